use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::credentials::Credentials;
use crate::config::ClientConfig;
use crate::error::AuthError;

const CREDENTIAL_FILE_VERSION: u32 = 1;

/// Storage for the current credential pair.
///
/// Reads return a consistent snapshot and never fail; writes report
/// persistence errors. Implementations must not perform network I/O.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Credentials;

    /// Replace both tokens (login, or a refresh that rotated the refresh token).
    fn save(&self, credentials: &Credentials) -> Result<(), AuthError>;

    /// Replace only the access token.
    fn save_access_token(&self, token: &str) -> Result<(), AuthError>;

    /// Remove both tokens.
    fn clear(&self) -> Result<(), AuthError>;

    /// Replace the pair with `next` only while the stored refresh token is
    /// still `refresh_token`. Compare and write happen under one lock.
    ///
    /// Returns whether the write happened.
    fn replace_if(&self, refresh_token: &str, next: &Credentials) -> Result<bool, AuthError>;

    fn access_token(&self) -> Option<String> {
        self.load().access_token().map(String::from)
    }

    fn refresh_token(&self) -> Option<String> {
        self.load().refresh_token().map(String::from)
    }
}

/// Process-local credential store.
///
/// # Example
/// ```
/// use fortuna_auth::auth::{CredentialStore, Credentials, MemoryCredentialStore};
///
/// let store = MemoryCredentialStore::with_credentials(Credentials::new("a", Some("r")));
/// store.save_access_token("b")?;
/// assert_eq!(store.access_token().as_deref(), Some("b"));
/// assert_eq!(store.refresh_token().as_deref(), Some("r"));
/// # Ok::<(), fortuna_auth::error::AuthError>(())
/// ```
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credentials: Mutex<Credentials>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            credentials: Mutex::new(credentials),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Credentials {
        lock(&self.credentials).clone()
    }

    fn save(&self, credentials: &Credentials) -> Result<(), AuthError> {
        *lock(&self.credentials) = credentials.clone();
        Ok(())
    }

    fn save_access_token(&self, token: &str) -> Result<(), AuthError> {
        let mut guard = lock(&self.credentials);
        *guard = guard.clone().with_access_token(token);
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        *lock(&self.credentials) = Credentials::empty();
        Ok(())
    }

    fn replace_if(&self, refresh_token: &str, next: &Credentials) -> Result<bool, AuthError> {
        let mut guard = lock(&self.credentials);
        if guard.refresh_token() != Some(refresh_token) {
            return Ok(false);
        }
        *guard = next.clone();
        Ok(true)
    }
}

/// File-backed credential store using a single TOML file per namespace.
///
/// The file is read once on open; afterwards an in-memory copy answers reads
/// and every write updates file and copy under the same lock.
///
/// # Example
/// ```no_run
/// use fortuna_auth::auth::{CredentialStore, Credentials, FileCredentialStore};
///
/// let store = FileCredentialStore::open("/tmp/fortuna", "fortuna_prefs")?;
/// store.save(&Credentials::new("access", Some("refresh")))?;
/// # Ok::<(), fortuna_auth::error::AuthError>(())
/// ```
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    cached: Mutex<Credentials>,
}

impl FileCredentialStore {
    pub fn open(base_dir: impl Into<PathBuf>, namespace: &str) -> Result<Self, AuthError> {
        let path = base_dir
            .into()
            .join(format!("{}.toml", normalize_namespace(namespace)));
        let credentials = read_credential_file(&path)?;
        Ok(Self {
            path,
            cached: Mutex::new(credentials),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, AuthError> {
        Self::open(config.store_dir.clone(), &config.store_namespace)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, guard: &mut MutexGuard<'_, Credentials>, next: Credentials) -> Result<(), AuthError> {
        if next.is_empty() {
            remove_credential_file(&self.path)?;
        } else {
            let file = CredentialFile {
                version: CREDENTIAL_FILE_VERSION,
                access_token: next.access_token().map(String::from),
                refresh_token: next.refresh_token().map(String::from),
                saved_at: Utc::now(),
            };
            atomic_write(&self.path, toml::to_string(&file)?.as_bytes())?;
        }
        **guard = next;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Credentials {
        lock(&self.cached).clone()
    }

    fn save(&self, credentials: &Credentials) -> Result<(), AuthError> {
        let mut guard = lock(&self.cached);
        self.persist(&mut guard, credentials.clone())
    }

    fn save_access_token(&self, token: &str) -> Result<(), AuthError> {
        let mut guard = lock(&self.cached);
        let next = guard.clone().with_access_token(token);
        self.persist(&mut guard, next)
    }

    fn clear(&self) -> Result<(), AuthError> {
        let mut guard = lock(&self.cached);
        self.persist(&mut guard, Credentials::empty())
    }

    fn replace_if(&self, refresh_token: &str, next: &Credentials) -> Result<bool, AuthError> {
        let mut guard = lock(&self.cached);
        if guard.refresh_token() != Some(refresh_token) {
            return Ok(false);
        }
        self.persist(&mut guard, next.clone())?;
        Ok(true)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CredentialFile {
    version: u32,
    access_token: Option<String>,
    refresh_token: Option<String>,
    saved_at: DateTime<Utc>,
}

fn lock(mutex: &Mutex<Credentials>) -> MutexGuard<'_, Credentials> {
    // A panic while holding the lock cannot leave a half-written pair behind:
    // every write replaces the whole value at once.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read_credential_file(path: &Path) -> Result<Credentials, AuthError> {
    let raw = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Credentials::empty()),
        Err(err) => return Err(AuthError::Io(err)),
    };
    let file: CredentialFile = toml::from_str(&raw)?;
    if file.version != CREDENTIAL_FILE_VERSION {
        return Err(AuthError::Configuration(format!(
            "Unsupported credential file version {} at {}",
            file.version,
            path.display()
        )));
    }
    let credentials = match file.access_token {
        Some(access) => Credentials::new(access, file.refresh_token),
        None => match file.refresh_token {
            Some(refresh) => Credentials::empty().with_refresh_token(refresh),
            None => Credentials::empty(),
        },
    };
    Ok(credentials)
}

fn remove_credential_file(path: &Path) -> Result<(), AuthError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(AuthError::Io(err)),
    }
}

/// Write `data` to a sibling temp file, then rename it over `path`.
///
/// `tempfile` creates the temp file owner-only (0600 on unix), and the rename
/// keeps that mode, so readers never see a partial or world-readable file.
fn atomic_write(path: &Path, data: &[u8]) -> Result<(), AuthError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut temp = tempfile::Builder::new()
        .prefix(".credentials-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    temp.write_all(data)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|err| AuthError::Io(err.error))?;
    Ok(())
}

fn normalize_namespace(value: &str) -> String {
    let trimmed = value.trim();
    let out: String = trimmed
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '-'
            }
        })
        .collect();
    if out.trim_matches('-').is_empty() {
        "default".to_string()
    } else {
        out
    }
}
