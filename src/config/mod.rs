//! Configuration system (layered: defaults > TOML file > env).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};

const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_STORE_NAMESPACE: &str = "fortuna_prefs";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
const DEFAULT_REFRESH_TIMEOUT_SECS: u64 = 10;

/// API paths the auth pipeline needs to know about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub google_login: String,
    pub refresh: String,
    pub logout: String,
    pub upload_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            google_login: "/api/user/auth/google/".to_string(),
            refresh: "/api/user/auth/refresh/".to_string(),
            logout: "/api/user/auth/logout/".to_string(),
            upload_url: "/api/core/chakra/upload-url/".to_string(),
        }
    }
}

/// Client configuration.
///
/// # Example
/// ```
/// use fortuna_auth::config::ClientConfig;
///
/// let config = ClientConfig::from_toml_str(r#"
///     base_url = "https://api.fortuna.example"
///     refresh_timeout_secs = 5
/// "#)?;
/// assert_eq!(config.refresh_url(), "https://api.fortuna.example/api/user/auth/refresh/");
/// # Ok::<(), fortuna_auth::error::AuthError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub endpoints: Endpoints,
    /// Path fragments matched by containment; matching requests bypass auth.
    pub exempt_routes: Vec<String>,
    pub request_timeout_secs: u64,
    pub refresh_timeout_secs: u64,
    pub store_dir: PathBuf,
    pub store_namespace: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            endpoints: Endpoints::default(),
            exempt_routes: default_exempt_routes(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            refresh_timeout_secs: DEFAULT_REFRESH_TIMEOUT_SECS,
            store_dir: default_store_dir(),
            store_namespace: DEFAULT_STORE_NAMESPACE.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Defaults overridden by environment variables (`.env` is loaded if present).
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file, then apply environment overrides.
    ///
    /// A missing file is not an error; defaults are used instead.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let _ = dotenvy::dotenv();
        let mut config = match std::fs::read_to_string(path.as_ref()) {
            Ok(raw) => toml::from_str(&raw)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(err) => return Err(AuthError::Io(err)),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("FORTUNA_BASE_URL") {
            self.base_url = url;
        }
        if let Ok(dir) = std::env::var("FORTUNA_STORE_DIR") {
            self.store_dir = PathBuf::from(dir);
        }
        if let Some(secs) = env_secs("FORTUNA_REQUEST_TIMEOUT_SECS")? {
            self.request_timeout_secs = secs;
        }
        if let Some(secs) = env_secs("FORTUNA_REFRESH_TIMEOUT_SECS")? {
            self.refresh_timeout_secs = secs;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let base = self.base_url.trim();
        if base.is_empty() {
            return Err(AuthError::Configuration("base_url is empty".to_string()));
        }
        reqwest::Url::parse(base).map_err(|err| {
            AuthError::Configuration(format!("base_url {base:?} is not a valid URL: {err}"))
        })?;
        if self.refresh_timeout_secs == 0 {
            return Err(AuthError::Configuration(
                "refresh_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.store_namespace.trim().is_empty() {
            return Err(AuthError::Configuration(
                "store_namespace is empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Join the base URL with an API path.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn refresh_url(&self) -> String {
        self.url(&self.endpoints.refresh)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.refresh_timeout_secs)
    }
}

fn default_exempt_routes() -> Vec<String> {
    ["auth/google", "auth/refresh", "auth/logout", "upload-url"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_store_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".fortuna"))
        .unwrap_or_else(|| PathBuf::from(".fortuna"))
}

fn env_secs(var: &str) -> Result<Option<u64>> {
    match std::env::var(var) {
        Ok(raw) => raw.trim().parse().map(Some).map_err(|_| {
            AuthError::Configuration(format!("{var} must be a whole number of seconds, got {raw:?}"))
        }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn defaults_cover_all_auth_endpoints() {
        let config = ClientConfig::default();
        assert_eq!(
            config.exempt_routes,
            vec!["auth/google", "auth/refresh", "auth/logout", "upload-url"]
        );
        assert_eq!(config.refresh_timeout(), Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn url_joins_without_doubling_slashes() {
        let config = ClientConfig::new("https://api.fortuna.example/");
        assert_eq!(
            config.url("/api/user/profile/"),
            "https://api.fortuna.example/api/user/profile/"
        );
        assert_eq!(
            config.url("api/core/fortune/tomorrow/"),
            "https://api.fortuna.example/api/core/fortune/tomorrow/"
        );
    }

    #[test]
    fn url_passes_absolute_urls_through() {
        let config = ClientConfig::default();
        assert_eq!(config.url("https://s3.example.com/x"), "https://s3.example.com/x");
    }

    #[test]
    fn toml_overrides_only_given_fields() {
        let config = ClientConfig::from_toml_str(
            r#"
            base_url = "https://api.fortuna.example"
            exempt_routes = ["auth/refresh"]

            [endpoints]
            refresh = "/v2/refresh/"
            "#,
        )
        .unwrap();
        assert_eq!(config.exempt_routes, vec!["auth/refresh"]);
        assert_eq!(config.endpoints.refresh, "/v2/refresh/");
        assert_eq!(config.endpoints.logout, "/api/user/auth/logout/");
        assert_eq!(config.refresh_url(), "https://api.fortuna.example/v2/refresh/");
    }

    #[test]
    fn zero_refresh_timeout_is_rejected() {
        let err = ClientConfig::from_toml_str("refresh_timeout_secs = 0").unwrap_err();
        assert!(matches!(err, AuthError::Configuration(_)));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = ClientConfig::new("not a url").validate().unwrap_err();
        assert!(matches!(err, AuthError::Configuration(msg) if msg.contains("not a url")));
    }

    #[test]
    fn load_missing_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ClientConfig::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.store_namespace, "fortuna_prefs");
    }
}
