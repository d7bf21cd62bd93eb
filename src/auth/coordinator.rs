//! Single-flight coordination of token refreshes.
//!
//! At most one refresh episode runs at a time. The first caller that finds the
//! slot idle marks it pending and spawns the episode; everyone arriving while
//! it is pending waits on the same `watch` channel. When the exchange finishes
//! the episode commits the outcome to the credential store, then publishes it
//! and frees the slot under the lock (idle -> pending -> publishing -> idle).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{info, warn};

use super::credentials::Credentials;
use super::refresher::{RefreshOutcome, TokenRefresher};
use super::store::CredentialStore;
use crate::error::RefreshError;

type OutcomeReceiver = watch::Receiver<Option<RefreshOutcome>>;

/// Marker for the refresh episode currently in flight.
#[derive(Debug)]
struct PendingRefresh {
    episode: u64,
    outcome: OutcomeReceiver,
}

type Slot = Arc<Mutex<Option<PendingRefresh>>>;

/// Runs token refreshes so that concurrent callers share one exchange.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use fortuna_auth::auth::{
///     Credentials, HttpTokenRefresher, MemoryCredentialStore, RefreshCoordinator,
/// };
/// use fortuna_auth::config::ClientConfig;
///
/// # async fn example() -> fortuna_auth::error::Result<()> {
/// let config = ClientConfig::default();
/// let store = Arc::new(MemoryCredentialStore::with_credentials(
///     Credentials::new("expired", Some("valid123")),
/// ));
/// let refresher = Arc::new(HttpTokenRefresher::from_config(&config)?);
/// let coordinator = RefreshCoordinator::new(refresher, store);
/// let outcome = coordinator.refresh_once("valid123").await;
/// # Ok(())
/// # }
/// ```
pub struct RefreshCoordinator {
    refresher: Arc<dyn TokenRefresher>,
    store: Arc<dyn CredentialStore>,
    slot: Slot,
    episodes: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new(refresher: Arc<dyn TokenRefresher>, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            refresher,
            store,
            slot: Arc::new(Mutex::new(None)),
            episodes: AtomicU64::new(0),
        }
    }

    /// Refresh the access token, joining the in-flight episode if there is one.
    ///
    /// Must be called from within a tokio runtime. Dropping the returned future
    /// only abandons this caller's wait; the episode itself keeps running.
    pub async fn refresh_once(&self, refresh_token: &str) -> RefreshOutcome {
        let mut receiver = self.join_or_start(refresh_token);
        receiver
            .wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|published| (*published).clone())
            .unwrap_or(RefreshOutcome::Failure(RefreshError::Abandoned))
    }

    /// Whether a refresh episode is currently in flight.
    pub fn is_pending(&self) -> bool {
        lock(&self.slot).is_some()
    }

    /// Number of episodes started since construction.
    pub fn episodes_started(&self) -> u64 {
        self.episodes.load(Ordering::SeqCst)
    }

    fn join_or_start(&self, refresh_token: &str) -> OutcomeReceiver {
        let mut slot = lock(&self.slot);
        if let Some(pending) = slot.as_ref() {
            return pending.outcome.clone();
        }

        let episode = self.episodes.fetch_add(1, Ordering::SeqCst) + 1;
        let (sender, receiver) = watch::channel(None);
        *slot = Some(PendingRefresh {
            episode,
            outcome: receiver.clone(),
        });
        drop(slot);

        info!(episode, "Starting token refresh");
        let guard = EpisodeGuard {
            slot: self.slot.clone(),
            episode,
            sender,
        };
        let refresher = self.refresher.clone();
        let store = self.store.clone();
        let refresh_token = refresh_token.to_string();
        tokio::spawn(async move {
            let outcome = refresher.refresh(&refresh_token).await;
            let outcome = commit(store.as_ref(), &refresh_token, outcome);
            guard.publish(outcome);
        });

        receiver
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("pending", &self.is_pending())
            .field("episodes", &self.episodes_started())
            .finish()
    }
}

/// Apply an outcome to storage: new tokens on success, cleared pair on failure.
///
/// Both writes only land while the store still holds `refresh_token`. If a
/// logout or a new login replaced it mid-episode, storage is left alone and a
/// success is downgraded to [`RefreshError::Superseded`].
fn commit(
    store: &dyn CredentialStore,
    refresh_token: &str,
    outcome: RefreshOutcome,
) -> RefreshOutcome {
    let next = match &outcome {
        RefreshOutcome::Success(tokens) => Credentials::new(
            tokens.access_token.as_str(),
            Some(tokens.refresh_token.as_deref().unwrap_or(refresh_token)),
        ),
        RefreshOutcome::Failure(err) => {
            warn!(error = %err, "Token refresh failed; clearing stored credentials");
            Credentials::empty()
        }
    };
    match store.replace_if(refresh_token, &next) {
        Ok(true) => outcome,
        Ok(false) if outcome.is_success() => {
            warn!("Stored credentials changed during refresh; discarding refreshed token");
            RefreshOutcome::Failure(RefreshError::Superseded)
        }
        Ok(false) => outcome,
        Err(err) => {
            warn!(error = %err, "Failed to persist refresh outcome");
            outcome
        }
    }
}

/// Owns the publishing side of one episode.
///
/// Dropping it without publishing (the episode task panicked) still frees the
/// slot; waiters then see a closed channel.
struct EpisodeGuard {
    slot: Slot,
    episode: u64,
    sender: watch::Sender<Option<RefreshOutcome>>,
}

impl EpisodeGuard {
    fn publish(self, outcome: RefreshOutcome) {
        let success = outcome.is_success();
        {
            let mut slot = lock(&self.slot);
            self.sender.send_replace(Some(outcome));
            release(&mut slot, self.episode);
        }
        info!(episode = self.episode, success, "Token refresh finished");
    }
}

impl Drop for EpisodeGuard {
    fn drop(&mut self) {
        release(&mut lock(&self.slot), self.episode);
    }
}

fn release(slot: &mut Option<PendingRefresh>, episode: u64) {
    if slot.as_ref().is_some_and(|p| p.episode == episode) {
        *slot = None;
    }
}

fn lock(slot: &Mutex<Option<PendingRefresh>>) -> MutexGuard<'_, Option<PendingRefresh>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}
