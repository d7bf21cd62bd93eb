//! Convenience re-exports for common use.

pub use crate::auth::{
    CredentialStore, Credentials, FileCredentialStore, MemoryCredentialStore, RefreshOutcome,
    SessionService, TokenRefresher,
};
pub use crate::client::FortunaClient;
pub use crate::config::ClientConfig;
pub use crate::error::{AuthError, RefreshError, Result};
