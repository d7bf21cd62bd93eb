//! Error types for fortuna-auth.
//!
//! [`AuthError`] covers everything outside the request path (configuration,
//! login/logout, credential persistence). The refresh path uses the cloneable
//! [`RefreshError`], which is absorbed by the middleware and never surfaced to
//! callers as an error.

use thiserror::Error;

/// Primary error type for fortuna-auth operations.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Middleware error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Not logged in")]
    NotLoggedIn,
}

impl AuthError {
    /// Create an API error from a status code and body.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::de::Error> for AuthError {
    fn from(error: toml::de::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::ser::Error> for AuthError {
    fn from(error: toml::ser::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

/// Why a refresh episode produced no usable access token.
///
/// Downstream every variant means the same thing: the original request is
/// retried once without a token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    #[error("refresh transport error: {0}")]
    Transport(String),

    #[error("refresh timed out after {0}ms")]
    Timeout(u64),

    #[error("refresh endpoint returned status {0}")]
    Status(u16),

    #[error("refresh response carried no access token")]
    MissingAccessToken,

    #[error("refresh episode ended without publishing an outcome")]
    Abandoned,

    #[error("stored credentials changed while the refresh was in flight")]
    Superseded,
}

impl From<reqwest::Error> for RefreshError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::MissingAccessToken
        } else {
            Self::Transport(error.to_string())
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, AuthError>;
