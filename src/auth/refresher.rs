use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::credentials::non_empty;
use crate::config::ClientConfig;
use crate::error::{AuthError, RefreshError};
use crate::util::timeout::with_timeout;

/// Tokens returned by a successful refresh exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshedTokens {
    pub access_token: String,
    /// Present only when the server rotated the refresh token.
    pub refresh_token: Option<String>,
}

/// Result of one refresh episode, shared read-only by every waiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Success(RefreshedTokens),
    Failure(RefreshError),
}

impl RefreshOutcome {
    pub fn access_token(&self) -> Option<&str> {
        match self {
            Self::Success(tokens) => Some(tokens.access_token.as_str()),
            Self::Failure(_) => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Exchanges a refresh token for a new access token.
///
/// Implementations never fail with an error: every problem becomes
/// [`RefreshOutcome::Failure`]. They also never persist what they fetch.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> RefreshOutcome;
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: Option<String>,
    refresh: Option<String>,
}

/// [`TokenRefresher`] that calls the refresh endpoint over HTTP.
///
/// Uses its own plain `reqwest` client so the exchange never passes back
/// through the auth middleware.
///
/// # Example
/// ```no_run
/// use fortuna_auth::auth::{HttpTokenRefresher, TokenRefresher};
/// use fortuna_auth::config::ClientConfig;
///
/// # async fn example() -> fortuna_auth::error::Result<()> {
/// let refresher = HttpTokenRefresher::from_config(&ClientConfig::default())?;
/// let outcome = refresher.refresh("refresh-token").await;
/// println!("refreshed: {}", outcome.is_success());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpTokenRefresher {
    client: reqwest::Client,
    refresh_url: String,
    timeout: Duration,
}

impl HttpTokenRefresher {
    pub fn new(refresh_url: impl Into<String>, timeout: Duration) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            refresh_url: refresh_url.into(),
            timeout,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, AuthError> {
        Self::new(config.refresh_url(), config.refresh_timeout())
    }

    pub fn refresh_url(&self) -> &str {
        &self.refresh_url
    }

    async fn exchange(&self, refresh_token: &str) -> Result<RefreshedTokens, RefreshError> {
        let resp = self
            .client
            .post(&self.refresh_url)
            .header("Accept", "application/json")
            .json(&RefreshRequest {
                refresh: refresh_token,
            })
            .send()
            .await
            .map_err(|err| self.map_transport(err))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RefreshError::Status(status.as_u16()));
        }

        let body = resp.text().await.map_err(|err| self.map_transport(err))?;
        let payload: Option<RefreshResponse> =
            serde_json::from_str(&body).map_err(|_| RefreshError::MissingAccessToken)?;
        let payload = payload.ok_or(RefreshError::MissingAccessToken)?;
        let access_token = non_empty(payload.access).ok_or(RefreshError::MissingAccessToken)?;

        Ok(RefreshedTokens {
            access_token,
            refresh_token: non_empty(payload.refresh),
        })
    }

    fn map_transport(&self, err: reqwest::Error) -> RefreshError {
        if err.is_timeout() {
            RefreshError::Timeout(self.timeout.as_millis() as u64)
        } else {
            RefreshError::from(err)
        }
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> RefreshOutcome {
        match with_timeout(self.timeout, self.exchange(refresh_token)).await {
            Ok(tokens) => RefreshOutcome::Success(tokens),
            Err(err) => {
                debug!(error = %err, url = %self.refresh_url, "Token refresh exchange failed");
                RefreshOutcome::Failure(err)
            }
        }
    }
}
