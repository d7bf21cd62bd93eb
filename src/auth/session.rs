use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::credentials::{non_empty, Credentials};
use super::refresher::RefreshOutcome;
use super::store::CredentialStore;
use crate::client::{error_for_status, FortunaClient};
use crate::error::{AuthError, Result};

/// Successful social-login payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: u64,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub profile_image: String,
    #[serde(default)]
    pub is_new_user: bool,
    #[serde(default)]
    pub needs_additional_info: bool,
}

/// Stored-credential summary for status displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    pub logged_in: bool,
    pub has_refresh_token: bool,
}

#[derive(Debug, Serialize)]
struct GoogleLoginRequest<'a> {
    id_token: &'a str,
}

#[derive(Debug, Serialize)]
struct LogoutRequest<'a> {
    refresh_token: &'a str,
}

/// Credential lifecycle outside the request path: login, logout, status.
///
/// All I/O decisions (printing, prompting, exit codes) belong to the caller.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use fortuna_auth::auth::{MemoryCredentialStore, SessionService};
/// use fortuna_auth::client::FortunaClient;
/// use fortuna_auth::config::ClientConfig;
///
/// # async fn example() -> fortuna_auth::error::Result<()> {
/// let client = FortunaClient::builder()
///     .config(ClientConfig::default())
///     .store(Arc::new(MemoryCredentialStore::new()))
///     .build()?;
/// let session = SessionService::new(client);
/// let login = session.login_with_google("google-id-token").await?;
/// println!("signed in as {}", login.email);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SessionService {
    client: FortunaClient,
}

impl SessionService {
    pub fn new(client: FortunaClient) -> Self {
        Self { client }
    }

    fn store(&self) -> &Arc<dyn CredentialStore> {
        self.client.store()
    }

    /// Exchange a Google ID token for an API token pair and store it.
    pub async fn login_with_google(&self, id_token: &str) -> Result<LoginResponse> {
        let endpoint = &self.client.config().endpoints.google_login;
        let resp = self
            .client
            .post(endpoint)
            .json(&GoogleLoginRequest { id_token })
            .send()
            .await?;
        let resp = error_for_status(resp).await?;
        let login: LoginResponse = serde_json::from_str(&resp.text().await?)?;

        let access = non_empty(Some(login.access_token.clone()));
        let refresh = non_empty(Some(login.refresh_token.clone()));
        let (Some(access), Some(refresh)) = (access, refresh) else {
            return Err(AuthError::InvalidResponse(
                "login response is missing access_token or refresh_token".to_string(),
            ));
        };
        self.store().save(&Credentials::new(access, Some(refresh)))?;
        info!(user_id = login.user_id, is_new_user = login.is_new_user, "Logged in");
        Ok(login)
    }

    /// Revoke the refresh token server-side (best effort) and forget both tokens.
    ///
    /// Local credentials are cleared even when the server call fails.
    pub async fn logout(&self) -> Result<()> {
        if let Some(refresh_token) = self.store().refresh_token() {
            let endpoint = &self.client.config().endpoints.logout;
            let sent = self
                .client
                .post(endpoint)
                .json(&LogoutRequest {
                    refresh_token: &refresh_token,
                })
                .send()
                .await;
            match sent {
                Ok(resp) if !resp.status().is_success() => {
                    warn!(status = %resp.status(), "Server-side logout was rejected");
                }
                Err(err) => warn!(error = %err, "Server-side logout failed"),
                Ok(_) => {}
            }
        }
        self.store().clear()?;
        info!("Logged out");
        Ok(())
    }

    pub fn status(&self) -> SessionStatus {
        let creds = self.store().load();
        SessionStatus {
            logged_in: creds.access_token().is_some(),
            has_refresh_token: creds.refresh_token().is_some(),
        }
    }

    /// Run one coordinated refresh episode now.
    ///
    /// Returns the new access token. On failure the episode has already settled
    /// storage (cleared, or left to whoever replaced it mid-flight).
    pub async fn refresh_now(&self) -> Result<String> {
        let refresh_token = self.store().refresh_token().ok_or(AuthError::NotLoggedIn)?;
        match self.client.coordinator().refresh_once(&refresh_token).await {
            RefreshOutcome::Success(tokens) => Ok(tokens.access_token),
            RefreshOutcome::Failure(err) => Err(AuthError::InvalidResponse(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryCredentialStore;
    use crate::config::ClientConfig;

    fn service(store: Arc<MemoryCredentialStore>) -> SessionService {
        let client = FortunaClient::builder()
            .config(ClientConfig::default())
            .store(store)
            .build()
            .unwrap();
        SessionService::new(client)
    }

    #[test]
    fn status_reports_missing_credentials() {
        let svc = service(Arc::new(MemoryCredentialStore::new()));
        assert_eq!(
            svc.status(),
            SessionStatus {
                logged_in: false,
                has_refresh_token: false
            }
        );
    }

    #[test]
    fn status_treats_empty_access_token_as_logged_out() {
        let store = Arc::new(MemoryCredentialStore::with_credentials(Credentials::new(
            "",
            Some("refresh"),
        )));
        let status = service(store).status();
        assert!(!status.logged_in);
        assert!(status.has_refresh_token);
    }

    #[tokio::test]
    async fn refresh_now_requires_refresh_token() {
        let svc = service(Arc::new(MemoryCredentialStore::new()));
        assert!(matches!(svc.refresh_now().await, Err(AuthError::NotLoggedIn)));
    }

    #[test]
    fn login_response_tolerates_missing_profile_fields() {
        let login: LoginResponse = serde_json::from_str(
            r#"{"access_token":"a","refresh_token":"r","user_id":7,"email":"x@y.z"}"#,
        )
        .unwrap();
        assert_eq!(login.user_id, 7);
        assert!(!login.is_new_user);
        assert_eq!(login.name, "");
    }
}
