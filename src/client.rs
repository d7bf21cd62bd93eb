//! Composition root: the HTTP client with the auth pipeline installed.

use std::sync::Arc;

use bon::bon;
use reqwest::Method;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};

use crate::auth::{
    AuthMiddleware, CredentialStore, HttpTokenRefresher, RefreshCoordinator, RouteClassifier,
    TokenRefresher,
};
use crate::config::ClientConfig;
use crate::error::{AuthError, Result};

/// Fortuna API client.
///
/// Built once at startup; every request sent through [`FortunaClient::http`]
/// goes through the [`AuthMiddleware`], and all of them share one
/// [`RefreshCoordinator`].
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use fortuna_auth::auth::MemoryCredentialStore;
/// use fortuna_auth::client::FortunaClient;
/// use fortuna_auth::config::ClientConfig;
///
/// # async fn example() -> fortuna_auth::error::Result<()> {
/// let client = FortunaClient::builder()
///     .config(ClientConfig::from_env()?)
///     .store(Arc::new(MemoryCredentialStore::new()))
///     .build()?;
/// let resp = client.get("/api/user/profile/").send().await?;
/// println!("{}", resp.status());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct FortunaClient {
    http: ClientWithMiddleware,
    config: Arc<ClientConfig>,
    store: Arc<dyn CredentialStore>,
    coordinator: Arc<RefreshCoordinator>,
}

#[bon]
impl FortunaClient {
    /// Wire the pipeline together.
    ///
    /// `refresher` defaults to an [`HttpTokenRefresher`] pointed at the
    /// configured refresh endpoint.
    #[builder]
    pub fn new(
        config: ClientConfig,
        store: Arc<dyn CredentialStore>,
        refresher: Option<Arc<dyn TokenRefresher>>,
    ) -> Result<Self> {
        config.validate()?;
        let refresher = match refresher {
            Some(refresher) => refresher,
            None => Arc::new(HttpTokenRefresher::from_config(&config)?),
        };
        let coordinator = Arc::new(RefreshCoordinator::new(refresher, store.clone()));
        let middleware = AuthMiddleware::new(
            store.clone(),
            RouteClassifier::from_config(&config),
            coordinator.clone(),
        );

        let inner = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .pool_max_idle_per_host(10)
            .build()?;
        let http = ClientBuilder::new(inner).with(middleware).build();

        Ok(Self {
            http,
            config: Arc::new(config),
            store,
            coordinator,
        })
    }
}

impl FortunaClient {
    /// Start a request to an API path (or an absolute URL).
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.config.url(path))
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::GET, path)
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.request(Method::POST, path)
    }

    pub fn http(&self) -> &ClientWithMiddleware {
        &self.http
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.coordinator
    }
}

impl std::fmt::Debug for FortunaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FortunaClient")
            .field("base_url", &self.config.base_url)
            .field("coordinator", &self.coordinator)
            .finish()
    }
}

/// Turn a non-success response into an [`AuthError::Api`].
pub(crate) async fn error_for_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(status_to_error(status.as_u16(), &body))
}

fn status_to_error(status: u16, body: &str) -> AuthError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "detail", "error"]
                .iter()
                .find_map(|key| v.get(key).and_then(|m| m.as_str()).map(String::from))
        })
        .unwrap_or_else(|| body.to_string());
    AuthError::api(status, message)
}
