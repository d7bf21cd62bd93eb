#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fortuna_auth::auth::{
    Credentials, MemoryCredentialStore, RefreshOutcome, RefreshedTokens, TokenRefresher,
};
use fortuna_auth::client::FortunaClient;
use fortuna_auth::config::ClientConfig;
use fortuna_auth::error::RefreshError;
use wiremock::{MockServer, Request};

pub const PROFILE_PATH: &str = "/api/user/profile/";
pub const REFRESH_PATH: &str = "/api/user/auth/refresh/";
pub const LOGIN_PATH: &str = "/api/user/auth/google/";
pub const LOGOUT_PATH: &str = "/api/user/auth/logout/";
pub const UPLOAD_URL_PATH: &str = "/api/core/chakra/upload-url/";

pub fn store(access: Option<&str>, refresh: Option<&str>) -> Arc<MemoryCredentialStore> {
    let credentials = match access {
        Some(access) => Credentials::new(access, refresh),
        None => match refresh {
            Some(refresh) => Credentials::empty().with_refresh_token(refresh),
            None => Credentials::empty(),
        },
    };
    Arc::new(MemoryCredentialStore::with_credentials(credentials))
}

pub fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::new(server.uri())
}

pub fn client_for(server: &MockServer, store: Arc<MemoryCredentialStore>) -> FortunaClient {
    FortunaClient::builder()
        .config(config_for(server))
        .store(store)
        .build()
        .expect("client should build")
}

/// Authorization header values seen on requests to `path`, in arrival order.
pub async fn auth_headers(server: &MockServer, path: &str) -> Vec<Option<String>> {
    server
        .received_requests()
        .await
        .expect("request recording enabled")
        .iter()
        .filter(|req| req.url.path() == path)
        .map(authorization)
        .collect()
}

pub fn authorization(req: &Request) -> Option<String> {
    req.headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

/// Refresher that counts calls and answers with a fixed outcome after a delay.
pub struct CountingRefresher {
    calls: AtomicUsize,
    delay: Duration,
    outcome: RefreshOutcome,
}

impl CountingRefresher {
    pub fn succeeding(access: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay,
            outcome: RefreshOutcome::Success(RefreshedTokens {
                access_token: access.to_string(),
                refresh_token: None,
            }),
        })
    }

    pub fn failing(err: RefreshError) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
            outcome: RefreshOutcome::Failure(err),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenRefresher for CountingRefresher {
    async fn refresh(&self, _refresh_token: &str) -> RefreshOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.outcome.clone()
    }
}
