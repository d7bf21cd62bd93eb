//! Bearer-token middleware with refresh-and-retry on 401.

use std::sync::Arc;

use async_trait::async_trait;
use http::Extensions;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Request, Response, StatusCode};
use reqwest_middleware::{Middleware, Next, Result};
use tracing::{debug, warn};

use super::coordinator::RefreshCoordinator;
use super::refresher::RefreshOutcome;
use super::routes::RouteClassifier;
use super::store::CredentialStore;

/// Attaches `Authorization: Bearer <token>` and recovers from expired tokens.
///
/// Every non-exempt request is forwarded with the stored access token. A 401
/// triggers at most one retry. It uses a token some other request already
/// refreshed if there is one, otherwise a coordinated refresh when a refresh
/// token exists, otherwise a bare resend. The retried response is returned
/// whatever its status, so one call costs at most two round trips.
pub struct AuthMiddleware {
    store: Arc<dyn CredentialStore>,
    routes: RouteClassifier,
    coordinator: Arc<RefreshCoordinator>,
}

impl AuthMiddleware {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        routes: RouteClassifier,
        coordinator: Arc<RefreshCoordinator>,
    ) -> Self {
        Self {
            store,
            routes,
            coordinator,
        }
    }

    /// Token to send on the single retry after a 401.
    ///
    /// `rejected` is the token the failed attempt carried. When storage already
    /// holds a different one (another request's refresh finished first), that
    /// token is reused and no new episode starts.
    async fn recover(&self, rejected: Option<&str>) -> Option<String> {
        let current = self.store.access_token();
        if current.is_some() && current.as_deref() != rejected {
            debug!("Stored token changed since this request was sent; retrying with it");
            return current;
        }
        let Some(refresh_token) = self.store.refresh_token() else {
            debug!("Got 401 without a refresh token; retrying as-is");
            return current;
        };
        match self.coordinator.refresh_once(&refresh_token).await {
            RefreshOutcome::Success(tokens) => Some(tokens.access_token),
            RefreshOutcome::Failure(err) => {
                // Storage was settled by the episode that produced this outcome.
                warn!(error = %err, "Token refresh failed; retrying without credentials");
                None
            }
        }
    }
}

#[async_trait]
impl Middleware for AuthMiddleware {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        if self.routes.is_exempt(req.url().path()) {
            debug!(path = req.url().path(), "Exempt route; forwarding without credentials");
            return next.run(req, extensions).await;
        }

        let sent = self.store.access_token();
        set_bearer(&mut req, sent.as_deref());
        let retry = req.try_clone();

        let response = next.clone().run(req, extensions).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let Some(mut retry) = retry else {
            warn!(
                url = %response.url(),
                "Got 401 on a request with a streaming body; cannot retry"
            );
            return Ok(response);
        };
        drop(response);

        let token = self.recover(sent.as_deref()).await;
        set_bearer(&mut retry, token.as_deref());
        let response = next.run(retry, extensions).await?;
        debug!(status = %response.status(), "Retried request after 401");
        Ok(response)
    }
}

/// Replace the bearer header; absent or empty tokens remove it entirely.
pub(crate) fn set_bearer(req: &mut Request, token: Option<&str>) {
    let headers = req.headers_mut();
    headers.remove(AUTHORIZATION);
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return;
    };
    match HeaderValue::from_str(&format!("Bearer {token}")) {
        Ok(mut value) => {
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Err(_) => warn!("Stored access token is not a valid header value; sending without it"),
    }
}
