//! Credential storage, token refresh, and the bearer-auth request pipeline.

pub mod coordinator;
pub mod credentials;
pub mod middleware;
pub mod refresher;
pub mod routes;
pub mod session;
pub mod store;

pub use coordinator::RefreshCoordinator;
pub use credentials::Credentials;
pub use middleware::AuthMiddleware;
pub use refresher::{HttpTokenRefresher, RefreshOutcome, RefreshedTokens, TokenRefresher};
pub use routes::{RouteClassifier, RouteDecision};
pub use session::{LoginResponse, SessionService, SessionStatus};
pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
