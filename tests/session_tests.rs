//! Login, logout, and manual refresh against a mock API server.

mod auth_support;

use fortuna_auth::auth::{CredentialStore, SessionService};
use fortuna_auth::error::AuthError;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_support::{auth_headers, client_for, store, LOGIN_PATH, LOGOUT_PATH, REFRESH_PATH};

fn login_body() -> serde_json::Value {
    json!({
        "access_token": "access-1",
        "refresh_token": "refresh-1",
        "user_id": 42,
        "email": "user@example.com",
        "name": "Moon",
        "profile_image": "https://example.com/p.png",
        "is_new_user": true,
        "needs_additional_info": true
    })
}

#[tokio::test]
async fn login_with_google_stores_token_pair() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .and(body_json(json!({ "id_token": "google-token" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body()))
        .expect(1)
        .mount(&server)
        .await;

    let store = store(None, None);
    let session = SessionService::new(client_for(&server, store.clone()));
    let login = session.login_with_google("google-token").await.unwrap();

    assert_eq!(login.user_id, 42);
    assert_eq!(login.email, "user@example.com");
    assert!(login.is_new_user);
    assert!(login.needs_additional_info);
    assert_eq!(store.access_token().as_deref(), Some("access-1"));
    assert_eq!(store.refresh_token().as_deref(), Some("refresh-1"));
    assert!(session.status().logged_in);
}

#[tokio::test]
async fn login_request_never_carries_old_bearer() {
    let server = MockServer::start().await;
    Mock::given(path(LOGIN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body()))
        .mount(&server)
        .await;

    let session = SessionService::new(client_for(&server, store(Some("old"), Some("old-r"))));
    session.login_with_google("google-token").await.unwrap();

    assert_eq!(auth_headers(&server, LOGIN_PATH).await, vec![None]);
}

#[tokio::test]
async fn rejected_login_surfaces_api_error_and_stores_nothing() {
    let server = MockServer::start().await;
    Mock::given(path(LOGIN_PATH))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "Invalid ID token" })),
        )
        .mount(&server)
        .await;

    let store = store(None, None);
    let session = SessionService::new(client_for(&server, store.clone()));
    let err = session.login_with_google("bad").await.unwrap_err();

    match err {
        AuthError::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid ID token");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    assert!(store.load().is_empty());
}

#[tokio::test]
async fn login_with_empty_tokens_is_invalid() {
    let server = MockServer::start().await;
    let mut body = login_body();
    body["refresh_token"] = json!("");
    Mock::given(path(LOGIN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let store = store(None, None);
    let session = SessionService::new(client_for(&server, store.clone()));
    let err = session.login_with_google("google-token").await.unwrap_err();

    assert!(matches!(err, AuthError::InvalidResponse(_)));
    assert!(store.load().is_empty());
}

#[tokio::test]
async fn logout_revokes_refresh_token_and_clears() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGOUT_PATH))
        .and(body_json(json!({ "refresh_token": "refresh-1" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let store = store(Some("access-1"), Some("refresh-1"));
    SessionService::new(client_for(&server, store.clone()))
        .logout()
        .await
        .unwrap();

    assert!(store.load().is_empty());
}

#[tokio::test]
async fn logout_clears_even_when_server_fails() {
    let server = MockServer::start().await;
    Mock::given(path(LOGOUT_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let store = store(Some("access-1"), Some("refresh-1"));
    SessionService::new(client_for(&server, store.clone()))
        .logout()
        .await
        .unwrap();

    assert!(store.load().is_empty());
}

#[tokio::test]
async fn logout_without_refresh_token_skips_server() {
    let server = MockServer::start().await;
    Mock::given(path(LOGOUT_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store = store(Some("access-only"), None);
    SessionService::new(client_for(&server, store.clone()))
        .logout()
        .await
        .unwrap();

    assert!(store.load().is_empty());
}

#[tokio::test]
async fn refresh_now_updates_access_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .and(body_json(json!({ "refresh": "refresh-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access": "access-2" })))
        .expect(1)
        .mount(&server)
        .await;

    let store = store(Some("access-1"), Some("refresh-1"));
    let session = SessionService::new(client_for(&server, store.clone()));
    let access = session.refresh_now().await.unwrap();

    assert_eq!(access, "access-2");
    assert_eq!(store.access_token().as_deref(), Some("access-2"));
    assert_eq!(store.refresh_token().as_deref(), Some("refresh-1"));
}

#[tokio::test]
async fn refresh_now_failure_clears_credentials() {
    let server = MockServer::start().await;
    Mock::given(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let store = store(Some("access-1"), Some("refresh-1"));
    let session = SessionService::new(client_for(&server, store.clone()));
    let err = session.refresh_now().await.unwrap_err();

    assert!(matches!(err, AuthError::InvalidResponse(_)));
    assert!(store.load().is_empty());
    assert!(!session.status().logged_in);
}
