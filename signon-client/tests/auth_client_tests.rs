//! `AuthClient` against an in-process authentication server.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use client::api::{AuthClient, AuthError, NETWORK_ERROR_MESSAGE};
use common::{Canned, MockAuthServer, closed_port_url};
use serde_json::json;
use shared::{
    config::ClientConfig,
    models::{Credentials, LoginResult},
};

fn alice_json() -> serde_json::Value {
    json!({
        "id": 1,
        "username": "alice",
        "email": "a@x.com",
        "enabled": true,
        "roles": [{ "id": 3, "name": "USER", "permissions": [{ "id": 9, "name": "read" }] }]
    })
}

#[tokio::test]
async fn test_login_posts_credentials_as_json() {
    let server = MockAuthServer::start(Canned::json(StatusCode::OK, &alice_json())).await;
    let client = AuthClient::new(&server.config()).unwrap();

    client
        .login(&Credentials::new("alice", "secret"))
        .await
        .unwrap();

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].body,
        json!({ "username": "alice", "password": "secret" })
    );
    assert!(
        requests[0]
            .content_type
            .as_deref()
            .is_some_and(|value| value.starts_with("application/json"))
    );
}

#[tokio::test]
async fn test_bare_profile_is_returned_as_is() {
    let server = MockAuthServer::start(Canned::json(StatusCode::OK, &alice_json())).await;
    let client = AuthClient::new(&server.config()).unwrap();

    let result = client
        .login(&Credentials::new("alice", "secret"))
        .await
        .unwrap();

    assert_eq!(result, LoginResult::Bare(alice_json()));
    let profile = result.profile().unwrap();
    assert_eq!(profile.username, "alice");
    assert_eq!(profile.role_names(), vec!["USER"]);
}

#[tokio::test]
async fn test_envelope_is_returned_with_token() {
    let body = json!({ "token": "abc", "user": alice_json() });
    let server = MockAuthServer::start(Canned::json(StatusCode::OK, &body)).await;
    let client = AuthClient::new(&server.config()).unwrap();

    let result = client
        .login(&Credentials::new("alice", "secret"))
        .await
        .unwrap();

    assert_eq!(result.token(), Some("abc"));
}

#[tokio::test]
async fn test_message_field_is_extracted() {
    let server = MockAuthServer::start(Canned::json(
        StatusCode::UNAUTHORIZED,
        &json!({ "message": "bad creds" }),
    ))
    .await;
    let client = AuthClient::new(&server.config()).unwrap();

    let err = client
        .login(&Credentials::new("alice", "wrong"))
        .await
        .unwrap_err();

    match err {
        AuthError::Api { status, message } => {
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(message, "bad creds");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_plain_text_body_is_the_message() {
    let server = MockAuthServer::start(Canned::text(StatusCode::BAD_REQUEST, "nope")).await;
    let client = AuthClient::new(&server.config()).unwrap();

    let err = client
        .login(&Credentials::new("alice", "wrong"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "nope");
}

#[tokio::test]
async fn test_error_field_is_second_choice() {
    let server = MockAuthServer::start(Canned::json(
        StatusCode::UNAUTHORIZED,
        &json!({ "error": "invalid credentials" }),
    ))
    .await;
    let client = AuthClient::new(&server.config()).unwrap();

    let err = client
        .login(&Credentials::new("alice", "wrong"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "invalid credentials");
}

#[tokio::test]
async fn test_status_reason_when_body_has_no_message() {
    let server =
        MockAuthServer::start(Canned::json(StatusCode::FORBIDDEN, &json!({ "code": 17 }))).await;
    let client = AuthClient::new(&server.config()).unwrap();

    let err = client
        .login(&Credentials::new("alice", "wrong"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Forbidden");
}

#[tokio::test]
async fn test_connection_failure_is_a_network_error() {
    let config = ClientConfig {
        api_base_url: closed_port_url().await,
        ..ClientConfig::with_defaults()
    };
    let client = AuthClient::new(&config).unwrap();

    let err = client
        .login(&Credentials::new("alice", "secret"))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Network(_)), "got {err:?}");
    assert_eq!(err.to_string(), NETWORK_ERROR_MESSAGE);
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let server = MockAuthServer::start(
        Canned::json(StatusCode::OK, &alice_json()).with_delay(Duration::from_secs(5)),
    )
    .await;
    let config = ClientConfig {
        request_timeout_secs: 1,
        ..server.config()
    };
    let client = AuthClient::new(&config).unwrap();

    let err = client
        .login(&Credentials::new("alice", "secret"))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Timeout(_)), "got {err:?}");
}

#[tokio::test]
async fn test_success_body_without_token_is_returned_as_sent() {
    let body = json!({ "welcome": true, "user": { "username": "alice" } });
    let server = MockAuthServer::start(Canned::json(StatusCode::OK, &body)).await;
    let client = AuthClient::new(&server.config()).unwrap();

    let result = client
        .login(&Credentials::new("alice", "secret"))
        .await
        .unwrap();

    assert_eq!(result, LoginResult::Bare(body));
}

#[tokio::test]
async fn test_non_json_success_body_is_unexpected() {
    let server = MockAuthServer::start(Canned::text(StatusCode::OK, "<html>welcome</html>")).await;
    let client = AuthClient::new(&server.config()).unwrap();

    let err = client
        .login(&Credentials::new("alice", "secret"))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Unexpected { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_session_cookie_is_replayed() {
    let server = MockAuthServer::start(
        Canned::json(StatusCode::OK, &alice_json()).with_cookie("SESSION=s3cr3t; Path=/; HttpOnly"),
    )
    .await;
    let client = AuthClient::new(&server.config()).unwrap();
    let credentials = Credentials::new("alice", "secret");

    client.login(&credentials).await.unwrap();
    client.login(&credentials).await.unwrap();

    let requests = server.requests();
    assert!(requests[0].cookie.is_none());
    assert_eq!(requests[1].cookie.as_deref(), Some("SESSION=s3cr3t"));
}
