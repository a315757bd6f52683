//! Integration tests for the Pushover client against a local mock server.
//!
//! `wiremock` stands in for `api.pushover.net`.  Each test mounts the response
//! Pushover would give and checks how `PushoverClient` maps it onto
//! `Result<(), DeliveryError>`.  Mounts with `.expect(n)` are verified when
//! the server is dropped, so a test also fails if the client sent more (or
//! fewer) requests than expected.

use std::time::Duration;

use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use notify_bridge::application::{DeliveryClient, DeliveryError};
use notify_bridge::infrastructure::pushover::{PushoverClient, PushoverConfig, MAX_MESSAGE_CHARS};

fn client_for(server: &MockServer) -> PushoverClient {
    PushoverClient::new(PushoverConfig {
        base_url: server.uri(),
        timeout: Duration::from_secs(2),
    })
    .expect("build client")
}

#[tokio::test]
async fn test_accepted_message_is_ok() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/1/messages.json"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("token=app-token"))
        .and(body_string_contains("user=user-key"))
        .and(body_string_contains("message=Camera+3+motion+detected"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 1,
            "request": "647d2300-702c-4b38-8b2f-d56326ae460b"
        })))
        .expect(1)
        .mount(&server)
        .await;

    // Act
    let result = client_for(&server)
        .send("Camera 3 motion detected", "user-key", "app-token")
        .await;

    // Assert
    assert_ok!(result);
}

#[tokio::test]
async fn test_http_400_with_errors_is_rejected_with_reason() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/1/messages.json"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "user": "invalid",
            "errors": ["user identifier is not a valid user, group, or subscribed user key"],
            "status": 0,
            "request": "5042853c-402d-4a18-abcb-168734a801de"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = assert_err!(client_for(&server).send("hi", "bad-user", "app-token").await);

    assert_eq!(
        err,
        DeliveryError::Rejected {
            status: 400,
            reason: "user identifier is not a valid user, group, or subscribed user key"
                .to_string(),
        }
    );
}

#[tokio::test]
async fn test_status_zero_on_http_200_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": 0, "request": "x"})))
        .mount(&server)
        .await;

    let err = assert_err!(client_for(&server).send("hi", "user-key", "app-token").await);

    assert_eq!(
        err,
        DeliveryError::Rejected {
            status: 200,
            reason: "status 0".to_string()
        }
    );
}

#[tokio::test]
async fn test_server_error_without_json_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = assert_err!(client_for(&server).send("hi", "user-key", "app-token").await);

    assert!(matches!(err, DeliveryError::Rejected { status: 503, .. }));
}

#[tokio::test]
async fn test_oversize_body_is_refused_without_a_request() {
    // Arrange: any request reaching the server fails the test on drop
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let body = "x".repeat(MAX_MESSAGE_CHARS + 1);

    // Act
    let err = assert_err!(client_for(&server).send(&body, "user-key", "app-token").await);

    // Assert
    assert_eq!(
        err,
        DeliveryError::MessageTooLong {
            len: MAX_MESSAGE_CHARS + 1,
            max: MAX_MESSAGE_CHARS
        }
    );
}

#[tokio::test]
async fn test_body_at_limit_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": 1, "request": "r"})))
        .expect(1)
        .mount(&server)
        .await;
    let body = "x".repeat(MAX_MESSAGE_CHARS);

    assert_ok!(client_for(&server).send(&body, "user-key", "app-token").await);
}

#[tokio::test]
async fn test_missing_token_is_refused_without_a_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let no_app = assert_err!(client.send("hi", "user-key", "").await);
    let no_user = assert_err!(client.send("hi", "", "app-token").await);

    assert_eq!(no_app, DeliveryError::MissingCredentials);
    assert_eq!(no_user, DeliveryError::MissingCredentials);
}

#[tokio::test]
async fn test_unreachable_service_is_transport_error() {
    // Nothing listens on port 1 of the loopback interface.
    let client = PushoverClient::new(PushoverConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        timeout: Duration::from_secs(2),
    })
    .expect("build client");

    let err = assert_err!(client.send("hi", "user-key", "app-token").await);

    assert!(matches!(err, DeliveryError::Transport(_)));
}
