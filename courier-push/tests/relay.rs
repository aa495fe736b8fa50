//! FCM relay tests against a mock server.

use courier_push::relay::{
    AccessTokenSource, Message, Notification, RelayClient, RelayCode, RelayError,
    ServiceAccount, ServiceAccountTokenSource, StaticToken,
};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn relay(server: &MockServer) -> RelayClient {
    RelayClient::new("demo", Arc::new(StaticToken("ya29.token".into()))).with_endpoint(server.uri())
}

#[tokio::test]
async fn test_message_is_wrapped_and_authorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/projects/demo/messages:send"))
        .and(header("authorization", "Bearer ya29.token"))
        .and(body_json(json!({
            "message": {"token": "device-1", "notification": {"title": "Hi", "body": "There"}}
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"name": "projects/demo/messages/1"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let message = Message::to_token("device-1").notification(Notification::new("Hi", "There"));
    let result = relay(&server).send(&message).await;

    assert_eq!(result.code, RelayCode::Ok);
    assert!(result.error.is_none());
    assert!(result.debug_request.contains("\"token\":\"device-1\""));
    assert!(result.debug_response.starts_with("code: 200\n"));
}

#[tokio::test]
async fn test_validate_only_flag() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_json(json!({"message": {"topic": "news"}, "validate_only": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let result = relay(&server).validate(&Message::to_topic("news")).await;
    assert_eq!(result.code, RelayCode::Ok);
}

#[tokio::test]
async fn test_status_mapping() {
    for (status, expected) in [
        (400, RelayCode::Fatal),
        (401, RelayCode::InvalidPreset),
        (404, RelayCode::InvalidPreset),
        (429, RelayCode::Fatal),
        (500, RelayCode::Retry),
        (503, RelayCode::Retry),
    ] {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(status).set_body_json(json!({"error": {"code": status}})),
            )
            .mount(&server)
            .await;

        let result = relay(&server).send(&Message::to_token("device-1")).await;
        assert_eq!(result.code, expected, "{status}");
        assert!(matches!(
            result.error,
            Some(RelayError::Status { status: s, .. }) if s == status
        ));
    }
}

#[tokio::test]
async fn test_non_json_response_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("<html>busy</html>"))
        .mount(&server)
        .await;

    let result = relay(&server).send(&Message::to_token("device-1")).await;
    assert_eq!(result.code, RelayCode::Fatal);
    assert!(matches!(result.error, Some(RelayError::MalformedResponse(_))));
}

#[tokio::test]
async fn test_connection_failure_retries() {
    let client = RelayClient::new("demo", Arc::new(StaticToken("t".into())))
        .with_endpoint("http://127.0.0.1:1");

    let result = client.send(&Message::to_token("device-1")).await;
    assert_eq!(result.code, RelayCode::Retry);
}

#[tokio::test]
async fn test_service_account_token_is_cached() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "ya29.fresh", "expires_in": 3600})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let rsa = openssl::rsa::Rsa::generate(2048).unwrap();
    let pem = String::from_utf8(rsa.private_key_to_pem().unwrap()).unwrap();
    let account = ServiceAccount {
        project_id: "demo".into(),
        client_email: "svc@demo.iam.gserviceaccount.com".into(),
        private_key: pem,
        token_uri: format!("{}/token", server.uri()),
    };
    let source = ServiceAccountTokenSource::new(account);

    assert_eq!(source.access_token().await.unwrap(), "ya29.fresh");
    assert_eq!(source.access_token().await.unwrap(), "ya29.fresh");
}

#[tokio::test]
async fn test_token_endpoint_failure_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let rsa = openssl::rsa::Rsa::generate(2048).unwrap();
    let account = ServiceAccount {
        project_id: "demo".into(),
        client_email: "svc@demo.iam.gserviceaccount.com".into(),
        private_key: String::from_utf8(rsa.private_key_to_pem().unwrap()).unwrap(),
        token_uri: format!("{}/token", server.uri()),
    };

    let client = RelayClient::from_service_account(account).with_endpoint(server.uri());
    let result = client.send(&Message::to_token("device-1")).await;

    assert_eq!(result.code, RelayCode::Retry);
    assert!(matches!(result.error, Some(RelayError::Token(_))));
}
