//! Drives the sso handler against a mocked Keycloak admin API.

use hookrelay_core::{CancellationToken, PluginLoadContext, Status, WebhookEvent, WebhookHandler};
use hookrelay_plugin_sso::{NO_MATCHING_CLIENT, SsoHandler};
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN_PATH: &str = "/auth/realms/3scale/protocol/openid-connect/token";
const CLIENTS_PATH: &str = "/auth/admin/realms/3scale/clients";

fn settings(server: &MockServer) -> Value {
    json!({
        "realm": "3scale",
        "hostname": server.address().to_string(),
        "scheme": "http",
        "client_id": "admin-cli",
        "service_username": "sync",
        "service_password": "pw",
    })
}

async fn handler(server: &MockServer) -> SsoHandler {
    let mut handler = SsoHandler::default();
    handler
        .init(&PluginLoadContext::new("sso", settings(server)))
        .await
        .unwrap();
    handler
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=password"))
        .and(body_string_contains("username=sync"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok"})))
        .mount(server)
        .await;
}

async fn mount_search(server: &MockServer, found: Value) {
    Mock::given(method("GET"))
        .and(path(CLIENTS_PATH))
        .and(query_param("clientId", "abc123"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(found))
        .mount(server)
        .await;
}

fn application(action: &str) -> WebhookEvent {
    WebhookEvent::new(
        action,
        "application",
        json!({
            "application_id": "abc123",
            "name": "My App",
            "redirect_url": "https://app.example.com/cb",
            "keys": {"key": "s3cr3t"},
        }),
    )
}

async fn run(handler: &SsoHandler, event: &WebhookEvent) -> Result<Status, String> {
    handler
        .handle(event, &CancellationToken::new())
        .await
        .map_err(|e| e.to_string())
}

#[tokio::test]
async fn test_created_application_creates_client() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_search(&server, json!([])).await;
    Mock::given(method("POST"))
        .and(path(CLIENTS_PATH))
        .and(body_partial_json(json!({
            "clientId": "abc123",
            "secret": "s3cr3t",
            "publicClient": false,
            "redirectUris": ["https://app.example.com/cb"],
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let handler = handler(&server).await;
    assert_eq!(run(&handler, &application("created")).await, Ok(Status::Success));
}

#[tokio::test]
async fn test_updated_application_updates_existing_client() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_search(&server, json!([{"id": "uuid-1", "clientId": "abc123"}])).await;
    Mock::given(method("PUT"))
        .and(path(format!("{CLIENTS_PATH}/uuid-1")))
        .and(body_partial_json(json!({"clientId": "abc123"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let handler = handler(&server).await;
    assert_eq!(run(&handler, &application("updated")).await, Ok(Status::Success));
}

#[tokio::test]
async fn test_deleted_application() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_search(&server, json!([{"id": "uuid-1", "clientId": "abc123"}])).await;
    Mock::given(method("DELETE"))
        .and(path(format!("{CLIENTS_PATH}/uuid-1")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let handler = handler(&server).await;
    assert_eq!(run(&handler, &application("deleted")).await, Ok(Status::Success));
}

#[tokio::test]
async fn test_deleted_without_match_does_nothing() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_search(&server, json!([])).await;

    let handler = handler(&server).await;
    assert_eq!(
        run(&handler, &application("deleted")).await,
        Ok(Status::message(NO_MATCHING_CLIENT))
    );
}

#[tokio::test]
async fn test_unknown_action() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_search(&server, json!([])).await;

    let handler = handler(&server).await;
    assert_eq!(
        run(&handler, &application("suspended")).await,
        Ok(Status::message("Unknown action 'suspended'"))
    );
}

#[tokio::test]
async fn test_ambiguous_search_refuses() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_search(&server, json!([{"id": "a"}, {"id": "b"}])).await;

    let handler = handler(&server).await;
    assert_eq!(
        run(&handler, &application("created")).await,
        Err("Too many matching clients (2). Refusing to do anything.".to_string())
    );
}

#[tokio::test]
async fn test_authentication_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let handler = handler(&server).await;
    assert_eq!(
        run(&handler, &application("created")).await,
        Err("Got a 401 response from SSO while authenticating".to_string())
    );
}

#[tokio::test]
async fn test_auth_realm_is_used_for_the_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/realms/master/protocol/openid-connect/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok"})))
        .expect(1)
        .mount(&server)
        .await;
    mount_search(&server, json!([])).await;

    let mut raw = settings(&server);
    raw["auth_realm"] = json!("master");
    let mut handler = SsoHandler::default();
    handler
        .init(&PluginLoadContext::new("sso", raw))
        .await
        .unwrap();

    assert_eq!(
        run(&handler, &application("deleted")).await,
        Ok(Status::message(NO_MATCHING_CLIENT))
    );
}

#[tokio::test]
async fn test_create_rejected() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_search(&server, json!([])).await;
    Mock::given(method("POST"))
        .and(path(CLIENTS_PATH))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let handler = handler(&server).await;
    assert_eq!(
        run(&handler, &application("created")).await,
        Err("Got a 409 response from SSO while creating client".to_string())
    );
}
