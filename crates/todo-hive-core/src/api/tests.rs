use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;
use crate::session::{MemoryTokenStore, SessionRecord};

fn client_for(server: &MockServer, store: &MemoryTokenStore) -> ApiClient {
    ApiClient::new(ClientOptions::new(server.uri()), Arc::new(store.clone())).unwrap()
}

fn user_json(username: &str) -> serde_json::Value {
    json!({
        "id": "7f9c0d2e-1111-2222-3333-444455556666",
        "username": username,
        "created_at": "2024-05-01T10:20:30.123456"
    })
}

#[tokio::test]
async fn test_register_message_marks_variant_a_without_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/register"))
        .and(body_json(json!({"username": "alice", "password": "secret1"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"message": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let store = MemoryTokenStore::new();
    let client = client_for(&server, &store);

    let outcome = client.register("alice", "secret1").await.unwrap();
    assert_eq!(
        outcome,
        RegisterOutcome::Acknowledged {
            message: "ok".to_string()
        }
    );
    assert_eq!(store.get().unwrap(), None);
    assert_eq!(store.get_variant().unwrap(), Some(BackendVariant::A));
}

#[tokio::test]
async fn test_register_token_marks_variant_b_and_stores_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/register"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"token": "abc", "user": {"username": "x"}})),
        )
        .mount(&server)
        .await;

    let store = MemoryTokenStore::new();
    let client = client_for(&server, &store);

    let outcome = client.register("xavier", "secret1").await.unwrap();
    assert_eq!(outcome.user().unwrap().username, "x");
    assert_eq!(store.get().unwrap().as_deref(), Some("abc"));
    assert_eq!(
        client.negotiate().unwrap(),
        Negotiated::Stored(BackendVariant::B)
    );
}

#[tokio::test]
async fn test_login_then_current_user_returns_same_username() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"token": "jwt-bob", "user": user_json("bob")})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/me"))
        .and(header("authorization", "Bearer jwt-bob"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"user": user_json("bob")})))
        .expect(1)
        .mount(&server)
        .await;

    let store = MemoryTokenStore::new();
    let client = client_for(&server, &store);

    let login = client.login("bob", "hunter22").await.unwrap();
    assert_eq!(login.variant(), BackendVariant::B);

    let me = client.current_user().await.unwrap().unwrap();
    assert_eq!(me.username, login.user().unwrap().username);
}

#[tokio::test]
async fn test_login_token_only_marks_variant_a() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "tok-a"})))
        .mount(&server)
        .await;

    let store = MemoryTokenStore::new();
    let client = client_for(&server, &store);

    client.login("alice", "secret1").await.unwrap();
    assert_eq!(store.get().unwrap().as_deref(), Some("tok-a"));
    assert_eq!(store.get_variant().unwrap(), Some(BackendVariant::A));
}

#[tokio::test]
async fn test_stored_variant_is_sticky() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"token": "t2", "user": user_json("bob")})),
        )
        .mount(&server)
        .await;

    let store = MemoryTokenStore::new();
    store.set_variant(BackendVariant::A).unwrap();
    let client = client_for(&server, &store);

    client.login("bob", "hunter22").await.unwrap();
    // Token is still stored, but the detected variant is not re-derived.
    assert_eq!(store.get().unwrap().as_deref(), Some("t2"));
    assert_eq!(store.get_variant().unwrap(), Some(BackendVariant::A));

    client.forget_backend().unwrap();
    assert_eq!(store.snapshot(), crate::session::SessionRecord::default());
}

#[tokio::test]
async fn test_create_todo_on_variant_b_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/todos"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/todos"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store = MemoryTokenStore::new();
    store.set("tok").unwrap();
    store.set_variant(BackendVariant::B).unwrap();
    let client = client_for(&server, &store);

    let err = client.create_todo("buy milk").await.unwrap_err();
    assert!(err.is_capability(), "unexpected error: {err:?}");
    let err = client.list_todos().await.unwrap_err();
    assert!(err.is_capability(), "unexpected error: {err:?}");
}

#[tokio::test]
async fn test_create_and_list_todos_with_bearer_token() {
    let server = MockServer::start().await;
    let todo = json!({
        "id": "aaaabbbb-cccc",
        "content": "buy milk",
        "user_id": "alice",
        "created_at": "2024-05-01T10:20:30"
    });
    Mock::given(method("POST"))
        .and(path("/api/todos"))
        .and(header("authorization", "Bearer tok-a"))
        .and(body_json(json!({"content": "buy milk"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(todo.clone()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/todos"))
        .and(header("authorization", "Bearer tok-a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"todos": [todo]})))
        .expect(1)
        .mount(&server)
        .await;

    let store = MemoryTokenStore::new();
    store.set("tok-a").unwrap();
    store.set_variant(BackendVariant::A).unwrap();
    let client = client_for(&server, &store);

    let created = client.create_todo("buy milk").await.unwrap();
    assert_eq!(created.owner_id, "alice");
    let todos = client.list_todos().await.unwrap();
    assert_eq!(todos, vec![created]);
}

#[tokio::test]
async fn test_http_error_carries_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"error": "Invalid username or password"})),
        )
        .mount(&server)
        .await;

    let store = MemoryTokenStore::new();
    let client = client_for(&server, &store);

    let err = client.login("alice", "wrongpass").await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.to_string(), "Invalid username or password");
    assert_eq!(store.get().unwrap(), None);
    assert_eq!(store.get_variant().unwrap(), None);
}

#[tokio::test]
async fn test_http_error_without_body_uses_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = client_for(&server, &MemoryTokenStore::new());
    let err = client.health().await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP error! status: 503");
}

#[tokio::test]
async fn test_no_authorization_header_without_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(move |req: &wiremock::Request| {
            if req.headers.contains_key("authorization") {
                ResponseTemplate::new(400)
            } else {
                ResponseTemplate::new(200).set_body_json(json!({"status": "healthy"}))
            }
        })
        .mount(&server)
        .await;

    let client = client_for(&server, &MemoryTokenStore::new());
    let health = client.health().await.unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.service, None);
}

#[tokio::test]
async fn test_current_user_skips_request_on_detected_variant_a() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/me"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store = MemoryTokenStore::new();
    store.set("tok").unwrap();
    store.set_variant(BackendVariant::A).unwrap();
    let client = client_for(&server, &store);

    assert_eq!(client.current_user().await.unwrap(), None);
}

#[tokio::test]
async fn test_current_user_unsupported_endpoint_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/me"))
        .respond_with(ResponseTemplate::new(404).set_body_string("<h1>Not Found</h1>"))
        .mount(&server)
        .await;

    let store = MemoryTokenStore::new();
    store.set("tok").unwrap();
    let client = client_for(&server, &store);

    assert_eq!(client.current_user().await.unwrap(), None);
}

#[tokio::test]
async fn test_current_user_refused_token_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/me"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid or expired token"})),
        )
        .mount(&server)
        .await;

    let store = MemoryTokenStore::new();
    store.set("stale").unwrap();
    let client = client_for(&server, &store);

    let err = client.current_user().await.unwrap_err();
    assert!(err.is_session_error());
}

#[tokio::test]
async fn test_verify_session_rejected_clears_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/me"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid or expired token"})),
        )
        .mount(&server)
        .await;

    let store = MemoryTokenStore::new();
    store.set("stale").unwrap();
    store.set_variant(BackendVariant::B).unwrap();
    let client = client_for(&server, &store);

    let check = client.verify_session().await.unwrap();
    assert_eq!(
        check,
        SessionCheck::Rejected {
            reason: "Invalid or expired token".to_string()
        }
    );
    assert_eq!(store.get().unwrap(), None);
    assert_eq!(store.get_variant().unwrap(), Some(BackendVariant::B));
}

#[tokio::test]
async fn test_verify_session_variant_a_uses_todo_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/todos"))
        .and(header("authorization", "Bearer tok-a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"todos": []})))
        .expect(1)
        .mount(&server)
        .await;

    let store = MemoryTokenStore::new();
    store.set("tok-a").unwrap();
    store.set_variant(BackendVariant::A).unwrap();
    let client = client_for(&server, &store);

    let check = client.verify_session().await.unwrap();
    assert_eq!(
        check,
        SessionCheck::Valid {
            user: None,
            todos: Some(Vec::new())
        }
    );
}

#[tokio::test]
async fn test_verify_session_without_token_is_anonymous() {
    let server = MockServer::start().await;
    let client = client_for(&server, &MemoryTokenStore::new());
    assert_eq!(
        client.verify_session().await.unwrap(),
        SessionCheck::Anonymous
    );
}

#[tokio::test]
async fn test_service_info_and_verify_token_on_variant_b() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "service": "Worker B Authentication API",
            "version": "1.0.0",
            "endpoints": {"me": "GET /api/me"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/verify-token"))
        .and(body_json(json!({"token": "jwt"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "valid": true,
            "user": {"user_id": "u1", "username": "bob"}
        })))
        .mount(&server)
        .await;

    let store = MemoryTokenStore::new();
    store.set_variant(BackendVariant::B).unwrap();
    let client = client_for(&server, &store);

    let info = client.service_info().await.unwrap();
    assert_eq!(info.version, "1.0.0");
    assert_eq!(info.endpoints["me"], "GET /api/me");

    let check = client.verify_token("jwt").await.unwrap();
    assert!(check.valid);
    assert_eq!(check.user.unwrap().username, "bob");
}

#[test]
fn test_assumed_variant_from_port_and_pin() {
    let b = url::Url::parse("http://localhost:5001").unwrap();
    let a = url::Url::parse("http://localhost:5000").unwrap();
    assert_eq!(assume_variant(&b, None), BackendVariant::B);
    assert_eq!(assume_variant(&a, None), BackendVariant::A);
    assert_eq!(
        assume_variant(&a, Some(BackendVariant::B)),
        BackendVariant::B
    );
}

#[test]
fn test_invalid_base_url_is_rejected() {
    let err = ApiClient::new(
        ClientOptions::new("localhost without scheme"),
        Arc::new(MemoryTokenStore::new()),
    )
    .unwrap_err();
    assert!(matches!(err, ApiError::InvalidBaseUrl { .. }));
}

#[test]
fn test_debug_output_omits_stored_token() {
    let store = MemoryTokenStore::with_record(SessionRecord {
        token: Some("secret-token".to_string()),
        variant: Some(BackendVariant::A),
    });
    let client = ApiClient::new(
        ClientOptions::new("http://localhost:5000"),
        Arc::new(store),
    )
    .unwrap();

    let debug = format!("{client:?}");
    assert!(debug.starts_with("ApiClient"));
    assert!(debug.contains("localhost:5000"));
    assert!(!debug.contains("secret-token"));
}
