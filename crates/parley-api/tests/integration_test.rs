use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use parley_api::{build_router, config::Config, error::ApiError, state::AppState};

async fn test_app() -> Router {
    let mut config = Config::default();
    config.generator.fragment_delay_ms = 0;
    config.generator.fragments = Some(vec!["Hi".to_string(), " there!".to_string()]);
    config.pipeline.settle_delay_ms = 10;

    let state = AppState::from_config(config).await.unwrap();
    build_router(Arc::new(state))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health_reports_storage() {
    let app = test_app().await;

    let (status, body) = send_json(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["storage"], "connected");
    assert_eq!(body["active_sessions"], 0);
}

#[tokio::test]
async fn test_thread_lifecycle() {
    let app = test_app().await;

    let (status, created) = send_json(&app, Method::POST, "/threads", Some(json!({}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["title"], "New chat");
    let id = created["thread_id"].as_str().unwrap().to_string();

    let (status, renamed) = send_json(
        &app,
        Method::PATCH,
        &format!("/threads/{}", id),
        Some(json!({ "title": "  Trip plans  " })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["title"], "Trip plans");

    let (status, _) = send_json(
        &app,
        Method::PATCH,
        &format!("/threads/{}", id),
        Some(json!({ "title": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, archived) = send_json(&app, Method::POST, &format!("/threads/{}/archive", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(archived["archived"], true);

    let (_, listing) = send_json(&app, Method::GET, "/threads", None).await;
    assert!(listing["threads"].as_array().unwrap().is_empty());

    let (_, listing) = send_json(&app, Method::GET, "/threads?include_archived=true", None).await;
    assert_eq!(listing["threads"].as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::DELETE, &format!("/threads/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::DELETE, &format!("/threads/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send_json(&app, Method::GET, &format!("/threads/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains(&id));
}

#[tokio::test]
async fn test_create_thread_without_body() {
    let app = test_app().await;

    let (status, created) = send_json(&app, Method::POST, "/threads", None).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["title"], "New chat");
}

#[tokio::test]
async fn test_chat_streams_and_persists_first_message() {
    let app = test_app().await;

    let (status, bytes) = send(
        &app,
        Method::POST,
        "/chat",
        Some(json!({ "text": "Plan a trip to Lisbon" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let body = String::from_utf8(bytes).unwrap();
    let thread_assigned = body.find("event: thread_assigned").unwrap();
    let completed = body.find("event: completed").unwrap();
    let settled = body.find("event: settled").unwrap();
    assert!(thread_assigned < completed && completed < settled);
    assert!(body.contains("event: listing"));
    assert!(body.contains("Hi there!"));

    let (_, listing) = send_json(&app, Method::GET, "/threads", None).await;
    let threads = listing["threads"].as_array().unwrap();
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0]["title"], "Plan a trip to Lisbon");
    assert_eq!(threads[0]["has_messages"], true);

    let id = threads[0]["thread_id"].as_str().unwrap();
    let (_, messages) = send_json(&app, Method::GET, &format!("/threads/{}/messages", id), None).await;
    let messages = messages["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[1]["role"], "assistant");
    assert_eq!(messages[1]["content"], "Hi there!");
}

#[tokio::test]
async fn test_chat_follow_up_reuses_thread() {
    let app = test_app().await;

    let (_, created) = send_json(&app, Method::POST, "/threads", Some(json!({ "title": "Kept" }))).await;
    let id = created["thread_id"].as_str().unwrap().to_string();

    for text in ["first", "second"] {
        let (status, bytes) = send(
            &app,
            Method::POST,
            "/chat",
            Some(json!({ "text": text, "thread_id": id })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(bytes).unwrap().contains("event: completed"));
    }

    let (_, messages) = send_json(&app, Method::GET, &format!("/threads/{}/messages", id), None).await;
    assert_eq!(messages["messages"].as_array().unwrap().len(), 4);

    // Titled from the first message only
    let (_, thread) = send_json(&app, Method::GET, &format!("/threads/{}", id), None).await;
    assert_eq!(thread["title"], "first");

    let (_, listing) = send_json(&app, Method::GET, "/threads", None).await;
    assert_eq!(listing["threads"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_empty_chat_creates_nothing() {
    let app = test_app().await;

    let (status, bytes) = send(&app, Method::POST, "/chat", Some(json!({ "text": "   " }))).await;
    assert_eq!(status, StatusCode::OK);

    let body = String::from_utf8(bytes).unwrap();
    assert!(body.contains("event: guarded"));
    assert!(!body.contains("event: thread_assigned"));
    assert!(!body.contains("event: completed"));

    let (_, listing) = send_json(&app, Method::GET, "/threads?include_archived=true", None).await;
    assert!(listing["threads"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_chat_on_missing_thread() {
    let app = test_app().await;

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/chat",
        Some(json!({ "text": "hello", "thread_id": "missing" })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_cancel_without_running_reply() {
    let app = test_app().await;

    let (status, body) = send_json(&app, Method::POST, "/chat/nothing-here/cancel", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cancelled"], false);
}

#[tokio::test]
async fn test_settings_partial_update() {
    let app = test_app().await;

    let (status, settings) = send_json(&app, Method::GET, "/settings", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["show_thread_sidebar"], true);
    assert_eq!(settings["listing_visible"], true);

    let (_, settings) = send_json(
        &app,
        Method::PUT,
        "/settings",
        Some(json!({ "show_thread_sidebar": false })),
    )
    .await;
    assert_eq!(settings["show_thread_sidebar"], false);
    assert_eq!(settings["show_threads_tab"], true);
    assert_eq!(settings["listing_visible"], true);

    let (_, settings) = send_json(&app, Method::PUT, "/settings", Some(json!({ "show_threads_tab": false }))).await;
    assert_eq!(settings["show_thread_sidebar"], false);
    assert_eq!(settings["listing_visible"], false);
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = test_app().await;

    let (status, doc) = send_json(&app, Method::GET, "/api/openapi.json", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/chat"].is_object());
    assert!(doc["paths"]["/threads/{thread_id}"].is_object());
}

#[tokio::test]
async fn test_api_error_response() {
    use axum::response::IntoResponse;

    let error = ApiError::BadRequest("Test error".to_string());
    let response = error.into_response();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
