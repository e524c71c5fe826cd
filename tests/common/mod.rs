#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{self, Request};
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::SqlitePool;
use tokio::net::TcpListener;
use tower::ServiceExt;

use todo_backend::api;
use todo_backend::db;
use todo_backend::proxy;
use todo_backend::state::{AppState, ProxyState};

pub async fn setup_test_db() -> SqlitePool {
    db::connect_in_memory()
        .await
        .expect("Failed to create test db")
}

pub async fn test_app() -> Router {
    api::router(AppState {
        db: setup_test_db().await,
    })
}

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind listener");
    let addr = listener.local_addr().expect("Failed to read local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server stopped");
    });
    format!("http://{}", addr)
}

pub async fn spawn_api() -> String {
    serve(test_app().await).await
}

pub fn proxy_app(upstream: &str) -> Router {
    proxy::router(ProxyState::new(upstream).expect("Failed to build proxy state"))
}

pub fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> (http::StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

/// Creates a todo through the router and returns its `data` object.
pub async fn create(app: &Router, body: Value) -> Value {
    let (status, json) = send(app, json_request("POST", "/todos", &body.to_string())).await;
    assert_eq!(status, http::StatusCode::CREATED, "create failed: {}", json);
    json["data"].clone()
}
