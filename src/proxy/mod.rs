//! Forwarding layer between the UI and the API.
//!
//! Query strings and bodies are passed upstream untouched. Whatever comes
//! back is turned into the response envelope, so callers never see raw
//! upstream errors or HTML pages.

use axum::body::Bytes;
use axum::extract::{Path, RawQuery, State};
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::ApiResponse;
use crate::state::ProxyState;

pub const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route(
            "/todos",
            get(forward_collection).post(forward_collection),
        )
        .route(
            "/todos/{id}",
            get(forward_item).patch(forward_item).delete(forward_item),
        )
        .with_state(state)
}

async fn forward_collection(
    State(state): State<ProxyState>,
    method: Method,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request_id = request_id(&headers);
    let result = forward(&state, method, "/todos", query, &headers, body, &request_id).await;
    finish(result, &request_id)
}

async fn forward_item(
    State(state): State<ProxyState>,
    Path(id): Path<String>,
    method: Method,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request_id = request_id(&headers);
    let result = match id.parse::<i64>() {
        Ok(id) => {
            let path = format!("/todos/{}", id);
            forward(&state, method, &path, query, &headers, body, &request_id).await
        }
        Err(_) => {
            warn!(%request_id, %id, "rejecting invalid todo id");
            Err(AppError::BadRequest("Invalid todo ID".to_string()))
        }
    };
    finish(result, &request_id)
}

/// Reuses the caller's request id, or mints a new one.
fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(&REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn finish(result: Result<Response, AppError>, request_id: &str) -> Response {
    let mut response = result.unwrap_or_else(IntoResponse::into_response);
    if let Ok(value) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert(REQUEST_ID, value);
    }
    response
}

async fn forward(
    state: &ProxyState,
    method: Method,
    path: &str,
    query: Option<String>,
    headers: &HeaderMap,
    body: Bytes,
    request_id: &str,
) -> Result<Response, AppError> {
    let mut url = format!("{}{}", state.upstream, path);
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(&query);
    }
    info!(%request_id, %method, %url, "forwarding request");

    let mut request = state
        .client
        .request(method, &url)
        .header(ACCEPT, "application/json")
        .header(REQUEST_ID, request_id);
    if let Some(content_type) = headers.get(CONTENT_TYPE) {
        request = request.header(CONTENT_TYPE, content_type.clone());
    }
    if !body.is_empty() {
        request = request.body(body);
    }

    let upstream = request.send().await.map_err(|e| {
        warn!(%request_id, "upstream request failed: {}", e);
        AppError::Upstream("Upstream API is unavailable".to_string())
    })?;
    let status = upstream.status();
    let bytes = upstream.bytes().await.map_err(|e| {
        warn!(%request_id, "reading upstream body failed: {}", e);
        AppError::Upstream("Upstream API is unavailable".to_string())
    })?;

    let value: Value = serde_json::from_slice(&bytes).map_err(|_| {
        warn!(%request_id, %status, "upstream answered with a non-JSON body");
        AppError::Upstream("Upstream API returned a non-JSON response".to_string())
    })?;

    info!(%request_id, %status, "upstream answered");
    Ok(normalize(status, value))
}

/// Maps an upstream JSON answer onto the envelope contract.
fn normalize(status: StatusCode, value: Value) -> Response {
    if status.is_success() || value.get("success").is_some() {
        return (status, Json(value)).into_response();
    }

    let body = ApiResponse::<()>::failure(format!("Upstream API error ({})", status.as_u16()));
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use serde_json::json;

    use super::*;

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_envelope_passes_through() {
        let upstream = json!({
            "success": false,
            "data": null,
            "message": "The given data was invalid.",
            "errors": {"title": ["The title field is required."]}
        });
        let response = normalize(StatusCode::UNPROCESSABLE_ENTITY, upstream.clone());
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(response).await, upstream);
    }

    #[tokio::test]
    async fn foreign_error_body_is_wrapped() {
        let response = normalize(StatusCode::SERVICE_UNAVAILABLE, json!({"error": "maintenance"}));
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body_json(response).await,
            json!({"success": false, "data": null, "message": "Upstream API error (503)"})
        );
    }

    #[test]
    fn request_id_is_reused_or_generated() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID, HeaderValue::from_static("abc-123"));
        assert_eq!(request_id(&headers), "abc-123");

        let generated = request_id(&HeaderMap::new());
        assert!(Uuid::parse_str(&generated).is_ok());
    }
}
