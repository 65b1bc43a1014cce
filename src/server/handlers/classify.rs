use axum::{
    Json,
    body::{Body, Bytes, to_bytes},
    extract::State,
    http::{HeaderMap, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

use crate::error::GatewayError;
use crate::server::AppState;
use crate::server::headers::{filter_forward_headers, sanitize_response_headers};
use crate::server::request_logging::log_proxy_request;
use crate::server::upstream_url::validate_upstream_url;

const ROUTE: &str = "/api/classify";

/// `GET|POST /api/classify`: opaque pass-through to the classification model API.
pub async fn classify(
    State(app_state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let start_time = Utc::now();
    let upstream = app_state.config.classify.url.clone();
    match forward(&app_state, method.clone(), &headers, body).await {
        Ok(response) => {
            let status = response.status().as_u16();
            log_proxy_request(start_time, method.as_str(), ROUTE, &upstream, status, None);
            response
        }
        Err(e) => {
            let message = e.to_string();
            log_proxy_request(
                start_time,
                method.as_str(),
                ROUTE,
                &upstream,
                500,
                Some(message.as_str()),
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                message,
            )
                .into_response()
        }
    }
}

/// Upstream failures become a 502 response here; only a failure to assemble
/// the relayed response is returned as an error.
async fn forward(
    app_state: &AppState,
    method: Method,
    headers: &HeaderMap,
    body: Body,
) -> Result<Response, GatewayError> {
    let upstream = match send_upstream(app_state, method, headers, body).await {
        Ok(upstream) => upstream,
        Err(e) => {
            tracing::warn!("Classification upstream failed: {}", e);
            return Ok(proxy_error_response(&e));
        }
    };

    let mut builder = Response::builder().status(upstream.status());
    for (name, value) in sanitize_response_headers(upstream.headers()).iter() {
        builder = builder.header(name, value);
    }
    builder
        .body(Body::from_stream(upstream.bytes_stream()))
        .map_err(|e| GatewayError::Config(format!("failed to build proxied response: {}", e)))
}

async fn send_upstream(
    app_state: &AppState,
    method: Method,
    headers: &HeaderMap,
    body: Body,
) -> Result<reqwest::Response, GatewayError> {
    let limit = app_state.config.classify.max_body_bytes;
    let bytes = to_bytes(body, limit)
        .await
        .map_err(|e| GatewayError::Io(std::io::Error::other(e)))?;
    let url = validate_upstream_url(&app_state.config.classify.url)?;

    let mut request = app_state
        .http_client
        .request(method, url)
        .headers(filter_forward_headers(headers));
    if let Some(bytes) = request_body(bytes) {
        request = request.body(bytes);
    }
    Ok(request.send().await?)
}

/// A zero-length body is not forwarded at all.
fn request_body(bytes: Bytes) -> Option<Bytes> {
    (!bytes.is_empty()).then_some(bytes)
}

fn proxy_error_response(e: &GatewayError) -> Response {
    (
        StatusCode::BAD_GATEWAY,
        Json(json!({ "error": "Upstream proxy error", "details": e.to_string() })),
    )
        .into_response()
}
