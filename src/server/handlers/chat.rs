use axum::{
    Json,
    body::{Body, to_bytes},
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

use crate::error::GatewayError;
use crate::providers::OpenAIProvider;
use crate::server::AppState;
use crate::server::chat_request::ChatRequest;
use crate::server::request_logging::log_proxy_request;
use crate::server::streaming::relay_response;
use crate::server::util::mask_key;

const ROUTE: &str = "/api/chat";

/// `POST /api/chat`: streams the upstream chat completion back to the widget.
///
/// Every failure ends here as a 500 with a JSON `{error, detail}` envelope.
pub async fn chat(
    State(app_state): State<Arc<AppState>>,
    body: Body,
) -> Response {
    let start_time = Utc::now();
    match relay_chat(&app_state, body).await {
        Ok((upstream, response)) => {
            log_proxy_request(start_time, "POST", ROUTE, &upstream, 200, None);
            response
        }
        Err(e) => {
            let (error, detail) = match e {
                GatewayError::Upstream { detail, .. } => ("Upstream error", detail),
                GatewayError::Config(msg) => ("Chat route failed", msg),
                other => ("Chat route failed", other.to_string()),
            };
            log_proxy_request(start_time, "POST", ROUTE, "-", 500, Some(detail.as_str()));
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": error, "detail": detail })),
            )
                .into_response()
        }
    }
}

async fn relay_chat(
    app_state: &AppState,
    body: Body,
) -> Result<(String, Response), GatewayError> {
    // Credentials are checked before anything is sent upstream.
    let gateway = app_state.config.gateway.resolve()?;

    let bytes = to_bytes(body, app_state.config.chat.max_body_bytes)
        .await
        .map_err(|e| GatewayError::Io(std::io::Error::other(e)))?;
    let conversation = ChatRequest::from_body(&bytes).into_conversation();

    tracing::debug!(
        model = %gateway.model,
        api_key = %mask_key(&gateway.api_key),
        turns = conversation.len(),
        "Relaying chat request"
    );

    let attempt =
        OpenAIProvider::send_chat_with_fallback(&app_state.http_client, &gateway, conversation)
            .await?;

    let status = attempt.response.status();
    if !status.is_success() {
        let text = attempt.response.text().await.unwrap_or_default();
        let detail = if text.is_empty() {
            status.canonical_reason().unwrap_or_default().to_string()
        } else {
            text
        };
        return Err(GatewayError::Upstream {
            status: status.as_u16(),
            detail,
        });
    }

    let upstream = attempt.endpoint.path().to_string();
    Ok((upstream, relay_response(attempt.response)?))
}
