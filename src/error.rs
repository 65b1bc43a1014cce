use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Upstream returned {status}: {detail}")]
    Upstream { status: u16, detail: String },
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Http(_) | GatewayError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::Json(_)
            | GatewayError::Io(_)
            | GatewayError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let code = self.status_code();
        tracing::error!(status = code.as_u16(), "{}", self);
        (code, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_map_to_internal_server_error() {
        let e = GatewayError::Config("missing".into());
        assert_eq!(e.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.to_string(), "Config error: missing");
    }

    #[test]
    fn upstream_errors_map_to_bad_gateway() {
        let e = GatewayError::Upstream {
            status: 503,
            detail: "busy".into(),
        };
        assert_eq!(e.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(e.to_string(), "Upstream returned 503: busy");
    }
}
