use axum::{Json, extract::State};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::server::AppState;

pub async fn health(State(app_state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": app_state.config.server.app_name,
    }))
}
