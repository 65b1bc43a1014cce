use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::server::AppState;

mod chat;
mod classify;
mod health;
mod models;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/chat", post(chat::chat))
        .route(
            "/api/classify",
            get(classify::classify).post(classify::classify),
        )
        .route("/api/models", get(models::list_models))
}
