pub mod handlers;
pub(crate) mod chat_request;
pub(crate) mod headers;
pub(crate) mod request_logging;
pub(crate) mod streaming;
pub(crate) mod upstream_url;
pub(crate) mod util;

use crate::config::Settings;
use crate::error::Result as AppResult;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: Settings,
    pub http_client: reqwest::Client,
}

impl AppState {
    pub fn new(config: Settings) -> AppResult<Self> {
        let http_client = crate::http_client::upstream_client(&config)?;
        Ok(Self {
            config,
            http_client,
        })
    }
}

pub fn create_app(config: Settings) -> AppResult<Router> {
    match config.gateway.resolve() {
        Ok(gw) => tracing::info!(
            base_url = %gw.base_url,
            model = %gw.model,
            api_key = %util::mask_key(&gw.api_key),
            "Chat gateway configured"
        ),
        Err(e) => tracing::warn!("Chat relay will reject requests: {}", e),
    }
    tracing::info!(url = %config.classify.url, "Classification upstream");

    let app_state = AppState::new(config)?;
    Ok(router(Arc::new(app_state)))
}

pub fn router(app_state: Arc<AppState>) -> Router {
    let mut app = handlers::routes().with_state(app_state);

    // CORS：反射请求来源，便于前端 dev server 直接调用
    use axum::http::{Method, header};
    use tower_http::cors::{AllowOrigin, CorsLayer};
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true);
    app = app.layer(cors).layer(TraceLayer::new_for_http());

    app
}
