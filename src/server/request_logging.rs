use chrono::{DateTime, Utc};

/// Emits one summary event per proxied request (status and latency).
pub fn log_proxy_request(
    start_time: DateTime<Utc>,
    method: &str,
    route: &str,
    upstream: &str,
    status_code: u16,
    error_message: Option<&str>,
) {
    let response_time_ms = (Utc::now() - start_time).num_milliseconds();
    match error_message {
        None => tracing::info!(
            method,
            route,
            upstream,
            status_code,
            response_time_ms,
            "proxied request"
        ),
        Some(error) => tracing::warn!(
            method,
            route,
            upstream,
            status_code,
            response_time_ms,
            error,
            "proxied request failed"
        ),
    }
}
