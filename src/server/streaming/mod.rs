use std::convert::Infallible;

use axum::{
    body::{Body, Bytes},
    http::{HeaderValue, StatusCode, header},
    response::Response,
};
use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::GatewayError;

/// Chunks buffered between the upstream reader and the client writer.
pub const RELAY_CHANNEL_CAPACITY: usize = 16;

const DEFAULT_STREAM_CONTENT_TYPE: &str = "text/event-stream";

/// Why the relay loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayEnd {
    /// Upstream signalled end-of-stream.
    Completed,
    /// The client went away; upstream is dropped.
    ClientClosed,
    /// Reading from upstream failed; the output is closed.
    UpstreamError,
}

/// Pumps chunks from `upstream` into `tx` unmodified until one side finishes.
pub async fn pump<S, E>(upstream: S, tx: mpsc::Sender<Result<Bytes, Infallible>>) -> RelayEnd
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::fmt::Display,
{
    let mut upstream = std::pin::pin!(upstream);
    loop {
        // A client that leaves while upstream is stalled still ends the relay.
        let chunk = tokio::select! {
            chunk = upstream.next() => chunk,
            _ = tx.closed() => return RelayEnd::ClientClosed,
        };
        match chunk {
            Some(Ok(bytes)) => {
                if tx.send(Ok(bytes)).await.is_err() {
                    return RelayEnd::ClientClosed;
                }
            }
            Some(Err(e)) => {
                tracing::warn!("Upstream stream error: {}", e);
                return RelayEnd::UpstreamError;
            }
            None => return RelayEnd::Completed,
        }
    }
}

/// Turns a successful upstream chat response into an unbuffered streaming
/// response. The upstream body is read on a spawned task feeding a bounded
/// channel; dropping the response body stops the task.
pub fn relay_response(upstream: reqwest::Response) -> Result<Response, GatewayError> {
    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_STREAM_CONTENT_TYPE));

    let (tx, rx) = mpsc::channel::<Result<Bytes, Infallible>>(RELAY_CHANNEL_CAPACITY);
    tokio::spawn(async move {
        let end = pump(upstream.bytes_stream(), tx).await;
        tracing::debug!(?end, "Chat relay finished");
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .header(header::TRANSFER_ENCODING, "chunked")
        .body(Body::from_stream(ReceiverStream::new(rx)))
        .map_err(|e| GatewayError::Config(format!("failed to build stream response: {}", e)))
}
