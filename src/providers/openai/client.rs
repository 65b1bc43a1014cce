use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::server::upstream_url::join_endpoint;

use super::types::{ChatEndpoint, Message};

/// Outcome of the primary attempt plus the optional fallback.
#[derive(Debug)]
pub struct ChatAttempt {
    pub endpoint: ChatEndpoint,
    pub response: reqwest::Response,
}

pub struct OpenAIProvider;

impl OpenAIProvider {
    /// Sends one streaming chat request to `endpoint`. The response is returned
    /// whatever its status; the body is not read.
    pub async fn send_chat(
        client: &reqwest::Client,
        config: &GatewayConfig,
        endpoint: ChatEndpoint,
        conversation: Vec<Message>,
    ) -> Result<reqwest::Response, GatewayError> {
        let url = join_endpoint(&config.base_url, endpoint.path())?;
        let payload = endpoint.payload(&config.model, conversation);

        let response = client
            .post(url)
            .header("Authorization", format!("Bearer {}", config.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;
        Ok(response)
    }

    /// Tries the primary endpoint shape and, if it does not answer with a 2xx,
    /// makes exactly one attempt with the fallback shape.
    ///
    /// The returned attempt may still carry a non-success status; callers decide
    /// how to report it.
    pub async fn send_chat_with_fallback(
        client: &reqwest::Client,
        config: &GatewayConfig,
        conversation: Vec<Message>,
    ) -> Result<ChatAttempt, GatewayError> {
        let mut endpoint = ChatEndpoint::PRIMARY;
        loop {
            let result = Self::send_chat(client, config, endpoint, conversation.clone()).await;
            let next = endpoint.fallback();
            match (result, next) {
                (Ok(response), _) if response.status().is_success() => {
                    return Ok(ChatAttempt { endpoint, response });
                }
                (Ok(response), Some(fallback)) => {
                    tracing::warn!(
                        endpoint = endpoint.path(),
                        status = response.status().as_u16(),
                        "Upstream rejected chat request; trying {}",
                        fallback.path()
                    );
                    endpoint = fallback;
                }
                (Err(e), Some(fallback)) => {
                    tracing::warn!(
                        endpoint = endpoint.path(),
                        "Upstream chat request failed: {}; trying {}",
                        e,
                        fallback.path()
                    );
                    endpoint = fallback;
                }
                (Ok(response), None) => return Ok(ChatAttempt { endpoint, response }),
                (Err(e), None) => return Err(e),
            }
        }
    }
}
