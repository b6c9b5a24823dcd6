use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::chat::{ChatReply, ChatRequest, ChatSession};
use crate::constants::CHAT_ENDPOINT;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Relay returned status {status}")]
    Status { status: u16 },
}

impl RelayError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RelayError::Http(e) if e.is_timeout())
    }
}

/// Posts conversations to the relay's chat endpoint.
#[derive(Debug, Clone)]
pub struct RelayClient {
    http: Client,
    endpoint: String,
}

impl RelayClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RelayError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), CHAT_ENDPOINT),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends one request and returns the reply text.
    #[instrument(skip(self, request), fields(messages = request.messages.len()))]
    pub async fn send(&self, request: &ChatRequest) -> Result<String, RelayError> {
        let response = self.http.post(&self.endpoint).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            error!(%status, "Relay request failed");
            return Err(RelayError::Status {
                status: status.as_u16(),
            });
        }

        let reply = response.json::<ChatReply>().await?;
        debug!(len = reply.message.len(), "Received relay reply");
        Ok(reply.message)
    }
}

/// Submits `text`, waits for the reply and settles it. Returns false when
/// the text was blank and nothing was sent.
pub async fn exchange(session: &mut ChatSession, client: &RelayClient, text: &str) -> bool {
    let Some(request) = session.submit_text(text) else {
        return false;
    };
    let (ticket, body) = request.into_parts();
    let reply = client.send(&body).await;
    session.settle(ticket, reply);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_base_url() {
        let client = RelayClient::new("http://localhost:4321/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:4321/api/chat");

        let client = RelayClient::new("http://localhost:4321", Duration::from_secs(1)).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:4321/api/chat");
    }

    #[test]
    fn test_status_error_display() {
        let err = RelayError::Status { status: 502 };
        assert_eq!(err.to_string(), "Relay returned status 502");
        assert!(!err.is_timeout());
    }
}
