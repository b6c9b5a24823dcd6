use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::chat::Message;
use crate::constants::{MAX_TOKENS, TEMPERATURE};

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Completion contained no reply text")]
    EmptyReply,
}

impl CompletionError {
    /// Best-effort check for usage-limit failures. Only the wording of the
    /// reply depends on it.
    pub fn is_quota_exceeded(&self) -> bool {
        match self {
            CompletionError::Api {
                status,
                code,
                message,
            } => {
                let message = message.to_lowercase();
                *status == 429
                    || code.as_deref() == Some("insufficient_quota")
                    || message.contains("quota")
                    || message.contains("rate limit")
            }
            _ => false,
        }
    }
}

// Structures matching the /chat/completions endpoint
#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f64,
    max_tokens: u32,
}

#[derive(Deserialize, Debug)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize, Debug)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Client for an OpenAI-compatible completions provider.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl CompletionClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the text of the first choice.
    #[instrument(skip(self, messages), fields(model = %self.model, messages = messages.len()))]
    pub async fn complete(&self, messages: &[Message]) -> Result<String, CompletionError> {
        let payload = CompletionRequest {
            model: &self.model,
            messages,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        debug!("Sending completion request");

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url.trim_end_matches('/')))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            let detail = body.get("error");
            let message = detail
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .unwrap_or("Unknown error")
                .to_string();
            let code = detail
                .and_then(|e| e.get("code"))
                .and_then(|c| c.as_str())
                .map(str::to_string);
            error!(%status, ?code, %message, "Completion API request failed");
            return Err(CompletionError::Api {
                status: status.as_u16(),
                code,
                message,
            });
        }

        let completion = response.json::<CompletionResponse>().await?;
        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(CompletionError::EmptyReply)?;

        debug!(len = text.len(), "Received completion");
        Ok(text)
    }
}
