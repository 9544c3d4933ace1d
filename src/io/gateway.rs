//! Model gateway: send a conversation, return the raw completion text.
//!
//! The [`ChatGateway`] trait decouples the loop from the actual model
//! backend. Tests use scripted gateways that return predetermined replies
//! without touching the network. The gateway does no retrying and no reply
//! parsing; transport failures and non-success statuses propagate as errors
//! rather than degrading to an empty string.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};

use crate::core::conversation::ChatMessage;

/// Transport contract for chat completion.
pub trait ChatGateway {
    /// Send the conversation and return the model's raw text reply.
    fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// Blocking client for an Ollama-compatible `/api/chat` endpoint.
pub struct HttpGateway {
    client: reqwest::blocking::Client,
    url: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

impl HttpGateway {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            url: format!("{}/api/chat", base_url.trim_end_matches('/')),
            model: model.to_string(),
        })
    }
}

impl ChatGateway for HttpGateway {
    #[instrument(skip_all, fields(model = %self.model, messages = messages.len()))]
    fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": messages,
            "stream": false,
        });
        let response: ChatResponse = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .context("send chat request")?
            .error_for_status()
            .context("chat request returned non-success status")?
            .json()
            .context("decode chat response")?;
        debug!(bytes = response.message.content.len(), "received completion");
        Ok(response.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_url_is_joined_without_double_slash() {
        let gateway = HttpGateway::new("http://localhost:11434/", "qwen2.5:7b", Duration::from_secs(1))
            .expect("gateway");
        assert_eq!(gateway.url, "http://localhost:11434/api/chat");
    }

    #[test]
    fn response_decodes_message_content() {
        let raw = r#"{"model":"m","message":{"role":"assistant","content":"hi"},"done":true}"#;
        let response: ChatResponse = serde_json::from_str(raw).expect("decode");
        assert_eq!(response.message.content, "hi");
    }
}
