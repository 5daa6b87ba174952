use crate::error::{Nl2SqlError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Something that turns a conversation into a free-text completion.
///
/// Implementations make exactly one attempt per call; retrying is the
/// caller's decision.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Model identifier, for messages shown to the user
    fn model(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ChatMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    total_duration: Option<u64>,
    #[serde(default)]
    eval_count: Option<u64>,
    #[serde(default)]
    error: Option<String>,
}

/// Client for a local Ollama server's chat endpoint
#[derive(Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        // Ollama runs locally; system proxy settings must not reroute it
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .map_err(|e| Nl2SqlError::Llm(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl CompletionBackend for OllamaClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages,
            stream: false,
        };

        info!("Requesting completion from {} ({})", self.model, self.base_url);

        let response = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Nl2SqlError::Llm(format!("Ollama request timed out: {}", e))
                } else {
                    Nl2SqlError::Llm(format!("Ollama request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Nl2SqlError::Llm(format!("Ollama API error ({}): {}", status, error_text)));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Nl2SqlError::Llm(format!("Failed to parse Ollama response: {}", e)))?;

        if let Some(error) = parsed.error {
            return Err(Nl2SqlError::Llm(format!("Ollama API error: {}", error)));
        }

        debug!(
            done = parsed.done,
            total_duration_ns = parsed.total_duration,
            eval_count = parsed.eval_count,
            "Ollama completion metadata"
        );

        let content = parsed
            .message
            .map(|m| m.content)
            .ok_or_else(|| Nl2SqlError::Llm("No message in Ollama response".to_string()))?;

        Ok(content.trim().to_string())
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let messages = vec![ChatMessage::user("Question: how many products?\nSQL:")];
        let body = ChatRequest {
            model: "qwen3:8b",
            messages: &messages,
            stream: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "qwen3:8b",
                "messages": [{"role": "user", "content": "Question: how many products?\nSQL:"}],
                "stream": false
            })
        );
    }

    #[test]
    fn test_response_metadata_is_optional() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"model":"qwen3:8b","message":{"role":"assistant","content":"SELECT 1;"}}"#,
        )
        .unwrap();
        assert_eq!(parsed.message.unwrap().content, "SELECT 1;");
        assert!(!parsed.done);
        assert!(parsed.total_duration.is_none());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = OllamaClient::new("http://localhost:11434/", "qwen3:8b", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:11434");
        assert_eq!(client.model(), "qwen3:8b");
    }
}
