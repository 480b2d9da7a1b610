//! Chat completions client for OpenAI-compatible APIs

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::gateway::{ChatMessage, ModelGateway};
use crate::config::AiConfig;
use crate::error::TriageError;

/// HTTP model gateway speaking the `/chat/completions` protocol
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatClient {
    /// Build a client from config. A missing API key is a configuration error.
    pub fn new(config: &AiConfig) -> Result<Self, TriageError> {
        let api_key = config.require_api_key()?.to_string();
        let timeout = Duration::from_secs(config.timeout_secs.max(1));

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TriageError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout,
        })
    }

    /// Same connection settings with a different model and sampling temperature
    pub fn with_model(&self, model: &str, temperature: f32) -> Self {
        Self {
            model: model.to_string(),
            temperature,
            ..self.clone()
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_error(&self, e: reqwest::Error) -> TriageError {
        if e.is_timeout() {
            TriageError::Gateway(format!(
                "request timed out after {}s",
                self.timeout.as_secs()
            ))
        } else {
            TriageError::Gateway(format!("request failed: {}", e))
        }
    }
}

#[async_trait]
impl ModelGateway for ChatClient {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, TriageError> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        tracing::debug!(
            "Sending {} message(s) to {} ({})",
            messages.len(),
            self.model,
            self.endpoint
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TriageError::Gateway(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| TriageError::Gateway(format!("unreadable API response: {}", e)))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| TriageError::Gateway("no response content from model".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_key() -> AiConfig {
        AiConfig {
            api_key: Some("sk-test".to_string()),
            base_url: "https://llm.example.com/v1/".to_string(),
            ..AiConfig::default()
        }
    }

    #[test]
    fn test_new_requires_api_key() {
        let err = ChatClient::new(&AiConfig::default()).err().unwrap();
        assert!(matches!(err, TriageError::Configuration(_)));
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let client = ChatClient::new(&config_with_key()).unwrap();
        assert_eq!(client.endpoint, "https://llm.example.com/v1/chat/completions");
        assert_eq!(client.model(), "gpt-4o-mini");
    }

    #[test]
    fn test_with_model_keeps_connection_settings() {
        let client = ChatClient::new(&config_with_key()).unwrap();
        let site = client.with_model("gpt-4o", 0.7);
        assert_eq!(site.model(), "gpt-4o");
        assert_eq!(site.endpoint, client.endpoint);
        assert_eq!(site.api_key, "sk-test");
    }

    #[test]
    fn test_request_body_shape() {
        let messages = vec![ChatMessage::system("sys"), ChatMessage::user("hi")];
        let body = serde_json::to_value(ChatRequest {
            model: "m",
            messages: &messages,
            temperature: 0.0,
            max_tokens: 10,
        })
        .unwrap();
        assert_eq!(body["model"], "m");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");
        assert_eq!(body["max_tokens"], 10);
    }

    fn local_config(addr: std::net::SocketAddr) -> AiConfig {
        AiConfig {
            api_key: Some("sk-test".to_string()),
            base_url: format!("http://{}", addr),
            timeout_secs: 1,
            ..AiConfig::default()
        }
    }

    #[tokio::test]
    async fn test_timeout_is_gateway_error() {
        // Bound but never accepted: the connection opens, no reply ever comes
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let client = ChatClient::new(&local_config(listener.local_addr().unwrap())).unwrap();

        let err = client.generate("hello").await.unwrap_err();
        match err {
            TriageError::Gateway(msg) => assert_eq!(msg, "request timed out after 1s"),
            other => panic!("expected gateway error, got {other:?}"),
        }
        drop(listener);
    }

    #[tokio::test]
    async fn test_connection_failure_is_gateway_error() {
        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let client = ChatClient::new(&local_config(addr)).unwrap();

        let err = client.generate("hello").await.unwrap_err();
        assert!(matches!(err, TriageError::Gateway(ref msg) if msg.starts_with("request failed")));
    }

    #[test]
    fn test_response_with_null_content_parses() {
        let parsed: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }
}
