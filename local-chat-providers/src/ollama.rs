//! Ollama HTTP client implementation

use async_trait::async_trait;
use local_chat_core::config::ProviderConfig;
use local_chat_core::session::Message;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::base::{ChatProvider, ProviderError, ProviderResult};

/// `POST /api/chat` request body
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

/// `POST /api/chat` response body, non-streaming
#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// `GET /api/tags` response body
#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

/// Client for a local Ollama service
pub struct OllamaClient {
    client: Client,
    api_base: String,
}

impl OllamaClient {
    /// Create a new client for the service at `api_base`
    pub fn new(api_base: impl Into<String>) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_string();
        Self {
            client: Client::builder()
                .http1_only() // Force HTTP/1.1 to avoid issues with some local servers
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_base,
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::new(config.api_base.clone())
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Send a request and return the body of a success response
    async fn fetch(&self, request: reqwest::RequestBuilder) -> ProviderResult<Vec<u8>> {
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::ServiceUnavailable(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl ChatProvider for OllamaClient {
    async fn list_models(&self) -> ProviderResult<Vec<String>> {
        let url = format!("{}/api/tags", self.api_base);
        debug!("Listing models from {}", url);

        let body = self.fetch(self.client.get(&url)).await?;
        let tags: TagsResponse = serde_json::from_slice(&body).map_err(|e| {
            ProviderError::ServiceUnavailable(format!("undecodable model list: {}", e))
        })?;

        let models: Vec<String> = tags.models.into_iter().map(|m| m.name).collect();
        debug!("Service offers {} models", models.len());
        Ok(models)
    }

    async fn complete(&self, model: &str, history: &[Message]) -> ProviderResult<Message> {
        let url = format!("{}/api/chat", self.api_base);
        let request = ChatRequest {
            model,
            messages: history,
            stream: false,
        };

        debug!(
            "Sending chat request to {} with model {} ({} messages)",
            self.api_base,
            model,
            history.len()
        );

        let body = self.fetch(self.client.post(&url).json(&request)).await?;
        let response: ChatResponse = serde_json::from_slice(&body)
            .map_err(|e| ProviderError::Protocol(format!("malformed chat response: {}", e)))?;

        Ok(Message::assistant(response.message.content))
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::from_config(&ProviderConfig::default())
    }
}
