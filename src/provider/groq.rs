//! Groq LLM provider implementation
//!
//! Groq serves an OpenAI-compatible chat completions API, so this provider
//! drives it through `async-openai` pointed at Groq's base URL.

use crate::context::{Message, MessageRole};
use crate::error::{BotError, Result};
use crate::provider::{is_placeholder_key, LLMProvider, ProviderConfig};
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";

/// Groq LLM provider
pub struct GroqProvider {
    client: Client<OpenAIConfig>,
    has_key: bool,
    config: ProviderConfig,
}

impl GroqProvider {
    /// Create a new Groq provider with the given API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, GROQ_API_BASE)
    }

    /// Create a provider against a different OpenAI-compatible endpoint
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let api_key = api_key.into();
        let has_key = !is_placeholder_key(&api_key);
        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(base_url);

        Self {
            client: Client::with_config(openai_config),
            has_key,
            config: ProviderConfig::new(DEFAULT_GROQ_MODEL).with_max_tokens(600),
        }
    }

    /// Create a new Groq provider from environment variable GROQ_API_KEY
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GROQ_API_KEY").map_err(|_| BotError::MissingCredentials {
            service: "Groq".to_string(),
            variable: "GROQ_API_KEY".to_string(),
        })?;

        Ok(Self::new(api_key))
    }

    /// Set the model to use
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Bound each request by `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        self.client = self.client.with_http_client(http_client);
        Ok(self)
    }

    /// Replace the generation settings, keeping the model
    pub fn with_config(mut self, config: ProviderConfig) -> Self {
        let model = std::mem::take(&mut self.config.model);
        self.config = ProviderConfig { model, ..config };
        self
    }

    fn convert_messages(&self, messages: Vec<Message>) -> Result<Vec<ChatCompletionRequestMessage>> {
        messages
            .into_iter()
            .map(|m| {
                let converted: ChatCompletionRequestMessage = match m.role {
                    MessageRole::System => ChatCompletionRequestSystemMessageArgs::default()
                        .content(m.content)
                        .build()
                        .map_err(request_error)?
                        .into(),
                    MessageRole::User => ChatCompletionRequestUserMessageArgs::default()
                        .content(m.content)
                        .build()
                        .map_err(request_error)?
                        .into(),
                    MessageRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                        .content(m.content)
                        .build()
                        .map_err(request_error)?
                        .into(),
                };
                Ok(converted)
            })
            .collect()
    }
}

fn request_error(e: OpenAIError) -> BotError {
    BotError::Provider {
        provider: "Groq".to_string(),
        message: format!("Failed to build request: {}", e),
    }
}

#[async_trait]
impl LLMProvider for GroqProvider {
    async fn complete(&self, messages: Vec<Message>) -> Result<String> {
        if !self.has_key {
            warn!("Groq API key not configured");
            return Err(BotError::MissingCredentials {
                service: "Groq".to_string(),
                variable: "GROQ_API_KEY".to_string(),
            });
        }

        info!(
            model = %self.config.model,
            message_count = messages.len(),
            "Requesting Groq completion"
        );

        let groq_messages = self.convert_messages(messages)?;

        let mut request_builder = CreateChatCompletionRequestArgs::default();
        request_builder
            .model(&self.config.model)
            .messages(groq_messages)
            .temperature(self.config.temperature);

        if let Some(max_tokens) = self.config.max_tokens {
            request_builder.max_tokens(max_tokens);
        }

        if let Some(top_p) = self.config.top_p {
            request_builder.top_p(top_p);
        }

        let request = request_builder.build().map_err(request_error)?;

        trace!("Sending request to Groq");

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!(error = %e, "Groq API error");
            BotError::Provider {
                provider: "Groq".to_string(),
                message: e.to_string(),
            }
        })?;

        let message = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                warn!("No content in Groq response");
                BotError::EmptyCompletion("Groq".to_string())
            })?;

        debug!(
            response_length = message.len(),
            "Groq completion successful"
        );

        Ok(message)
    }

    fn name(&self) -> &str {
        "Groq"
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn completion_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": DEFAULT_GROQ_MODEL,
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        })
    }

    #[test]
    fn test_groq_provider_creation() {
        let provider = GroqProvider::new("gsk-test");
        assert_eq!(provider.name(), "Groq");
        assert_eq!(provider.config().model, DEFAULT_GROQ_MODEL);
        assert_eq!(provider.config().max_tokens, Some(600));
    }

    #[test]
    fn test_with_config_keeps_model() {
        let provider = GroqProvider::new("gsk-test")
            .with_model("llama-3.1-8b-instant")
            .with_config(ProviderConfig::new("ignored").with_temperature(0.2));
        assert_eq!(provider.config().model, "llama-3.1-8b-instant");
        assert_eq!(provider.config().temperature, 0.2);
    }

    #[test]
    fn test_message_conversion() {
        let provider = GroqProvider::new("gsk-test");
        let converted = provider
            .convert_messages(vec![
                Message::system("You are Smart Escalate AI"),
                Message::user("Hello"),
                Message::assistant("Hi there!"),
            ])
            .unwrap();
        assert_eq!(converted.len(), 3);
        assert!(matches!(converted[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(converted[2], ChatCompletionRequestMessage::Assistant(_)));
    }

    #[tokio::test]
    async fn test_missing_key_fails_at_call_time() {
        let provider = GroqProvider::new("");
        let err = provider.complete(vec![Message::user("hi")]).await.unwrap_err();
        assert!(err.is_missing_credentials());
    }

    #[tokio::test]
    async fn test_complete_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer gsk-test"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(completion_body("Restart your router.")),
            )
            .mount(&server)
            .await;

        let provider = GroqProvider::with_base_url("gsk-test", server.uri());
        let reply = provider
            .complete(vec![Message::system("help"), Message::user("no internet")])
            .await
            .unwrap();
        assert_eq!(reply, "Restart your router.");
    }

    #[tokio::test]
    async fn test_empty_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("  ")))
            .mount(&server)
            .await;

        let provider = GroqProvider::with_base_url("gsk-test", server.uri());
        let err = provider.complete(vec![Message::user("hi")]).await.unwrap_err();
        assert!(matches!(err, BotError::EmptyCompletion(_)));
    }

    #[tokio::test]
    async fn test_api_error_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {
                    "message": "Invalid API Key",
                    "type": "invalid_request_error",
                    "param": null,
                    "code": "invalid_api_key"
                }
            })))
            .mount(&server)
            .await;

        let provider = GroqProvider::with_base_url("gsk-bad", server.uri());
        let err = provider.complete(vec![Message::user("hi")]).await.unwrap_err();
        match err {
            BotError::Provider { provider, message } => {
                assert_eq!(provider, "Groq");
                assert!(message.contains("Invalid API Key"));
            }
            other => panic!("Expected provider error, got {:?}", other),
        }
    }
}
