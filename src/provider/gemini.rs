//! Google Gemini LLM provider implementation
//!
//! Talks to the `generateContent` REST endpoint directly with reqwest.

use crate::context::{Message, MessageRole};
use crate::error::{BotError, Result};
use crate::provider::{is_placeholder_key, LLMProvider, ProviderConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Google Gemini LLM provider
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    config: ProviderConfig,
}

impl GeminiProvider {
    /// Create a new Gemini provider with the given API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: GEMINI_API_BASE.to_string(),
            config: ProviderConfig::new(DEFAULT_GEMINI_MODEL).with_max_tokens(600),
        }
    }

    /// Create a new Gemini provider from environment variable GEMINI_API_KEY
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| BotError::MissingCredentials {
            service: "Gemini".to_string(),
            variable: "GEMINI_API_KEY".to_string(),
        })?;

        Ok(Self::new(api_key))
    }

    /// Set the model to use
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Replace the generation settings, keeping the model
    pub fn with_config(mut self, config: ProviderConfig) -> Self {
        let model = std::mem::take(&mut self.config.model);
        self.config = ProviderConfig { model, ..config };
        self
    }

    /// Point the provider at another endpoint (proxies, mock servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Use a client with a request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    fn build_request(&self, messages: Vec<Message>) -> GenerateContentRequest {
        let mut system_prompt: Option<String> = None;
        let mut contents: Vec<Content> = Vec::new();

        for msg in messages {
            let role = match msg.role {
                MessageRole::System => {
                    system_prompt = Some(match system_prompt.take() {
                        Some(existing) => format!("{}\n\n{}", existing, msg.content),
                        None => msg.content,
                    });
                    continue;
                }
                MessageRole::User => "user",
                MessageRole::Assistant => "model",
            };
            contents.push(Content {
                role: Some(role.to_string()),
                parts: vec![Part { text: msg.content }],
            });
        }

        // Gemini rejects a history that opens with a model turn
        let first_user = contents
            .iter()
            .position(|c| c.role.as_deref() == Some("user"))
            .unwrap_or(contents.len());
        contents.drain(..first_user);

        GenerateContentRequest {
            system_instruction: system_prompt.map(|text| Content {
                role: None,
                parts: vec![Part { text }],
            }),
            contents,
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_tokens,
                top_p: self.config.top_p,
            },
        }
    }

    fn provider_error(message: impl Into<String>) -> BotError {
        BotError::Provider {
            provider: "Gemini".to_string(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    async fn complete(&self, messages: Vec<Message>) -> Result<String> {
        if is_placeholder_key(&self.api_key) {
            warn!("Gemini API key not configured");
            return Err(BotError::MissingCredentials {
                service: "Gemini".to_string(),
                variable: "GEMINI_API_KEY".to_string(),
            });
        }

        info!(
            model = %self.config.model,
            message_count = messages.len(),
            "Requesting Gemini completion"
        );

        let request = self.build_request(messages);
        let url = format!("{}/models/{}:generateContent", self.base_url, self.config.model);

        trace!(contents = request.contents.len(), "Sending request to Gemini");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Gemini request failed");
                Self::provider_error(format!("HTTP request failed: {}", e))
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Self::provider_error(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => match api_err.error.status {
                    Some(code) => format!("{} ({})", api_err.error.message, code),
                    None => api_err.error.message,
                },
                Err(_) => format!("API returned {}: {}", status, body),
            };
            warn!(status = %status, error = %message, "Gemini API error");
            return Err(Self::provider_error(message));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| Self::provider_error(format!("Failed to parse API response: {}", e)))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            warn!("No content in Gemini response");
            return Err(BotError::EmptyCompletion("Gemini".to_string()));
        }

        debug!(response_length = text.len(), "Gemini completion successful");

        Ok(text)
    }

    fn name(&self) -> &str {
        "Gemini"
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}
