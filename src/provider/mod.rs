//! LLM provider abstraction and implementations
//!
//! This module provides a trait-based abstraction for LLM providers, so the bot
//! can run against Groq or Google Gemini selected by configuration.

use crate::context::{Message, MessageRole};
use crate::error::{BotError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod gemini;
pub mod groq;

pub use gemini::GeminiProvider;
pub use groq::GroqProvider;

/// Configuration for an LLM provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Model name to use
    pub model: String,
    /// Temperature for response generation (0.0-2.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Top-p sampling parameter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

fn default_temperature() -> f32 {
    0.7
}

impl ProviderConfig {
    /// Create a new provider configuration with default values
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: default_temperature(),
            max_tokens: None,
            top_p: None,
        }
    }

    /// Set the temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    /// Set the maximum tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the top-p sampling parameter
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p.clamp(0.0, 1.0));
        self
    }
}

/// Which LLM backend answers customer messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Groq,
    Gemini,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Groq => f.write_str("groq"),
            ProviderKind::Gemini => f.write_str("gemini"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "groq" => Ok(ProviderKind::Groq),
            "gemini" => Ok(ProviderKind::Gemini),
            other => Err(BotError::Configuration(format!(
                "Unknown AI provider '{}', expected 'groq' or 'gemini'",
                other
            ))),
        }
    }
}

/// Trait for LLM provider implementations
///
/// Providers receive chat-style messages (an optional leading system message,
/// then alternating history) and return one text completion.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a complete response for the given messages
    ///
    /// Returns [`BotError::MissingCredentials`] when the provider was built
    /// without a usable API key; the check happens at call time.
    async fn complete(&self, messages: Vec<Message>) -> Result<String>;

    /// Get the name of the provider
    fn name(&self) -> &str;

    /// Get the provider configuration
    fn config(&self) -> &ProviderConfig;
}

/// Whether an API key is absent or left as a template placeholder
pub fn is_placeholder_key(key: &str) -> bool {
    let key = key.trim();
    key.is_empty() || key.starts_with("your_") || key.starts_with("your-")
}

/// Assemble the request for one turn: system prompt, prior turns, current text
pub fn chat_messages(system_prompt: &str, history: &[Message], current: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(system_prompt));
    messages.extend(
        history
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .cloned(),
    );
    messages.push(Message::user(current));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_config_creation() {
        let config = ProviderConfig::new("llama-3.3-70b-versatile");
        assert_eq!(config.model, "llama-3.3-70b-versatile");
        assert_eq!(config.temperature, 0.7);
        assert!(config.max_tokens.is_none());
    }

    #[test]
    fn test_provider_config_clamping() {
        let config = ProviderConfig::new("m").with_temperature(3.0).with_top_p(-1.0);
        assert_eq!(config.temperature, 2.0);
        assert_eq!(config.top_p, Some(0.0));
    }

    #[test]
    fn test_provider_config_serialization() {
        let config = ProviderConfig::new("gemini-1.5-flash").with_max_tokens(600);
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: ProviderConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!("groq".parse::<ProviderKind>().unwrap(), ProviderKind::Groq);
        assert_eq!(" Gemini ".parse::<ProviderKind>().unwrap(), ProviderKind::Gemini);
        assert!("openai".parse::<ProviderKind>().is_err());
        assert_eq!(ProviderKind::default().to_string(), "groq");
    }

    #[test]
    fn test_placeholder_keys() {
        assert!(is_placeholder_key(""));
        assert!(is_placeholder_key("your_gemini_api_key_here"));
        assert!(!is_placeholder_key("gsk_live123"));
    }

    #[test]
    fn test_chat_messages_order() {
        let history = vec![Message::assistant("Welcome"), Message::user("Hi")];
        let messages = chat_messages("be helpful", &history, "My Jio network is down");

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[1].content, "Welcome");
        assert_eq!(messages[3].role, MessageRole::User);
        assert_eq!(messages[3].content, "My Jio network is down");
    }
}
