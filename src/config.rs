//! Bot configuration
//!
//! [`BotConfig`] is an explicit value handed to [`SupportBot::from_config`]
//! (there is no global state). It deserializes with serde defaults for every
//! field and can be read from the process environment.
//!
//! [`SupportBot::from_config`]: crate::bot::SupportBot::from_config

use crate::bot::MAX_HISTORY_WINDOW;
use crate::directory::DEFAULT_SUPPORT_EMAIL;
use crate::email::{EmailJsSender, EmailProviderKind, EmailSender, ResendSender};
use crate::error::{BotError, Result};
use crate::provider::gemini::{DEFAULT_GEMINI_MODEL, GEMINI_API_BASE};
use crate::provider::groq::{DEFAULT_GROQ_MODEL, GROQ_API_BASE};
use crate::provider::{GeminiProvider, GroqProvider, LLMProvider, ProviderConfig, ProviderKind};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Groq connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroqSettings {
    #[serde(default, skip_serializing)]
    pub api_key: String,
    #[serde(default = "default_groq_model")]
    pub model: String,
    #[serde(default = "default_groq_base_url")]
    pub base_url: String,
}

fn default_groq_model() -> String {
    DEFAULT_GROQ_MODEL.to_string()
}

fn default_groq_base_url() -> String {
    GROQ_API_BASE.to_string()
}

impl Default for GroqSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_groq_model(),
            base_url: default_groq_base_url(),
        }
    }
}

/// Gemini connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiSettings {
    #[serde(default, skip_serializing)]
    pub api_key: String,
    #[serde(default = "default_gemini_model")]
    pub model: String,
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
}

fn default_gemini_model() -> String {
    DEFAULT_GEMINI_MODEL.to_string()
}

fn default_gemini_base_url() -> String {
    GEMINI_API_BASE.to_string()
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_gemini_model(),
            base_url: default_gemini_base_url(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmailJsSettings {
    #[serde(default)]
    pub service_id: String,
    #[serde(default)]
    pub template_id: String,
    #[serde(default)]
    pub public_key: String,
    #[serde(default, skip_serializing)]
    pub private_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResendSettings {
    #[serde(default, skip_serializing)]
    pub api_key: String,
    #[serde(default = "default_resend_from")]
    pub from: String,
}

fn default_resend_from() -> String {
    "Smart Escalate <tickets@smartescalate.ai>".to_string()
}

impl Default for ResendSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            from: default_resend_from(),
        }
    }
}

/// E-mail dispatch settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmailSettings {
    #[serde(default)]
    pub provider: EmailProviderKind,
    #[serde(default)]
    pub emailjs: EmailJsSettings,
    #[serde(default)]
    pub resend: ResendSettings,
}

/// Complete bot configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotConfig {
    /// Name the assistant introduces itself with in the system prompt
    #[serde(default = "default_bot_name")]
    pub bot_name: String,

    #[serde(default)]
    pub provider: ProviderKind,

    #[serde(default)]
    pub groq: GroqSettings,

    #[serde(default)]
    pub gemini: GeminiSettings,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default)]
    pub email: EmailSettings,

    /// Prior messages sent to the LLM with each turn
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Messages included in a ticket transcript
    #[serde(default = "default_transcript_window")]
    pub transcript_window: usize,

    #[serde(default = "default_support_email")]
    pub default_support_email: String,

    #[serde(
        default = "default_request_timeout",
        serialize_with = "serialize_duration",
        deserialize_with = "deserialize_duration"
    )]
    pub request_timeout: Duration,
}

fn default_bot_name() -> String {
    "Smart Escalate AI".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    600
}

fn default_history_window() -> usize {
    MAX_HISTORY_WINDOW
}

fn default_transcript_window() -> usize {
    10
}

fn default_support_email() -> String {
    DEFAULT_SUPPORT_EMAIL.to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

fn serialize_duration<S>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(duration.as_secs())
}

fn deserialize_duration<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let secs = u64::deserialize(deserializer)?;
    Ok(Duration::from_secs(secs))
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            bot_name: default_bot_name(),
            provider: ProviderKind::default(),
            groq: GroqSettings::default(),
            gemini: GeminiSettings::default(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            email: EmailSettings::default(),
            history_window: default_history_window(),
            transcript_window: default_transcript_window(),
            default_support_email: default_support_email(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl BotConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup; unset keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(kind) = get("AI_PROVIDER") {
            config.provider = kind.parse()?;
        }
        if let Some(key) = get("GROQ_API_KEY") {
            config.groq.api_key = key;
        }
        if let Some(model) = get("GROQ_MODEL") {
            config.groq.model = model;
        }
        if let Some(key) = get("GEMINI_API_KEY") {
            config.gemini.api_key = key;
        }
        if let Some(model) = get("GEMINI_MODEL") {
            config.gemini.model = model;
        }

        if let Some(kind) = get("EMAIL_PROVIDER") {
            config.email.provider = kind.parse()?;
        }
        if let Some(v) = get("EMAILJS_SERVICE_ID") {
            config.email.emailjs.service_id = v;
        }
        if let Some(v) = get("EMAILJS_TEMPLATE_ID") {
            config.email.emailjs.template_id = v;
        }
        if let Some(v) = get("EMAILJS_PUBLIC_KEY") {
            config.email.emailjs.public_key = v;
        }
        config.email.emailjs.private_key = get("EMAILJS_PRIVATE_KEY");
        if let Some(v) = get("RESEND_API_KEY") {
            config.email.resend.api_key = v;
        }
        if let Some(v) = get("RESEND_FROM") {
            config.email.resend.from = v;
        }
        if let Some(v) = get("SUPPORT_EMAIL") {
            config.default_support_email = v;
        }
        if let Some(v) = get("REQUEST_TIMEOUT_SECS") {
            let secs: u64 = v.parse().map_err(|_| {
                BotError::Configuration(format!("REQUEST_TIMEOUT_SECS must be a number, got '{}'", v))
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        debug!(provider = %config.provider, email = %config.email.provider, "Configuration loaded");
        Ok(config)
    }

    /// Reject settings the bot cannot run with
    ///
    /// Missing API keys are not an error here: they surface at call time as a
    /// canned reply so the conversation keeps going.
    pub fn validate(&self) -> Result<()> {
        if self.history_window == 0 || self.history_window > MAX_HISTORY_WINDOW {
            return Err(BotError::Configuration(format!(
                "history_window must be between 1 and {}",
                MAX_HISTORY_WINDOW
            )));
        }
        if self.transcript_window == 0 {
            return Err(BotError::Configuration(
                "transcript_window must be at least 1".to_string(),
            ));
        }
        if !self.default_support_email.contains('@') {
            return Err(BotError::Configuration(format!(
                "default_support_email is not an e-mail address: {}",
                self.default_support_email
            )));
        }
        if self.request_timeout.is_zero() {
            return Err(BotError::Configuration(
                "request_timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn generation(&self, model: &str) -> ProviderConfig {
        ProviderConfig::new(model)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
    }

    /// Instantiate the configured LLM provider
    pub fn build_provider(&self) -> Result<Box<dyn LLMProvider>> {
        info!(provider = %self.provider, "Building LLM provider");
        let provider: Box<dyn LLMProvider> = match self.provider {
            ProviderKind::Groq => Box::new(
                GroqProvider::with_base_url(&self.groq.api_key, &self.groq.base_url)
                    .with_model(&self.groq.model)
                    .with_config(self.generation(&self.groq.model))
                    .with_timeout(self.request_timeout)?,
            ),
            ProviderKind::Gemini => Box::new(
                GeminiProvider::new(&self.gemini.api_key)
                    .with_base_url(&self.gemini.base_url)
                    .with_model(&self.gemini.model)
                    .with_config(self.generation(&self.gemini.model))
                    .with_timeout(self.request_timeout)?,
            ),
        };
        Ok(provider)
    }

    /// Instantiate the configured e-mail sender, `None` when dispatch is disabled
    pub fn build_email_sender(&self) -> Result<Option<Box<dyn EmailSender>>> {
        info!(email = %self.email.provider, "Building e-mail sender");
        let sender: Option<Box<dyn EmailSender>> = match self.email.provider {
            EmailProviderKind::EmailJs => {
                let settings = &self.email.emailjs;
                let mut sender = EmailJsSender::new(
                    &settings.service_id,
                    &settings.template_id,
                    &settings.public_key,
                )
                .with_timeout(self.request_timeout)?;
                if let Some(private_key) = &settings.private_key {
                    sender = sender.with_private_key(private_key);
                }
                Some(Box::new(sender))
            }
            EmailProviderKind::Resend => Some(Box::new(
                ResendSender::new(&self.email.resend.api_key, &self.email.resend.from)
                    .with_timeout(self.request_timeout)?,
            )),
            EmailProviderKind::Disabled => None,
        };
        Ok(sender)
    }
}
