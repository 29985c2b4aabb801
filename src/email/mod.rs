//! Transactional e-mail senders
//!
//! Tickets are forwarded to the company's support mailbox through an
//! [`EmailSender`]. Two HTTP services are supported, EmailJS (template
//! rendered server side from the ticket fields) and Resend (plain-text body
//! rendered here).

use crate::error::{BotError, Result};
use crate::ticket::TicketEmail;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod emailjs;
pub mod resend;

pub use emailjs::EmailJsSender;
pub use resend::ResendSender;

/// Trait for e-mail delivery backends
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver a ticket e-mail; `Ok` only when the service accepted it
    async fn send(&self, email: &TicketEmail) -> Result<()>;

    /// Get the name of the sender
    fn name(&self) -> &str;
}

/// Which e-mail service forwards tickets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailProviderKind {
    #[default]
    EmailJs,
    Resend,
    /// Tickets are recorded but never e-mailed
    Disabled,
}

impl fmt::Display for EmailProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmailProviderKind::EmailJs => f.write_str("emailjs"),
            EmailProviderKind::Resend => f.write_str("resend"),
            EmailProviderKind::Disabled => f.write_str("disabled"),
        }
    }
}

impl FromStr for EmailProviderKind {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "emailjs" => Ok(EmailProviderKind::EmailJs),
            "resend" => Ok(EmailProviderKind::Resend),
            "disabled" | "none" | "off" => Ok(EmailProviderKind::Disabled),
            other => Err(BotError::Configuration(format!(
                "Unknown e-mail provider '{}', expected 'emailjs', 'resend' or 'disabled'",
                other
            ))),
        }
    }
}

pub(crate) fn send_error(sender: &str, message: impl Into<String>) -> BotError {
    BotError::Email {
        sender: sender.to_string(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_provider_kind_parsing() {
        assert_eq!(
            "EmailJS".parse::<EmailProviderKind>().unwrap(),
            EmailProviderKind::EmailJs
        );
        assert_eq!(
            "none".parse::<EmailProviderKind>().unwrap(),
            EmailProviderKind::Disabled
        );
        assert!("smtp".parse::<EmailProviderKind>().is_err());
    }

    #[test]
    fn test_email_provider_kind_serialization() {
        let json = serde_json::to_string(&EmailProviderKind::Resend).unwrap();
        assert_eq!(json, "\"resend\"");
        assert_eq!(EmailProviderKind::default().to_string(), "emailjs");
    }
}
