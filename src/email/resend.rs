//! Resend sender
//!
//! Sends the ticket as a plain-text e-mail through the Resend REST API.

use crate::email::{send_error, EmailSender};
use crate::error::{BotError, Result};
use crate::provider::is_placeholder_key;
use crate::ticket::TicketEmail;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const RESEND_SEND_URL: &str = "https://api.resend.com/emails";

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: String,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

/// Resend transactional e-mail sender
pub struct ResendSender {
    client: reqwest::Client,
    api_key: String,
    from: String,
    send_url: String,
}

impl ResendSender {
    pub fn new(api_key: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            from: from.into(),
            send_url: RESEND_SEND_URL.to_string(),
        }
    }

    pub fn with_send_url(mut self, url: impl Into<String>) -> Self {
        self.send_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(self)
    }
}

#[async_trait]
impl EmailSender for ResendSender {
    async fn send(&self, email: &TicketEmail) -> Result<()> {
        if is_placeholder_key(&self.api_key) {
            return Err(BotError::MissingCredentials {
                service: "Resend".to_string(),
                variable: "RESEND_API_KEY".to_string(),
            });
        }

        info!(
            ticket_number = %email.ticket_number,
            company = %email.company,
            "Sending ticket e-mail via Resend"
        );

        let reply_to = Some(email.user_email.as_str()).filter(|addr| addr.contains('@'));
        let request = SendRequest {
            from: &self.from,
            to: vec![email.to_email.as_str()],
            subject: format!(
                "[{}] [{}] {}",
                email.ticket_number,
                email.priority.to_uppercase(),
                email.subject
            ),
            text: email.text_body(),
            reply_to,
        };

        let response = self
            .client
            .post(&self.send_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| send_error("Resend", format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Resend rejected the e-mail");
            return Err(send_error("Resend", format!("API returned {}: {}", status, body)));
        }

        let sent: SendResponse = response
            .json()
            .await
            .map_err(|e| send_error("Resend", format!("Failed to parse API response: {}", e)))?;

        debug!(email_id = %sent.id, ticket_number = %email.ticket_number, "Resend accepted the e-mail");
        Ok(())
    }

    fn name(&self) -> &str {
        "Resend"
    }
}
