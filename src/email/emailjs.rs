//! EmailJS sender
//!
//! Posts the ticket fields as template parameters to the EmailJS REST API.
//! The e-mail itself is rendered by the template configured in EmailJS.

use crate::email::{send_error, EmailSender};
use crate::error::{BotError, Result};
use crate::provider::is_placeholder_key;
use crate::ticket::TicketEmail;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const EMAILJS_SEND_URL: &str = "https://api.emailjs.com/api/v1.0/email/send";

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    access_token: Option<&'a str>,
    template_params: &'a TicketEmail,
}

/// EmailJS transactional e-mail sender
pub struct EmailJsSender {
    client: reqwest::Client,
    service_id: String,
    template_id: String,
    public_key: String,
    private_key: Option<String>,
    send_url: String,
}

impl EmailJsSender {
    pub fn new(
        service_id: impl Into<String>,
        template_id: impl Into<String>,
        public_key: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            service_id: service_id.into(),
            template_id: template_id.into(),
            public_key: public_key.into(),
            private_key: None,
            send_url: EMAILJS_SEND_URL.to_string(),
        }
    }

    /// Private key, required when the EmailJS account enforces strict mode
    pub fn with_private_key(mut self, private_key: impl Into<String>) -> Self {
        self.private_key = Some(private_key.into());
        self
    }

    pub fn with_send_url(mut self, url: impl Into<String>) -> Self {
        self.send_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    fn check_credentials(&self) -> Result<()> {
        let missing = [
            (&self.service_id, "EMAILJS_SERVICE_ID"),
            (&self.template_id, "EMAILJS_TEMPLATE_ID"),
            (&self.public_key, "EMAILJS_PUBLIC_KEY"),
        ]
        .into_iter()
        .find(|(value, _)| is_placeholder_key(value));

        match missing {
            Some((_, variable)) => Err(BotError::MissingCredentials {
                service: "EmailJS".to_string(),
                variable: variable.to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl EmailSender for EmailJsSender {
    async fn send(&self, email: &TicketEmail) -> Result<()> {
        self.check_credentials()?;

        info!(
            ticket_number = %email.ticket_number,
            company = %email.company,
            "Sending ticket e-mail via EmailJS"
        );

        let request = SendRequest {
            service_id: &self.service_id,
            template_id: &self.template_id,
            user_id: &self.public_key,
            access_token: self.private_key.as_deref(),
            template_params: email,
        };

        let response = self
            .client
            .post(&self.send_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| send_error("EmailJS", format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "EmailJS rejected the e-mail");
            return Err(send_error("EmailJS", format!("API returned {}: {}", status, body)));
        }

        debug!(ticket_number = %email.ticket_number, "EmailJS accepted the e-mail");
        Ok(())
    }

    fn name(&self) -> &str {
        "EmailJS"
    }
}
