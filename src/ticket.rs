//! Support tickets
//!
//! This module builds the ticket created on escalation, renders the chat
//! transcript, and produces the template fields handed to an e-mail sender.

use crate::context::{ConversationContext, Message, MessageRole, Sentiment};
use crate::decider::priority_for;
use crate::directory::CompanyDirectory;
use crate::types::TicketId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category used when no quick action picked one
pub const DEFAULT_CATEGORY: &str = "General Support";

const SUBJECT_ISSUE_CHARS: usize = 60;

/// Lifecycle status of a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TicketStatus {
    Received,
    InProgress,
    Resolved,
}

impl TicketStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TicketStatus::Received => "Received",
            TicketStatus::InProgress => "In Progress",
            TicketStatus::Resolved => "Resolved",
        }
    }
}

/// Ticket priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl TicketPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketPriority::Low => "low",
            TicketPriority::Medium => "medium",
            TicketPriority::High => "high",
            TicketPriority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A support ticket raised from a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    /// Human-facing number, `TKT-` plus six time-derived digits
    pub ticket_number: String,
    pub status: TicketStatus,
    pub category: String,
    pub priority: TicketPriority,
    pub description: String,
    pub subject: String,
    pub company: String,
    pub company_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    pub email_sent: bool,
    pub created_at: DateTime<Utc>,
}

impl Ticket {
    /// Mark the ticket as being worked on by a support agent
    pub fn assign(&mut self, agent: impl Into<String>) {
        self.assigned_to = Some(agent.into());
        self.status = TicketStatus::InProgress;
    }

    pub fn resolve(&mut self) {
        self.status = TicketStatus::Resolved;
    }

    pub fn mark_email_sent(&mut self) {
        self.email_sent = true;
    }
}

/// Ticket number derived from the time: last six digits of the Unix time in ms
pub fn ticket_number(now: DateTime<Utc>) -> String {
    let millis = now.timestamp_millis().unsigned_abs();
    format!("TKT-{:06}", millis % 1_000_000)
}

/// Render messages as a plain-text transcript with role labels
pub fn render_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .filter(|m| m.role != MessageRole::System)
        .map(|m| {
            let label = match m.role {
                MessageRole::User => "Customer",
                _ => "Support Bot",
            };
            format!(
                "[{}] {}: {}",
                m.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
                label,
                m.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Template fields for the ticket e-mail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketEmail {
    pub to_email: String,
    pub ticket_number: String,
    pub subject: String,
    pub priority: String,
    pub category: String,
    pub company: String,
    pub company_email: String,
    pub user_name: String,
    pub user_email: String,
    pub issue_description: String,
    pub transcript: String,
    pub created_at: String,
}

impl TicketEmail {
    /// Plain-text body for senders that do not render templates server side
    pub fn text_body(&self) -> String {
        format!(
            "Ticket: {}\nPriority: {}\nCategory: {}\nCompany: {}\nCustomer: {} <{}>\nCreated: {}\n\nIssue:\n{}\n\nConversation transcript:\n{}\n",
            self.ticket_number,
            self.priority.to_uppercase(),
            self.category,
            self.company,
            self.user_name,
            self.user_email,
            self.created_at,
            self.issue_description,
            self.transcript,
        )
    }
}

/// Builds tickets and their e-mails from conversation state
pub struct TicketEmitter {
    transcript_window: usize,
}

impl TicketEmitter {
    pub fn new(transcript_window: usize) -> Self {
        Self { transcript_window }
    }

    /// Create a ticket for `company`
    ///
    /// `prior_attempts` counts the turns before the one that escalated.
    #[allow(clippy::too_many_arguments)]
    pub fn create_ticket(
        &self,
        company: &str,
        directory: &CompanyDirectory,
        context: &ConversationContext,
        sentiment: Sentiment,
        prior_attempts: u32,
        current_message: &str,
        now: DateTime<Utc>,
    ) -> Ticket {
        let description = context
            .main_issue
            .clone()
            .unwrap_or_else(|| current_message.trim().to_string());

        let summary: String = description.chars().take(SUBJECT_ISSUE_CHARS).collect();
        let subject = if summary.len() < description.len() {
            format!("{} support request: {}...", company, summary.trim_end())
        } else {
            format!("{} support request: {}", company, summary)
        };

        Ticket {
            id: TicketId::new(),
            ticket_number: ticket_number(now),
            status: TicketStatus::Received,
            category: context
                .issue_category
                .clone()
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            priority: priority_for(sentiment, prior_attempts),
            description,
            subject,
            company: company.to_string(),
            company_email: directory.support_email(company).to_string(),
            assigned_to: None,
            email_sent: false,
            created_at: now,
        }
    }

    /// E-mail fields for a ticket, with the last messages of the conversation
    pub fn email_for(
        &self,
        ticket: &Ticket,
        context: &ConversationContext,
        messages: &[Message],
    ) -> TicketEmail {
        let start = messages.len().saturating_sub(self.transcript_window);
        TicketEmail {
            to_email: ticket.company_email.clone(),
            ticket_number: ticket.ticket_number.clone(),
            subject: ticket.subject.clone(),
            priority: ticket.priority.as_str().to_string(),
            category: ticket.category.clone(),
            company: ticket.company.clone(),
            company_email: ticket.company_email.clone(),
            user_name: context.user.name.clone(),
            user_email: context.user.email.clone(),
            issue_description: ticket.description.clone(),
            transcript: render_transcript(&messages[start..]),
            created_at: ticket.created_at.to_rfc3339(),
        }
    }
}

impl Default for TicketEmitter {
    fn default() -> Self {
        Self::new(10)
    }
}
