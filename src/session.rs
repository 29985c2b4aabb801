//! Chat sessions
//!
//! A session owns one conversation and the tickets raised from it. Nothing in
//! a session outlives the process.

use crate::context::{Conversation, UserProfile};
use crate::ticket::Ticket;
use crate::types::{SessionId, TicketId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a chat session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Session is active and can process messages
    Active,
    /// Session has been ended by the customer or the host application
    Completed,
}

/// A chat session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier for the session
    pub id: SessionId,
    /// Current status of the session
    pub status: SessionStatus,
    /// Messages and escalation context
    pub conversation: Conversation,
    /// Tickets raised in this session, oldest first
    #[serde(default)]
    pub tickets: Vec<Ticket>,
    /// When the session was created
    pub created_at: DateTime<Utc>,
    /// When the session was last updated
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session for a customer
    pub fn new(user: UserProfile) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            status: SessionStatus::Active,
            conversation: Conversation::new(user),
            tickets: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the session's updated_at timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Check if the session is active
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// Complete the session
    pub fn complete(&mut self) {
        self.status = SessionStatus::Completed;
        self.touch();
    }

    pub fn add_ticket(&mut self, ticket: Ticket) {
        self.tickets.push(ticket);
        self.touch();
    }

    pub fn ticket_mut(&mut self, id: &TicketId) -> Option<&mut Ticket> {
        self.tickets.iter_mut().find(|t| &t.id == id)
    }
}
