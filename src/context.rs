//! Conversation context for support chats
//!
//! This module provides the message log and the per-conversation context the
//! escalation engine mutates once per turn.

use crate::types::MessageId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Greeting seeded into every new conversation
pub const WELCOME_MESSAGE: &str = "Hello! I'm AssistBot, your virtual assistant. I'm here to help resolve any issues you're experiencing.\n\nTo get started, could you briefly describe the problem you're facing?";

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Instructions sent to the LLM, never stored in a conversation
    System,
    /// Message from the customer
    User,
    /// Message from the support bot
    Assistant,
}

/// Sentiment detected in a customer message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    #[default]
    Neutral,
    Urgent,
    Frustrated,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Neutral => "neutral",
            Sentiment::Urgent => "urgent",
            Sentiment::Frustrated => "frustrated",
        }
    }
}

/// A single message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier for the message
    pub id: MessageId,
    /// Role of the message sender
    pub role: MessageRole,
    /// Content of the message
    pub content: String,
    /// Sentiment tag, set on user messages and on urgent replies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
    /// Timestamp when the message was created
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn with_role(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role,
            content: content.into(),
            sentiment: None,
            created_at: Utc::now(),
        }
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(MessageRole::System, content)
    }

    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(MessageRole::User, content)
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(MessageRole::Assistant, content)
    }

    /// Tag the message with a sentiment
    pub fn with_sentiment(mut self, sentiment: Sentiment) -> Self {
        self.sentiment = Some(sentiment);
        self
    }
}

/// Identity of the customer on the other end of the chat
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
}

impl UserProfile {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Anonymous visitor, used when the widget runs without a signed-in user
    pub fn guest() -> Self {
        Self::new("Guest", "guest@unknown")
    }
}

/// Per-conversation escalation state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    /// Number of user turns that reached the decider
    pub attempt_count: u32,
    /// Company named anywhere in the conversation so far
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_company: Option<String>,
    /// First substantive customer message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_issue: Option<String>,
    /// Category chosen through a quick action
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_category: Option<String>,
    /// Set when escalation was requested before a company was known
    #[serde(default)]
    pub pending_escalation: bool,
    /// When the first turn happened
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    pub user: UserProfile,
}

impl ConversationContext {
    pub fn new(user: UserProfile) -> Self {
        Self {
            attempt_count: 0,
            detected_company: None,
            main_issue: None,
            issue_category: None,
            pending_escalation: false,
            started_at: None,
            user,
        }
    }

    /// Record one user turn reaching the decider
    pub fn record_attempt(&mut self) {
        self.attempt_count = self.attempt_count.saturating_add(1);
        self.started_at.get_or_insert_with(Utc::now);
    }

    /// Remember the company; a later mention replaces an earlier one
    pub fn remember_company(&mut self, company: impl Into<String>) {
        self.detected_company = Some(company.into());
    }

    /// Keep the first message as the main issue
    pub fn remember_issue(&mut self, text: &str) {
        let trimmed = text.trim();
        if self.main_issue.is_none() && !trimmed.is_empty() {
            self.main_issue = Some(trimmed.to_string());
        }
    }
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self::new(UserProfile::guest())
    }
}

/// Ordered conversation log plus its context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub messages: Vec<Message>,
    pub context: ConversationContext,
}

impl Conversation {
    /// Start a conversation with the welcome greeting
    pub fn new(user: UserProfile) -> Self {
        Self {
            messages: vec![Message::assistant(WELCOME_MESSAGE)],
            context: ConversationContext::new(user),
        }
    }

    /// Append a message to the log
    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// The last `n` messages, oldest first
    pub fn recent(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    /// Text of the most recent assistant message
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant)
            .map(|m| m.content.as_str())
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, MessageRole::User);
        assert_eq!(msg.content, "Hello");
        assert!(msg.sentiment.is_none());

        let tagged = Message::user("ASAP").with_sentiment(Sentiment::Urgent);
        assert_eq!(tagged.sentiment, Some(Sentiment::Urgent));
    }

    #[test]
    fn test_sentiment_serialization() {
        let json = serde_json::to_string(&Sentiment::Frustrated).unwrap();
        assert_eq!(json, "\"frustrated\"");
        assert_eq!(Sentiment::default(), Sentiment::Neutral);
    }

    #[test]
    fn test_conversation_starts_with_welcome() {
        let conversation = Conversation::new(UserProfile::guest());
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.last_assistant_text(), Some(WELCOME_MESSAGE));
        assert_eq!(conversation.context.attempt_count, 0);
    }

    #[test]
    fn test_recent_window() {
        let mut conversation = Conversation::new(UserProfile::guest());
        for i in 0..8 {
            conversation.add_message(Message::user(format!("msg {}", i)));
        }

        let recent = conversation.recent(6);
        assert_eq!(recent.len(), 6);
        assert_eq!(recent[0].content, "msg 2");
        assert_eq!(recent[5].content, "msg 7");

        assert_eq!(conversation.recent(100).len(), 9);
    }

    #[test]
    fn test_last_assistant_text_skips_user_messages() {
        let mut conversation = Conversation::new(UserProfile::guest());
        conversation.add_message(Message::assistant("Would you like me to escalate?"));
        conversation.add_message(Message::user("hmm"));
        assert_eq!(
            conversation.last_assistant_text(),
            Some("Would you like me to escalate?")
        );
    }

    #[test]
    fn test_record_attempt_is_monotonic() {
        let mut context = ConversationContext::default();
        assert!(context.started_at.is_none());

        context.record_attempt();
        let started = context.started_at;
        context.record_attempt();

        assert_eq!(context.attempt_count, 2);
        assert_eq!(context.started_at, started);
    }

    #[test]
    fn test_main_issue_keeps_first_message() {
        let mut context = ConversationContext::default();
        context.remember_issue("   ");
        assert!(context.main_issue.is_none());

        context.remember_issue("My Jio network is not working");
        context.remember_issue("still broken");
        assert_eq!(
            context.main_issue.as_deref(),
            Some("My Jio network is not working")
        );
    }
}
