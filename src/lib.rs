//! # Smart Escalate - Support Chat with Ticket Escalation
//!
//! Smart Escalate is the conversation engine behind a customer-support chat widget.
//! Each customer message is classified for sentiment, company, and escalation intent;
//! the bot then either answers through an LLM, asks which company the issue is with,
//! or raises a support ticket and e-mails it to that company's support address.
//!
//! ## Features
//!
//! - 🎯 **Keyword Classification**: Urgent/frustrated sentiment and explicit or confirmed escalation requests
//! - 🏢 **Company Directory**: Alias matching against known providers and their support mailboxes
//! - 🔌 **LLM Providers**: Groq (OpenAI-compatible) and Gemini behind one trait
//! - ✉️ **Ticket E-mail**: EmailJS or Resend, with a conversation transcript
//! - 💾 **Session Storage**: In-memory sessions behind a storage trait
//!
//! ## Quick Start
//!
//! ```no_run
//! use smart_escalate::{GroqProvider, SupportBot, UserProfile};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = GroqProvider::new(std::env::var("GROQ_API_KEY")?);
//!
//! let bot = SupportBot::builder()
//!     .name("Smart Escalate AI")
//!     .provider(Box::new(provider))
//!     .build()?;
//!
//! let session_id = bot.create_session(UserProfile::guest()).await?;
//! let response = bot
//!     .send_message(session_id, "My Airtel broadband is down, please escalate")
//!     .await?;
//!
//! println!("Bot: {}", response.message);
//! if let Some(ticket) = response.ticket {
//!     println!("Ticket {} sent to {}", ticket.ticket_number, ticket.company_email);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  SupportBot                     │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │  Classifier  │  │   Decider    │            │
//! │  │  - Sentiment │  │  - Assistant │            │
//! │  │  - Company   │  │  - Ticket    │            │
//! │  │  - Intent    │  │  - Ask       │            │
//! │  └──────────────┘  └──────────────┘            │
//! │  ┌──────────────────────────────────┐          │
//! │  │  LLM Provider    │ E-mail Sender │          │
//! │  │  - Groq - Gemini │ - EmailJS     │          │
//! │  │                  │ - Resend      │          │
//! │  └──────────────────────────────────┘          │
//! │  ┌──────────────────────────────────┐          │
//! │  │      Session Storage (memory)    │          │
//! │  └──────────────────────────────────┘          │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`bot`]: Turn orchestration and builder
//! - [`classifier`]: Sentiment, company, and escalation-intent detection
//! - [`directory`]: Known companies and their support addresses
//! - [`decider`]: Assistant/ticket/ask decision and ticket priority
//! - [`ticket`]: Tickets, transcripts, and e-mail fields
//! - [`provider`]: LLM provider abstractions (Groq, Gemini)
//! - [`email`]: Ticket e-mail senders (EmailJS, Resend)
//! - [`config`]: Environment-driven configuration
//! - [`storage`]: Session storage backends
//! - [`context`]: Messages and per-conversation escalation state
//! - [`session`]: Session lifecycle management
//! - [`error`]: Error types and result aliases
//!
//! ## Demo
//!
//! `demos/support_chat.rs` runs an interactive chat on stdin using the
//! environment configuration.

// Core type definitions
pub mod types;

// Error types
pub mod error;

// Messages and conversation state
pub mod context;

// Company directory
pub mod directory;

// Message classification
pub mod classifier;

// Escalation decision rule
pub mod decider;

// Tickets and transcripts
pub mod ticket;

// Session management
pub mod session;

// Provider abstraction
pub mod provider;

// E-mail dispatch
pub mod email;

// Storage backends
pub mod storage;

// Configuration
pub mod config;

// Bot core
pub mod bot;

pub use bot::{BotResponse, QuickAction, SupportBot, SupportBotBuilder, MAX_HISTORY_WINDOW};
pub use classifier::Classifier;
pub use config::BotConfig;
pub use context::{
    Conversation, ConversationContext, Message, MessageRole, Sentiment, UserProfile,
    WELCOME_MESSAGE,
};
pub use decider::{decide, priority_for, Decision, DecisionInput};
pub use directory::{Company, CompanyDirectory};
pub use email::{EmailJsSender, EmailProviderKind, EmailSender, ResendSender};
pub use error::{BotError, Result, StorageError};
pub use provider::{GeminiProvider, GroqProvider, LLMProvider, ProviderConfig, ProviderKind};
pub use session::{Session, SessionStatus};
pub use storage::{memory::InMemorySessionStore, SessionStore};
pub use ticket::{Ticket, TicketEmail, TicketEmitter, TicketPriority, TicketStatus};
pub use types::*;
