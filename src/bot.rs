// Support bot orchestration
//
// This module implements the SupportBot that runs one customer turn: classify
// the message, decide between the assistant and a ticket, perform the action,
// and persist the session.

use crate::classifier::Classifier;
use crate::config::BotConfig;
use crate::context::{ConversationContext, Message, Sentiment, UserProfile};
use crate::decider::{company_question, decide, Decision, DecisionInput};
use crate::directory::CompanyDirectory;
use crate::email::EmailSender;
use crate::error::{BotError, Result};
use crate::provider::{chat_messages, LLMProvider};
use crate::session::Session;
use crate::storage::memory::InMemorySessionStore;
use crate::storage::SessionStore;
use crate::ticket::{Ticket, TicketEmitter, DEFAULT_CATEGORY};
use crate::types::{SessionId, TicketId};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, trace, warn};

/// Most prior messages sent to the LLM with a turn
pub const MAX_HISTORY_WINDOW: usize = 6;

/// Companies offered as examples in the clarifying question
const COMPANY_EXAMPLES: usize = 3;

const EMPTY_COMPLETION_REPLY: &str = "I apologize, but I'm having trouble generating a response right now. Could you please rephrase your question, or would you like me to create a support ticket?";

/// Shortcut buttons shown under the welcome message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuickAction {
    Network,
    Software,
    Device,
    Other,
}

impl QuickAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuickAction::Network => "network",
            QuickAction::Software => "software",
            QuickAction::Device => "device",
            QuickAction::Other => "other",
        }
    }

    /// Issue category recorded on the conversation
    pub fn category(&self) -> &'static str {
        match self {
            QuickAction::Network => "Network/Connectivity",
            QuickAction::Software => "Software/Application",
            QuickAction::Device => "Hardware/Device",
            QuickAction::Other => "Other",
        }
    }

    /// Message sent on the customer's behalf
    pub fn message(&self) -> String {
        format!("I'm having issues with {}", self.as_str())
    }
}

impl fmt::Display for QuickAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuickAction {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "network" => Ok(QuickAction::Network),
            "software" => Ok(QuickAction::Software),
            "device" => Ok(QuickAction::Device),
            "other" => Ok(QuickAction::Other),
            other => Err(BotError::InvalidInput(format!("Unknown quick action: {}", other))),
        }
    }
}

/// Result of one customer turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotResponse {
    /// Text shown to the customer
    pub message: String,
    pub decision: Decision,
    pub sentiment: Sentiment,
    /// Company known after this turn
    pub company: Option<String>,
    /// Ticket raised by this turn
    pub ticket: Option<Ticket>,
}

/// Customer support bot with ticket escalation
///
/// # Examples
///
/// ```no_run
/// use smart_escalate::{BotConfig, SupportBot, UserProfile};
///
/// # #[tokio::main]
/// # async fn main() -> smart_escalate::Result<()> {
/// let bot = SupportBot::from_config(&BotConfig::from_env()?)?;
/// let session_id = bot.create_session(UserProfile::guest()).await?;
///
/// let response = bot
///     .send_message(session_id, "My Jio network is not working")
///     .await?;
/// println!("{}", response.message);
/// # Ok(())
/// # }
/// ```
pub struct SupportBot {
    name: String,
    provider: Box<dyn LLMProvider>,
    email_sender: Option<Box<dyn EmailSender>>,
    classifier: Classifier,
    emitter: TicketEmitter,
    history_window: usize,
    session_store: Arc<dyn SessionStore>,
    turns_in_flight: Mutex<HashSet<SessionId>>,
}

impl SupportBot {
    /// Create a new bot builder
    pub fn builder() -> SupportBotBuilder {
        SupportBotBuilder::new()
    }

    /// Build a bot from configuration, with in-memory sessions
    pub fn from_config(config: &BotConfig) -> Result<Self> {
        let directory = CompanyDirectory::new(
            crate::directory::builtin_companies(),
            config.default_support_email.clone(),
        )?;

        let mut builder = SupportBot::builder()
            .name(config.bot_name.clone())
            .provider(config.build_provider()?)
            .classifier(Classifier::with_directory(directory)?)
            .history_window(config.history_window)
            .transcript_window(config.transcript_window);
        if let Some(sender) = config.build_email_sender()? {
            builder = builder.email_sender(sender);
        }
        builder.build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Start a conversation; the session opens with the welcome message
    pub async fn create_session(&self, user: UserProfile) -> Result<SessionId> {
        let session = Session::new(user);
        let session_id = self.session_store.create(session).await?;
        info!(session_id = %session_id, "Session created");
        Ok(session_id)
    }

    /// Get a session by ID
    pub async fn get_session(&self, session_id: &SessionId) -> Result<Option<Session>> {
        Ok(self.session_store.get(session_id).await?)
    }

    /// End a conversation session
    pub async fn end_session(&self, session_id: &SessionId) -> Result<()> {
        let mut session = self.load_session(session_id).await?;
        session.complete();
        self.session_store.update(session_id, session).await?;
        info!(session_id = %session_id, "Session ended");
        Ok(())
    }

    /// Tickets raised in a session, oldest first
    pub async fn tickets(&self, session_id: &SessionId) -> Result<Vec<Ticket>> {
        Ok(self.load_session(session_id).await?.tickets)
    }

    /// Hand a ticket to a support agent
    pub async fn assign_ticket(
        &self,
        session_id: &SessionId,
        ticket_id: &TicketId,
        agent: &str,
    ) -> Result<Ticket> {
        let ticket = self
            .update_ticket(session_id, ticket_id, |ticket| ticket.assign(agent))
            .await?;
        info!(ticket = %ticket.ticket_number, agent, "Ticket assigned");
        Ok(ticket)
    }

    /// Close a ticket once the company has dealt with it
    pub async fn resolve_ticket(
        &self,
        session_id: &SessionId,
        ticket_id: &TicketId,
    ) -> Result<Ticket> {
        let ticket = self
            .update_ticket(session_id, ticket_id, Ticket::resolve)
            .await?;
        info!(ticket = %ticket.ticket_number, "Ticket resolved");
        Ok(ticket)
    }

    async fn update_ticket<F>(
        &self,
        session_id: &SessionId,
        ticket_id: &TicketId,
        change: F,
    ) -> Result<Ticket>
    where
        F: FnOnce(&mut Ticket),
    {
        let mut session = self.load_session(session_id).await?;
        let ticket = session
            .ticket_mut(ticket_id)
            .ok_or_else(|| BotError::InvalidInput(format!("Unknown ticket: {}", ticket_id)))?;
        change(ticket);
        let ticket = ticket.clone();

        session.touch();
        self.session_store.update(session_id, session).await?;
        Ok(ticket)
    }

    /// Record the quick action's category and send its canned message
    ///
    /// Runs as a normal turn, so it also fails with
    /// [`BotError::TurnInProgress`] while another turn is in flight.
    pub async fn handle_quick_action(
        &self,
        session_id: SessionId,
        action: QuickAction,
    ) -> Result<BotResponse> {
        let _turn = TurnGuard::acquire(&self.turns_in_flight, session_id)?;
        debug!(session_id = %session_id, action = %action, "Quick action selected");
        self.run_turn(session_id, &action.message(), Some(action.category()))
            .await
    }

    /// Process one customer message
    ///
    /// Only one turn per session runs at a time; a second concurrent call for
    /// the same session fails with [`BotError::TurnInProgress`].
    pub async fn send_message(&self, session_id: SessionId, text: &str) -> Result<BotResponse> {
        let text = text.trim();
        if text.is_empty() {
            return Err(BotError::InvalidInput("Message is empty".to_string()));
        }

        let _turn = TurnGuard::acquire(&self.turns_in_flight, session_id)?;
        self.run_turn(session_id, text, None).await
    }

    /// One turn; the caller holds the session's turn guard
    async fn run_turn(
        &self,
        session_id: SessionId,
        text: &str,
        category: Option<&str>,
    ) -> Result<BotResponse> {
        info!(
            session_id = %session_id,
            message_length = text.len(),
            "Processing customer message"
        );

        let mut session = self.load_session(&session_id).await?;
        if !session.is_active() {
            return Err(BotError::SessionClosed(session_id));
        }
        if let Some(category) = category {
            session.conversation.context.issue_category = Some(category.to_string());
        }

        let last_assistant = session
            .conversation
            .last_assistant_text()
            .map(str::to_string);

        let sentiment = self.classifier.detect_sentiment(text);
        let intent = self
            .classifier
            .detect_escalation_intent(text, last_assistant.as_deref());
        let detected = self.classifier.detect_company(text).map(|c| c.name.clone());

        let history = session.conversation.recent(self.history_window).to_vec();
        session
            .conversation
            .add_message(Message::user(text).with_sentiment(sentiment));

        let context = &mut session.conversation.context;
        context.remember_issue(text);
        if let Some(company) = detected {
            context.remember_company(company);
        }
        let prior_attempts = context.attempt_count;
        context.record_attempt();

        let decision = decide(DecisionInput {
            escalation_intent: intent,
            pending_escalation: context.pending_escalation,
            company_known: context.detected_company.is_some(),
        });

        debug!(
            sentiment = sentiment.as_str(),
            intent,
            company = context.detected_company.as_deref(),
            attempts = context.attempt_count,
            ?decision,
            "Turn classified"
        );

        let (reply, ticket) = match (decision, context.detected_company.clone()) {
            (Decision::CreateTicket, Some(company)) => {
                let ticket = self
                    .raise_ticket(&mut session, &company, sentiment, prior_attempts, text)
                    .await;
                let reply = confirmation_message(&ticket, sentiment, self.email_sender.is_some());
                session.add_ticket(ticket.clone());
                (reply, Some(ticket))
            }
            (Decision::AskForCompany, _) | (Decision::CreateTicket, None) => {
                session.conversation.context.pending_escalation = true;
                let names: Vec<&str> = self
                    .classifier
                    .directory()
                    .companies()
                    .take(COMPANY_EXAMPLES)
                    .map(|c| c.name.as_str())
                    .collect();
                (company_question(&names), None)
            }
            (Decision::ConsultAssistant, _) => {
                if session.conversation.context.pending_escalation {
                    debug!(session_id = %session_id, "Pending escalation dropped");
                    session.conversation.context.pending_escalation = false;
                }
                let prompt = self.system_prompt(
                    &session.conversation.context,
                    session.conversation.len(),
                );
                let messages = chat_messages(&prompt, &history, text);
                (self.consult_assistant(messages).await, None)
            }
        };

        let mut reply_message = Message::assistant(reply.clone());
        if sentiment == Sentiment::Urgent {
            reply_message = reply_message.with_sentiment(sentiment);
        }
        session.conversation.add_message(reply_message);
        session.touch();

        let company = session.conversation.context.detected_company.clone();
        self.session_store.update(&session_id, session).await?;

        Ok(BotResponse {
            message: reply,
            decision,
            sentiment,
            company,
            ticket,
        })
    }

    /// Create the ticket and try to forward it; a failed send is logged, not returned
    async fn raise_ticket(
        &self,
        session: &mut Session,
        company: &str,
        sentiment: Sentiment,
        prior_attempts: u32,
        text: &str,
    ) -> Ticket {
        let context = &mut session.conversation.context;
        context.pending_escalation = false;

        let mut ticket = self.emitter.create_ticket(
            company,
            self.classifier.directory(),
            context,
            sentiment,
            prior_attempts,
            text,
            Utc::now(),
        );
        info!(
            ticket = %ticket.ticket_number,
            company,
            priority = %ticket.priority,
            "Ticket created"
        );

        let Some(sender) = &self.email_sender else {
            warn!(ticket = %ticket.ticket_number, "E-mail dispatch disabled, ticket not forwarded");
            return ticket;
        };

        let email = self.emitter.email_for(
            &ticket,
            &session.conversation.context,
            &session.conversation.messages,
        );
        match sender.send(&email).await {
            Ok(()) => {
                ticket.mark_email_sent();
                info!(
                    ticket = %ticket.ticket_number,
                    sender = sender.name(),
                    to = %ticket.company_email,
                    "Ticket e-mail sent"
                );
            }
            Err(e) => {
                warn!(
                    ticket = %ticket.ticket_number,
                    sender = sender.name(),
                    error = %e,
                    "Ticket e-mail failed"
                );
            }
        }
        ticket
    }

    /// Ask the LLM, turning provider failures into a reply for the customer
    async fn consult_assistant(&self, messages: Vec<Message>) -> String {
        trace!(provider = self.provider.name(), count = messages.len(), "Calling LLM provider");
        match self.provider.complete(messages).await {
            Ok(reply) => reply,
            Err(e) if e.is_missing_credentials() => {
                warn!(provider = self.provider.name(), error = %e, "LLM provider not configured");
                format!(
                    "I apologize, but I'm unable to connect to my AI service ({}). Please ensure the API key is configured correctly. Would you like me to create a support ticket for immediate assistance?",
                    self.provider.name()
                )
            }
            Err(BotError::EmptyCompletion(_)) => {
                warn!(provider = self.provider.name(), "LLM returned an empty completion");
                EMPTY_COMPLETION_REPLY.to_string()
            }
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "LLM request failed");
                format!(
                    "I'm experiencing technical difficulties connecting to my AI service ({}). Error: {}. To ensure you get immediate help, I recommend creating a support ticket. Would you like me to do that for you?",
                    self.provider.name(),
                    e
                )
            }
        }
    }

    fn system_prompt(&self, context: &ConversationContext, message_count: usize) -> String {
        format!(
            "You are {name}, an expert IT support assistant helping customers troubleshoot technology issues.\n\n\
             Current context:\n\
             - Customer: {customer}\n\
             - Issue category: {category}\n\
             - Company: {company}\n\
             - Attempt count: {attempts}\n\
             - Messages in conversation: {messages}\n\n\
             Response guidelines:\n\
             1. Give clear, numbered troubleshooting steps.\n\
             2. End with one follow-up question to confirm progress.\n\
             3. Keep responses under 300 words.\n\
             4. If the issue persists after several attempts, offer to create a support ticket.",
            name = self.name,
            customer = context.user.name,
            category = context.issue_category.as_deref().unwrap_or(DEFAULT_CATEGORY),
            company = context.detected_company.as_deref().unwrap_or("Not identified"),
            attempts = context.attempt_count,
            messages = message_count,
        )
    }

    async fn load_session(&self, session_id: &SessionId) -> Result<Session> {
        self.session_store
            .get(session_id)
            .await?
            .ok_or(BotError::SessionNotFound(*session_id))
    }
}

/// Reply confirming a new ticket
///
/// The wording avoids the escalation-offer phrases so a following "ok"
/// does not raise a second ticket.
fn confirmation_message(ticket: &Ticket, sentiment: Sentiment, dispatch_enabled: bool) -> String {
    let opening = match sentiment {
        Sentiment::Urgent => "I understand this is urgent. I've opened a priority ticket for you.",
        Sentiment::Frustrated => "I'm sorry for the trouble you've had. I've opened a ticket for you.",
        Sentiment::Neutral => "I've opened a ticket for you.",
    };

    let forwarding = if ticket.email_sent {
        format!(
            "Your ticket and our conversation have been forwarded to {} support at {}.",
            ticket.company, ticket.company_email
        )
    } else if dispatch_enabled {
        format!(
            "I couldn't forward it to {} automatically. Please contact them at {} and quote your ticket number.",
            ticket.company, ticket.company_email
        )
    } else {
        format!(
            "Please contact {} at {} and quote your ticket number.",
            ticket.company, ticket.company_email
        )
    };

    format!(
        "{}\n\nTicket Number: {}\nPriority: {}\nStatus: {}\n\n{}",
        opening,
        ticket.ticket_number,
        ticket.priority.as_str().to_uppercase(),
        ticket.status.label(),
        forwarding
    )
}

/// Marks a session as having a turn in flight until dropped
struct TurnGuard<'a> {
    turns: &'a Mutex<HashSet<SessionId>>,
    session_id: SessionId,
}

impl<'a> TurnGuard<'a> {
    fn acquire(turns: &'a Mutex<HashSet<SessionId>>, session_id: SessionId) -> Result<Self> {
        let mut in_flight = turns.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !in_flight.insert(session_id) {
            return Err(BotError::TurnInProgress(session_id));
        }
        Ok(Self { turns, session_id })
    }
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        let mut in_flight = self
            .turns
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        in_flight.remove(&self.session_id);
    }
}

/// Builder for creating SupportBot instances
pub struct SupportBotBuilder {
    name: Option<String>,
    provider: Option<Box<dyn LLMProvider>>,
    email_sender: Option<Box<dyn EmailSender>>,
    classifier: Option<Classifier>,
    history_window: usize,
    transcript_window: usize,
    session_store: Option<Arc<dyn SessionStore>>,
}

impl SupportBotBuilder {
    pub fn new() -> Self {
        Self {
            name: None,
            provider: None,
            email_sender: None,
            classifier: None,
            history_window: MAX_HISTORY_WINDOW,
            transcript_window: 10,
            session_store: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Box<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn email_sender(mut self, sender: Box<dyn EmailSender>) -> Self {
        self.email_sender = Some(sender);
        self
    }

    pub fn classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Prior messages sent with each LLM request, capped at [`MAX_HISTORY_WINDOW`]
    pub fn history_window(mut self, window: usize) -> Self {
        self.history_window = window.min(MAX_HISTORY_WINDOW);
        self
    }

    pub fn transcript_window(mut self, window: usize) -> Self {
        self.transcript_window = window;
        self
    }

    pub fn session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.session_store = Some(store);
        self
    }

    pub fn build(self) -> Result<SupportBot> {
        let name = self
            .name
            .ok_or_else(|| BotError::Configuration("Bot name is required".to_string()))?;

        let provider = self
            .provider
            .ok_or_else(|| BotError::Configuration("LLM provider is required".to_string()))?;

        let classifier = match self.classifier {
            Some(classifier) => classifier,
            None => Classifier::new()?,
        };

        let session_store = self
            .session_store
            .unwrap_or_else(|| Arc::new(InMemorySessionStore::new()));

        Ok(SupportBot {
            name,
            provider,
            email_sender: self.email_sender,
            classifier,
            emitter: TicketEmitter::new(self.transcript_window),
            history_window: self.history_window,
            session_store,
            turns_in_flight: Mutex::new(HashSet::new()),
        })
    }
}

impl Default for SupportBotBuilder {
    fn default() -> Self {
        Self::new()
    }
}
