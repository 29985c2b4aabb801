// Escalation decider
//
// Pure decision over the classifier output and the conversation context.
// The bot performs the chosen action; nothing here touches the network.

use crate::context::Sentiment;
use crate::ticket::TicketPriority;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Attempts after which an unresolved issue is treated as high priority
pub const HIGH_PRIORITY_ATTEMPTS: u32 = 2;

/// What the bot does with a customer turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Reply with an LLM completion
    ConsultAssistant,
    /// Create a ticket and forward it to the company
    CreateTicket,
    /// Escalation requested but no company known yet
    AskForCompany,
}

/// Inputs the decision rule looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionInput {
    pub escalation_intent: bool,
    pub pending_escalation: bool,
    pub company_known: bool,
}

/// Choose the action for a turn
///
/// An explicit request, or one left pending by an earlier clarifying
/// question, escalates once a company is known. A pending request only asks
/// again when the customer repeats it; otherwise the turn goes back to the
/// assistant and the caller drops the pending flag.
pub fn decide(input: DecisionInput) -> Decision {
    let decision = match (
        input.escalation_intent,
        input.pending_escalation,
        input.company_known,
    ) {
        (true, _, true) | (false, true, true) => Decision::CreateTicket,
        (true, _, false) => Decision::AskForCompany,
        (false, _, false) | (false, false, true) => Decision::ConsultAssistant,
    };
    debug!(?input, ?decision, "Escalation decision");
    decision
}

/// Ticket priority from this turn's sentiment and the turns that came before it
pub fn priority_for(sentiment: Sentiment, prior_attempts: u32) -> TicketPriority {
    match sentiment {
        Sentiment::Urgent => TicketPriority::Urgent,
        Sentiment::Frustrated => TicketPriority::High,
        Sentiment::Neutral if prior_attempts > HIGH_PRIORITY_ATTEMPTS => TicketPriority::High,
        Sentiment::Neutral => TicketPriority::Medium,
    }
}

/// Clarifying question asked when escalation has no company to go to
pub fn company_question(companies: &[&str]) -> String {
    if companies.is_empty() {
        return "I can raise a support ticket for you. Which company or service provider is this issue with?".to_string();
    }
    format!(
        "I can raise a support ticket for you. Which company or service provider is this issue with (for example {})?",
        companies.join(", ")
    )
}
