// Conversation classifier
//
// Maps message text to sentiment, company, and escalation intent. All
// checks are ordered keyword tables; the order of each table is its
// precedence.

use crate::context::Sentiment;
use crate::directory::{Company, CompanyDirectory};
use crate::error::{BotError, Result};
use aho_corasick::{AhoCorasick, AhoCorasickBuilder};
use regex::Regex;
use tracing::trace;

pub const URGENT_KEYWORDS: &[&str] = &["urgent", "critical", "emergency", "immediately", "asap"];

pub const FRUSTRATED_KEYWORDS: &[&str] = &["frustrated", "annoyed", "angry", "terrible", "worst"];

/// Phrases that request a ticket on their own
pub const ESCALATION_PHRASES: &[&str] = &[
    "ticket",
    "escalate",
    "escalation",
    "complaint",
    "human",
    "agent",
    "real person",
    "representative",
    "speak to someone",
    "talk to someone",
    "customer care",
];

/// Phrases marking an assistant message as an offer to escalate
pub const ESCALATION_OFFERS: &[&str] = &[
    "create a support ticket",
    "support ticket",
    "create a ticket",
    "raise a ticket",
    "would you like me to",
    "escalate",
];

pub const AFFIRMATIVES: &[&str] = &[
    "yes", "yeah", "yep", "yup", "sure", "ok", "okay", "please", "confirm", "go ahead", "do it",
];

/// Words that turn an affirmative reply into a refusal ("no please don't")
pub const NEGATIONS: &[&str] = &["no", "not", "nope", "never", "don't", "dont", "do not", "cancel"];

/// Case-insensitive substring matcher over a fixed keyword list
pub struct KeywordSet {
    matcher: AhoCorasick,
}

impl KeywordSet {
    pub fn new(keywords: &[&str]) -> Result<Self> {
        let matcher = AhoCorasickBuilder::new()
            .ascii_case_insensitive(true)
            .build(keywords)
            .map_err(|e| BotError::Configuration(format!("Invalid keyword list: {}", e)))?;
        Ok(Self { matcher })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.matcher.is_match(text)
    }
}

/// Stateless text classifier
pub struct Classifier {
    sentiment_rules: Vec<(KeywordSet, Sentiment)>,
    escalation_phrases: KeywordSet,
    escalation_offers: KeywordSet,
    affirmative: Regex,
    negation: Regex,
    directory: CompanyDirectory,
}

impl Classifier {
    /// Classifier over the built-in keyword tables and company directory
    pub fn new() -> Result<Self> {
        Self::with_directory(CompanyDirectory::builtin()?)
    }

    pub fn with_directory(directory: CompanyDirectory) -> Result<Self> {
        let affirmative = word_regex(AFFIRMATIVES, "affirmative")?;
        let negation = word_regex(NEGATIONS, "negation")?;

        Ok(Self {
            // urgency is listed first so it wins over frustration
            sentiment_rules: vec![
                (KeywordSet::new(URGENT_KEYWORDS)?, Sentiment::Urgent),
                (KeywordSet::new(FRUSTRATED_KEYWORDS)?, Sentiment::Frustrated),
            ],
            escalation_phrases: KeywordSet::new(ESCALATION_PHRASES)?,
            escalation_offers: KeywordSet::new(ESCALATION_OFFERS)?,
            affirmative,
            negation,
            directory,
        })
    }

    /// Sentiment of a message; the first matching rule wins
    pub fn detect_sentiment(&self, text: &str) -> Sentiment {
        let sentiment = self
            .sentiment_rules
            .iter()
            .fold(None, |found, (keywords, sentiment)| {
                found.or_else(|| keywords.is_match(text).then_some(*sentiment))
            })
            .unwrap_or_default();
        trace!(sentiment = sentiment.as_str(), "Sentiment detected");
        sentiment
    }

    /// Company named in the message, first directory entry wins
    pub fn detect_company(&self, text: &str) -> Option<&Company> {
        let company = self.directory.detect(text);
        trace!(company = company.map(|c| c.name.as_str()), "Company detection");
        company
    }

    /// Whether the customer is asking for a ticket
    ///
    /// Explicit escalation phrases always count. A bare affirmative ("yes",
    /// "sure", "go ahead") counts only when the previous assistant message
    /// offered to escalate, and the reply carries no negation.
    pub fn detect_escalation_intent(&self, text: &str, last_assistant_text: Option<&str>) -> bool {
        if self.escalation_phrases.is_match(text) {
            trace!("Explicit escalation phrase found");
            return true;
        }

        let offered = last_assistant_text
            .map(|prior| self.escalation_offers.is_match(prior))
            .unwrap_or(false);

        let text = text.trim();
        let confirmed =
            offered && self.affirmative.is_match(text) && !self.negation.is_match(text);
        trace!(offered, confirmed, "Contextual escalation check");
        confirmed
    }

    pub fn directory(&self) -> &CompanyDirectory {
        &self.directory
    }
}

/// Case-insensitive whole-word alternation over `words`
fn word_regex(words: &[&str], what: &str) -> Result<Regex> {
    let escaped: Vec<String> = words.iter().map(|w| regex::escape(w)).collect();
    Regex::new(&format!(r"(?i)\b(?:{})\b", escaped.join("|")))
        .map_err(|e| BotError::Configuration(format!("Invalid {} list: {}", what, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> Classifier {
        Classifier::new().unwrap()
    }

    #[test]
    fn test_sentiment_default_neutral() {
        assert_eq!(
            classifier().detect_sentiment("My internet is slow"),
            Sentiment::Neutral
        );
    }

    #[test]
    fn test_sentiment_keywords_case_insensitive() {
        let c = classifier();
        assert_eq!(c.detect_sentiment("Please fix this ASAP"), Sentiment::Urgent);
        assert_eq!(c.detect_sentiment("This is the WORST"), Sentiment::Frustrated);
    }

    #[test]
    fn test_urgency_takes_precedence_over_frustration() {
        let c = classifier();
        for urgent in URGENT_KEYWORDS {
            for frustrated in FRUSTRATED_KEYWORDS {
                let text = format!("I am {} and this is {}", frustrated, urgent);
                assert_eq!(c.detect_sentiment(&text), Sentiment::Urgent, "{}", text);
            }
        }
    }

    #[test]
    fn test_explicit_phrase_ignores_prior_text() {
        let c = classifier();
        for phrase in ESCALATION_PHRASES {
            let text = format!("can you {} this", phrase);
            assert!(c.detect_escalation_intent(&text, None));
            assert!(c.detect_escalation_intent(&text, Some("Try restarting the router.")));
        }
    }

    #[test]
    fn test_yes_after_offer() {
        let c = classifier();
        let offer = "Would you like me to create a support ticket for immediate assistance?";
        assert!(c.detect_escalation_intent("yes", Some(offer)));
        assert!(c.detect_escalation_intent("  Sure, go ahead ", Some(offer)));
    }

    #[test]
    fn test_yes_without_offer() {
        let c = classifier();
        assert!(!c.detect_escalation_intent("yes", Some("Did restarting the router help?")));
        assert!(!c.detect_escalation_intent("yes", None));
    }

    #[test]
    fn test_affirmative_must_be_a_word() {
        let c = classifier();
        let offer = "I can escalate this for you.";
        assert!(!c.detect_escalation_intent("eyesight", Some(offer)));
        assert!(!c.detect_escalation_intent("no thanks", Some(offer)));
    }

    #[test]
    fn test_documented_phrases_escalate() {
        let c = classifier();
        let explicit = [
            ("I want a ticket", "ticket"),
            ("please escalate", "escalate"),
            ("I want to speak to a human", "human"),
            ("connect me to an agent", "agent"),
            ("get me a representative", "representative"),
            ("I have a complaint", "complaint"),
            ("can I speak to someone", "speak to someone"),
        ];
        for (text, phrase) in explicit {
            assert!(c.detect_escalation_intent(text, None), "{}", phrase);
        }

        let offers = [
            "Shall I create a support ticket?",
            "Would you like me to connect you with our team?",
            "I can escalate this for you.",
        ];
        for offer in offers {
            for word in AFFIRMATIVES {
                assert!(c.detect_escalation_intent(word, Some(offer)), "{} / {}", word, offer);
            }
        }
    }

    #[test]
    fn test_negated_affirmative_does_not_confirm() {
        let c = classifier();
        let offer = "Would you like me to create a support ticket?";
        for reply in ["no please don't", "not ok", "nope, it's fine", "do not do it", "never mind, ok"] {
            assert!(!c.detect_escalation_intent(reply, Some(offer)), "{}", reply);
        }
        assert!(c.detect_escalation_intent("ok, please do", Some(offer)));
    }

    #[test]
    fn test_detect_company_delegates_to_directory() {
        let c = classifier();
        assert_eq!(
            c.detect_company("My Jio network is not working").unwrap().name,
            "Jio"
        );
        assert!(c.detect_company("my router is broken").is_none());
    }
}
