// Company directory
//
// Ordered table of the service providers the bot can escalate to: display
// name, aliases customers use, and the support mailbox tickets are sent to.
// Table order is the tie-break when a message names several companies.

use crate::error::{BotError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Mailbox used when a ticket names a company missing from the directory
pub const DEFAULT_SUPPORT_EMAIL: &str = "support@smartescalate.ai";

/// A company the bot knows how to escalate to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
    pub aliases: Vec<String>,
    pub support_email: String,
}

impl Company {
    pub fn new<I, S>(name: impl Into<String>, aliases: I, support_email: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            aliases: aliases.into_iter().map(Into::into).collect(),
            support_email: support_email.into(),
        }
    }
}

/// Built-in telecom and broadband providers
pub fn builtin_companies() -> Vec<Company> {
    vec![
        Company::new("Jio", ["jio", "reliance jio", "jiofiber"], "care@jio.com"),
        Company::new(
            "Airtel",
            ["airtel", "bharti airtel", "airtel xstream"],
            "121@in.airtel.com",
        ),
        Company::new(
            "Vi",
            ["vi", "vodafone idea", "vodafone"],
            "customercare@myvi.in",
        ),
        Company::new("BSNL", ["bsnl"], "pgcell@bsnl.co.in"),
        Company::new("ACT Fibernet", ["act fibernet", "actcorp"], "helpdesk@actcorp.in"),
        Company::new("Tata Play", ["tata play", "tata sky"], "help@tataplay.com"),
    ]
}

struct CompiledCompany {
    company: Company,
    pattern: Regex,
}

/// Ordered company lookup with word-boundary alias matching
pub struct CompanyDirectory {
    entries: Vec<CompiledCompany>,
    default_email: String,
}

impl CompanyDirectory {
    /// Compile a directory; aliases match case-insensitively on word boundaries
    pub fn new(companies: Vec<Company>, default_email: impl Into<String>) -> Result<Self> {
        let entries = companies
            .into_iter()
            .map(|company| {
                let mut names: Vec<String> = company
                    .aliases
                    .iter()
                    .map(|a| regex::escape(a.trim()))
                    .filter(|a| !a.is_empty())
                    .collect();
                names.push(regex::escape(&company.name));
                let pattern = Regex::new(&format!(r"(?i)\b(?:{})\b", names.join("|")))
                    .map_err(|e| {
                        BotError::Configuration(format!(
                            "Invalid aliases for company {}: {}",
                            company.name, e
                        ))
                    })?;
                Ok(CompiledCompany { company, pattern })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            entries,
            default_email: default_email.into(),
        })
    }

    /// Directory of the built-in providers
    pub fn builtin() -> Result<Self> {
        Self::new(builtin_companies(), DEFAULT_SUPPORT_EMAIL)
    }

    /// First company, in table order, named in `text`
    pub fn detect(&self, text: &str) -> Option<&Company> {
        self.entries
            .iter()
            .find(|entry| entry.pattern.is_match(text))
            .map(|entry| &entry.company)
    }

    /// Look a company up by its display name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&Company> {
        self.entries
            .iter()
            .map(|entry| &entry.company)
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Support mailbox for a company, or the default mailbox when unmapped
    pub fn support_email(&self, name: &str) -> &str {
        self.get(name)
            .map(|c| c.support_email.as_str())
            .unwrap_or(&self.default_email)
    }

    pub fn default_email(&self) -> &str {
        &self.default_email
    }

    pub fn companies(&self) -> impl Iterator<Item = &Company> {
        self.entries.iter().map(|entry| &entry.company)
    }
}
