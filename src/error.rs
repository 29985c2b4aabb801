//! Error types for Smart Escalate
//!
//! This module provides the error taxonomy for every bot operation, built with thiserror.
//! Provider and e-mail failures are recovered inside a turn; the remaining variants
//! are returned to the caller.

use crate::types::SessionId;
use thiserror::Error;

/// Main error type for Smart Escalate operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BotError {
    /// Credentials for an external service are absent or still a placeholder
    #[error("Missing credentials for {service}: set {variable}")]
    MissingCredentials {
        service: String,
        variable: String,
    },

    /// LLM provider call failed (network, quota, malformed response)
    #[error("{provider} API error: {message}")]
    Provider { provider: String, message: String },

    /// LLM provider answered without any text
    #[error("{0} returned an empty completion")]
    EmptyCompletion(String),

    /// Transactional e-mail dispatch failed
    #[error("E-mail dispatch via {sender} failed: {message}")]
    Email { sender: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Session not found
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    /// Session was already ended
    #[error("Session is closed: {0}")]
    SessionClosed(SessionId),

    /// A turn is already running for this session
    #[error("A turn is already in progress for session {0}")]
    TurnInProgress(SessionId),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl BotError {
    /// Whether the error means a service was never reachable because it is not configured
    pub fn is_missing_credentials(&self) -> bool {
        matches!(self, BotError::MissingCredentials { .. })
    }
}

/// Storage-related errors
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StorageError {
    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Resource already exists
    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    /// Internal storage error
    #[error("Internal storage error: {0}")]
    Internal(String),
}

/// Type alias for Smart Escalate Result
pub type Result<T> = std::result::Result<T, BotError>;

/// Type alias for Storage Result
pub type StorageResult<T> = std::result::Result<T, StorageError>;
