//! Session storage backends
//!
//! This module provides a trait-based abstraction for session storage. The
//! bundled backend keeps sessions in memory for the life of the process.

use crate::error::StorageError;
use crate::session::Session;
use crate::types::SessionId;
use async_trait::async_trait;

pub mod memory;

/// Trait for session storage backends
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a new session in the store
    async fn create(&self, session: Session) -> Result<SessionId, StorageError>;

    /// Get a session by ID, `None` if it does not exist
    async fn get(&self, id: &SessionId) -> Result<Option<Session>, StorageError>;

    /// Replace an existing session
    async fn update(&self, id: &SessionId, session: Session) -> Result<(), StorageError>;

    /// Delete a session by ID
    async fn delete(&self, id: &SessionId) -> Result<(), StorageError>;

    /// List all session IDs in the store
    async fn list(&self) -> Result<Vec<SessionId>, StorageError>;

    /// Check if a session exists
    async fn exists(&self, id: &SessionId) -> Result<bool, StorageError> {
        Ok(self.get(id).await?.is_some())
    }
}
