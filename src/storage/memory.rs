//! In-memory session storage
//!
//! Sessions live in a HashMap behind an async RwLock and disappear with the
//! process, matching a chat widget that keeps no history between visits.

use crate::error::{StorageError, StorageResult};
use crate::session::Session;
use crate::storage::SessionStore;
use crate::types::SessionId;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::trace;

/// In-memory session storage implementation
///
/// # Examples
///
/// ```
/// use smart_escalate::storage::SessionStore;
/// use smart_escalate::{InMemorySessionStore, Session, UserProfile};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = InMemorySessionStore::new();
///     let session_id = store.create(Session::new(UserProfile::guest())).await?;
///
///     assert!(store.get(&session_id).await?.is_some());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// IDs of sessions that can still take messages
    pub async fn active_sessions(&self) -> Vec<SessionId> {
        self.sessions
            .read()
            .await
            .values()
            .filter(|s| s.is_active())
            .map(|s| s.id)
            .collect()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, session: Session) -> StorageResult<SessionId> {
        let id = session.id;
        let mut sessions = self.sessions.write().await;

        if sessions.contains_key(&id) {
            return Err(StorageError::AlreadyExists(format!("session {}", id)));
        }

        sessions.insert(id, session);
        trace!(session_id = %id, "Session stored");
        Ok(id)
    }

    async fn get(&self, id: &SessionId) -> StorageResult<Option<Session>> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn update(&self, id: &SessionId, session: Session) -> StorageResult<()> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(id) {
            Some(slot) => {
                *slot = session;
                Ok(())
            }
            None => Err(StorageError::NotFound(format!("session {}", id))),
        }
    }

    async fn delete(&self, id: &SessionId) -> StorageResult<()> {
        self.sessions
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(format!("session {}", id)))
    }

    async fn list(&self) -> StorageResult<Vec<SessionId>> {
        Ok(self.sessions.read().await.keys().copied().collect())
    }

    async fn exists(&self, id: &SessionId) -> StorageResult<bool> {
        Ok(self.sessions.read().await.contains_key(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::UserProfile;

    fn session() -> Session {
        Session::new(UserProfile::guest())
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = InMemorySessionStore::new();
        let s = session();
        let id = store.create(s.clone()).await.unwrap();

        assert_eq!(id, s.id);
        assert_eq!(store.get(&id).await.unwrap(), Some(s));
        assert!(store.exists(&id).await.unwrap());
    }

    #[tokio::test]
    async fn test_create_duplicate_session() {
        let store = InMemorySessionStore::new();
        let s = session();
        store.create(s.clone()).await.unwrap();

        let err = store.create(s).await.unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_update_replaces_session() {
        let store = InMemorySessionStore::new();
        let mut s = session();
        let id = store.create(s.clone()).await.unwrap();

        s.conversation.context.record_attempt();
        store.update(&id, s).await.unwrap();

        let stored = store.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.conversation.context.attempt_count, 1);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing() {
        let store = InMemorySessionStore::new();
        let s = session();
        let id = s.id;

        assert!(matches!(
            store.update(&id, s).await.unwrap_err(),
            StorageError::NotFound(_)
        ));
        assert!(matches!(
            store.delete(&id).await.unwrap_err(),
            StorageError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_active_sessions_excludes_completed() {
        let store = InMemorySessionStore::new();
        let open = session();
        let mut closed = session();
        closed.complete();

        store.create(open.clone()).await.unwrap();
        store.create(closed).await.unwrap();

        assert_eq!(store.len().await, 2);
        assert_eq!(store.list().await.unwrap().len(), 2);
        assert_eq!(store.active_sessions().await, vec![open.id]);
    }

    #[tokio::test]
    async fn test_concurrent_access() {
        let store = InMemorySessionStore::new();
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    for _ in 0..10 {
                        store.create(session()).await.unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(store.len().await, 20);
    }
}
