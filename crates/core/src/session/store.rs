//! In-memory session store keyed by user.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::chat::{MessageId, UserId};

use super::types::{
    Handle, SearchSession, SessionDraft, SessionError, SessionId, SessionSlot,
};

/// Holds at most one search session per user.
///
/// Sessions are built as [`SessionDraft`]s outside the map and swapped in
/// whole by [`SessionStore::publish`], so a lookup sees either the old
/// session, no session, or the complete new one.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<UserId, SessionSlot>>,
    next_id: AtomicU64,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard the user's current session and start a fresh draft.
    pub async fn start_session(&self, user: UserId) -> SessionDraft {
        let id = SessionId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        if let Some(old) = self.sessions.write().await.remove(&user) {
            debug!(user = %user, session = old.session.id.0, "Discarded previous session");
        }
        SessionDraft {
            user,
            id,
            identifiers: Vec::new(),
        }
    }

    /// Install a completed draft as the user's session.
    pub async fn publish(&self, draft: SessionDraft) -> SessionId {
        let SessionDraft {
            user,
            id,
            identifiers,
        } = draft;
        let slot = SessionSlot {
            session: Arc::new(SearchSession::new(id, identifiers)),
            anchor: None,
        };
        debug!(user = %user, session = id.0, handles = slot.session.len(), "Published session");
        self.sessions.write().await.insert(user, slot);
        id
    }

    /// Bind a published session to the message that carries its buttons.
    ///
    /// Returns false when the session has been replaced in the meantime.
    pub async fn anchor(&self, user: UserId, session: SessionId, message: MessageId) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&user) {
            Some(slot) if slot.session.id == session => {
                slot.anchor = Some(message);
                true
            }
            _ => false,
        }
    }

    /// Resolve a handle within a specific session.
    pub async fn resolve(
        &self,
        user: UserId,
        session: SessionId,
        handle: Handle,
    ) -> Result<String, SessionError> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&user)
            .filter(|slot| slot.session.id == session)
            .and_then(|slot| slot.session.get(handle))
            .map(str::to_string)
            .ok_or(SessionError::HandleNotFound { user, handle })
    }

    /// Resolve a handle pressed on `message`.
    ///
    /// Only the session anchored to that exact message answers, so buttons
    /// left on older result messages never reach a newer session.
    pub async fn resolve_anchored(
        &self,
        user: UserId,
        message: MessageId,
        handle: Handle,
    ) -> Result<String, SessionError> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&user)
            .filter(|slot| slot.anchor == Some(message))
            .and_then(|slot| slot.session.get(handle))
            .map(str::to_string)
            .ok_or(SessionError::HandleNotFound { user, handle })
    }

    /// Current session of a user, if any.
    pub async fn current(&self, user: UserId) -> Option<Arc<SearchSession>> {
        self.sessions
            .read()
            .await
            .get(&user)
            .map(|slot| Arc::clone(&slot.session))
    }

    /// Drop the user's session.
    pub async fn clear(&self, user: UserId) {
        self.sessions.write().await.remove(&user);
    }

    /// Number of users with a live session.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: UserId = UserId(1);
    const BOB: UserId = UserId(2);

    async fn publish(store: &SessionStore, user: UserId, ids: &[&str]) -> SessionId {
        let mut draft = store.start_session(user).await;
        for id in ids {
            draft.record(*id);
        }
        store.publish(draft).await
    }

    #[tokio::test]
    async fn test_resolve_returns_nth_identifier() {
        let store = SessionStore::new();
        let session = publish(&store, ALICE, &["m1", "m2", "m3"]).await;

        assert_eq!(store.resolve(ALICE, session, Handle(1)).await.unwrap(), "m1");
        assert_eq!(store.resolve(ALICE, session, Handle(3)).await.unwrap(), "m3");
        assert_eq!(
            store.resolve(ALICE, session, Handle(4)).await,
            Err(SessionError::HandleNotFound {
                user: ALICE,
                handle: Handle(4)
            })
        );
    }

    #[tokio::test]
    async fn test_new_search_invalidates_old_handles() {
        let store = SessionStore::new();
        let first = publish(&store, ALICE, &["old1", "old2"]).await;
        let second = publish(&store, ALICE, &["new1", "new2"]).await;

        assert_ne!(first, second);
        assert!(store.resolve(ALICE, first, Handle(1)).await.is_err());
        assert!(store.resolve(ALICE, first, Handle(2)).await.is_err());
        assert_eq!(store.resolve(ALICE, second, Handle(1)).await.unwrap(), "new1");
    }

    #[tokio::test]
    async fn test_starting_a_session_discards_the_previous_one() {
        let store = SessionStore::new();
        let first = publish(&store, ALICE, &["old"]).await;

        let _draft = store.start_session(ALICE).await;
        assert!(store.current(ALICE).await.is_none());
        assert!(store.resolve(ALICE, first, Handle(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_draft_is_invisible_until_published() {
        let store = SessionStore::new();
        let mut draft = store.start_session(ALICE).await;
        let id = draft.id();
        draft.record("m1");

        assert!(store.resolve(ALICE, id, Handle(1)).await.is_err());
        store.publish(draft).await;
        assert_eq!(store.resolve(ALICE, id, Handle(1)).await.unwrap(), "m1");
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let store = SessionStore::new();
        let alice = publish(&store, ALICE, &["alice"]).await;
        let bob = publish(&store, BOB, &["bob"]).await;

        assert_eq!(store.resolve(ALICE, alice, Handle(1)).await.unwrap(), "alice");
        assert_eq!(store.resolve(BOB, bob, Handle(1)).await.unwrap(), "bob");
        assert!(store.resolve(BOB, alice, Handle(1)).await.is_err());
        assert_eq!(store.len().await, 2);

        store.clear(ALICE).await;
        assert_eq!(store.len().await, 1);
        assert_eq!(store.resolve(BOB, bob, Handle(1)).await.unwrap(), "bob");
    }

    #[tokio::test]
    async fn test_anchored_resolution_rejects_stale_messages() {
        let store = SessionStore::new();
        let first = publish(&store, ALICE, &["old1", "old2", "old3"]).await;
        assert!(store.anchor(ALICE, first, MessageId(10)).await);
        assert_eq!(
            store.resolve_anchored(ALICE, MessageId(10), Handle(3)).await.unwrap(),
            "old3"
        );

        let second = publish(&store, ALICE, &["new1", "new2", "new3"]).await;
        // Not yet anchored: nothing answers
        assert!(store.resolve_anchored(ALICE, MessageId(10), Handle(3)).await.is_err());

        assert!(store.anchor(ALICE, second, MessageId(11)).await);
        assert!(store.resolve_anchored(ALICE, MessageId(10), Handle(3)).await.is_err());
        assert_eq!(
            store.resolve_anchored(ALICE, MessageId(11), Handle(3)).await.unwrap(),
            "new3"
        );
    }

    #[tokio::test]
    async fn test_anchor_ignores_replaced_session() {
        let store = SessionStore::new();
        let first = publish(&store, ALICE, &["old"]).await;
        let _second = publish(&store, ALICE, &["new"]).await;

        assert!(!store.anchor(ALICE, first, MessageId(5)).await);
        assert!(store.resolve_anchored(ALICE, MessageId(5), Handle(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_concurrent_searches_never_expose_partial_sessions() {
        let store = Arc::new(SessionStore::new());
        let mut tasks = Vec::new();
        for round in 0..20u32 {
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(async move {
                let mut draft = store.start_session(ALICE).await;
                for i in 1..=5 {
                    draft.record(format!("r{}-{}", round, i));
                    tokio::task::yield_now().await;
                }
                store.publish(draft).await;
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let session = store.current(ALICE).await.unwrap();
        assert_eq!(session.len(), 5);
        let prefix = session.get(Handle(1)).unwrap().split('-').next().unwrap().to_string();
        for i in 1..=5 {
            assert!(session.get(Handle(i)).unwrap().starts_with(&format!("{}-", prefix)));
        }
    }
}
