//! Types for per-user search sessions.

use std::fmt;

use thiserror::Error;

use crate::chat::{MessageId, UserId};

/// Process-unique id of a search session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

/// 1-based position of a result within its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(pub u32);

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A published, immutable handle → identifier mapping.
#[derive(Debug, Clone)]
pub struct SearchSession {
    pub id: SessionId,
    identifiers: Vec<String>,
}

impl SearchSession {
    pub(super) fn new(id: SessionId, identifiers: Vec<String>) -> Self {
        Self { id, identifiers }
    }

    /// Identifier bound to `handle`, if the handle belongs to this session.
    pub fn get(&self, handle: Handle) -> Option<&str> {
        let index = (handle.0 as usize).checked_sub(1)?;
        self.identifiers.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }
}

/// A session being filled in; invisible to lookups until published.
#[derive(Debug)]
pub struct SessionDraft {
    pub(super) user: UserId,
    pub(super) id: SessionId,
    pub(super) identifiers: Vec<String>,
}

impl SessionDraft {
    /// Bind the next handle to `identifier`.
    pub fn record(&mut self, identifier: impl Into<String>) -> Handle {
        self.identifiers.push(identifier.into());
        Handle(self.identifiers.len() as u32)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn user(&self) -> UserId {
        self.user
    }
}

/// Errors from session lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Handle {handle} not found for user {user}")]
    HandleNotFound { user: UserId, handle: Handle },
}

/// Installed session plus the message carrying its buttons.
#[derive(Debug, Clone)]
pub(super) struct SessionSlot {
    pub session: std::sync::Arc<SearchSession>,
    pub anchor: Option<MessageId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_get_is_one_based() {
        let session = SearchSession::new(
            SessionId(1),
            vec!["a".to_string(), "b".to_string()],
        );
        assert_eq!(session.get(Handle(0)), None);
        assert_eq!(session.get(Handle(1)), Some("a"));
        assert_eq!(session.get(Handle(2)), Some("b"));
        assert_eq!(session.get(Handle(3)), None);
        assert_eq!(session.len(), 2);
    }

    #[test]
    fn test_draft_allocates_sequential_handles() {
        let mut draft = SessionDraft {
            user: UserId(1),
            id: SessionId(9),
            identifiers: Vec::new(),
        };
        assert_eq!(draft.record("x"), Handle(1));
        assert_eq!(draft.record("y"), Handle(2));
        assert_eq!(draft.record("z"), Handle(3));
        assert_eq!(draft.id(), SessionId(9));
    }
}
