//! In-memory session storage
//!
//! Nothing survives the process. Used by tests and by callers that opt out of
//! session persistence.

use super::store::{Session, SessionStore};
use anyhow::Result;
use std::sync::{Arc, PoisonError, RwLock};

/// In-memory session store
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    slot: Arc<RwLock<Option<Session>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a session is currently stored
    pub fn is_occupied(&self) -> bool {
        self.slot.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<Session>> {
        Ok(self.slot.read().unwrap_or_else(PoisonError::into_inner).clone())
    }

    async fn save(&self, session: &Session) -> Result<()> {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
