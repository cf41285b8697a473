//! Shared session handle

use super::memory::MemorySessionStore;
use super::store::{Session, SessionStore};
use crate::error::ApiError;
use crate::model::user::AuthUser;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Cloneable view of the current session.
///
/// Reads are synchronous; mutations update the in-process copy first and
/// then write through to the backing store.
#[derive(Clone)]
pub struct SessionHandle {
    state: Arc<RwLock<Option<Session>>>,
    store: Arc<dyn SessionStore>,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

impl SessionHandle {
    pub fn new(store: impl SessionStore + 'static) -> Self {
        Self { state: Arc::new(RwLock::new(None)), store: Arc::new(store) }
    }

    /// Handle backed by a fresh [`MemorySessionStore`]
    pub fn in_memory() -> Self {
        Self::new(MemorySessionStore::new())
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<Session>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Session>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load the persisted session into memory. Returns whether one was found.
    pub async fn restore(&self) -> Result<bool, ApiError> {
        let loaded = self.store.load().await.map_err(|e| ApiError::Session(e.to_string()))?;
        let found = loaded.is_some();
        *self.write() = loaded;
        Ok(found)
    }

    pub async fn establish(&self, session: Session) -> Result<(), ApiError> {
        log::info!("Session established for {}", session.user.email);
        *self.write() = Some(session.clone());
        self.store.save(&session).await.map_err(|e| ApiError::Session(e.to_string()))
    }

    /// Swap in a refreshed access token, keeping identity and refresh token
    pub async fn replace_access_token(&self, token: String) -> Result<(), ApiError> {
        let updated = {
            let mut guard = self.write();
            match guard.as_mut() {
                Some(session) => {
                    session.access_token = token;
                    session.clone()
                }
                None => return Ok(()),
            }
        };
        self.store.save(&updated).await.map_err(|e| ApiError::Session(e.to_string()))
    }

    pub async fn clear(&self) -> Result<(), ApiError> {
        *self.write() = None;
        self.store.clear().await.map_err(|e| ApiError::Session(e.to_string()))
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    pub fn access_token(&self) -> Option<String> {
        self.read().as_ref().map(|s| s.access_token.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read().as_ref().and_then(|s| s.refresh_token.clone())
    }

    pub fn user(&self) -> Option<AuthUser> {
        self.read().as_ref().map(|s| s.user.clone())
    }

    pub fn snapshot(&self) -> Option<Session> {
        self.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::user::Role;

    fn session() -> Session {
        Session::new(
            "a-1".into(),
            Some("r-1".into()),
            AuthUser::new("u-1", "alice@example.com", Role::Admin),
        )
    }

    #[tokio::test]
    async fn test_establish_and_clear_write_through() {
        let store = MemorySessionStore::new();
        let handle = SessionHandle::new(store.clone());

        handle.establish(session()).await.unwrap();
        assert!(handle.is_authenticated());
        assert!(store.is_occupied());
        assert_eq!(handle.access_token().as_deref(), Some("a-1"));

        handle.clear().await.unwrap();
        assert!(!handle.is_authenticated());
        assert!(!store.is_occupied());
    }

    #[tokio::test]
    async fn test_replace_access_token_keeps_refresh_token() {
        let store = MemorySessionStore::new();
        let handle = SessionHandle::new(store.clone());
        handle.establish(session()).await.unwrap();

        handle.replace_access_token("a-2".into()).await.unwrap();
        assert_eq!(handle.access_token().as_deref(), Some("a-2"));
        assert_eq!(handle.refresh_token().as_deref(), Some("r-1"));
        assert_eq!(store.load().await.unwrap().unwrap().access_token, "a-2");
    }

    #[tokio::test]
    async fn test_restore_from_store() {
        let store = MemorySessionStore::new();
        store.save(&session()).await.unwrap();

        let handle = SessionHandle::new(store);
        assert!(!handle.is_authenticated());
        assert!(handle.restore().await.unwrap());
        assert_eq!(handle.user().unwrap().email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_replace_without_session_is_noop() {
        let handle = SessionHandle::in_memory();
        handle.replace_access_token("x".into()).await.unwrap();
        assert!(handle.access_token().is_none());
    }
}
