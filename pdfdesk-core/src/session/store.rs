//! Session storage trait and types

use crate::model::user::AuthUser;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Signed-in session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token attached to every request
    pub access_token: String,

    /// Token exchanged for a new access token after a 401
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Identity returned by login
    pub user: AuthUser,

    pub established_at: DateTime<Utc>,
}

impl Session {
    pub fn new(access_token: String, refresh_token: Option<String>, user: AuthUser) -> Self {
        Self { access_token, refresh_token, user, established_at: Utc::now() }
    }
}

/// Session persistence
///
/// Implement this trait to keep sessions somewhere other than memory or a
/// local JSON file.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the persisted session, if any
    async fn load(&self) -> Result<Option<Session>>;

    /// Persist the session, replacing any previous one
    async fn save(&self, session: &Session) -> Result<()>;

    /// Forget the persisted session
    async fn clear(&self) -> Result<()>;
}

#[async_trait::async_trait]
impl<S: SessionStore + ?Sized> SessionStore for std::sync::Arc<S> {
    async fn load(&self) -> Result<Option<Session>> {
        (**self).load().await
    }

    async fn save(&self, session: &Session) -> Result<()> {
        (**self).save(session).await
    }

    async fn clear(&self) -> Result<()> {
        (**self).clear().await
    }
}
