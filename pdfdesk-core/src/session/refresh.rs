//! Access token refresh

use crate::error::ApiError;
use crate::transport::{ApiRequest, Transport};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

pub const REFRESH_PATH: &str = "auth/token/refresh/";

/// Exchanges a refresh token for a new access token
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> crate::Result<String>;
}

#[derive(Deserialize)]
struct RefreshResponse {
    access: String,
}

/// Refresher for the backend's SimpleJWT endpoint
pub struct JwtRefresher {
    transport: Arc<dyn Transport>,
}

impl JwtRefresher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl TokenRefresher for JwtRefresher {
    async fn refresh(&self, refresh_token: &str) -> crate::Result<String> {
        let request = ApiRequest::post(REFRESH_PATH).with_json(json!({ "refresh": refresh_token }));
        let response = self.transport.send(request, None).await?;
        if !response.is_success() {
            return Err(ApiError::from_response(&response));
        }
        let body: RefreshResponse = response.json()?;
        Ok(body.access)
    }
}
