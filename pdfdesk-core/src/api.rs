//! Bearer-authenticated backend client
//!
//! [`ApiClient`] attaches the session's access token to every request. On a
//! 401 it asks the configured [`TokenRefresher`] for a new access token and
//! replays the request exactly once; if that also fails the session is
//! cleared and [`ApiError::Unauthorized`] is returned.

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::session::{JwtRefresher, SessionHandle, TokenRefresher};
use crate::transport::{ApiRequest, ApiResponse, HttpTransport, MultipartForm, Transport};
use crate::Result;
use bytes::Bytes;
use http::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    session: SessionHandle,
    refresher: Option<Arc<dyn TokenRefresher>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("session", &self.session)
            .field("refresh", &self.refresher.is_some())
            .finish()
    }
}

impl ApiClient {
    /// Client without token refresh
    pub fn new(transport: Arc<dyn Transport>, session: SessionHandle) -> Self {
        Self { transport, session, refresher: None }
    }

    /// Production client: `reqwest` transport and SimpleJWT refresh
    pub fn from_config(config: &ApiConfig, session: SessionHandle) -> anyhow::Result<Self> {
        let transport: Arc<dyn Transport> =
            Arc::new(HttpTransport::new(&config.base_url, config.timeout())?);
        let refresher = Arc::new(JwtRefresher::new(transport.clone()));
        Ok(Self::new(transport, session).with_refresher(refresher))
    }

    pub fn with_refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Send without credentials and without refresh handling (login)
    pub async fn execute_anonymous(&self, request: ApiRequest) -> Result<ApiResponse> {
        log::debug!("{} {} (anonymous)", request.method, request.path);
        let response = self.transport.send(request, None).await?;
        Self::check(response)
    }

    /// Send an authenticated request, mapping non-2xx statuses to [`ApiError`]
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        log::debug!("{} {}", request.method, request.path);
        let response = self.transport.send(request.clone(), self.session.access_token()).await?;
        if response.status != StatusCode::UNAUTHORIZED {
            return Self::check(response);
        }

        match self.replay_after_refresh(request).await? {
            Some(response) => Self::check(response),
            None => {
                log::warn!("Session rejected by backend, signing out");
                self.session.clear().await?;
                Err(ApiError::Unauthorized)
            }
        }
    }

    async fn replay_after_refresh(&self, request: ApiRequest) -> Result<Option<ApiResponse>> {
        let (Some(refresher), Some(refresh_token)) = (&self.refresher, self.session.refresh_token())
        else {
            return Ok(None);
        };

        let access = match refresher.refresh(&refresh_token).await {
            Ok(access) => access,
            Err(e) => {
                log::warn!("Token refresh failed: {}", e);
                return Ok(None);
            }
        };
        self.session.replace_access_token(access.clone()).await?;

        let response = self.transport.send(request, Some(access)).await?;
        if response.status == StatusCode::UNAUTHORIZED {
            Ok(None)
        } else {
            Ok(Some(response))
        }
    }

    fn check(response: ApiResponse) -> Result<ApiResponse> {
        if response.is_success() {
            Ok(response)
        } else {
            let err = ApiError::from_response(&response);
            log::debug!("Request failed: {}", err);
            Err(err)
        }
    }

    fn decode<T: DeserializeOwned>(response: &ApiResponse) -> Result<T> {
        response.json().map_err(ApiError::from)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.get_with(path, Vec::new()).await
    }

    pub async fn get_with<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<T> {
        let response = self.execute(ApiRequest::get(path).with_query(query)).await?;
        Self::decode(&response)
    }

    /// Fetch a raw body (PDF, ZIP, CSV)
    pub async fn get_bytes(&self, path: &str, query: Vec<(String, String)>) -> Result<ApiResponse> {
        self.execute(ApiRequest::get(path).with_query(query)).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send_json(Method::POST, path, body).await
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send_json(Method::PUT, path, body).await
    }

    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send_json(Method::PATCH, path, body).await
    }

    /// POST with no body (toggle endpoints)
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.execute(ApiRequest::post(path)).await?;
        Self::decode(&response)
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.execute(ApiRequest::delete(path)).await?;
        Ok(())
    }

    pub async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let value = serde_json::to_value(body)?;
        let response = self.execute(ApiRequest::new(method, path).with_json(value)).await?;
        Self::decode(&response)
    }

    pub async fn send_multipart<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        form: MultipartForm,
    ) -> Result<T> {
        let response = self.execute(ApiRequest::new(method, path).with_multipart(form)).await?;
        Self::decode(&response)
    }
}

/// Downloaded file body with the name it should be saved under
#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl Download {
    pub fn from_response(file_name: impl Into<String>, response: ApiResponse) -> Self {
        Self { file_name: file_name.into(), content_type: response.content_type, bytes: response.body }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::user::{AuthUser, Role};
    use crate::session::Session;
    use crate::testing::{MockBackend, MockReply};
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct StaticRefresher(std::result::Result<String, ()>);

    #[async_trait]
    impl TokenRefresher for StaticRefresher {
        async fn refresh(&self, _refresh_token: &str) -> Result<String> {
            self.0.clone().map_err(|_| ApiError::Unauthorized)
        }
    }

    async fn signed_in(backend: &Arc<MockBackend>) -> ApiClient {
        let session = SessionHandle::in_memory();
        session
            .establish(Session::new(
                "stale".into(),
                Some("refresh".into()),
                AuthUser::new("u-1", "a@example.com", Role::Admin),
            ))
            .await
            .unwrap();
        ApiClient::new(backend.clone(), session)
    }

    #[tokio::test]
    async fn test_bearer_token_is_attached() {
        let backend = MockBackend::new();
        backend.on(Method::GET, "users/me/", MockReply::json(200, json!({"ok": true})));
        let client = signed_in(&backend).await;

        let _: Value = client.get("/users/me").await.unwrap();
        let recorded = backend.requests();
        assert_eq!(recorded[0].bearer.as_deref(), Some("stale"));
        assert_eq!(recorded[0].request.path, "users/me/");
    }

    #[tokio::test]
    async fn test_refresh_and_replay_once() {
        let backend = MockBackend::new();
        backend.on_fn(Method::GET, "forms/templates/", |_, bearer| {
            if bearer == Some("fresh") {
                MockReply::json(200, json!([]))
            } else {
                MockReply::status(401)
            }
        });
        let client = signed_in(&backend)
            .await
            .with_refresher(Arc::new(StaticRefresher(Ok("fresh".into()))));

        let templates: Vec<Value> = client.get("forms/templates").await.unwrap();
        assert!(templates.is_empty());
        assert_eq!(backend.count(&Method::GET, "forms/templates/"), 2);
        assert_eq!(client.session().access_token().as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_failed_refresh_clears_session() {
        let backend = MockBackend::new();
        backend.on(Method::GET, "forms/templates/", MockReply::status(401));
        let client =
            signed_in(&backend).await.with_refresher(Arc::new(StaticRefresher(Err(()))));

        let result: Result<Value> = client.get("forms/templates").await;
        assert!(matches!(result, Err(ApiError::Unauthorized)));
        assert!(!client.session().is_authenticated());
        assert_eq!(backend.count(&Method::GET, "forms/templates/"), 1);
    }

    #[tokio::test]
    async fn test_second_401_is_not_retried_again() {
        let backend = MockBackend::new();
        backend.on(Method::GET, "forms/templates/", MockReply::status(401));
        let client = signed_in(&backend)
            .await
            .with_refresher(Arc::new(StaticRefresher(Ok("fresh".into()))));

        let result: Result<Value> = client.get("forms/templates").await;
        assert!(matches!(result, Err(ApiError::Unauthorized)));
        assert_eq!(backend.count(&Method::GET, "forms/templates/"), 2);
    }

    #[tokio::test]
    async fn test_network_failure_maps_to_network_error() {
        let backend = MockBackend::new();
        backend.on(Method::GET, "users/me/", MockReply::network_error("connection refused"));
        let client = signed_in(&backend).await;

        let result: Result<Value> = client.get("users/me").await;
        assert!(matches!(result, Err(ApiError::Network(m)) if m.contains("connection refused")));
    }
}
