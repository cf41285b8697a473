//! Scripted in-memory backend for tests
//!
//! [`MockBackend`] implements [`Transport`]: routes are matched on method and
//! normalized path, every request is recorded, and unmatched requests answer
//! 404 so a missing script shows up as a test failure rather than a hang.

use crate::api::ApiClient;
use crate::model::user::{AuthUser, Role};
use crate::session::{Session, SessionHandle};
use crate::transport::{normalize_path, ApiRequest, ApiResponse, Transport, TransportError};
use async_trait::async_trait;
use bytes::Bytes;
use http::{Method, StatusCode};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

/// Scripted answer to a request
#[derive(Debug, Clone)]
pub enum MockReply {
    Response(ApiResponse),
    Fail(TransportError),
}

impl MockReply {
    pub fn json(status: u16, body: Value) -> Self {
        MockReply::Response(ApiResponse {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            content_type: Some("application/json".to_string()),
            body: Bytes::from(body.to_string()),
        })
    }

    pub fn status(status: u16) -> Self {
        MockReply::Response(ApiResponse {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            content_type: None,
            body: Bytes::new(),
        })
    }

    pub fn bytes(content_type: &str, body: impl Into<Bytes>) -> Self {
        MockReply::Response(ApiResponse {
            status: StatusCode::OK,
            content_type: Some(content_type.to_string()),
            body: body.into(),
        })
    }

    pub fn network_error(message: &str) -> Self {
        MockReply::Fail(TransportError::Request(message.to_string()))
    }
}

type Handler = Arc<dyn Fn(&ApiRequest, Option<&str>) -> MockReply + Send + Sync>;

struct Route {
    method: Method,
    path: String,
    once: VecDeque<MockReply>,
    handler: Option<Handler>,
}

/// A request as seen by the backend
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub request: ApiRequest,
    pub bearer: Option<String>,
}

#[derive(Default)]
pub struct MockBackend {
    routes: Mutex<Vec<Route>>,
    log: Mutex<Vec<RecordedRequest>>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn with_route<R>(&self, method: &Method, path: &str, f: impl FnOnce(&mut Route) -> R) -> R {
        let path = normalize_path(path);
        let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        let index = match routes.iter().position(|r| &r.method == method && r.path == path) {
            Some(index) => index,
            None => {
                routes.push(Route { method: method.clone(), path, once: VecDeque::new(), handler: None });
                routes.len() - 1
            }
        };
        f(&mut routes[index])
    }

    /// Answer every matching request with `reply`
    pub fn on(&self, method: Method, path: &str, reply: MockReply) {
        self.with_route(&method, path, |route| {
            route.handler = Some(Arc::new(move |_, _| reply.clone()));
        });
    }

    /// Answer the next matching request with `reply`, ahead of any `on` reply
    pub fn once(&self, method: Method, path: &str, reply: MockReply) {
        self.with_route(&method, path, |route| route.once.push_back(reply));
    }

    /// Compute the reply from the request and its bearer token
    pub fn on_fn<F>(&self, method: Method, path: &str, handler: F)
    where
        F: Fn(&ApiRequest, Option<&str>) -> MockReply + Send + Sync + 'static,
    {
        self.with_route(&method, path, |route| route.handler = Some(Arc::new(handler)));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn requests_to(&self, method: &Method, path: &str) -> Vec<ApiRequest> {
        let path = normalize_path(path);
        self.requests()
            .into_iter()
            .filter(|r| &r.request.method == method && r.request.path == path)
            .map(|r| r.request)
            .collect()
    }

    pub fn count(&self, method: &Method, path: &str) -> usize {
        self.requests_to(method, path).len()
    }

    /// Number of requests other than GET
    pub fn write_count(&self) -> usize {
        self.requests().iter().filter(|r| r.request.method != Method::GET).count()
    }

    pub fn reset_log(&self) {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Client signed in as an administrator, without token refresh
    pub async fn client(self: &Arc<Self>) -> ApiClient {
        self.client_as(AuthUser::new("admin-1", "admin@example.com", Role::Admin)).await
    }

    pub async fn client_as(self: &Arc<Self>, user: AuthUser) -> ApiClient {
        let session = SessionHandle::in_memory();
        // The in-memory store cannot fail
        let _ = session.establish(Session::new("test-token".into(), Some("test-refresh".into()), user)).await;
        ApiClient::new(self.clone(), session)
    }
}

#[async_trait]
impl Transport for MockBackend {
    async fn send(
        &self,
        request: ApiRequest,
        bearer: Option<String>,
    ) -> Result<ApiResponse, TransportError> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedRequest { request: request.clone(), bearer: bearer.clone() });

        let reply = {
            let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
            routes
                .iter_mut()
                .find(|r| r.method == request.method && r.path == request.path)
                .and_then(|route| match route.once.pop_front() {
                    Some(reply) => Some(reply),
                    None => route.handler.as_ref().map(|h| h(&request, bearer.as_deref())),
                })
        };

        match reply.unwrap_or_else(|| MockReply::status(404)) {
            MockReply::Response(response) => Ok(response),
            MockReply::Fail(err) => Err(err),
        }
    }
}
