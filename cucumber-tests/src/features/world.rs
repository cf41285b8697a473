use cucumber::World as CucumberWorld;
use http::Method;
use pdfdesk_core::error::ApiError;
use pdfdesk_core::notify::RecordingNotifier;
use pdfdesk_core::ordering::{DisplayOrderManager, ReorderOutcome};
use pdfdesk_core::registry::TemplateBoard;
use pdfdesk_core::testing::MockBackend;
use pdfdesk_core::workflow::FormGenerationWorkflow;
use pdfdesk_core::ApiClient;
use serde_json::{json, Value};
use std::sync::Arc;

/// State shared by the steps of one scenario.
///
/// Each scenario gets a fresh scripted backend; nothing leaves the process.
#[derive(CucumberWorld)]
pub struct PdfdeskWorld {
    pub backend: Arc<MockBackend>,
    pub notifier: Arc<RecordingNotifier>,
    pub workflow: Option<FormGenerationWorkflow>,
    pub ordering: Option<DisplayOrderManager>,
    pub board: Option<TemplateBoard>,
    pub last_outcome: Option<ReorderOutcome>,
    pub last_error: Option<ApiError>,
}

impl std::fmt::Debug for PdfdeskWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfdeskWorld")
            .field("requests", &self.backend.requests().len())
            .field("notices", &self.notifier.notices())
            .field("step", &self.workflow.as_ref().map(|w| w.step()))
            .field("last_outcome", &self.last_outcome)
            .field("last_error", &self.last_error)
            .finish()
    }
}

impl Default for PdfdeskWorld {
    fn default() -> Self {
        Self {
            backend: MockBackend::new(),
            notifier: Arc::new(RecordingNotifier::new()),
            workflow: None,
            ordering: None,
            board: None,
            last_outcome: None,
            last_error: None,
        }
    }
}

impl PdfdeskWorld {
    /// Client signed in as an administrator
    pub async fn client(&self) -> ApiClient {
        self.backend.client().await
    }

    /// Keep the error of a failed call for later `then` steps
    pub fn remember<T>(&mut self, result: Result<T, ApiError>) -> Option<T> {
        match result {
            Ok(value) => {
                self.last_error = None;
                Some(value)
            }
            Err(err) => {
                self.last_error = Some(err);
                None
            }
        }
    }

    pub fn workflow(&mut self) -> &mut FormGenerationWorkflow {
        self.workflow.as_mut().expect("No form generation wizard opened")
    }

    pub fn ordering(&mut self) -> &mut DisplayOrderManager {
        self.ordering.as_mut().expect("No display category selected")
    }

    pub fn board(&mut self) -> &mut TemplateBoard {
        self.board.as_mut().expect("No template list loaded")
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        let method = Method::from_bytes(method.as_bytes()).expect("Invalid HTTP method");
        self.backend.count(&method, path)
    }

    /// JSON bodies sent to `method path`, in order
    pub fn bodies(&self, method: &str, path: &str) -> Vec<Value> {
        let method = Method::from_bytes(method.as_bytes()).expect("Invalid HTTP method");
        self.backend
            .requests_to(&method, path)
            .iter()
            .map(|r| r.json_body().cloned().unwrap_or(Value::Null))
            .collect()
    }
}

/// Registry field as the backend lists it
pub fn field_json(id: &str, name: &str, display_category: &str, display_order: i64) -> Value {
    json!({
        "id": id,
        "name": name,
        "label": name.to_uppercase(),
        "field_type": "text",
        "field_category": "client",
        "display_category": display_category,
        "display_order": display_order,
    })
}

/// DRF page around `results`
pub fn page(results: Vec<Value>) -> Value {
    json!({"count": results.len(), "next": null, "previous": null, "results": results})
}
