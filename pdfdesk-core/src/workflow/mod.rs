//! Form generation wizard
//!
//! Three linear steps: select templates, generate, review. `next` from the
//! first step requires at least one selected template; from the second it
//! submits the batch and advances only on success. `reset` is only available
//! from the review step and always returns to template selection.
//!
//! Quota is refreshed before selection starts and after every successful
//! generation. It is shown, never used to gate `next`.

pub mod generator;

pub use generator::{FormGenerator, BATCHES_PATH, QUOTA_EXCEEDED_MESSAGE};

use crate::api::Download;
use crate::error::ApiError;
use crate::model::batch::{FormGenerationBatch, GenerateFormsRequest};
use crate::model::template::Template;
use crate::notify::Notifier;
use crate::quota::{QuotaService, QuotaSnapshot};
use crate::Result;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

pub const NO_TEMPLATE_SELECTED: &str = "Please select at least one template.";
pub const GENERATION_FAILED: &str = "Failed to generate forms";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStep {
    SelectingTemplates,
    Generating,
    ReviewingResults,
}

impl WorkflowStep {
    pub fn index(self) -> usize {
        match self {
            WorkflowStep::SelectingTemplates => 0,
            WorkflowStep::Generating => 1,
            WorkflowStep::ReviewingResults => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WorkflowStep::SelectingTemplates => "Select Templates",
            WorkflowStep::Generating => "Generate Forms",
            WorkflowStep::ReviewingResults => "Preview & Download",
        }
    }
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub struct FormGenerationWorkflow {
    generator: FormGenerator,
    quota: QuotaService,
    notifier: Arc<dyn Notifier>,
    client_id: String,
    client_data: Map<String, Value>,
    insurer: Option<String>,
    step: WorkflowStep,
    selected: Vec<Template>,
    batch: Option<FormGenerationBatch>,
    quota_snapshot: Option<QuotaSnapshot>,
}

impl FormGenerationWorkflow {
    pub fn new(
        generator: FormGenerator,
        quota: QuotaService,
        notifier: Arc<dyn Notifier>,
        client_id: impl Into<String>,
        client_data: Map<String, Value>,
    ) -> Self {
        Self {
            generator,
            quota,
            notifier,
            client_id: client_id.into(),
            client_data,
            insurer: None,
            step: WorkflowStep::SelectingTemplates,
            selected: Vec::new(),
            batch: None,
            quota_snapshot: None,
        }
    }

    pub fn with_insurer(mut self, insurer: impl Into<String>) -> Self {
        self.insurer = Some(insurer.into());
        self
    }

    /// Refresh quota ahead of template selection
    pub async fn start(&mut self) {
        self.refresh_quota().await;
    }

    pub fn step(&self) -> WorkflowStep {
        self.step
    }

    pub fn selected(&self) -> &[Template] {
        &self.selected
    }

    pub fn is_selected(&self, template_id: &str) -> bool {
        self.selected.iter().any(|t| t.id == template_id)
    }

    pub fn batch(&self) -> Option<&FormGenerationBatch> {
        self.batch.as_ref()
    }

    pub fn quota(&self) -> Option<&QuotaSnapshot> {
        self.quota_snapshot.as_ref()
    }

    /// Add or remove a template by id; ignored outside template selection
    pub fn toggle_template(&mut self, template: Template) {
        if self.step != WorkflowStep::SelectingTemplates {
            return;
        }
        if let Some(pos) = self.selected.iter().position(|t| t.id == template.id) {
            self.selected.remove(pos);
        } else {
            self.selected.push(template);
        }
    }

    /// Advance one step, returning the step the wizard ends on
    pub async fn next(&mut self) -> WorkflowStep {
        match self.step {
            WorkflowStep::SelectingTemplates => {
                if self.selected.is_empty() {
                    self.notifier.error(NO_TEMPLATE_SELECTED);
                } else {
                    self.step = WorkflowStep::Generating;
                }
            }
            WorkflowStep::Generating => {
                if self.generate().await.is_ok() {
                    self.step = WorkflowStep::ReviewingResults;
                    self.refresh_quota().await;
                }
            }
            WorkflowStep::ReviewingResults => {}
        }
        self.step
    }

    async fn generate(&mut self) -> Result<()> {
        let request = GenerateFormsRequest {
            client_id: self.client_id.clone(),
            template_ids: self.selected.iter().map(|t| t.id.clone()).collect(),
            client_data: self.client_data.clone(),
            insurer: self.insurer.clone(),
        };

        match self.generator.generate(&request).await {
            Ok(batch) => {
                log::info!(
                    "Batch {} for client {}: {} of {} form(s) completed",
                    batch.id,
                    self.client_id,
                    batch.completed_forms,
                    batch.total_forms
                );
                self.batch = Some(batch);
                Ok(())
            }
            Err(ApiError::QuotaExceeded(message)) => {
                self.notifier.error(&message);
                Err(ApiError::QuotaExceeded(message))
            }
            Err(err) => {
                log::error!("Error generating forms: {}", err);
                self.notifier.error(GENERATION_FAILED);
                Err(err)
            }
        }
    }

    /// Back to an empty selection; only from the review step
    pub fn reset(&mut self) -> WorkflowStep {
        if self.step == WorkflowStep::ReviewingResults {
            self.step = WorkflowStep::SelectingTemplates;
            self.selected.clear();
            self.batch = None;
        }
        self.step
    }

    pub async fn download_form(&self, form_id: &str) -> Result<Download> {
        self.generator.download_form(form_id).await
    }

    /// Zip of the current batch
    pub async fn download_batch(&self) -> Result<Download> {
        let batch = self.batch.as_ref().ok_or_else(|| ApiError::NotFound("no generated batch".to_string()))?;
        self.generator.download_batch(&batch.id).await
    }

    async fn refresh_quota(&mut self) {
        match self.quota.snapshot().await {
            Ok(snapshot) => self.quota_snapshot = Some(snapshot),
            Err(err) => log::warn!("Failed to refresh quota usage: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::template::TemplateCategory;
    use crate::notify::RecordingNotifier;
    use crate::registry::users::QUOTA_USAGE_PATH;
    use crate::testing::{MockBackend, MockReply};
    use http::Method;
    use serde_json::json;

    fn quota_reply(used: u64) -> MockReply {
        MockReply::json(200, json!({"daily_usage": used, "daily_quota": 10, "has_daily_quota": true}))
    }

    async fn wizard(backend: &Arc<MockBackend>) -> (FormGenerationWorkflow, Arc<RecordingNotifier>) {
        let client = backend.client().await;
        let notifier = Arc::new(RecordingNotifier::new());
        let workflow = FormGenerationWorkflow::new(
            FormGenerator::new(client.clone()),
            QuotaService::new(client),
            notifier.clone(),
            "c-1",
            Map::new(),
        );
        (workflow, notifier)
    }

    fn template(id: &str) -> Template {
        Template::new(id, format!("Template {}", id), TemplateCategory::Broker)
    }

    #[tokio::test]
    async fn test_next_requires_a_template() {
        let backend = MockBackend::new();
        let (mut workflow, notifier) = wizard(&backend).await;

        assert_eq!(workflow.next().await.index(), 0);
        assert_eq!(notifier.messages(), [NO_TEMPLATE_SELECTED]);

        workflow.toggle_template(template("1"));
        workflow.toggle_template(template("1"));
        assert_eq!(workflow.next().await, WorkflowStep::SelectingTemplates);
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn test_quota_refusal_stays_on_generating() {
        let backend = MockBackend::new();
        backend.on(Method::GET, QUOTA_USAGE_PATH, quota_reply(10));
        backend.on(Method::POST, BATCHES_PATH, MockReply::json(403, json!({"detail": "quota"})));
        let (mut workflow, notifier) = wizard(&backend).await;
        workflow.start().await;

        workflow.toggle_template(template("1"));
        assert_eq!(workflow.next().await, WorkflowStep::Generating);
        assert_eq!(workflow.next().await.index(), 1);
        assert_eq!(notifier.messages(), [QUOTA_EXCEEDED_MESSAGE]);
        assert_eq!(backend.count(&Method::POST, BATCHES_PATH), 1);
        assert_eq!(backend.count(&Method::GET, QUOTA_USAGE_PATH), 1);
    }

    #[tokio::test]
    async fn test_other_failure_is_generic() {
        let backend = MockBackend::new();
        backend.on(Method::POST, BATCHES_PATH, MockReply::status(500));
        let (mut workflow, notifier) = wizard(&backend).await;

        workflow.toggle_template(template("1"));
        workflow.next().await;
        assert_eq!(workflow.next().await, WorkflowStep::Generating);
        assert_eq!(notifier.messages(), [GENERATION_FAILED]);
        assert!(workflow.batch().is_none());
    }

    #[tokio::test]
    async fn test_success_reviews_then_resets() {
        let backend = MockBackend::new();
        backend.on(Method::GET, QUOTA_USAGE_PATH, quota_reply(3));
        backend.on(
            Method::POST,
            BATCHES_PATH,
            MockReply::json(201, json!({
                "id": 4, "status": "completed", "total_forms": 1, "completed_forms": 1,
                "forms": [{"id": 9, "template": 1, "template_name": "FNA", "status": "completed"}]
            })),
        );
        let (mut workflow, _) = wizard(&backend).await;
        workflow.start().await;

        assert_eq!(workflow.reset(), WorkflowStep::SelectingTemplates);
        workflow.toggle_template(template("1"));
        workflow.next().await;
        assert_eq!(workflow.next().await, WorkflowStep::ReviewingResults);
        assert_eq!(workflow.batch().unwrap().forms.len(), 1);
        assert_eq!(backend.count(&Method::GET, QUOTA_USAGE_PATH), 2);

        // selection is frozen outside the first step
        workflow.toggle_template(template("2"));
        assert_eq!(workflow.selected().len(), 1);

        assert_eq!(workflow.next().await, WorkflowStep::ReviewingResults);
        assert_eq!(workflow.reset(), WorkflowStep::SelectingTemplates);
        assert!(workflow.selected().is_empty());
        assert!(workflow.batch().is_none());
    }
}
