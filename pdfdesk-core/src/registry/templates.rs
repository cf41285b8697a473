//! PDF template registry
//!
//! Deletion is gated on the backend's `check_deletable` answer: a template
//! that belongs to a form set cannot be removed. A check that fails for any
//! reason counts as "not deletable".

use super::{action_path, item_path};
use crate::api::{ApiClient, Download};
use crate::error::ApiError;
use crate::model::page::{ListQuery, Page};
use crate::model::template::{Deletability, PdfFile, Template, TemplateCategory, TemplatePatch};
use crate::notify::{require_confirmation, Confirm};
use crate::transport::{FilePart, MultipartForm};
use crate::validation::{TemplateForm, Validate};
use crate::Result;
use futures::future::join_all;
use http::Method;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const TEMPLATES_PATH: &str = "forms/templates/";

const PDF_CONTENT_TYPE: &str = "application/pdf";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateFilter {
    pub category: Option<TemplateCategory>,
    pub is_active: Option<bool>,
    pub list: ListQuery,
}

impl TemplateFilter {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(category) = self.category {
            query.push(("category".to_string(), category.to_string()));
        }
        if let Some(active) = self.is_active {
            query.push(("is_active".to_string(), active.to_string()));
        }
        query.extend(self.list.to_query());
        query
    }
}

/// Inline preview of a template
#[derive(Debug, Clone, PartialEq)]
pub enum Preview {
    /// Transient URL served by the backend
    Url(String),
    /// The PDF itself
    Pdf(Download),
}

fn pdf_part(file: &PdfFile) -> FilePart {
    FilePart {
        field: "file".to_string(),
        file_name: file.file_name.clone(),
        content_type: PDF_CONTENT_TYPE.to_string(),
        bytes: file.bytes.clone(),
    }
}

fn multipart(patch: &TemplatePatch) -> MultipartForm {
    let mut form = patch
        .text_fields()
        .into_iter()
        .fold(MultipartForm::new(), |form, (name, value)| form.text(name, value));
    if let Some(file) = &patch.file {
        form = form.file(pdf_part(file));
    }
    form
}

fn patch_json(patch: &TemplatePatch) -> Value {
    let mut body = Map::new();
    for (name, value) in patch.text_fields() {
        let value = match name {
            "is_active" => Value::Bool(value == "true"),
            _ => Value::String(value),
        };
        body.insert(name.to_string(), value);
    }
    Value::Object(body)
}

#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    client: ApiClient,
}

impl TemplateRegistry {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, filter: &TemplateFilter) -> Result<Page<Template>> {
        self.client.get_with(TEMPLATES_PATH, filter.to_query()).await
    }

    pub async fn get(&self, id: &str) -> Result<Template> {
        self.client.get(&item_path(TEMPLATES_PATH, id)).await
    }

    /// Upload a new template; the PDF is mandatory
    pub async fn create(&self, form: &TemplateForm) -> Result<Template> {
        let new = form.validate()?;
        let patch = TemplatePatch { file: Some(new.file), ..TemplatePatch::from(new.metadata) };
        let created: Template =
            self.client.send_multipart(Method::POST, TEMPLATES_PATH, multipart(&patch)).await?;
        log::info!("Uploaded template {} ({})", created.name, created.id);
        Ok(created)
    }

    /// Update metadata, replacing the PDF when the form carries one
    pub async fn update(&self, id: &str, form: &TemplateForm) -> Result<Template> {
        let patch = form.validate_for_update()?;
        self.patch(id, &patch).await
    }

    pub async fn patch(&self, id: &str, patch: &TemplatePatch) -> Result<Template> {
        let path = item_path(TEMPLATES_PATH, id);
        if patch.file.is_some() {
            self.client.send_multipart(Method::PATCH, &path, multipart(patch)).await
        } else {
            self.client.patch(&path, &patch_json(patch)).await
        }
    }

    /// Whether the template may be deleted; `false` when the check fails
    pub async fn check_deletable(&self, id: &str) -> bool {
        let path = action_path(TEMPLATES_PATH, id, "check_deletable");
        match self.client.get::<Deletability>(&path).await {
            Ok(status) => status.deletable,
            Err(e) => {
                log::warn!("Deletable check for template {} failed, treating as in use: {}", id, e);
                false
            }
        }
    }

    /// Deletable status of many templates, checked concurrently
    pub async fn deletable_statuses(&self, ids: &[String]) -> BTreeMap<String, bool> {
        let checks = ids.iter().map(|id| async move { (id.clone(), self.check_deletable(id).await) });
        join_all(checks).await.into_iter().collect()
    }

    /// Delete after re-checking deletability and asking for confirmation
    pub async fn delete(&self, id: &str, confirm: &dyn Confirm) -> Result<()> {
        if !self.check_deletable(id).await {
            return Err(ApiError::NotDeletable(format!("template {}", id)));
        }
        require_confirmation(confirm, "Delete this template?")?;
        match self.client.delete(&item_path(TEMPLATES_PATH, id)).await {
            Err(ApiError::Conflict(_)) => Err(ApiError::NotDeletable(format!("template {}", id))),
            other => other,
        }
    }

    pub async fn preview(&self, id: &str) -> Result<Preview> {
        let response = self.client.get_bytes(&action_path(TEMPLATES_PATH, id, "preview"), Vec::new()).await?;
        if response.is_json() {
            let url = response
                .json_value()
                .and_then(|body| body.get("preview_url").and_then(Value::as_str).map(str::to_string))
                .ok_or_else(|| ApiError::Decode("preview response has no preview_url".into()))?;
            Ok(Preview::Url(url))
        } else {
            Ok(Preview::Pdf(Download::from_response(format!("template-{}.pdf", id), response)))
        }
    }

    pub async fn download(&self, id: &str) -> Result<Download> {
        let response =
            self.client.get_bytes(&action_path(TEMPLATES_PATH, id, "download"), Vec::new()).await?;
        Ok(Download::from_response(format!("template-{}.pdf", id), response))
    }
}

/// Loaded template list with per-row deletability.
///
/// Rows whose check failed or reported "in use" have their delete action
/// disabled; deleting such a row is refused without touching the network.
#[derive(Debug, Clone)]
pub struct TemplateBoard {
    registry: TemplateRegistry,
    templates: Vec<Template>,
    deletable: BTreeMap<String, bool>,
}

impl TemplateBoard {
    pub fn new(registry: TemplateRegistry) -> Self {
        Self { registry, templates: Vec::new(), deletable: BTreeMap::new() }
    }

    /// Load a page of templates and check every row's deletability
    pub async fn load(&mut self, filter: &TemplateFilter) -> Result<()> {
        let page = self.registry.list(filter).await?;
        let ids: Vec<String> = page.results.iter().map(|t| t.id.clone()).collect();
        self.deletable = self.registry.deletable_statuses(&ids).await;
        self.templates = page.results;
        Ok(())
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn can_delete(&self, id: &str) -> bool {
        self.deletable.get(id).copied().unwrap_or(false)
    }

    pub async fn delete(&mut self, id: &str, confirm: &dyn Confirm) -> Result<()> {
        if !self.can_delete(id) {
            log::debug!("Delete of template {} ignored: action disabled", id);
            return Err(ApiError::NotDeletable(format!("template {}", id)));
        }
        self.registry.delete(id, confirm).await?;
        self.templates.retain(|t| t.id != id);
        self.deletable.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::AlwaysConfirm;
    use crate::testing::{MockBackend, MockReply};
    use crate::transport::RequestBody;
    use serde_json::json;

    fn template_json(id: u32) -> Value {
        json!({"id": id, "name": format!("T{}", id), "category": "broker", "version": "1"})
    }

    fn full_form() -> TemplateForm {
        TemplateForm {
            name: "FNA".into(),
            description: "Needs analysis".into(),
            category: "broker".into(),
            form_type: "fna".into(),
            form_affiliation: "broker".into(),
            version: "1".into(),
            file: Some(PdfFile::new("fna.pdf", b"%PDF".to_vec())),
            ..TemplateForm::default()
        }
    }

    #[tokio::test]
    async fn test_create_uploads_multipart() {
        let backend = MockBackend::new();
        backend.on(Method::POST, TEMPLATES_PATH, MockReply::json(201, template_json(5)));
        let registry = TemplateRegistry::new(backend.client().await);

        let created = registry.create(&full_form()).await.unwrap();
        assert_eq!(created.id, "5");

        let sent = backend.requests_to(&Method::POST, TEMPLATES_PATH);
        let RequestBody::Multipart(form) = &sent[0].body else {
            panic!("expected multipart body");
        };
        assert_eq!(form.field("form_type"), Some("fna"));
        assert_eq!(form.files[0].field, "file");
        assert_eq!(form.files[0].content_type, "application/pdf");
    }

    #[tokio::test]
    async fn test_update_without_file_sends_json() {
        let backend = MockBackend::new();
        backend.on(Method::PATCH, "forms/templates/5/", MockReply::json(200, template_json(5)));
        let registry = TemplateRegistry::new(backend.client().await);

        let form = TemplateForm { file: None, is_active: false, ..full_form() };
        registry.update("5", &form).await.unwrap();
        let sent = backend.requests_to(&Method::PATCH, "forms/templates/5/");
        assert_eq!(sent[0].json_body().unwrap()["is_active"], json!(false));
    }

    #[tokio::test]
    async fn test_failed_check_is_not_deletable() {
        let backend = MockBackend::new();
        backend.on(
            Method::GET,
            "forms/templates/1/check_deletable/",
            MockReply::json(200, json!({"deletable": true})),
        );
        backend.on(Method::GET, "forms/templates/2/check_deletable/", MockReply::status(500));
        backend.on(
            Method::GET,
            "forms/templates/3/check_deletable/",
            MockReply::network_error("timed out"),
        );
        let registry = TemplateRegistry::new(backend.client().await);

        let statuses =
            registry.deletable_statuses(&["1".to_string(), "2".to_string(), "3".to_string()]).await;
        assert_eq!(statuses.get("1"), Some(&true));
        assert_eq!(statuses.get("2"), Some(&false));
        assert_eq!(statuses.get("3"), Some(&false));
    }

    #[tokio::test]
    async fn test_delete_refused_when_in_use() {
        let backend = MockBackend::new();
        backend.on(
            Method::GET,
            "forms/templates/7/check_deletable/",
            MockReply::json(200, json!({"deletable": false})),
        );
        let registry = TemplateRegistry::new(backend.client().await);

        let err = registry.delete("7", &AlwaysConfirm).await.unwrap_err();
        assert!(matches!(err, ApiError::NotDeletable(_)));
        assert_eq!(backend.count(&Method::DELETE, "forms/templates/7/"), 0);
    }

    #[tokio::test]
    async fn test_board_disabled_delete_makes_no_request() {
        let backend = MockBackend::new();
        backend.on(Method::GET, TEMPLATES_PATH, MockReply::json(200, json!([template_json(7)])));
        backend.on(
            Method::GET,
            "forms/templates/7/check_deletable/",
            MockReply::json(200, json!({"deletable": false})),
        );
        let mut board = TemplateBoard::new(TemplateRegistry::new(backend.client().await));
        board.load(&TemplateFilter::default()).await.unwrap();
        assert!(!board.can_delete("7"));

        backend.reset_log();
        let err = board.delete("7", &AlwaysConfirm).await.unwrap_err();
        assert!(matches!(err, ApiError::NotDeletable(_)));
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn test_preview_url_or_pdf() {
        let backend = MockBackend::new();
        backend.on(
            Method::GET,
            "forms/templates/1/preview/",
            MockReply::json(200, json!({"preview_url": "http://files/1.pdf"})),
        );
        backend.on(Method::GET, "forms/templates/2/preview/", MockReply::bytes("application/pdf", "%PDF"));
        let registry = TemplateRegistry::new(backend.client().await);

        assert_eq!(registry.preview("1").await.unwrap(), Preview::Url("http://files/1.pdf".into()));
        let Preview::Pdf(pdf) = registry.preview("2").await.unwrap() else {
            panic!("expected inline pdf");
        };
        assert_eq!(pdf.file_name, "template-2.pdf");
        assert_eq!(&pdf.bytes[..], b"%PDF");
    }
}
