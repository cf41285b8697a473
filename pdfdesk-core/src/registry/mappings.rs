//! Per-template field mappings
//!
//! A template's AcroForm field names must stay unique: creating or renaming a
//! mapping is refused when another mapping of the same template already uses
//! the PDF field name.
//!
//! Validation results are reported per mapping. The backend may answer with
//! a structured `{field: [messages]}` map or a flat list of sentences; in the
//! latter case a sentence is attributed to each mapping whose key appears in
//! it as a whole word, and anything unattributed is kept as a general error.

use super::item_path;
use super::templates::TEMPLATES_PATH;
use crate::api::ApiClient;
use crate::error::{ApiError, FieldErrors, NON_FIELD_ERRORS};
use crate::model::mapping::{FieldMapping, MappingErrors, MappingValidation};
use crate::model::page::Page;
use crate::notify::{require_confirmation, Confirm};
use crate::transport::segment;
use crate::validation::{FieldMappingForm, Validate};
use crate::Result;
use serde_json::{json, Value};

pub const DUPLICATE_PDF_FIELD: &str = "PDF field name must be unique within the template";

fn mappings_path(template_id: &str) -> String {
    format!("{}{}/field-mappings/", TEMPLATES_PATH, segment(template_id))
}

/// Whether `name` occurs in `text` delimited by non-identifier characters
fn mentions(text: &str, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    text.match_indices(name).any(|(start, _)| {
        let before = text[..start].chars().next_back();
        let after = text[start + name.len()..].chars().next();
        !before.is_some_and(is_word) && !after.is_some_and(is_word)
    })
}

/// Validation outcome projected onto mappings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingReport {
    pub valid: bool,
    /// Messages keyed by [`FieldMapping::error_key`]
    pub errors: FieldErrors,
    /// Messages that belong to no single mapping
    pub general: Vec<String>,
}

impl MappingReport {
    pub fn from_validation(validation: MappingValidation, mappings: &[FieldMapping]) -> Self {
        let mut errors = FieldErrors::new();
        let mut general = Vec::new();

        match validation.errors {
            MappingErrors::Structured(map) => {
                for (key, messages) in map {
                    if key == NON_FIELD_ERRORS || key == "general" {
                        general.extend(messages);
                    } else {
                        for message in messages {
                            errors.add(key.as_str(), message);
                        }
                    }
                }
            }
            MappingErrors::Legacy(messages) => {
                for message in messages {
                    let mut matched = false;
                    for mapping in mappings {
                        let key = mapping.error_key();
                        if mentions(&message, key) {
                            errors.add(key, message.clone());
                            matched = true;
                        }
                    }
                    if !matched {
                        general.push(message);
                    }
                }
            }
        }

        Self { valid: validation.valid && errors.is_empty() && general.is_empty(), errors, general }
    }

    pub fn errors_for(&self, mapping: &FieldMapping) -> &[String] {
        self.errors.get(mapping.error_key())
    }
}

fn ensure_unique(
    existing: &[FieldMapping],
    pdf_field_name: &str,
    ignore_id: Option<&str>,
) -> Result<()> {
    let taken = existing
        .iter()
        .filter(|m| Some(m.id.as_str()) != ignore_id)
        .any(|m| m.pdf_field_name == pdf_field_name);
    if taken {
        Err(ApiError::invalid("pdf_field_name", DUPLICATE_PDF_FIELD))
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct FieldMappingLayer {
    client: ApiClient,
}

impl FieldMappingLayer {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, template_id: &str) -> Result<Vec<FieldMapping>> {
        let page: Page<FieldMapping> = self.client.get(&mappings_path(template_id)).await?;
        Ok(page.results)
    }

    pub async fn create(&self, template_id: &str, form: &FieldMappingForm) -> Result<FieldMapping> {
        let mapping = form.validate()?;
        let existing = self.list(template_id).await?;
        ensure_unique(&existing, &mapping.pdf_field_name, None)?;
        self.client.post(&mappings_path(template_id), &mapping).await
    }

    pub async fn update(
        &self,
        template_id: &str,
        mapping_id: &str,
        form: &FieldMappingForm,
    ) -> Result<FieldMapping> {
        let patch = form.validate_update()?;
        if let Some(name) = &patch.pdf_field_name {
            let existing = self.list(template_id).await?;
            ensure_unique(&existing, name, Some(mapping_id))?;
        }
        self.client.patch(&item_path(&mappings_path(template_id), mapping_id), &patch).await
    }

    pub async fn delete(
        &self,
        template_id: &str,
        mapping: &FieldMapping,
        confirm: &dyn Confirm,
    ) -> Result<()> {
        require_confirmation(confirm, &format!("Delete mapping for \"{}\"?", mapping.pdf_field_name))?;
        self.client.delete(&item_path(&mappings_path(template_id), &mapping.id)).await
    }

    /// Replace every mapping of a template in one request
    pub async fn replace_all(&self, template_id: &str, mappings: &[FieldMappingForm]) -> Result<()> {
        let mut errors = FieldErrors::new();
        let mut payloads = Vec::with_capacity(mappings.len());
        let mut seen = std::collections::BTreeSet::new();
        for (i, form) in mappings.iter().enumerate() {
            match form.validate() {
                Ok(mapping) => {
                    if !seen.insert(mapping.pdf_field_name.clone()) {
                        errors.add(format!("{}.pdf_field_name", i), DUPLICATE_PDF_FIELD);
                    }
                    payloads.push(mapping);
                }
                Err(form_errors) => {
                    for (field, messages) in form_errors.iter() {
                        for message in messages {
                            errors.add(format!("{}.{}", i, field), message.clone());
                        }
                    }
                }
            }
        }
        errors.into_result()?;

        let path = format!("{}{}/update_field_mappings/", TEMPLATES_PATH, segment(template_id));
        let _: Value = self.client.post(&path, &json!({ "mappings": payloads })).await?;
        Ok(())
    }

    /// Ask the backend to validate the template's mappings
    pub async fn validate(&self, template_id: &str) -> Result<MappingReport> {
        let mappings = self.list(template_id).await?;
        let path = format!("{}validate-mappings/", mappings_path(template_id));
        let validation: MappingValidation = self.client.post(&path, &json!({})).await?;
        let report = MappingReport::from_validation(validation, &mappings);
        if !report.valid {
            log::warn!(
                "Template {} has {} mapping(s) with errors",
                template_id,
                report.errors.len()
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::field::FieldType;
    use crate::testing::{MockBackend, MockReply};
    use http::Method;

    fn mapping(id: &str, pdf: &str, system: &str) -> FieldMapping {
        FieldMapping {
            id: id.into(),
            template_id: Some("t1".into()),
            pdf_field_name: pdf.into(),
            system_field_name: Some(system.into()),
            standardized_field_id: None,
            field_type: Some(FieldType::Text),
            transformation_rules: None,
            validation_rules: None,
            field_definition_override: None,
        }
    }

    fn form(pdf: &str, system: &str) -> FieldMappingForm {
        FieldMappingForm {
            pdf_field_name: pdf.into(),
            system_field_name: system.into(),
            field_type: "text".into(),
            ..FieldMappingForm::default()
        }
    }

    fn listed() -> Value {
        json!([
            {"id": 1, "pdf_field_name": "Name", "system_field_name": "name"},
            {"id": 2, "pdf_field_name": "Surname", "system_field_name": "last_name"}
        ])
    }

    #[test]
    fn test_whole_word_matching() {
        assert!(mentions("Field name is missing", "name"));
        assert!(mentions("name: required", "name"));
        assert!(!mentions("Field last_name is missing", "name"));
        assert!(!mentions("Field names are missing", "name"));
        assert!(mentions("Field last_name is missing", "last_name"));
    }

    #[test]
    fn test_legacy_errors_are_attributed_by_word() {
        let mappings = vec![mapping("1", "Name", "name"), mapping("2", "Surname", "last_name")];
        let validation = MappingValidation {
            valid: false,
            errors: MappingErrors::Legacy(vec![
                "Field last_name has no value".into(),
                "Template is inactive".into(),
            ]),
        };

        let report = MappingReport::from_validation(validation, &mappings);
        assert!(!report.valid);
        assert!(report.errors_for(&mappings[0]).is_empty());
        assert_eq!(report.errors_for(&mappings[1]), ["Field last_name has no value"]);
        assert_eq!(report.general, ["Template is inactive"]);
    }

    #[test]
    fn test_structured_errors_pass_through() {
        let mappings = vec![mapping("1", "Name", "name")];
        let validation: MappingValidation = serde_json::from_value(json!({
            "valid": false,
            "errors": {"name": ["Unknown system field"], "non_field_errors": ["Stale template"]}
        }))
        .unwrap();

        let report = MappingReport::from_validation(validation, &mappings);
        assert_eq!(report.errors_for(&mappings[0]), ["Unknown system field"]);
        assert_eq!(report.general, ["Stale template"]);
    }

    #[tokio::test]
    async fn test_duplicate_pdf_field_is_refused() {
        let backend = MockBackend::new();
        backend.on(Method::GET, "forms/templates/t1/field-mappings/", MockReply::json(200, listed()));
        let layer = FieldMappingLayer::new(backend.client().await);

        let err = layer.create("t1", &form("Name", "first_name")).await.unwrap_err();
        assert_eq!(err.field_errors().unwrap().get("pdf_field_name"), [DUPLICATE_PDF_FIELD]);
        assert_eq!(backend.write_count(), 0);
    }

    #[tokio::test]
    async fn test_rename_checks_other_mappings_only() {
        let backend = MockBackend::new();
        backend.on(Method::GET, "forms/templates/t1/field-mappings/", MockReply::json(200, listed()));
        backend.on(
            Method::PATCH,
            "forms/templates/t1/field-mappings/1/",
            MockReply::json(200, json!({"id": 1, "pdf_field_name": "Name", "system_field_name": "full_name"})),
        );
        let layer = FieldMappingLayer::new(backend.client().await);

        layer.update("t1", "1", &form("Name", "full_name")).await.unwrap();
        let err = layer.update("t1", "1", &form("Surname", "full_name")).await.unwrap_err();
        assert!(err.field_errors().is_some());
        assert_eq!(backend.count(&Method::PATCH, "forms/templates/t1/field-mappings/1/"), 1);
    }

    #[tokio::test]
    async fn test_replace_all_rejects_duplicates_locally() {
        let backend = MockBackend::new();
        let layer = FieldMappingLayer::new(backend.client().await);

        let err = layer
            .replace_all("t1", &[form("Name", "name"), form("Name", "first_name")])
            .await
            .unwrap_err();
        assert_eq!(err.field_errors().unwrap().get("1.pdf_field_name"), [DUPLICATE_PDF_FIELD]);
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn test_validate_projects_onto_rows() {
        let backend = MockBackend::new();
        backend.on(Method::GET, "forms/templates/t1/field-mappings/", MockReply::json(200, listed()));
        backend.on(
            Method::POST,
            "forms/templates/t1/field-mappings/validate-mappings/",
            MockReply::json(200, json!({"valid": false, "errors": ["Mapping for name is ambiguous"]})),
        );
        let layer = FieldMappingLayer::new(backend.client().await);

        let report = layer.validate("t1").await.unwrap();
        assert_eq!(report.errors.get("name"), ["Mapping for name is ambiguous"]);
        assert!(report.errors.get("last_name").is_empty());
    }
}
