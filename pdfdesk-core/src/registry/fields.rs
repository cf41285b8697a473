//! Standardized field registry

use super::item_path;
use crate::api::ApiClient;
use crate::error::ApiError;
use crate::model::field::{
    sort_for_display, FieldCategory, FieldType, StandardizedField, StandardizedFieldPatch,
};
use crate::model::page::{ListQuery, Page};
use crate::notify::{require_confirmation, Confirm};
use crate::validation::{FieldSchema, StandardizedFieldForm, Validate};
use crate::Result;
use serde::Deserialize;
use serde_json::{json, Value};

pub const FIELDS_PATH: &str = "forms/standardized-fields/";

/// Page size used when a caller needs every field of a category
const FULL_LIST_PAGE_SIZE: u32 = 100;

/// Filters for the field list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldFilter {
    pub category: Option<FieldCategory>,
    pub display_category: Option<String>,
    pub is_active: Option<bool>,
    pub list: ListQuery,
}

impl FieldFilter {
    pub fn display_category(name: impl Into<String>) -> Self {
        Self { display_category: Some(name.into()), ..Self::default() }
    }

    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(category) = self.category {
            query.push(("field_category".to_string(), category.to_string()));
        }
        if let Some(name) = self.display_category.as_ref().filter(|n| !n.is_empty()) {
            query.push(("display_category".to_string(), name.clone()));
        }
        if let Some(active) = self.is_active {
            query.push(("is_active".to_string(), active.to_string()));
        }
        query.extend(self.list.to_query());
        query
    }
}

#[derive(Deserialize)]
struct GeneratedDefinition {
    field_definition: String,
}

#[derive(Deserialize)]
struct GeneratedGuide {
    llm_guide: String,
}

#[derive(Deserialize)]
struct SuggestedRules {
    #[serde(default)]
    validation_rules: Vec<Value>,
}

/// CRUD over standardized fields
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    client: ApiClient,
}

impl FieldRegistry {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, filter: &FieldFilter) -> Result<Page<StandardizedField>> {
        self.client.get_with(FIELDS_PATH, filter.to_query()).await
    }

    /// Every page of a filtered list
    async fn list_all(&self, filter: &FieldFilter) -> Result<Vec<StandardizedField>> {
        let mut filter = filter.clone();
        filter.list.page_size = Some(FULL_LIST_PAGE_SIZE);
        let mut fields = Vec::new();
        let mut page_number = 1;
        loop {
            filter.list.page = Some(page_number);
            let page = self.list(&filter).await?;
            let done = !page.has_next() || page.results.is_empty();
            fields.extend(page.results);
            if done {
                return Ok(fields);
            }
            page_number += 1;
        }
    }

    pub async fn get(&self, id: &str) -> Result<StandardizedField> {
        self.client.get(&item_path(FIELDS_PATH, id)).await
    }

    pub async fn create(&self, form: &StandardizedFieldForm) -> Result<StandardizedField> {
        let field = form.validate()?;
        let created: StandardizedField = self.client.post(FIELDS_PATH, &field).await?;
        log::info!("Created standardized field {} ({})", created.name, created.id);
        Ok(created)
    }

    /// Full edit from the field editor
    pub async fn update(&self, id: &str, form: &StandardizedFieldForm) -> Result<StandardizedField> {
        let patch = form.validate_update()?;
        self.patch(id, &patch).await
    }

    /// Partial update; only the members that are set are sent
    pub async fn patch(&self, id: &str, patch: &StandardizedFieldPatch) -> Result<StandardizedField> {
        self.client.patch(&item_path(FIELDS_PATH, id), patch).await
    }

    /// Delete a field. System fields are refused without a request.
    pub async fn delete(&self, field: &StandardizedField, confirm: &dyn Confirm) -> Result<()> {
        if field.is_system {
            return Err(ApiError::Forbidden(format!(
                "System field {} cannot be deleted",
                field.name
            )));
        }
        require_confirmation(confirm, &format!("Delete field \"{}\"?", field.label))?;
        self.client.delete(&item_path(FIELDS_PATH, &field.id)).await?;
        log::info!("Deleted standardized field {}", field.name);
        Ok(())
    }

    /// Fields of one display category in display order
    pub async fn list_by_category(&self, display_category: &str) -> Result<Vec<StandardizedField>> {
        let mut fields = self.list_all(&FieldFilter::display_category(display_category)).await?;
        fields.retain(|f| f.display_category.as_deref() == Some(display_category));
        sort_for_display(&mut fields);
        Ok(fields)
    }

    /// Set one field's display order
    pub async fn reorder(&self, id: &str, display_order: i64) -> Result<StandardizedField> {
        self.patch(id, &StandardizedFieldPatch::display_order(display_order)).await
    }

    /// Registry entries of one subject as a validation schema
    pub async fn schema(&self, category: FieldCategory) -> Result<FieldSchema> {
        let filter = FieldFilter { category: Some(category), ..FieldFilter::default() };
        let fields = self.list_all(&filter).await?;
        Ok(FieldSchema::new(fields.into_iter().filter(|f| f.field_category == category)))
    }

    // ========================================================================
    // GENERATION HELPERS - backend-side text generation, passed through
    // ========================================================================

    pub async fn generate_definition(&self, name: &str, field_type: FieldType) -> Result<String> {
        let body = json!({ "field_name": name, "field_type": field_type });
        let generated: GeneratedDefinition =
            self.client.post(&format!("{}generate-definition/", FIELDS_PATH), &body).await?;
        Ok(generated.field_definition)
    }

    pub async fn generate_llm_guide(
        &self,
        name: &str,
        field_type: FieldType,
        definition: &str,
    ) -> Result<String> {
        let body = json!({
            "field_name": name,
            "field_type": field_type,
            "field_definition": definition,
        });
        let generated: GeneratedGuide =
            self.client.post(&format!("{}generate-llm-guide/", FIELDS_PATH), &body).await?;
        Ok(generated.llm_guide)
    }

    pub async fn suggest_validation_rules(
        &self,
        name: &str,
        field_type: FieldType,
    ) -> Result<Vec<Value>> {
        let body = json!({ "field_name": name, "field_type": field_type });
        let suggested: SuggestedRules =
            self.client.post(&format!("{}suggest-validation-rules/", FIELDS_PATH), &body).await?;
        Ok(suggested.validation_rules)
    }
}
