//! Per-template field mappings

use super::field::FieldType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Binds one AcroForm field of a template to registry data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    #[serde(deserialize_with = "super::id_string")]
    pub id: String,
    #[serde(default, alias = "template", deserialize_with = "super::opt_id_string")]
    pub template_id: Option<String>,
    pub pdf_field_name: String,
    #[serde(default)]
    pub system_field_name: Option<String>,
    #[serde(default, alias = "standardized_field", deserialize_with = "super::opt_id_string")]
    pub standardized_field_id: Option<String>,
    #[serde(default)]
    pub field_type: Option<FieldType>,
    #[serde(default)]
    pub transformation_rules: Option<Value>,
    #[serde(default)]
    pub validation_rules: Option<Value>,
    #[serde(default)]
    pub field_definition_override: Option<String>,
}

/// Effective binding of a mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding<'a> {
    /// Bound to a registry entry by id; wins when both are present
    Standardized(&'a str),
    /// Bound by legacy system field name
    System(&'a str),
    Unbound,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl FieldMapping {
    pub fn binding(&self) -> Binding<'_> {
        if let Some(id) = non_blank(&self.standardized_field_id) {
            Binding::Standardized(id)
        } else if let Some(name) = non_blank(&self.system_field_name) {
            Binding::System(name)
        } else {
            Binding::Unbound
        }
    }

    /// Key used to file validation errors for this mapping
    pub fn error_key(&self) -> &str {
        non_blank(&self.system_field_name).unwrap_or(&self.pdf_field_name)
    }
}

/// Create payload for a mapping
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewFieldMapping {
    pub pdf_field_name: String,
    pub system_field_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standardized_field_id: Option<String>,
    pub field_type: FieldType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_rules: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transformation_rules: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_definition_override: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldMappingPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_field_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_field_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standardized_field_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_rules: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transformation_rules: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_definition_override: Option<String>,
}

/// Backend answer to a mapping validation request.
///
/// `errors` is either a structured `{field: [messages]}` map or the legacy
/// flat list of strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MappingValidation {
    pub valid: bool,
    #[serde(default)]
    pub errors: MappingErrors,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MappingErrors {
    Structured(std::collections::BTreeMap<String, Vec<String>>),
    Legacy(Vec<String>),
}

impl Default for MappingErrors {
    fn default() -> Self {
        MappingErrors::Legacy(Vec::new())
    }
}
