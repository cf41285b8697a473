//! PDF template types

use super::{default_true, wire_enum};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

wire_enum! {
    pub enum TemplateCategory {
        Broker => "broker",
        Boclife => "boclife",
        Chubb => "chubb",
    }
}

wire_enum! {
    pub enum FormType {
        Fna => "fna",
        Application => "application",
        Agreement => "agreement",
        Payment => "payment",
    }
}

wire_enum! {
    pub enum FormAffiliation {
        Broker => "broker",
        Insurance => "insurance",
    }
}

/// Uploaded PDF template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(deserialize_with = "super::id_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: TemplateCategory,
    #[serde(default)]
    pub form_type: Option<FormType>,
    #[serde(default)]
    pub form_affiliation: Option<FormAffiliation>,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Template {
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: TemplateCategory) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            category,
            form_type: None,
            form_affiliation: None,
            version: String::new(),
            file_name: None,
            is_active: true,
            created_at: None,
            updated_at: None,
        }
    }
}

/// PDF payload for upload
#[derive(Debug, Clone, PartialEq)]
pub struct PdfFile {
    pub file_name: String,
    pub bytes: Bytes,
}

impl PdfFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self { file_name: file_name.into(), bytes: bytes.into() }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Validated template metadata
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateMetadata {
    pub name: String,
    pub description: String,
    pub category: TemplateCategory,
    pub form_type: FormType,
    pub form_affiliation: FormAffiliation,
    pub version: String,
    pub is_active: bool,
}

/// Create payload: metadata plus the mandatory PDF
#[derive(Debug, Clone, PartialEq)]
pub struct NewTemplate {
    pub metadata: TemplateMetadata,
    pub file: PdfFile,
}

/// Partial update; a replacement PDF is optional
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplatePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<TemplateCategory>,
    pub form_type: Option<FormType>,
    pub form_affiliation: Option<FormAffiliation>,
    pub version: Option<String>,
    pub is_active: Option<bool>,
    pub file: Option<PdfFile>,
}

impl TemplatePatch {
    /// Text members that are set, as (name, value) pairs in wire form
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();
        if let Some(name) = &self.name {
            fields.push(("name", name.clone()));
        }
        if let Some(description) = &self.description {
            fields.push(("description", description.clone()));
        }
        if let Some(category) = self.category {
            fields.push(("category", category.to_string()));
        }
        if let Some(form_type) = self.form_type {
            fields.push(("form_type", form_type.to_string()));
        }
        if let Some(affiliation) = self.form_affiliation {
            fields.push(("form_affiliation", affiliation.to_string()));
        }
        if let Some(version) = &self.version {
            fields.push(("version", version.clone()));
        }
        if let Some(active) = self.is_active {
            fields.push(("is_active", active.to_string()));
        }
        fields
    }
}

impl From<TemplateMetadata> for TemplatePatch {
    fn from(m: TemplateMetadata) -> Self {
        Self {
            name: Some(m.name),
            description: Some(m.description),
            category: Some(m.category),
            form_type: Some(m.form_type),
            form_affiliation: Some(m.form_affiliation),
            version: Some(m.version),
            is_active: Some(m.is_active),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Deletability {
    pub deletable: bool,
}
