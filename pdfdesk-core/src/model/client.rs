//! Client records
//!
//! The backend returns a client as a small core (`id_number`, `is_active`)
//! plus a `data` map and, for older records, the same values flattened onto
//! the top level. [`ClientRecord`] folds both into one extension map keyed by
//! standardized field name; the field registry is the schema for that map.

use super::default_true;
use crate::error::FieldErrors;
use crate::validation::record::FieldSchema;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Top-level keys that are computed by the backend, never stored
const DERIVED_KEYS: &[&str] = &["full_name", "full_address", "user"];

/// Client as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    #[serde(deserialize_with = "super::id_string")]
    pub id: String,
    #[serde(default)]
    pub id_number: String,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Legacy flattened fields
    #[serde(flatten)]
    pub legacy: Map<String, Value>,
}

impl Client {
    /// Display name from whichever name fields are present
    pub fn display_name(&self) -> String {
        let record = self.to_record();
        let part = |key: &str| {
            record.extensions.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
        };
        let name = format!("{} {}", part("first_name"), part("last_name")).trim().to_string();
        if name.is_empty() {
            self.id_number.clone()
        } else {
            name
        }
    }

    pub fn to_record(&self) -> ClientRecord {
        let mut extensions: BTreeMap<String, Value> = self
            .legacy
            .iter()
            .filter(|(k, v)| !DERIVED_KEYS.contains(&k.as_str()) && !v.is_null())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (key, value) in &self.data {
            extensions.insert(key.clone(), value.clone());
        }

        ClientRecord {
            id: Some(self.id.clone()),
            id_number: self.id_number.clone(),
            is_active: self.is_active,
            extensions,
        }
    }
}

/// Client core plus validated extension map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientRecord {
    pub id: Option<String>,
    pub id_number: String,
    pub is_active: bool,
    /// Values keyed by standardized field name
    pub extensions: BTreeMap<String, Value>,
}

impl ClientRecord {
    pub fn new(id_number: impl Into<String>) -> Self {
        Self { id: None, id_number: id_number.into(), is_active: true, extensions: BTreeMap::new() }
    }

    pub fn with_value(mut self, field: impl Into<String>, value: Value) -> Self {
        self.extensions.insert(field.into(), value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.extensions.get(field)
    }

    /// Check the core and every extension value against the registry schema
    pub fn validate(&self, schema: &FieldSchema) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.id_number.trim().is_empty() {
            errors.add("id_number", "ID number is required");
        }
        if let Err(extension_errors) = schema.validate_values(&self.extensions) {
            errors.extend(extension_errors);
        }
        errors.into_result()
    }

    /// Wire payload: core members plus everything else under `data`
    pub fn to_payload(&self) -> Value {
        let data: Map<String, Value> =
            self.extensions.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        serde_json::json!({
            "id_number": self.id_number,
            "is_active": self.is_active,
            "data": data,
        })
    }
}

/// Query filters for the client list and export
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientFilters {
    pub search: Option<String>,
    pub is_active: Option<bool>,
    pub nationality: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub name: Option<String>,
    pub ordering: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl ClientFilters {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        let mut push = |key: &str, value: Option<String>| {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                query.push((key.to_string(), value));
            }
        };
        push("search", self.search.clone());
        push("is_active", self.is_active.map(|b| b.to_string()));
        push("nationality", self.nationality.clone());
        push("country", self.country.clone());
        push("city", self.city.clone());
        push("start_date", self.start_date.clone());
        push("end_date", self.end_date.clone());
        push("name", self.name.clone());
        push("ordering", self.ordering.clone());
        push("page", self.page.map(|p| p.to_string()));
        push("page_size", self.page_size.map(|p| p.to_string()));
        query
    }
}
