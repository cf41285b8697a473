//! Form generation batches

use super::wire_enum;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

wire_enum! {
    pub enum BatchStatus {
        Processing => "processing",
        Completed => "completed",
        Partial => "partial",
        Failed => "failed",
    }
}

wire_enum! {
    pub enum FormStatus {
        Processing => "processing",
        Completed => "completed",
        Failed => "failed",
    }
}

/// One generated PDF within a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedForm {
    #[serde(deserialize_with = "super::id_string")]
    pub id: String,
    #[serde(default, alias = "template", deserialize_with = "super::opt_id_string")]
    pub template_ref: Option<String>,
    #[serde(default)]
    pub template_name: String,
    pub status: FormStatus,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl GeneratedForm {
    /// Failure text, treating an empty message as none
    pub fn error(&self) -> Option<&str> {
        self.error_message.as_deref().filter(|m| !m.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRef {
    #[serde(deserialize_with = "super::id_string")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormGenerationBatch {
    #[serde(deserialize_with = "super::id_string")]
    pub id: String,
    pub status: BatchStatus,
    #[serde(default)]
    pub insurer: Option<String>,
    #[serde(default, alias = "client")]
    pub client_ref: Option<ClientRef>,
    #[serde(default)]
    pub forms: Vec<GeneratedForm>,
    #[serde(default)]
    pub total_forms: u32,
    #[serde(default)]
    pub completed_forms: u32,
    #[serde(default)]
    pub failed_forms: u32,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl FormGenerationBatch {
    pub fn completed(&self) -> impl Iterator<Item = &GeneratedForm> {
        self.forms.iter().filter(|f| f.status == FormStatus::Completed)
    }

    pub fn failed(&self) -> impl Iterator<Item = &GeneratedForm> {
        self.forms.iter().filter(|f| f.status == FormStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateFormsRequest {
    pub client_id: String,
    pub template_ids: Vec<String>,
    pub client_data: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insurer: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_batch_decodes_backend_shape() {
        let batch: FormGenerationBatch = serde_json::from_value(json!({
            "id": 4,
            "status": "partial",
            "insurer": "",
            "forms": [
                {"id": 1, "template": 7, "template_name": "FNA", "status": "completed",
                 "error_message": "", "download_url": "http://x/1.pdf"},
                {"id": 2, "template": 8, "template_name": "App", "status": "failed",
                 "error_message": "Missing field", "download_url": null}
            ],
            "total_forms": 2, "completed_forms": 1, "failed_forms": 1
        }))
        .unwrap();

        assert_eq!(batch.status, BatchStatus::Partial);
        assert_eq!(batch.completed().count(), 1);
        let failed: Vec<_> = batch.failed().collect();
        assert_eq!(failed[0].error(), Some("Missing field"));
        assert_eq!(batch.forms[0].error(), None);
        assert_eq!(batch.forms[0].template_ref.as_deref(), Some("7"));
    }
}
