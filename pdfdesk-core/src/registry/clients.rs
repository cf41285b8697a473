//! Client record store

use super::{action_path, item_path};
use crate::api::{ApiClient, Download};
use crate::model::client::{Client, ClientFilters, ClientRecord};
use crate::model::page::Page;
use crate::notify::{require_confirmation, Confirm};
use crate::validation::FieldSchema;
use crate::Result;
use serde::Deserialize;

pub const CLIENTS_PATH: &str = "clients/";

#[derive(Deserialize)]
struct ToggleStatus {
    #[serde(default)]
    status: String,
}

/// Client CRUD; records are validated against the field registry schema
#[derive(Debug, Clone)]
pub struct ClientStore {
    client: ApiClient,
}

impl ClientStore {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, filters: &ClientFilters) -> Result<Page<Client>> {
        self.client.get_with(CLIENTS_PATH, filters.to_query()).await
    }

    pub async fn get(&self, id: &str) -> Result<Client> {
        self.client.get(&item_path(CLIENTS_PATH, id)).await
    }

    pub async fn create(&self, record: &ClientRecord, schema: &FieldSchema) -> Result<Client> {
        record.validate(schema)?;
        let created: Client = self.client.post(CLIENTS_PATH, &record.to_payload()).await?;
        log::info!("Created client {}", created.id);
        Ok(created)
    }

    pub async fn update(&self, id: &str, record: &ClientRecord, schema: &FieldSchema) -> Result<Client> {
        record.validate(schema)?;
        self.client.put(&item_path(CLIENTS_PATH, id), &record.to_payload()).await
    }

    pub async fn delete(&self, client: &Client, confirm: &dyn Confirm) -> Result<()> {
        require_confirmation(confirm, &format!("Delete client {}?", client.display_name()))?;
        self.client.delete(&item_path(CLIENTS_PATH, &client.id)).await
    }

    /// Flip the active flag; returns the backend's status text
    pub async fn toggle_active(&self, id: &str) -> Result<String> {
        let status: ToggleStatus = self.client.post_empty(&action_path(CLIENTS_PATH, id, "toggle_active")).await?;
        Ok(status.status)
    }

    /// CSV export of the clients matching `filters`
    pub async fn export(&self, filters: &ClientFilters) -> Result<Download> {
        let response = self.client.get_bytes("clients/export/", filters.to_query()).await?;
        Ok(Download::from_response("clients.csv", response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::model::field::{FieldCategory, FieldType, StandardizedField};
    use crate::notify::NeverConfirm;
    use crate::testing::{MockBackend, MockReply};
    use http::Method;
    use serde_json::json;

    fn schema() -> FieldSchema {
        let mut email = StandardizedField::new("1", "email", "Email", FieldType::Email, FieldCategory::Client);
        email.is_required = true;
        FieldSchema::new([email])
    }

    #[tokio::test]
    async fn test_invalid_record_is_not_sent() {
        let backend = MockBackend::new();
        let store = ClientStore::new(backend.client().await);

        let record = ClientRecord::new("").with_value("email", json!("nope"));
        let err = store.create(&record, &schema()).await.unwrap_err();
        let errors = err.field_errors().unwrap();
        assert_eq!(errors.get("id_number"), ["ID number is required"]);
        assert_eq!(errors.get("email"), ["Email must be a valid email address"]);
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn test_create_sends_extensions_under_data() {
        let backend = MockBackend::new();
        backend.on(
            Method::POST,
            CLIENTS_PATH,
            MockReply::json(201, json!({"id": "c-1", "id_number": "A1", "data": {"email": "a@b.co"}})),
        );
        let store = ClientStore::new(backend.client().await);

        let record = ClientRecord::new("A1").with_value("email", json!("a@b.co"));
        let created = store.create(&record, &schema()).await.unwrap();
        assert_eq!(created.id, "c-1");
        let sent = backend.requests_to(&Method::POST, CLIENTS_PATH);
        assert_eq!(sent[0].json_body().unwrap()["data"]["email"], "a@b.co");
    }

    #[tokio::test]
    async fn test_toggle_export_and_guarded_delete() {
        let backend = MockBackend::new();
        backend.on(
            Method::POST,
            "clients/c-1/toggle_active/",
            MockReply::json(200, json!({"status": "client deactivated"})),
        );
        backend.on(Method::GET, "clients/export/", MockReply::bytes("text/csv", "id_number\nA1\n"));
        let store = ClientStore::new(backend.client().await);

        assert_eq!(store.toggle_active("c-1").await.unwrap(), "client deactivated");

        let filters = ClientFilters { is_active: Some(true), ..ClientFilters::default() };
        let csv = store.export(&filters).await.unwrap();
        assert_eq!(csv.file_name, "clients.csv");
        assert_eq!(backend.requests_to(&Method::GET, "clients/export/")[0].query_value("is_active"), Some("true"));

        let client: Client = serde_json::from_value(json!({"id": "c-1", "id_number": "A1"})).unwrap();
        assert!(matches!(store.delete(&client, &NeverConfirm).await, Err(ApiError::Cancelled)));
        assert_eq!(backend.count(&Method::DELETE, "clients/c-1/"), 0);
    }
}
