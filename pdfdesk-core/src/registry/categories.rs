//! Display categories for standardized fields

use super::item_path;
use crate::api::ApiClient;
use crate::model::field::StandardizedFieldCategory;
use crate::model::page::{ListQuery, Page};
use crate::notify::{require_confirmation, Confirm};
use crate::validation::{CategoryForm, Validate};
use crate::Result;

pub const CATEGORIES_PATH: &str = "forms/standardized-field-categories/";

#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    client: ApiClient,
}

impl CategoryRegistry {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Page<StandardizedFieldCategory>> {
        self.client.get_with(CATEGORIES_PATH, query.to_query()).await
    }

    pub async fn get(&self, id: &str) -> Result<StandardizedFieldCategory> {
        self.client.get(&item_path(CATEGORIES_PATH, id)).await
    }

    pub async fn create(&self, form: &CategoryForm) -> Result<StandardizedFieldCategory> {
        let category = form.validate()?;
        self.client.post(CATEGORIES_PATH, &category).await
    }

    pub async fn update(&self, id: &str, form: &CategoryForm) -> Result<StandardizedFieldCategory> {
        let category = form.validate()?;
        self.client.put(&item_path(CATEGORIES_PATH, id), &category).await
    }

    pub async fn delete(&self, category: &StandardizedFieldCategory, confirm: &dyn Confirm) -> Result<()> {
        require_confirmation(confirm, &format!("Delete category \"{}\"?", category.name))?;
        self.client.delete(&item_path(CATEGORIES_PATH, &category.id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockBackend, MockReply};
    use http::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_and_list() {
        let backend = MockBackend::new();
        backend.on(
            Method::POST,
            CATEGORIES_PATH,
            MockReply::json(201, json!({"id": 1, "name": "Personal", "description": null})),
        );
        backend.on(
            Method::GET,
            CATEGORIES_PATH,
            MockReply::json(200, json!([{"id": 1, "name": "Personal"}, {"id": 2, "name": "Employment"}])),
        );
        let registry = CategoryRegistry::new(backend.client().await);

        let err = registry.create(&CategoryForm::default()).await.unwrap_err();
        assert_eq!(err.field_errors().unwrap().get("name"), ["Name is required"]);
        assert_eq!(backend.write_count(), 0);

        let created = registry
            .create(&CategoryForm { name: "Personal".into(), description: String::new() })
            .await
            .unwrap();
        assert_eq!(created.id, "1");
        let sent = backend.requests_to(&Method::POST, CATEGORIES_PATH);
        assert_eq!(sent[0].json_body(), Some(&json!({"name": "Personal"})));

        let page = registry.list(&ListQuery::default()).await.unwrap();
        assert_eq!(page.count, 2);
    }
}
