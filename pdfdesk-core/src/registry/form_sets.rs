//! Form set composer
//!
//! A form set always names at least one template, on create and on every
//! update that touches its membership.

use super::item_path;
use crate::api::ApiClient;
use crate::model::form_set::{FormSet, FormSetPatch};
use crate::model::page::{ListQuery, Page};
use crate::notify::{require_confirmation, Confirm};
use crate::validation::{FormSetForm, Validate};
use crate::Result;

pub const FORM_SETS_PATH: &str = "form-sets/";

#[derive(Debug, Clone)]
pub struct FormSetComposer {
    client: ApiClient,
}

impl FormSetComposer {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Page<FormSet>> {
        self.client.get_with(FORM_SETS_PATH, query.to_query()).await
    }

    pub async fn get(&self, id: &str) -> Result<FormSet> {
        self.client.get(&item_path(FORM_SETS_PATH, id)).await
    }

    pub async fn create(&self, form: &FormSetForm) -> Result<FormSet> {
        let form_set = form.validate()?;
        let created: FormSet = self.client.post(FORM_SETS_PATH, &form_set).await?;
        log::info!("Created form set {} with {} template(s)", created.name, created.templates.len());
        Ok(created)
    }

    pub async fn update(&self, id: &str, patch: &FormSetPatch) -> Result<FormSet> {
        let patch = patch.validate()?;
        self.client.put(&item_path(FORM_SETS_PATH, id), &patch).await
    }

    pub async fn delete(&self, form_set: &FormSet, confirm: &dyn Confirm) -> Result<()> {
        require_confirmation(confirm, &format!("Delete form set \"{}\"?", form_set.name))?;
        self.client.delete(&item_path(FORM_SETS_PATH, &form_set.id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::testing::{MockBackend, MockReply};
    use http::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_empty_membership_never_reaches_backend() {
        let backend = MockBackend::new();
        let composer = FormSetComposer::new(backend.client().await);

        let form = FormSetForm { name: "Onboarding".into(), ..FormSetForm::default() };
        assert!(matches!(composer.create(&form).await, Err(ApiError::Validation(_))));

        let patch = FormSetPatch { template_ids: Some(Vec::new()), ..FormSetPatch::default() };
        assert!(matches!(composer.update("3", &patch).await, Err(ApiError::Validation(_))));
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn test_update_puts_supplied_members() {
        let backend = MockBackend::new();
        backend.on(
            Method::PUT,
            "form-sets/3/",
            MockReply::json(200, json!({
                "id": 3, "name": "Onboarding",
                "templates": [{"id": 1, "name": "FNA", "category": "broker"}]
            })),
        );
        let composer = FormSetComposer::new(backend.client().await);

        let patch = FormSetPatch { template_ids: Some(vec!["1".into()]), ..FormSetPatch::default() };
        let updated = composer.update("3", &patch).await.unwrap();
        assert_eq!(updated.template_ids(), ["1"]);
        let sent = backend.requests_to(&Method::PUT, "form-sets/3/");
        assert_eq!(sent[0].json_body(), Some(&json!({"template_ids": ["1"]})));
    }
}
