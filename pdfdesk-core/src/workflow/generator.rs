//! Batch generation endpoints

use crate::api::{ApiClient, Download};
use crate::error::ApiError;
use crate::model::batch::{FormGenerationBatch, GenerateFormsRequest};
use crate::model::page::Page;
use crate::registry::item_path;
use crate::transport::segment;
use crate::Result;

pub const BATCHES_PATH: &str = "forms/batches/";

pub const QUOTA_EXCEEDED_MESSAGE: &str =
    "Daily form generation quota exceeded. Please try again tomorrow.";

#[derive(Debug, Clone)]
pub struct FormGenerator {
    client: ApiClient,
}

impl FormGenerator {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Submit client data against templates.
    ///
    /// The backend refuses an over-quota user with 403 or 429; both surface
    /// as [`ApiError::QuotaExceeded`].
    pub async fn generate(&self, request: &GenerateFormsRequest) -> Result<FormGenerationBatch> {
        if request.template_ids.is_empty() {
            return Err(ApiError::invalid("template_ids", "Please select at least one template."));
        }

        match self.client.post(BATCHES_PATH, request).await {
            Ok(batch) => Ok(batch),
            Err(ApiError::Forbidden(detail)) | Err(ApiError::QuotaExceeded(detail)) => {
                log::warn!("Form generation refused for client {}: {}", request.client_id, detail);
                Err(ApiError::QuotaExceeded(QUOTA_EXCEEDED_MESSAGE.to_string()))
            }
            Err(err) => Err(err),
        }
    }

    pub async fn get_batch(&self, id: &str) -> Result<FormGenerationBatch> {
        self.client.get(&item_path(BATCHES_PATH, id)).await
    }

    pub async fn list_batches(&self) -> Result<Page<FormGenerationBatch>> {
        self.client.get(BATCHES_PATH).await
    }

    /// One generated PDF
    pub async fn download_form(&self, form_id: &str) -> Result<Download> {
        let path = format!("forms/forms/{}/download/", segment(form_id));
        let response = self.client.get_bytes(&path, Vec::new()).await?;
        Ok(Download::from_response(format!("form-{}.pdf", form_id), response))
    }

    /// Every PDF of a batch as one zip archive
    pub async fn download_batch(&self, batch_id: &str) -> Result<Download> {
        let path = format!("{}{}/download_forms/", BATCHES_PATH, segment(batch_id));
        let response = self.client.get_bytes(&path, Vec::new()).await?;
        Ok(Download::from_response(format!("batch-{}.zip", batch_id), response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockBackend, MockReply};
    use http::Method;
    use serde_json::{json, Map};

    fn request() -> GenerateFormsRequest {
        GenerateFormsRequest {
            client_id: "c-1".into(),
            template_ids: vec!["7".into()],
            client_data: Map::new(),
            insurer: None,
        }
    }

    #[tokio::test]
    async fn test_forbidden_and_429_mean_quota() {
        for status in [403, 429] {
            let backend = MockBackend::new();
            backend.on(Method::POST, BATCHES_PATH, MockReply::json(status, json!({"detail": "nope"})));
            let generator = FormGenerator::new(backend.client().await);

            let err = generator.generate(&request()).await.unwrap_err();
            assert!(matches!(err, ApiError::QuotaExceeded(ref m) if m == QUOTA_EXCEEDED_MESSAGE));
        }
    }

    #[tokio::test]
    async fn test_generate_posts_payload() {
        let backend = MockBackend::new();
        backend.on(
            Method::POST,
            BATCHES_PATH,
            MockReply::json(201, json!({"id": 4, "status": "processing", "forms": []})),
        );
        let generator = FormGenerator::new(backend.client().await);

        let batch = generator.generate(&request()).await.unwrap();
        assert_eq!(batch.id, "4");
        let sent = &backend.requests_to(&Method::POST, BATCHES_PATH)[0];
        assert_eq!(sent.json_body().unwrap()["template_ids"], json!(["7"]));
        assert!(sent.json_body().unwrap().get("insurer").is_none());
    }

    #[tokio::test]
    async fn test_downloads_are_named() {
        let backend = MockBackend::new();
        backend.on(Method::GET, "forms/forms/9/download/", MockReply::bytes("application/pdf", "%PDF"));
        backend.on(Method::GET, "forms/batches/4/download_forms/", MockReply::bytes("application/zip", "PK"));
        let generator = FormGenerator::new(backend.client().await);

        assert_eq!(generator.download_form("9").await.unwrap().file_name, "form-9.pdf");
        let zip = generator.download_batch("4").await.unwrap();
        assert_eq!(zip.file_name, "batch-4.zip");
        assert_eq!(zip.bytes.as_ref(), b"PK");
    }
}
