use async_trait::async_trait;
use gstrecon_core::ReconciliationResult;
use serde::de::DeserializeOwned;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

use crate::types::{Dataset, InputFile, MissingPreview, UploadSummary};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP {status}: {detail}")]
    Http { status: u16, detail: String },
    #[error("Parse error: {0}")]
    Parse(String),
}

/// The matching engine, seen from the client.
#[async_trait]
pub trait ReconBackend: Send + Sync {
    async fn upload(&self, dataset: Dataset, file: &InputFile) -> Result<UploadSummary, BackendError>;

    async fn preview_missing(&self) -> Result<MissingPreview, BackendError>;

    async fn reconcile(&self) -> Result<ReconciliationResult, BackendError>;
}

// ── HTTP backend ──────────────────────────────────────────────────────────────

pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("gstrecon/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Status check, then JSON decode. Error bodies carry a `detail` field.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Http {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))
    }
}

fn error_detail(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => match map.get("detail") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => body.to_string(),
        },
        _ => body.to_string(),
    }
}

#[async_trait]
impl ReconBackend for HttpBackend {
    async fn upload(&self, dataset: Dataset, file: &InputFile) -> Result<UploadSummary, BackendError> {
        let url = self.url(&format!("/upload/{}", dataset.endpoint()));
        tracing::debug!(%url, file = %file.name, bytes = file.bytes.len(), "uploading dataset");

        let part = reqwest::multipart::Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str("text/csv")
            .map_err(|e| BackendError::Parse(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;
        Self::decode(response).await
    }

    async fn preview_missing(&self) -> Result<MissingPreview, BackendError> {
        let response = self
            .http
            .get(self.url("/preview-missing"))
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;
        Self::decode(response).await
    }

    async fn reconcile(&self) -> Result<ReconciliationResult, BackendError> {
        let response = self
            .http
            .post(self.url("/reconcile"))
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;
        Self::decode(response).await
    }
}

// ── Mock backend (tests and offline runs) ─────────────────────────────────────

/// Canned responses. Records the file names it was asked to upload.
pub struct MockBackend {
    upload: Result<UploadSummary, BackendError>,
    preview: Result<MissingPreview, BackendError>,
    reconcile: Result<ReconciliationResult, BackendError>,
    uploads: Mutex<Vec<(Dataset, String)>>,
}

impl MockBackend {
    pub fn new(result: ReconciliationResult) -> Self {
        Self {
            upload: Ok(UploadSummary {
                status: "success".to_string(),
                message: "uploaded".to_string(),
                records: 0,
                fields: Vec::new(),
                total_invoice_value: gstrecon_core::Money::zero(),
                duplicates: None,
                warning: None,
            }),
            preview: Ok(MissingPreview::default()),
            reconcile: Ok(result),
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn with_upload(mut self, upload: Result<UploadSummary, BackendError>) -> Self {
        self.upload = upload;
        self
    }

    pub fn with_preview(mut self, preview: Result<MissingPreview, BackendError>) -> Self {
        self.preview = preview;
        self
    }

    pub fn with_reconcile(mut self, reconcile: Result<ReconciliationResult, BackendError>) -> Self {
        self.reconcile = reconcile;
        self
    }

    pub fn uploads(&self) -> Vec<(Dataset, String)> {
        self.uploads
            .lock()
            .map(|u| u.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ReconBackend for MockBackend {
    async fn upload(&self, dataset: Dataset, file: &InputFile) -> Result<UploadSummary, BackendError> {
        if let Ok(mut uploads) = self.uploads.lock() {
            uploads.push((dataset, file.name.clone()));
        }
        self.upload.clone()
    }

    async fn preview_missing(&self) -> Result<MissingPreview, BackendError> {
        self.preview.clone()
    }

    async fn reconcile(&self) -> Result<ReconciliationResult, BackendError> {
        self.reconcile.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_extracted_from_json_body() {
        assert_eq!(
            error_detail(r#"{"detail": "Only CSV files are allowed"}"#),
            "Only CSV files are allowed"
        );
        assert_eq!(error_detail("Internal Server Error"), "Internal Server Error");
        assert_eq!(error_detail(r#"{"error": "x"}"#), r#"{"error": "x"}"#);
        assert!(error_detail(r#"{"detail": [{"loc": ["body"]}]}"#).starts_with('['));
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let b = HttpBackend::new("http://localhost:8000/", Duration::from_secs(5)).unwrap();
        assert_eq!(b.base_url(), DEFAULT_BASE_URL);
        assert_eq!(b.url("/reconcile"), "http://localhost:8000/reconcile");
    }

    #[tokio::test]
    async fn mock_records_uploads() {
        let mock = MockBackend::new(ReconciliationResult::default());
        mock.upload(Dataset::Gst, &InputFile::new("gst.csv", "a,b"))
            .await
            .unwrap();
        assert_eq!(mock.uploads(), vec![(Dataset::Gst, "gst.csv".to_string())]);
    }

    #[tokio::test]
    async fn mock_returns_configured_failure() {
        let mock = MockBackend::new(ReconciliationResult::default())
            .with_reconcile(Err(BackendError::Network("refused".into())));
        assert_eq!(
            mock.reconcile().await.unwrap_err().to_string(),
            "Network error: refused"
        );
    }
}
