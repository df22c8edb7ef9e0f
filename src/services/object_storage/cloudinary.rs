//! Cloudinary signed uploads.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::ObjectStorage;
use crate::error::StorageError;
use crate::models::{StorageConfig, StoredObject};

#[derive(Debug, Deserialize)]
struct UploadResult {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Clone)]
pub struct CloudinaryStorage {
    client: Client,
    upload_url: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

impl CloudinaryStorage {
    pub fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        let missing = |name: &str| StorageError::ConnectionError(format!("missing {name}"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StorageError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            upload_url: config.upload_url.trim_end_matches('/').to_string(),
            cloud_name: config.cloud_name.clone().ok_or_else(|| missing("cloud_name"))?,
            api_key: config.api_key.clone().ok_or_else(|| missing("api_key"))?,
            api_secret: config.api_secret.clone().ok_or_else(|| missing("api_secret"))?,
        })
    }

    /// `resource_type` is `auto` so Cloudinary decides how to treat the PDF.
    fn endpoint(&self) -> String {
        format!("{}/{}/auto/upload", self.upload_url, self.cloud_name)
    }
}

/// Hex SHA-256 of the sorted signed parameters followed by the secret.
pub fn sign(timestamp: i64, api_secret: &str) -> String {
    let payload = format!("timestamp={timestamp}{api_secret}");
    hex::encode(Sha256::digest(payload.as_bytes()))
}

#[async_trait]
impl ObjectStorage for CloudinaryStorage {
    fn name(&self) -> &str {
        "cloudinary"
    }

    async fn upload(&self, path: &Path, filename: &str) -> Result<StoredObject, StorageError> {
        let bytes = tokio::fs::read(path).await?;
        let timestamp = Utc::now().timestamp();

        let file = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str("application/pdf")
            .map_err(|e| StorageError::InvalidResponse(e.to_string()))?;

        let form = Form::new()
            .part("file", file)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("signature", sign(timestamp, &self.api_secret))
            .text("signature_algorithm", "sha256");

        let response = self
            .client
            .post(self.endpoint())
            .multipart(form)
            .send()
            .await
            .map_err(|e| StorageError::ConnectionError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::ServerError(format!("status {status}: {body}")));
        }

        let result: UploadResult = response
            .json()
            .await
            .map_err(|e| StorageError::InvalidResponse(e.to_string()))?;

        debug!(public_id = %result.public_id, "Uploaded to Cloudinary");
        Ok(StoredObject {
            url: result.secure_url,
            public_id: result.public_id,
        })
    }

    /// Credentials are checked locally; Cloudinary's admin API is rate limited.
    async fn health_check(&self) -> Result<bool, StorageError> {
        Ok(!self.cloud_name.is_empty() && !self.api_key.is_empty() && !self.api_secret.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::mock::MockUpstream;
    use crate::testing::pdf::single_page_pdf;

    fn config() -> StorageConfig {
        StorageConfig {
            cloud_name: Some("demo".to_string()),
            api_key: Some("1234".to_string()),
            api_secret: Some("abcd".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_signature() {
        // sha256("timestamp=1315060510abcd")
        let expected = hex::encode(Sha256::digest(b"timestamp=1315060510abcd"));
        assert_eq!(sign(1_315_060_510, "abcd"), expected);
        assert_eq!(sign(1_315_060_510, "abcd").len(), 64);
        assert_ne!(sign(1_315_060_510, "abcd"), sign(1_315_060_511, "abcd"));
    }

    #[test]
    fn test_endpoint() {
        let storage = CloudinaryStorage::new(&config()).unwrap();
        assert_eq!(
            storage.endpoint(),
            "https://api.cloudinary.com/v1_1/demo/auto/upload"
        );
    }

    #[test]
    fn test_missing_credentials() {
        let mut config = config();
        config.api_secret = None;
        assert!(matches!(
            CloudinaryStorage::new(&config),
            Err(StorageError::ConnectionError(ref s)) if s.contains("api_secret")
        ));
    }

    async fn write_pdf(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("spool.pdf");
        tokio::fs::write(&path, single_page_pdf("The sky is blue."))
            .await
            .unwrap();
        path
    }

    #[tokio::test]
    async fn test_upload_sends_signed_form() {
        let upstream = MockUpstream::start().await;
        let dir = tempfile::tempdir().unwrap();
        let path = write_pdf(&dir).await;

        let mut config = config();
        config.upload_url = upstream.url();
        let storage = CloudinaryStorage::new(&config).unwrap();

        let object = storage.upload(&path, "report.pdf").await.unwrap();
        assert_eq!(object.public_id, "report");
        assert_eq!(
            object.url,
            "https://res.cloudinary.com/demo/image/upload/v1/report.pdf"
        );

        let upload = upstream.last_upload().unwrap();
        assert_eq!(upload.cloud_name, "demo");
        assert_eq!(upload.filename, "report.pdf");
        assert_eq!(upload.bytes, single_page_pdf("The sky is blue.").len());
        assert_eq!(upload.api_key, "1234");
        let timestamp: i64 = upload.timestamp.parse().unwrap();
        assert_eq!(upload.signature, sign(timestamp, "abcd"));
    }

    #[tokio::test]
    async fn test_rejected_upload_is_server_error() {
        let upstream = MockUpstream::start().await;
        upstream.fail_storage(true);
        let dir = tempfile::tempdir().unwrap();
        let path = write_pdf(&dir).await;

        let mut config = config();
        config.upload_url = upstream.url();
        let storage = CloudinaryStorage::new(&config).unwrap();

        let err = storage.upload(&path, "report.pdf").await.unwrap_err();
        assert!(matches!(err, StorageError::ServerError(ref s) if s.contains("401")));
    }

    #[test]
    fn test_parse_upload_result() {
        let result: UploadResult = serde_json::from_str(
            r#"{"asset_id": "x", "public_id": "report_abc", "version": 1,
                "secure_url": "https://res.cloudinary.com/demo/image/upload/v1/report_abc.pdf"}"#,
        )
        .unwrap();
        assert_eq!(result.public_id, "report_abc");
    }
}
