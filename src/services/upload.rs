//! Upload flow: spool, extract, store the binary, persist the text.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::document_store::DocumentStore;
use super::extractor::PdfExtractor;
use super::object_storage::ObjectStorage;
use crate::error::UploadError;
use crate::models::{InsertOutcome, StoredDocument, UploadReceipt};

#[derive(Clone)]
pub struct UploadService {
    extractor: PdfExtractor,
    storage: Arc<dyn ObjectStorage>,
    documents: Arc<dyn DocumentStore>,
    temp_dir: Option<PathBuf>,
}

impl UploadService {
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        documents: Arc<dyn DocumentStore>,
        temp_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            extractor: PdfExtractor::new(),
            storage,
            documents,
            temp_dir,
        }
    }

    /// Create an empty temporary file for an incoming upload. The file is
    /// removed when the handle is dropped.
    pub fn spool(&self) -> Result<NamedTempFile, UploadError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("pdfqa-upload-").suffix(".pdf");
        let spool = match &self.temp_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                builder.tempfile_in(dir)?
            }
            None => builder.tempfile()?,
        };
        Ok(spool)
    }

    /// Upload in-memory bytes under `filename`.
    pub async fn upload_bytes(
        &self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<UploadReceipt, UploadError> {
        validate_filename(filename)?;
        let spool = self.spool()?;
        let mut file = tokio::fs::File::from_std(spool.as_file().try_clone()?);
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        self.store_file(filename, spool.path()).await
    }

    /// Upload a file from disk, named after its final path component.
    pub async fn upload_path(&self, path: &Path) -> Result<UploadReceipt, UploadError> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| {
                UploadError::InvalidRequest(format!("{} has no file name", path.display()))
            })?;
        self.store_file(&filename, path).await
    }

    /// Extract, store and persist the file at `path` under `filename`.
    pub async fn store_file(&self, filename: &str, path: &Path) -> Result<UploadReceipt, UploadError> {
        validate_filename(filename)?;

        let text = self.extractor.extract_path(path).await?;
        debug!(filename, characters = text.chars().count(), "Text extracted");

        let object = self.storage.upload(path, filename).await?;
        debug!(filename, storage = self.storage.name(), url = %object.url, "Binary stored");

        let document = StoredDocument::new(filename, object, text);
        let outcome = self.documents.insert(&document).await?;
        let replaced = outcome == InsertOutcome::Replaced;

        info!(filename, replaced, "Document uploaded");
        Ok(UploadReceipt {
            filename: document.filename,
            storage_url: document.storage_url,
            storage_id: document.storage_id,
            characters: document.text.chars().count(),
            replaced,
        })
    }
}

fn validate_filename(filename: &str) -> Result<(), UploadError> {
    if filename.trim().is_empty() {
        return Err(UploadError::InvalidRequest("filename must not be blank".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractError;
    use crate::services::document_store::SqliteDocumentStore;
    use crate::services::object_storage::LocalStorage;
    use crate::testing::pdf::single_page_pdf;
    use tempfile::{TempDir, tempdir};

    fn service(dir: &TempDir) -> (UploadService, Arc<SqliteDocumentStore>) {
        let documents = Arc::new(SqliteDocumentStore::in_memory().unwrap());
        let storage = Arc::new(LocalStorage::new(dir.path().join("objects")).unwrap());
        let service = UploadService::new(storage, documents.clone(), Some(dir.path().join("tmp")));
        (service, documents)
    }

    fn spooled_files(dir: &TempDir) -> usize {
        std::fs::read_dir(dir.path().join("tmp"))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    #[tokio::test]
    async fn test_upload_then_lookup() {
        let dir = tempdir().unwrap();
        let (service, documents) = service(&dir);

        let receipt = service
            .upload_bytes("report.pdf", &single_page_pdf("The sky is blue."))
            .await
            .unwrap();

        assert_eq!(receipt.filename, "report.pdf");
        assert!(!receipt.replaced);
        assert!(receipt.characters > 0);

        let stored = documents.find_by_filename("report.pdf").await.unwrap().unwrap();
        assert!(stored.text.contains("The sky is blue."));
        assert_eq!(stored.storage_id, receipt.storage_id);
        assert_eq!(spooled_files(&dir), 0);
    }

    #[tokio::test]
    async fn test_reupload_replaces() {
        let dir = tempdir().unwrap();
        let (service, documents) = service(&dir);

        service
            .upload_bytes("report.pdf", &single_page_pdf("First draft."))
            .await
            .unwrap();
        let receipt = service
            .upload_bytes("report.pdf", &single_page_pdf("Final version."))
            .await
            .unwrap();

        assert!(receipt.replaced);
        let stored = documents.find_by_filename("report.pdf").await.unwrap().unwrap();
        assert!(stored.text.contains("Final version."));
        assert_eq!(documents.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_invalid_pdf_is_rejected_and_cleaned_up() {
        let dir = tempdir().unwrap();
        let (service, documents) = service(&dir);

        let err = service
            .upload_bytes("notes.pdf", b"just some text")
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Extract(ExtractError::NotPdf)));
        assert_eq!(documents.count().await.unwrap(), 0);
        assert_eq!(spooled_files(&dir), 0);
    }

    #[tokio::test]
    async fn test_blank_filename() {
        let dir = tempdir().unwrap();
        let (service, _) = service(&dir);

        let err = service
            .upload_bytes("  ", &single_page_pdf("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_upload_path_uses_file_name() {
        let dir = tempdir().unwrap();
        let (service, documents) = service(&dir);
        let path = dir.path().join("summary.pdf");
        std::fs::write(&path, single_page_pdf("Quarterly summary.")).unwrap();

        let receipt = service.upload_path(&path).await.unwrap();
        assert_eq!(receipt.filename, "summary.pdf");
        assert!(documents.find_by_filename("summary.pdf").await.unwrap().is_some());
    }
}
