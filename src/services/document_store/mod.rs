//! Document store abstraction layer.
//!
//! Uploaded documents are keyed by filename. A trait-based abstraction over
//! MongoDB, PostgreSQL and SQLite lets the backend be switched by
//! configuration.

mod mongo;
mod postgres;
mod sqlite;

pub use mongo::MongoDocumentStore;
pub use postgres::PostgresDocumentStore;
pub use sqlite::SqliteDocumentStore;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::DocumentStoreError;
use crate::models::{DocumentDriver, DocumentStoreConfig, InsertOutcome, StoredDocument};

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Driver name as it appears in configuration.
    fn driver(&self) -> &str;

    async fn health_check(&self) -> Result<bool, DocumentStoreError>;

    /// Write `document`, replacing any earlier document with the same filename.
    async fn insert(&self, document: &StoredDocument) -> Result<InsertOutcome, DocumentStoreError>;

    async fn find_by_filename(
        &self,
        filename: &str,
    ) -> Result<Option<StoredDocument>, DocumentStoreError>;

    async fn count(&self) -> Result<u64, DocumentStoreError>;
}

/// Connect to the document store selected by configuration.
pub async fn create_document_store(
    config: &DocumentStoreConfig,
) -> Result<Arc<dyn DocumentStore>, DocumentStoreError> {
    Ok(match config.driver {
        DocumentDriver::MongoDB => Arc::new(MongoDocumentStore::connect(config).await?),
        DocumentDriver::PostgreSQL => Arc::new(PostgresDocumentStore::connect(config).await?),
        DocumentDriver::SQLite => {
            let path = config.sqlite_path().ok_or_else(|| {
                DocumentStoreError::ConnectionError("could not determine SQLite path".into())
            })?;
            Arc::new(SqliteDocumentStore::open(&path)?)
        }
    })
}

/// Table and collection names are interpolated into SQL, so only plain
/// identifiers are accepted.
pub(crate) fn validate_identifier(name: &str) -> Result<&str, DocumentStoreError> {
    let valid = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(name)
    } else {
        Err(DocumentStoreError::ConnectionError(format!(
            "invalid table name: {name:?}"
        )))
    }
}
