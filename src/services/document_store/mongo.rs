use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::{self, doc};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, IndexModel};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::DocumentStore;
use crate::error::DocumentStoreError;
use crate::models::{DocumentStoreConfig, InsertOutcome, StoredDocument};

/// Field layout shared with documents written by earlier deployments.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DocumentRecord {
    filename: String,
    upload_date: bson::DateTime,
    cloudinary_url: String,
    cloudinary_public_id: String,
    text: String,
}

impl From<&StoredDocument> for DocumentRecord {
    fn from(document: &StoredDocument) -> Self {
        Self {
            filename: document.filename.clone(),
            upload_date: bson::DateTime::from_millis(document.upload_date.timestamp_millis()),
            cloudinary_url: document.storage_url.clone(),
            cloudinary_public_id: document.storage_id.clone(),
            text: document.text.clone(),
        }
    }
}

impl TryFrom<DocumentRecord> for StoredDocument {
    type Error = DocumentStoreError;

    fn try_from(record: DocumentRecord) -> Result<Self, Self::Error> {
        let millis = record.upload_date.timestamp_millis();
        let upload_date = DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| {
            DocumentStoreError::CorruptRecord(format!("upload_date out of range: {millis}"))
        })?;
        Ok(Self {
            filename: record.filename,
            upload_date,
            storage_url: record.cloudinary_url,
            storage_id: record.cloudinary_public_id,
            text: record.text,
        })
    }
}

pub struct MongoDocumentStore {
    client: Client,
    collection: Collection<DocumentRecord>,
    database: String,
}

impl MongoDocumentStore {
    pub async fn connect(config: &DocumentStoreConfig) -> Result<Self, DocumentStoreError> {
        let mut options = ClientOptions::parse(config.connection_url())
            .await
            .map_err(|e| DocumentStoreError::ConnectionError(e.to_string()))?;
        options.max_pool_size = Some(config.pool_max);
        options.server_selection_timeout = Some(Duration::from_secs(10));

        let client = Client::with_options(options)
            .map_err(|e| DocumentStoreError::ConnectionError(e.to_string()))?;
        let collection = client
            .database(&config.database)
            .collection::<DocumentRecord>(&config.collection);

        let store = Self {
            client,
            collection,
            database: config.database.clone(),
        };
        store.ensure_filename_index().await;
        Ok(store)
    }

    /// Collections written with plain inserts may already hold duplicate
    /// filenames, in which case the unique index cannot be built. Lookups
    /// still work without it.
    async fn ensure_filename_index(&self) {
        let index = IndexModel::builder()
            .keys(doc! { "filename": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        if let Err(e) = self.collection.create_index(index).await {
            warn!("Could not create unique filename index: {e}");
        }
    }
}

#[async_trait]
impl DocumentStore for MongoDocumentStore {
    fn driver(&self) -> &str {
        "mongodb"
    }

    async fn health_check(&self) -> Result<bool, DocumentStoreError> {
        self.client
            .database(&self.database)
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| true)
            .map_err(|e| DocumentStoreError::ConnectionError(e.to_string()))
    }

    async fn insert(&self, document: &StoredDocument) -> Result<InsertOutcome, DocumentStoreError> {
        let record = DocumentRecord::from(document);
        let result = self
            .collection
            .replace_one(doc! { "filename": document.filename.as_str() }, &record)
            .upsert(true)
            .await
            .map_err(|e| DocumentStoreError::WriteError(e.to_string()))?;

        Ok(if result.upserted_id.is_some() {
            InsertOutcome::Inserted
        } else {
            InsertOutcome::Replaced
        })
    }

    async fn find_by_filename(
        &self,
        filename: &str,
    ) -> Result<Option<StoredDocument>, DocumentStoreError> {
        self.collection
            .find_one(doc! { "filename": filename })
            .await
            .map_err(|e| DocumentStoreError::QueryError(e.to_string()))?
            .map(StoredDocument::try_from)
            .transpose()
    }

    async fn count(&self) -> Result<u64, DocumentStoreError> {
        self.collection
            .count_documents(doc! {})
            .await
            .map_err(|e| DocumentStoreError::QueryError(e.to_string()))
    }
}
