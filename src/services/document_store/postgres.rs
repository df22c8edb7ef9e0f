use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};

use super::{DocumentStore, validate_identifier};
use crate::error::DocumentStoreError;
use crate::models::{DocumentStoreConfig, InsertOutcome, StoredDocument};

pub struct PostgresDocumentStore {
    pool: PgPool,
    table_name: String,
}

impl PostgresDocumentStore {
    pub async fn connect(config: &DocumentStoreConfig) -> Result<Self, DocumentStoreError> {
        let table_name = validate_identifier(&config.collection)?.to_string();

        let pool = PgPoolOptions::new()
            .max_connections(config.pool_max)
            .acquire_timeout(Duration::from_secs(10))
            .connect(&config.connection_url())
            .await
            .map_err(|e| DocumentStoreError::ConnectionError(e.to_string()))?;

        let store = Self { pool, table_name };
        store.ensure_table().await?;
        Ok(store)
    }

    async fn ensure_table(&self) -> Result<(), DocumentStoreError> {
        let query = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                filename TEXT PRIMARY KEY,
                upload_date TIMESTAMPTZ NOT NULL,
                storage_url TEXT NOT NULL,
                storage_id TEXT NOT NULL,
                text TEXT NOT NULL
            )
            "#,
            self.table_name
        );
        sqlx::query(&query)
            .execute(&self.pool)
            .await
            .map_err(|e| DocumentStoreError::QueryError(e.to_string()))?;
        Ok(())
    }

    fn row_to_document(row: &PgRow) -> Result<StoredDocument, DocumentStoreError> {
        let corrupt = |e: sqlx::Error| DocumentStoreError::CorruptRecord(e.to_string());
        Ok(StoredDocument {
            filename: row.try_get("filename").map_err(corrupt)?,
            upload_date: row.try_get::<DateTime<Utc>, _>("upload_date").map_err(corrupt)?,
            storage_url: row.try_get("storage_url").map_err(corrupt)?,
            storage_id: row.try_get("storage_id").map_err(corrupt)?,
            text: row.try_get("text").map_err(corrupt)?,
        })
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    fn driver(&self) -> &str {
        "postgres"
    }

    async fn health_check(&self) -> Result<bool, DocumentStoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| true)
            .map_err(|e| DocumentStoreError::ConnectionError(e.to_string()))
    }

    async fn insert(&self, document: &StoredDocument) -> Result<InsertOutcome, DocumentStoreError> {
        // xmax is zero only for rows created by this statement.
        let query = format!(
            r#"
            INSERT INTO {} (filename, upload_date, storage_url, storage_id, text)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (filename) DO UPDATE SET
                upload_date = EXCLUDED.upload_date,
                storage_url = EXCLUDED.storage_url,
                storage_id = EXCLUDED.storage_id,
                text = EXCLUDED.text
            RETURNING (xmax = 0) AS inserted
            "#,
            self.table_name
        );

        let inserted: bool = sqlx::query_scalar(&query)
            .bind(&document.filename)
            .bind(document.upload_date)
            .bind(&document.storage_url)
            .bind(&document.storage_id)
            .bind(&document.text)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DocumentStoreError::WriteError(e.to_string()))?;

        Ok(if inserted {
            InsertOutcome::Inserted
        } else {
            InsertOutcome::Replaced
        })
    }

    async fn find_by_filename(
        &self,
        filename: &str,
    ) -> Result<Option<StoredDocument>, DocumentStoreError> {
        let query = format!(
            "SELECT filename, upload_date, storage_url, storage_id, text FROM {} WHERE filename = $1",
            self.table_name
        );
        let row = sqlx::query(&query)
            .bind(filename)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DocumentStoreError::QueryError(e.to_string()))?;

        row.as_ref().map(Self::row_to_document).transpose()
    }

    async fn count(&self) -> Result<u64, DocumentStoreError> {
        let query = format!("SELECT COUNT(*) FROM {}", self.table_name);
        let count: i64 = sqlx::query_scalar(&query)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DocumentStoreError::QueryError(e.to_string()))?;
        Ok(count.max(0) as u64)
    }
}
