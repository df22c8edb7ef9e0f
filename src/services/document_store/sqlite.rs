use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use super::DocumentStore;
use crate::error::DocumentStoreError;
use crate::models::{InsertOutcome, StoredDocument};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    filename TEXT PRIMARY KEY,
    upload_date TEXT NOT NULL,
    storage_url TEXT NOT NULL,
    storage_id TEXT NOT NULL,
    text TEXT NOT NULL
);
"#;

pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
}

impl SqliteDocumentStore {
    pub fn open(path: &Path) -> Result<Self, DocumentStoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| DocumentStoreError::ConnectionError(e.to_string()))?;
        }
        let conn = Connection::open(path).map_err(connection_error)?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(connection_error)?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self, DocumentStoreError> {
        Self::with_connection(Connection::open_in_memory().map_err(connection_error)?)
    }

    fn with_connection(conn: Connection) -> Result<Self, DocumentStoreError> {
        conn.execute_batch(SCHEMA).map_err(connection_error)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, DocumentStoreError> {
        self.conn
            .lock()
            .map_err(|_| DocumentStoreError::ConnectionError("connection lock poisoned".into()))
    }
}

fn connection_error(e: rusqlite::Error) -> DocumentStoreError {
    DocumentStoreError::ConnectionError(e.to_string())
}

fn query_error(e: rusqlite::Error) -> DocumentStoreError {
    DocumentStoreError::QueryError(e.to_string())
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    fn driver(&self) -> &str {
        "sqlite"
    }

    async fn health_check(&self) -> Result<bool, DocumentStoreError> {
        let conn = self.lock()?;
        conn.query_row("SELECT 1", [], |_| Ok(()))
            .map(|_| true)
            .map_err(connection_error)
    }

    async fn insert(&self, document: &StoredDocument) -> Result<InsertOutcome, DocumentStoreError> {
        let conn = self.lock()?;
        let existed: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM documents WHERE filename = ?1)",
                params![document.filename],
                |row| row.get(0),
            )
            .map_err(query_error)?;

        conn.execute(
            "INSERT INTO documents (filename, upload_date, storage_url, storage_id, text)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(filename) DO UPDATE SET
                upload_date = excluded.upload_date,
                storage_url = excluded.storage_url,
                storage_id = excluded.storage_id,
                text = excluded.text",
            params![
                document.filename,
                document
                    .upload_date
                    .to_rfc3339_opts(SecondsFormat::Micros, true),
                document.storage_url,
                document.storage_id,
                document.text,
            ],
        )
        .map_err(|e| DocumentStoreError::WriteError(e.to_string()))?;

        Ok(if existed {
            InsertOutcome::Replaced
        } else {
            InsertOutcome::Inserted
        })
    }

    async fn find_by_filename(
        &self,
        filename: &str,
    ) -> Result<Option<StoredDocument>, DocumentStoreError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT filename, upload_date, storage_url, storage_id, text
                 FROM documents WHERE filename = ?1",
                params![filename],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()
            .map_err(query_error)?;

        let Some((filename, upload_date, storage_url, storage_id, text)) = row else {
            return Ok(None);
        };

        let upload_date = DateTime::parse_from_rfc3339(&upload_date)
            .map_err(|e| DocumentStoreError::CorruptRecord(format!("upload_date: {e}")))?
            .with_timezone(&Utc);

        Ok(Some(StoredDocument {
            filename,
            upload_date,
            storage_url,
            storage_id,
            text,
        }))
    }

    async fn count(&self) -> Result<u64, DocumentStoreError> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
            .map_err(query_error)?;
        Ok(count.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StoredObject;

    fn document(filename: &str, text: &str) -> StoredDocument {
        StoredDocument::new(
            filename,
            StoredObject {
                url: format!("file:///objects/{filename}"),
                public_id: format!("id-{filename}"),
            },
            text.to_string(),
        )
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = SqliteDocumentStore::in_memory().unwrap();
        let doc = document("report.pdf", "The sky is blue.");

        assert_eq!(store.insert(&doc).await.unwrap(), InsertOutcome::Inserted);

        let found = store.find_by_filename("report.pdf").await.unwrap().unwrap();
        assert_eq!(found.text, "The sky is blue.");
        assert_eq!(found.storage_id, "id-report.pdf");
        assert_eq!(
            found.upload_date.timestamp_micros(),
            doc.upload_date.timestamp_micros()
        );
    }

    #[tokio::test]
    async fn test_duplicate_filename_overwrites() {
        let store = SqliteDocumentStore::in_memory().unwrap();
        store.insert(&document("report.pdf", "old")).await.unwrap();

        let outcome = store.insert(&document("report.pdf", "new")).await.unwrap();
        assert_eq!(outcome, InsertOutcome::Replaced);

        let found = store.find_by_filename("report.pdf").await.unwrap().unwrap();
        assert_eq!(found.text, "new");
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_lookup_is_exact() {
        let store = SqliteDocumentStore::in_memory().unwrap();
        store.insert(&document("report.pdf", "x")).await.unwrap();

        assert!(store.find_by_filename("missing.pdf").await.unwrap().is_none());
        assert!(store.find_by_filename("Report.pdf").await.unwrap().is_none());
        assert!(store.find_by_filename("report.pdf ").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("documents.db");

        {
            let store = SqliteDocumentStore::open(&path).unwrap();
            store.insert(&document("a.pdf", "alpha")).await.unwrap();
            assert!(store.health_check().await.unwrap());
        }

        let reopened = SqliteDocumentStore::open(&path).unwrap();
        assert_eq!(reopened.count().await.unwrap(), 1);
        assert!(reopened.find_by_filename("a.pdf").await.unwrap().is_some());
    }
}
