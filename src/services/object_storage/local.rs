//! Filesystem-backed object storage for development and tests.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use super::ObjectStorage;
use crate::error::StorageError;
use crate::models::StoredObject;
use crate::utils::{calculate_checksum, sanitize_filename};

#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: PathBuf) -> Result<Self, StorageError> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Stable id for a filename and content pair.
fn object_id(filename: &str, checksum: &str) -> Uuid {
    Uuid::new_v5(
        &Uuid::NAMESPACE_URL,
        format!("{filename}#{checksum}").as_bytes(),
    )
}

#[async_trait]
impl ObjectStorage for LocalStorage {
    fn name(&self) -> &str {
        "local"
    }

    async fn upload(&self, path: &Path, filename: &str) -> Result<StoredObject, StorageError> {
        let bytes = tokio::fs::read(path).await?;
        let id = object_id(filename, &calculate_checksum(&bytes));

        let target = self
            .root
            .join(format!("{id}-{}", sanitize_filename(filename)));
        tokio::fs::write(&target, &bytes).await?;

        let target = target.canonicalize()?;
        Ok(StoredObject {
            url: format!("file://{}", target.display()),
            public_id: id.to_string(),
        })
    }

    async fn health_check(&self) -> Result<bool, StorageError> {
        Ok(tokio::fs::metadata(&self.root).await?.is_dir())
    }
}
