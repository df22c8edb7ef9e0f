//! Object storage for uploaded PDF binaries.

mod cloudinary;
mod local;

pub use cloudinary::CloudinaryStorage;
pub use local::LocalStorage;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::models::{StorageConfig, StorageDriver, StoredObject};

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    fn name(&self) -> &str;

    /// Store the file at `path` under `filename` and return where it landed.
    async fn upload(&self, path: &Path, filename: &str) -> Result<StoredObject, StorageError>;

    async fn health_check(&self) -> Result<bool, StorageError>;
}

pub fn create_object_storage(
    config: &StorageConfig,
) -> Result<Arc<dyn ObjectStorage>, StorageError> {
    Ok(match config.driver {
        StorageDriver::Cloudinary => Arc::new(CloudinaryStorage::new(config)?),
        StorageDriver::Local => {
            let dir = config.local_dir().ok_or_else(|| {
                StorageError::ConnectionError("could not determine local storage directory".into())
            })?;
            Arc::new(LocalStorage::new(dir)?)
        }
    })
}
