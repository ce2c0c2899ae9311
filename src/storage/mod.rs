mod file_store;
mod local_fs;

pub use file_store::FileStore;
pub use local_fs::LocalFileStorage;

use crate::errors::StoreError;
use async_trait::async_trait;
use mime::Mime;

/// One uploaded multipart item, already bound from the request.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub field_name: String,
    pub original_filename: String,
    pub content_type: Option<Mime>,
    pub bytes: Vec<u8>,
}

#[cfg(test)]
impl UploadedFile {
    pub fn new(original_filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            field_name: "file".to_string(),
            original_filename: original_filename.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }
}

/// A file read back from the storage root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Operations on the direct children of a single storage root.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    async fn get(&self, name: &str) -> Result<StoredFile, StoreError>;
    async fn list(&self) -> Result<Vec<String>, StoreError>;
    /// Writes a new file; never replaces an existing one.
    async fn save(&self, file: &UploadedFile) -> Result<String, StoreError>;
    async fn delete(&self, name: &str) -> Result<(), StoreError>;
    /// Removes every direct child that is a file and returns how many went away.
    async fn delete_all(&self) -> Result<u64, StoreError>;
    async fn count(&self) -> Result<u64, StoreError>;
}
