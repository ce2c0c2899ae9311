use super::*;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Flat directory store. The root is resolved once and never changes.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    /// Resolves `storage_path` to an absolute directory, optionally wiping what
    /// is already there, and creates it. Wipe failures are only logged.
    pub fn init(storage_path: impl AsRef<Path>, wipe_existing: bool) -> Result<Self, StoreError> {
        let root = std::path::absolute(storage_path.as_ref())?;

        if wipe_existing {
            match std::fs::remove_dir_all(&root) {
                Ok(()) => tracing::info!(root = %root.display(), "wiped storage root"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(root = %root.display(), error = %e, "could not wipe storage root")
                }
            }
        }

        std::fs::create_dir_all(&root)?;

        let metadata = std::fs::metadata(&root)?;
        if !metadata.is_dir() {
            return Err(StoreError::NotADirectory);
        }
        if metadata.permissions().readonly() {
            return Err(StoreError::Io(std::io::Error::from(
                std::io::ErrorKind::PermissionDenied,
            )));
        }

        tracing::info!(root = %root.display(), "storage root ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a file name to a direct child of the root. Anything that is not a
    /// single plain path segment is rejected.
    fn resolve(&self, name: &str) -> Result<PathBuf, StoreError> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(segment)), None) if segment == OsStr::new(name) => {
                Ok(self.root.join(segment))
            }
            _ => Err(StoreError::InvalidName(name.to_string())),
        }
    }
}

#[async_trait]
impl Storage for LocalFileStorage {
    async fn get(&self, name: &str) -> Result<StoredFile, StoreError> {
        let file_path = self.resolve(name)?;

        let metadata = fs::metadata(&file_path).await.map_err(StoreError::from_io)?;
        if !metadata.is_file() {
            return Err(StoreError::NotFound);
        }

        let bytes = fs::read(&file_path).await.map_err(StoreError::from_io)?;

        Ok(StoredFile {
            name: name.to_string(),
            bytes,
        })
    }

    async fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut entries = fs::read_dir(&self.root).await.map_err(StoreError::from_io)?;

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(StoreError::from_io)? {
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => tracing::warn!(name = ?raw, "skipping entry with a non UTF-8 name"),
            }
        }

        Ok(names)
    }

    async fn save(&self, file: &UploadedFile) -> Result<String, StoreError> {
        let file_path = self.resolve(&file.original_filename)?;

        let mut out = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&file_path)
            .await
            .map_err(StoreError::from_io)?;

        let written = async {
            out.write_all(&file.bytes).await?;
            out.flush().await
        }
        .await;

        if let Err(e) = written {
            drop(out);
            let _ = fs::remove_file(&file_path).await;
            return Err(StoreError::Io(e));
        }

        tracing::info!(
            name = %file.original_filename,
            field = %file.field_name,
            content_type = ?file.content_type,
            size = file.bytes.len(),
            "stored file"
        );
        Ok(file.original_filename.clone())
    }

    async fn delete(&self, name: &str) -> Result<(), StoreError> {
        let file_path = self.resolve(name)?;

        fs::remove_file(file_path)
            .await
            .map_err(StoreError::from_io)?;

        tracing::info!(name = %name, "deleted file");
        Ok(())
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        let mut entries = fs::read_dir(&self.root).await.map_err(StoreError::from_io)?;

        let mut deleted = 0;
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "listing interrupted while emptying storage");
                    break;
                }
            };

            // Subdirectories are left alone and not counted.
            if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }

            match fs::remove_file(entry.path()).await {
                Ok(()) => deleted += 1,
                Err(e) => tracing::warn!(
                    name = %entry.file_name().to_string_lossy(),
                    error = %e,
                    "could not delete file"
                ),
            }
        }

        tracing::info!(deleted, "emptied storage");
        Ok(deleted)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let mut entries = fs::read_dir(&self.root).await.map_err(StoreError::from_io)?;

        let mut count = 0;
        while entries.next_entry().await.map_err(StoreError::from_io)?.is_some() {
            count += 1;
        }

        Ok(count)
    }
}
