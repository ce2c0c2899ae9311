use super::*;
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;

/// Caller-facing view of a [`Storage`]: expected failures come back as
/// absent, `false`, empty or a negative count instead of errors.
#[derive(Clone)]
pub struct FileStore {
    storage: Arc<dyn Storage>,
}

impl FileStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Missing and unreadable files both come back as `None`.
    pub async fn fetch(&self, name: &str) -> Option<StoredFile> {
        match self.storage.get(name).await {
            Ok(file) => Some(file),
            Err(e) => {
                tracing::debug!(name = %name, error = %e, "file not available");
                None
            }
        }
    }

    pub async fn list_all(&self) -> Vec<String> {
        self.storage.list().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not list storage root");
            Vec::new()
        })
    }

    pub async fn save(&self, file: &UploadedFile) -> Option<String> {
        match self.storage.save(file).await {
            Ok(name) => Some(name),
            Err(e) => {
                tracing::warn!(name = %file.original_filename, error = %e, "could not store file");
                None
            }
        }
    }

    /// Saves each file in turn as the stream is polled, yielding the names
    /// that were stored. Failed entries are skipped silently.
    pub fn save_all<'a>(&'a self, files: &'a [UploadedFile]) -> BoxStream<'a, String> {
        stream::iter(files)
            .then(move |file| self.save(file))
            .filter_map(|saved| async move { saved })
            .boxed()
    }

    /// `true` only when a file was there and has been removed.
    pub async fn delete(&self, name: &str) -> bool {
        match self.storage.delete(name).await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(name = %name, error = %e, "nothing deleted");
                false
            }
        }
    }

    pub async fn delete_all(&self) -> u64 {
        self.storage.delete_all().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not empty storage root");
            0
        })
    }

    /// Number of direct children, or `-1` when the root cannot be read.
    pub async fn count(&self) -> i64 {
        match self.storage.count().await {
            Ok(count) => count as i64,
            Err(e) => {
                tracing::warn!(error = %e, "could not count storage root");
                -1
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, FileStore) {
        let dir = TempDir::new().unwrap();
        let storage = LocalFileStorage::init(dir.path().join("uploads"), false).unwrap();
        (dir, FileStore::new(Arc::new(storage)))
    }

    #[tokio::test]
    async fn round_trip_through_fetch() {
        let (_dir, store) = store();
        assert_eq!(
            store.save(&UploadedFile::new("x.txt", "hi")).await.as_deref(),
            Some("x.txt")
        );
        assert_eq!(store.fetch("x.txt").await.unwrap().bytes, b"hi");
    }

    #[tokio::test]
    async fn bad_names_are_just_absent() {
        let (_dir, store) = store();
        assert!(store.fetch("../x.txt").await.is_none());
        assert!(store.fetch("missing.txt").await.is_none());
        assert!(store.save(&UploadedFile::new("a/b.txt", "x")).await.is_none());
        assert!(!store.delete("../x.txt").await);
    }

    #[tokio::test]
    async fn listing_is_stable_without_mutation() {
        let (_dir, store) = store();
        for name in ["c.txt", "a.txt", "b.txt"] {
            store.save(&UploadedFile::new(name, name)).await.unwrap();
        }

        let mut first = store.list_all().await;
        let mut second = store.list_all().await;
        first.sort();
        second.sort();
        assert_eq!(first, second);
        assert_eq!(first, vec!["a.txt", "b.txt", "c.txt"]);
    }

    #[tokio::test]
    async fn save_all_skips_failures_in_order() {
        let (_dir, store) = store();
        store.save(&UploadedFile::new("taken.txt", "old")).await.unwrap();

        let files = vec![
            UploadedFile::new("one.txt", "1"),
            UploadedFile::new("taken.txt", "new"),
            UploadedFile::new("../bad.txt", "x"),
            UploadedFile::new("two.txt", "2"),
        ];
        let saved: Vec<String> = store.save_all(&files).collect().await;

        assert_eq!(saved, vec!["one.txt", "two.txt"]);
        assert_eq!(store.fetch("taken.txt").await.unwrap().bytes, b"old");
    }

    #[tokio::test]
    async fn save_all_writes_only_as_far_as_polled() {
        let (dir, store) = store();
        let files = vec![
            UploadedFile::new("one.txt", "1"),
            UploadedFile::new("two.txt", "2"),
        ];

        let mut saved = store.save_all(&files);
        assert_eq!(saved.next().await.as_deref(), Some("one.txt"));
        assert!(dir.path().join("uploads").join("one.txt").exists());
        assert!(!dir.path().join("uploads").join("two.txt").exists());

        assert_eq!(saved.next().await.as_deref(), Some("two.txt"));
        assert!(saved.next().await.is_none());
        assert!(dir.path().join("uploads").join("two.txt").exists());
    }

    #[tokio::test]
    async fn delete_missing_leaves_listing_alone() {
        let (_dir, store) = store();
        store.save(&UploadedFile::new("a.txt", "a")).await.unwrap();

        assert!(!store.delete("missing.txt").await);
        assert_eq!(store.list_all().await, vec!["a.txt"]);
        assert!(store.delete("a.txt").await);
        assert!(store.list_all().await.is_empty());
    }

    #[tokio::test]
    async fn count_matches_delete_all() {
        let (_dir, store) = store();
        for name in ["a.txt", "b.txt", "c.txt"] {
            store.save(&UploadedFile::new(name, "x")).await.unwrap();
        }

        let before = store.count().await;
        assert_eq!(before, 3);
        assert_eq!(store.delete_all().await as i64, before);
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn unreadable_root_degrades() {
        let (dir, store) = store();
        std::fs::remove_dir_all(dir.path().join("uploads")).unwrap();

        assert!(store.list_all().await.is_empty());
        assert_eq!(store.count().await, -1);
        assert_eq!(store.delete_all().await, 0);
    }
}
