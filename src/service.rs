use std::pin::Pin;

use futures::StreamExt;

use crate::listing::to_records;
use crate::models::{FileRecord, Payload};
use crate::storage::{FileStore, StoredFile, UploadedFile};

pub const NO_FILE_GIVEN: &str = "No file was given.";
pub const NO_FILES_GIVEN: &str = "No files were given.";
pub const RESULTS_HEADER: &str = "Results:";
pub const FILE_TOO_LARGE: &str = "The selected file (or one of them) is too large!";

/// Turns store operations into response payloads. Every payload carries the
/// listing as it stands after the operation.
#[derive(Clone)]
pub struct FolderService {
    store: FileStore,
}

impl FolderService {
    pub fn new(store: FileStore) -> Self {
        Self { store }
    }

    pub async fn upload_file(&self, file: Option<UploadedFile>, base_url: &str) -> Payload {
        let Some(file) = file else {
            return Payload::message(NO_FILE_GIVEN, self.records(base_url).await);
        };

        let message = match self.store.save(&file).await {
            Some(name) => format!("{name} file has been successfully uploaded."),
            None => format!("Could not upload the file: {}", file.original_filename),
        };

        Payload::message(message, self.records(base_url).await)
    }

    pub async fn upload_files(&self, files: Vec<UploadedFile>, base_url: &str) -> Payload {
        if files.is_empty() {
            return Payload::messages(
                vec![NO_FILES_GIVEN.to_string()],
                self.records(base_url).await,
            );
        }

        // Saved names come back in input order with failures left out, so
        // each input either matches the next saved name or it failed.
        let mut saved = self.store.save_all(&files).peekable();
        let mut messages = Vec::with_capacity(files.len() + 1);
        messages.push(RESULTS_HEADER.to_string());

        let mut failed = 0;
        for file in &files {
            let name = &file.original_filename;
            if Pin::new(&mut saved).next_if_eq(name).await.is_some() {
                messages.push(format!("{name}: [Success]"));
            } else {
                failed += 1;
                messages.push(format!("{name}: [Failed]"));
            }
        }

        tracing::info!(given = files.len(), failed, "bulk upload finished");

        Payload::messages(messages, self.records(base_url).await)
    }

    pub async fn file_list(&self, base_url: &str) -> Payload {
        Payload::listing(self.records(base_url).await)
    }

    pub async fn file(&self, name: Option<&str>) -> Option<StoredFile> {
        let name = name.filter(|n| !n.trim().is_empty())?;
        self.store.fetch(name).await
    }

    pub async fn delete_file(&self, name: Option<&str>, base_url: &str) -> Payload {
        let Some(name) = name.filter(|n| !n.trim().is_empty()) else {
            return Payload::message(NO_FILE_GIVEN, self.records(base_url).await);
        };

        let message = if self.store.delete(name).await {
            format!("{name} file has been deleted.")
        } else {
            format!("{name} file does not exist!")
        };

        Payload::message(message, self.records(base_url).await)
    }

    pub async fn delete_all_files(&self, base_url: &str) -> Payload {
        let total = self.store.count().await;
        let deleted = self.store.delete_all().await;

        Payload::message(
            format!("{deleted} of {total} file(s) has been deleted."),
            self.records(base_url).await,
        )
    }

    pub async fn file_too_large(&self, base_url: &str) -> Payload {
        Payload::message(FILE_TOO_LARGE, self.records(base_url).await)
    }

    async fn records(&self, base_url: &str) -> Vec<FileRecord> {
        to_records(self.store.list_all().await, base_url)
    }
}
