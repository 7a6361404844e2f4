use std::sync::Arc;

use dashmap::{DashMap, DashSet};
use tower_lsp::lsp_types::Url;

use super::FileState;

/// Thread-safe map of tracked files plus the set open in the editor.
#[derive(Debug, Default)]
pub struct FileStore {
    files: DashMap<Url, Arc<FileState>>,
    open: DashSet<Url>,
}

impl FileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arc-cloned state. No lock held after return.
    pub fn get(
        &self,
        uri: &Url,
    ) -> Option<Arc<FileState>> {
        self.files.get(uri).map(|entry| entry.value().clone())
    }

    pub fn replace(
        &self,
        state: Arc<FileState>,
    ) {
        self.files.insert(state.uri.clone(), state);
    }

    pub fn remove(
        &self,
        uri: &Url,
    ) -> Option<Arc<FileState>> {
        self.open.remove(uri);
        self.files.remove(uri).map(|(_, state)| state)
    }

    pub fn contains(
        &self,
        uri: &Url,
    ) -> bool {
        self.files.contains_key(uri)
    }

    pub fn uris(&self) -> Vec<Url> {
        self.files.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn clear(&self) {
        self.files.clear();
        self.open.clear();
    }

    pub fn mark_open(
        &self,
        uri: &Url,
    ) {
        self.open.insert(uri.clone());
    }

    pub fn mark_closed(
        &self,
        uri: &Url,
    ) {
        self.open.remove(uri);
    }

    pub fn is_open(
        &self,
        uri: &Url,
    ) -> bool {
        self.open.contains(uri)
    }
}

#[cfg(test)]
#[path = "../../tests/src/document/file_store_tests.rs"]
mod tests;
