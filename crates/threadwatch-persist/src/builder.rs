use std::path::PathBuf;

use crate::dbs::document::DocumentStore;
use crate::error::Result;

/// Chooses between a file-backed and an in-memory [`DocumentStore`].
#[derive(Debug, Default)]
pub struct DocumentStoreBuilder {
    path: Option<PathBuf>,
    reset: bool,
}

impl DocumentStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back the store with this JSON file
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Start from empty tables even if the file already holds data
    pub fn reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }

    pub async fn build(self) -> Result<DocumentStore> {
        let store = match self.path {
            Some(path) => DocumentStore::open(path).await?,
            None => DocumentStore::in_memory(),
        };
        if self.reset {
            store.clear_all().await?;
        }
        Ok(store)
    }
}
