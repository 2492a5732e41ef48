use crate::error::StoreError;
use dashmap::DashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Minimal read/write text storage keyed by config id.
pub trait ConfigTextStore: Send + Sync {
    /// Returns `None` when no document exists for `id`.
    fn read(&self, id: &str) -> Result<Option<String>, StoreError>;
    fn write(&self, id: &str, text: &str) -> Result<(), StoreError>;
}

/// Store backed by a concurrent map. Useful for tests and ephemeral hosts.
#[derive(Debug, Default)]
pub struct InMemoryConfigTextStore {
    documents: DashMap<String, String>,
}

impl InMemoryConfigTextStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl ConfigTextStore for InMemoryConfigTextStore {
    fn read(&self, id: &str) -> Result<Option<String>, StoreError> {
        Ok(self.documents.get(id).map(|doc| doc.value().clone()))
    }

    fn write(&self, id: &str, text: &str) -> Result<(), StoreError> {
        self.documents.insert(id.to_string(), text.to_string());
        Ok(())
    }
}

/// Store that maps each id to a file below a base directory.
///
/// Ids are relative paths. Blank ids, absolute paths and anything containing
/// `..` are rejected with [`StoreError::InvalidId`].
#[derive(Debug, Clone)]
pub struct FileConfigTextStore {
    base_dir: PathBuf,
}

impl FileConfigTextStore {
    /// Creates the store. The base directory is created on first write.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn resolve(&self, id: &str) -> Result<PathBuf, StoreError> {
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        let relative = Path::new(trimmed);
        if !relative.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir)) {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        Ok(self.base_dir.join(relative))
    }
}

impl ConfigTextStore for FileConfigTextStore {
    fn read(&self, id: &str) -> Result<Option<String>, StoreError> {
        let path = self.resolve(id)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Read(id.to_string(), e)),
        }
    }

    fn write(&self, id: &str, text: &str) -> Result<(), StoreError> {
        let path = self.resolve(id)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::Write(id.to_string(), e))?;
        }
        fs::write(&path, text).map_err(|e| StoreError::Write(id.to_string(), e))?;
        debug!("💾 Wrote config {} to {}", id, path.display());
        Ok(())
    }
}
