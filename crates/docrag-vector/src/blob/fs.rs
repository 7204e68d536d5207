use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

use tempfile::NamedTempFile;

use docrag_core::error::{Error, Result};
use docrag_core::traits::BlobStore;

/// Local filesystem blob store rooted at a directory.
///
/// Keys are relative `/`-separated paths. Puts write a temp file next to the
/// target and rename it into place, so readers never see a partial object.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| Error::storage(root.display().to_string(), e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let rel = Path::new(key);
        let plain = !key.is_empty()
            && rel.components().all(|c| matches!(c, Component::Normal(_)));
        if !plain {
            return Err(Error::storage(key, "key must be a relative path without '..'"));
        }
        Ok(self.root.join(rel))
    }
}

impl BlobStore for FsBlobStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.resolve(key)?;
        let parent = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(parent).map_err(|e| Error::storage(key, e))?;
        let mut tmp = NamedTempFile::new_in(parent).map_err(|e| Error::storage(key, e))?;
        tmp.write_all(bytes).map_err(|e| Error::storage(key, e))?;
        tmp.as_file().sync_all().map_err(|e| Error::storage(key, e))?;
        tmp.persist(&path).map_err(|e| Error::storage(key, e.error))?;
        tracing::debug!(key, bytes = bytes.len(), "blob written");
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.resolve(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(Error::NotFound(key.to_string())),
            Err(e) => Err(Error::storage(key, e)),
        }
    }

    fn exists(&self, key: &str) -> Result<bool> {
        let path = self.resolve(key)?;
        path.try_exists().map_err(|e| Error::storage(key, e))
    }

    fn delete(&self, key: &str) -> Result<bool> {
        let path = self.resolve(key)?;
        let removed = match fs::remove_file(&path) {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => return Err(Error::storage(key, e)),
        };
        // Prune the per-document directory once it is empty; failure just leaves it behind.
        if let Some(parent) = path.parent() {
            if parent != self.root {
                let _ = fs::remove_dir(parent);
            }
        }
        Ok(removed)
    }
}
