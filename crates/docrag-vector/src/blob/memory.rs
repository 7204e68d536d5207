use std::collections::HashMap;
use std::sync::RwLock;

use docrag_core::error::{Error, Result};
use docrag_core::traits::BlobStore;

/// Process-local blob store. Puts replace the whole object atomically.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Result<Vec<String>> {
        let objects = self.objects.read().map_err(|_| Error::storage("*", "lock poisoned"))?;
        let mut keys: Vec<String> = objects.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

impl BlobStore for MemoryBlobStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let mut objects = self.objects.write().map_err(|_| Error::storage(key, "lock poisoned"))?;
        objects.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>> {
        let objects = self.objects.read().map_err(|_| Error::storage(key, "lock poisoned"))?;
        objects.get(key).cloned().ok_or_else(|| Error::NotFound(key.to_string()))
    }

    fn exists(&self, key: &str) -> Result<bool> {
        let objects = self.objects.read().map_err(|_| Error::storage(key, "lock poisoned"))?;
        Ok(objects.contains_key(key))
    }

    fn delete(&self, key: &str) -> Result<bool> {
        let mut objects = self.objects.write().map_err(|_| Error::storage(key, "lock poisoned"))?;
        Ok(objects.remove(key).is_some())
    }
}
