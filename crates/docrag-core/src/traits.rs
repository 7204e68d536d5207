//! Ports to the collaborators the engine does not implement itself.

use crate::error::Result;

/// Sentence-embedding model.
///
/// Implementations must return one vector per input, in input order, all of
/// length `dim()`. Documents and queries that are compared against each other
/// must be embedded by implementations reporting the same `model_id()`.
pub trait Embedder: Send + Sync {
    /// Stable identifier for the model and version (e.g. `local:all-MiniLM-L6-v2:d384`).
    fn model_id(&self) -> &str;
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Raw byte-blob key/value backend.
///
/// `get` must fail with `Error::NotFound` when the key is absent so callers can
/// tell absence apart from a real storage failure.
pub trait BlobStore: Send + Sync {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;
    fn get(&self, key: &str) -> Result<Vec<u8>>;
    fn exists(&self, key: &str) -> Result<bool>;
    /// Returns `false` when there was nothing to delete.
    fn delete(&self, key: &str) -> Result<bool>;
}
