#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use docrag_core::chunker::ChunkingConfig;
use docrag_core::config::RetrievalSettings;
use docrag_core::error::{Error, Result};
use docrag_core::traits::{BlobStore, Embedder};
use docrag_retrieve::RetrievalEngine;
use docrag_vector::{IndexStore, MemoryBlobStore, VectorIndex};

/// Maps known texts to fixed 2-d vectors so distances are known up front.
pub struct TableEmbedder {
    table: HashMap<String, Vec<f32>>,
}

impl TableEmbedder {
    pub fn new(entries: &[(&str, [f32; 2])]) -> Self {
        Self { table: entries.iter().map(|(t, v)| (t.to_string(), v.to_vec())).collect() }
    }
}

impl Embedder for TableEmbedder {
    fn model_id(&self) -> &str { "table:d2" }
    fn dim(&self) -> usize { 2 }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        texts
            .iter()
            .map(|t| self.table.get(t).cloned().ok_or_else(|| anyhow::anyhow!("unknown text '{t}'")))
            .collect()
    }
}

/// Delegates to an inner store, sleeping before reads of keys under `slow_prefix`.
pub struct SlowBlobStore {
    pub inner: MemoryBlobStore,
    pub slow_prefix: String,
    pub delay: Duration,
}

impl BlobStore for SlowBlobStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> { self.inner.put(key, bytes) }
    fn get(&self, key: &str) -> Result<Vec<u8>> {
        if key.starts_with(&self.slow_prefix) { std::thread::sleep(self.delay); }
        self.inner.get(key)
    }
    fn exists(&self, key: &str) -> Result<bool> { self.inner.exists(key) }
    fn delete(&self, key: &str) -> Result<bool> { self.inner.delete(key) }
}

/// Fails every read of keys under `failing_prefix` with a storage error.
pub struct FailingBlobStore {
    pub inner: MemoryBlobStore,
    pub failing_prefix: String,
}

impl BlobStore for FailingBlobStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> { self.inner.put(key, bytes) }
    fn get(&self, key: &str) -> Result<Vec<u8>> {
        if key.starts_with(&self.failing_prefix) {
            return Err(Error::storage(key, "disk read error"));
        }
        self.inner.get(key)
    }
    fn exists(&self, key: &str) -> Result<bool> { self.inner.exists(key) }
    fn delete(&self, key: &str) -> Result<bool> { self.inner.delete(key) }
}

pub fn engine(blobs: Arc<dyn BlobStore>, embedder: Arc<dyn Embedder>) -> RetrievalEngine {
    RetrievalEngine::new(blobs, embedder, ChunkingConfig::default(), RetrievalSettings::default())
        .expect("engine")
}

/// Persist one index per document, each chunk embedded by `embedder`.
pub fn seed(blobs: Arc<dyn BlobStore>, embedder: &dyn Embedder, docs: &[(&str, &[&str])]) {
    let store = IndexStore::new(blobs);
    for (doc_id, chunks) in docs {
        let chunks = chunks.iter().map(|c| c.to_string()).collect();
        let index = VectorIndex::build(chunks, embedder).expect("build");
        store.save(doc_id, &index).expect("save");
    }
}
