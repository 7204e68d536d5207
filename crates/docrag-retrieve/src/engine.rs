use std::sync::Arc;

use docrag_core::chunker::{Chunker, ChunkingConfig};
use docrag_core::config::{RetrievalSettings, Settings};
use docrag_core::error::{Error, Result};
use docrag_core::traits::{BlobStore, Embedder};
use docrag_vector::store::validate_doc_id;
use docrag_vector::{IndexStore, VectorIndex};

/// Ingestion, deletion and retrieval over per-document indices.
///
/// Holds no per-request state: every call loads what it needs from the blob
/// store, so clones can serve concurrent requests without coordination.
#[derive(Clone)]
pub struct RetrievalEngine {
    pub(crate) store: IndexStore,
    pub(crate) embedder: Arc<dyn Embedder>,
    pub(crate) chunker: Chunker,
    pub(crate) retrieval: RetrievalSettings,
}

impl RetrievalEngine {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        embedder: Arc<dyn Embedder>,
        chunking: ChunkingConfig,
        retrieval: RetrievalSettings,
    ) -> Result<Self> {
        if retrieval.candidate_multiplier == 0 {
            return Err(Error::Configuration("candidate_multiplier must be positive".to_string()));
        }
        Ok(Self { store: IndexStore::new(blobs), embedder, chunker: Chunker::new(chunking)?, retrieval })
    }

    pub fn from_settings(blobs: Arc<dyn BlobStore>, embedder: Arc<dyn Embedder>, settings: &Settings) -> Result<Self> {
        Self::new(blobs, embedder, settings.chunking, settings.retrieval.clone())
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    /// Chunk, embed and persist `text` as document `doc_id`. Returns the chunk count.
    pub fn ingest(&self, doc_id: &str, text: &str) -> Result<usize> {
        validate_doc_id(doc_id)?;
        let chunks = self.chunker.chunk(text);
        if chunks.is_empty() {
            return Err(Error::EmptyDocument(doc_id.to_string()));
        }
        let index = VectorIndex::build(chunks, self.embedder.as_ref())?;
        self.store.save(doc_id, &index)?;
        tracing::info!(doc_id, chunks = index.len(), model = index.model_id(), "ingested document");
        Ok(index.len())
    }

    /// Remove the persisted index of `doc_id`; succeeds when nothing was stored.
    pub fn delete(&self, doc_id: &str) -> Result<()> {
        self.store.delete(doc_id)?;
        tracing::info!(doc_id, "deleted document index");
        Ok(())
    }
}
