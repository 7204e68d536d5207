//! Persistence of `VectorIndex` values through a `BlobStore`.

use std::sync::Arc;

use docrag_core::error::{Error, Result};
use docrag_core::traits::BlobStore;

use crate::codec;
use crate::index::VectorIndex;

pub const VECTOR_BLOB: &str = "doc.index";
pub const TEXT_BLOB: &str = "chunks.txt";

/// Saves and loads one index per document id under `<doc_id>/doc.index` and
/// `<doc_id>/chunks.txt`.
#[derive(Clone)]
pub struct IndexStore {
    blobs: Arc<dyn BlobStore>,
}

impl IndexStore {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }

    pub fn vector_key(doc_id: &str) -> String {
        format!("{doc_id}/{VECTOR_BLOB}")
    }

    pub fn text_key(doc_id: &str) -> String {
        format!("{doc_id}/{TEXT_BLOB}")
    }

    /// Persist `index` for `doc_id`.
    ///
    /// The text blob is written first; the vector blob carries its digest, so a
    /// reader racing this call sees either a matching pair or `Error::Corrupt`.
    pub fn save(&self, doc_id: &str, index: &VectorIndex) -> Result<()> {
        validate_doc_id(doc_id)?;
        let text_blob = codec::encode_chunks(index.chunk_texts())?;
        let digest = codec::text_digest(&text_blob);
        let vector_blob = codec::encode_vectors(index, &digest)?;
        self.blobs.put(&Self::text_key(doc_id), &text_blob)?;
        self.blobs.put(&Self::vector_key(doc_id), &vector_blob)?;
        tracing::debug!(doc_id, chunks = index.len(), bytes = text_blob.len() + vector_blob.len(), "saved index");
        Ok(())
    }

    /// Load the index for `doc_id`; `Error::NotFound` when either blob is absent.
    pub fn load(&self, doc_id: &str) -> Result<VectorIndex> {
        validate_doc_id(doc_id)?;
        let text_key = Self::text_key(doc_id);
        let vector_key = Self::vector_key(doc_id);
        let vector_bytes = self.blobs.get(&vector_key).map_err(|e| absent_as(doc_id, e))?;
        let text_bytes = self.blobs.get(&text_key).map_err(|e| absent_as(doc_id, e))?;

        let blob = codec::decode_vectors(&vector_key, &vector_bytes)?;
        if blob.text_digest != codec::text_digest(&text_bytes) {
            return Err(Error::corrupt(&vector_key, "text blob does not match vector blob"));
        }
        let chunk_texts = codec::decode_chunks(&text_key, &text_bytes)?;
        if chunk_texts.len() != blob.vectors.len() {
            return Err(Error::corrupt(
                &vector_key,
                format!("{} vectors for {} chunks", blob.vectors.len(), chunk_texts.len()),
            ));
        }
        VectorIndex::from_parts(blob.model_id, blob.dim, chunk_texts, blob.vectors)
    }

    /// True only when both blobs are present.
    pub fn exists(&self, doc_id: &str) -> Result<bool> {
        validate_doc_id(doc_id)?;
        Ok(self.blobs.exists(&Self::vector_key(doc_id))? && self.blobs.exists(&Self::text_key(doc_id))?)
    }

    /// Remove both blobs. Already-absent blobs are not an error.
    ///
    /// The vector blob goes first so a half-finished delete leaves no loadable index.
    pub fn delete(&self, doc_id: &str) -> Result<()> {
        validate_doc_id(doc_id)?;
        let removed_vectors = self.blobs.delete(&Self::vector_key(doc_id))?;
        let removed_text = self.blobs.delete(&Self::text_key(doc_id))?;
        tracing::debug!(doc_id, removed_vectors, removed_text, "deleted index");
        Ok(())
    }
}

fn absent_as(doc_id: &str, err: Error) -> Error {
    if err.is_not_found() { Error::NotFound(format!("no index for document '{doc_id}'")) } else { err }
}

/// Document ids become key prefixes, so they must be a single path segment.
pub fn validate_doc_id(doc_id: &str) -> Result<()> {
    let bad = doc_id.is_empty()
        || doc_id == "."
        || doc_id == ".."
        || doc_id.contains(['/', '\\']);
    if bad {
        return Err(Error::Configuration(format!("invalid document id '{doc_id}'")));
    }
    Ok(())
}
