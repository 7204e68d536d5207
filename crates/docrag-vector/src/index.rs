//! Per-document vector index with exact nearest-neighbour search.
//!
//! Document-scale corpora are small, so search is an exhaustive scan over every
//! stored vector. Results are deterministic for identical inputs.

use docrag_core::error::{Error, Result};
use docrag_core::traits::Embedder;
use docrag_core::types::{Chunk, Neighbor};

/// Chunk texts and their embeddings, aligned by position.
///
/// `chunk_texts[i]` and `vectors[i]` always describe the same chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    model_id: String,
    dim: usize,
    chunk_texts: Vec<String>,
    vectors: Vec<Vec<f32>>,
}

impl VectorIndex {
    /// Embed `chunk_texts` with one batch call and pair each vector with its chunk.
    pub fn build(chunk_texts: Vec<String>, embedder: &dyn Embedder) -> Result<Self> {
        let dim = embedder.dim();
        if chunk_texts.is_empty() {
            return Self::from_parts(embedder.model_id().to_string(), dim, chunk_texts, Vec::new());
        }
        if dim == 0 {
            return Err(Error::Embedding(format!("embedder '{}' reports dimension 0", embedder.model_id())));
        }
        let vectors = embedder
            .embed_batch(&chunk_texts)
            .map_err(|e| Error::Embedding(format!("{e:#}")))?;
        if vectors.len() != chunk_texts.len() {
            return Err(Error::Embedding(format!(
                "embedder returned {} vectors for {} chunks",
                vectors.len(),
                chunk_texts.len()
            )));
        }
        if let Some((i, v)) = vectors.iter().enumerate().find(|(_, v)| v.len() != dim) {
            return Err(Error::Embedding(format!(
                "vector {i} has dimension {}, embedder reports {dim}",
                v.len()
            )));
        }
        tracing::debug!(chunks = chunk_texts.len(), dim, model = embedder.model_id(), "built vector index");
        Ok(Self { model_id: embedder.model_id().to_string(), dim, chunk_texts, vectors })
    }

    /// Assemble an index from already-embedded parts, checking alignment.
    pub fn from_parts(
        model_id: String,
        dim: usize,
        chunk_texts: Vec<String>,
        vectors: Vec<Vec<f32>>,
    ) -> Result<Self> {
        if chunk_texts.len() != vectors.len() {
            return Err(Error::Configuration(format!(
                "{} chunk texts but {} vectors",
                chunk_texts.len(),
                vectors.len()
            )));
        }
        if let Some(v) = vectors.iter().find(|v| v.len() != dim) {
            return Err(Error::DimensionMismatch { expected: dim, actual: v.len() });
        }
        Ok(Self { model_id, dim, chunk_texts, vectors })
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.chunk_texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunk_texts.is_empty()
    }

    pub fn chunk_texts(&self) -> &[String] {
        &self.chunk_texts
    }

    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    pub fn chunk_text(&self, position: usize) -> Option<&str> {
        self.chunk_texts.get(position).map(String::as_str)
    }

    pub fn chunk(&self, position: usize) -> Option<Chunk> {
        self.chunk_text(position).map(|text| Chunk { position, text: text.to_string() })
    }

    /// The `top_k` stored vectors closest to `query`, ascending by squared
    /// Euclidean distance, ties broken by lower position.
    ///
    /// Asking for more than `len()` results returns all of them.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dim {
            return Err(Error::DimensionMismatch { expected: self.dim, actual: query.len() });
        }
        let mut scored: Vec<Neighbor> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, v)| Neighbor { position, distance: squared_l2(query, v) })
            .collect();
        scored.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.position.cmp(&b.position)));
        scored.truncate(top_k);
        Ok(scored)
    }
}

pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
