//! Domain types shared by the index, store and retriever.

use serde::{Deserialize, Serialize};

pub type DocId = String;

/// A chunk of a source document at a fixed zero-based position.
///
/// Chunks are never mutated after ingestion; re-ingesting a document produces
/// a new document identity rather than an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub position: usize,
    pub text: String,
}

/// One nearest-neighbour match inside a single index.
///
/// `distance` is the squared Euclidean distance; lower is better.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

/// A passage returned by multi-document retrieval, attributed to its source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub doc_id: DocId,
    pub position: usize,
    pub text: String,
    pub score: f32,
}
