//! Retrieval engine: ingestion, single- and multi-document retrieval, and
//! prompt-context assembly on top of `docrag-vector`.

mod concurrent;
pub mod context;
mod engine;
mod retrieve;

pub use context::{build_context, ContextOutcome, Purpose};
pub use engine::RetrievalEngine;
