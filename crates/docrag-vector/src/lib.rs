//! Per-document vector indices and their persistence.

pub mod blob;
pub mod codec;
pub mod index;
pub mod store;

pub use blob::{FsBlobStore, MemoryBlobStore};
pub use index::VectorIndex;
pub use store::IndexStore;
