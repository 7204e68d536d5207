//! Blob backends implementing `docrag_core::traits::BlobStore`.

pub mod fs;
pub mod memory;

pub use fs::FsBlobStore;
pub use memory::MemoryBlobStore;
