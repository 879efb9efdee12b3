// Vector index module
// Handles on-disk index storage plus the prebuilt-archive bootstrap path

pub mod fetch;
pub mod store;

pub use fetch::{ArchiveLayout, ensure_index_available, index_is_present};
pub use store::{ChunkRecord, RetrievedChunk, VectorStore};
