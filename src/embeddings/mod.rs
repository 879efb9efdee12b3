// Embeddings module
// Handles chunking of document text and the hosted model API client

pub mod chunking;
pub mod openai;

pub use chunking::{ChunkingConfig, TextChunk, chunk_text};
pub use openai::OpenAiClient;
