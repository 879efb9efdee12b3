
use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::documents::load_documents;
use crate::embeddings::chunking::chunk_text;
use crate::embeddings::openai::OpenAiClient;
use crate::index::store::{ChunkRecord, VectorStore};

const INSERT_BATCH_SIZE: usize = 256;

/// One-shot build pipeline: load documents, chunk, embed, write a fresh
/// index.
pub struct IndexBuilder {
    config: Config,
    client: OpenAiClient,
}

/// Statistics about a completed build.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IndexingStats {
    pub documents_loaded: usize,
    pub documents_failed: usize,
    pub chunks_created: usize,
    pub embeddings_generated: usize,
}

impl IndexBuilder {
    #[inline]
    pub fn new(config: Config) -> Result<Self> {
        let client =
            OpenAiClient::new(&config.api).context("Failed to initialize model API client")?;
        Ok(Self { config, client })
    }

    /// Build the index from the documents folder.
    ///
    /// Per-file extraction failures are logged and skipped; an embedding
    /// failure aborts the whole build. All embeddings are generated before
    /// the index directory is replaced, so a failed build never leaves a
    /// partial index behind.
    #[inline]
    pub async fn build(&self) -> Result<IndexingStats> {
        let documents_dir = self.config.documents_dir();
        let outcome = load_documents(&documents_dir)
            .with_context(|| format!("Failed to load documents from {}", documents_dir.display()))?;

        for failure in &outcome.failures {
            warn!("Could not load {}: {}", failure.path.display(), failure.error);
        }

        if outcome.documents.is_empty() {
            bail!(
                "No documents could be loaded from {}",
                documents_dir.display()
            );
        }

        let mut chunk_texts = Vec::new();
        let mut chunk_origins = Vec::new();
        for document in &outcome.documents {
            let source = document
                .path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            for chunk in chunk_text(&document.text, &self.config.chunking) {
                chunk_origins.push((source.clone(), chunk.chunk_index as u32));
                chunk_texts.push(chunk.content);
            }
        }

        info!(
            "Chunked {} documents into {} chunks",
            outcome.documents.len(),
            chunk_texts.len()
        );

        let embeddings = self
            .client
            .embed_batch(&chunk_texts)
            .context("Failed to embed document chunks")?;

        let created_at = Utc::now().to_rfc3339();
        let records: Vec<ChunkRecord> = chunk_texts
            .into_iter()
            .zip(embeddings)
            .zip(chunk_origins)
            .map(|((content, vector), (source, chunk_index))| ChunkRecord {
                id: Uuid::new_v4().to_string(),
                vector,
                content,
                source,
                chunk_index,
                created_at: created_at.clone(),
            })
            .collect();

        let index_dir = self.config.index_dir();
        let mut store = VectorStore::create(&index_dir)
            .await
            .with_context(|| format!("Failed to create index at {}", index_dir.display()))?;

        for batch in records.chunks(INSERT_BATCH_SIZE) {
            store
                .insert_batch(batch)
                .await
                .context("Failed to store embedded chunks")?;
        }

        let stats = IndexingStats {
            documents_loaded: outcome.documents.len(),
            documents_failed: outcome.failures.len(),
            chunks_created: records.len(),
            embeddings_generated: records.len(),
        };

        info!(
            "Index build complete: {} documents, {} chunks",
            stats.documents_loaded, stats.chunks_created
        );

        Ok(stats)
    }
}
