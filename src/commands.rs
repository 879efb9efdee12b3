use anyhow::{Context, Result, bail};
use std::sync::Arc;
use tracing::info;

use crate::answer::AnswerEngine;
use crate::config::Config;
use crate::embeddings::openai::OpenAiClient;
use crate::index::store::VectorStore;
use crate::index::{ensure_index_available, index_is_present};
use crate::indexer::IndexBuilder;
use crate::web::{self, AppState};

/// Build the vector index from the documents folder.
#[inline]
pub async fn build_index(config: Config) -> Result<()> {
    let stats = IndexBuilder::new(config)?.build().await?;

    println!("Index build complete");
    println!("  Documents loaded: {}", stats.documents_loaded);
    if stats.documents_failed > 0 {
        println!("  Documents skipped: {}", stats.documents_failed);
    }
    println!("  Chunks embedded: {}", stats.chunks_created);

    Ok(())
}

/// Ensure a local index is available, load it, and serve the web form.
#[inline]
pub async fn serve_web(config: Config) -> Result<()> {
    // Constructed first so a missing API key is fatal before any index work.
    let client =
        OpenAiClient::new(&config.api).context("Failed to initialize model API client")?;

    let index_dir = config.index_dir();
    ensure_index_available(&index_dir, config.index.archive_url.as_deref())
        .context("Failed to make a local index available")?;

    let store = VectorStore::open(&index_dir)
        .await
        .context("Failed to open the vector index")?;

    let chunk_count = store.count().await?;
    if chunk_count == 0 {
        bail!(
            "Index at {} holds no chunks; run `askdocs build` or configure an archive URL",
            index_dir.display()
        );
    }
    info!("Index loaded with {} chunks", chunk_count);

    let engine = AnswerEngine::new(store, client, config.api.temperature);
    let state = Arc::new(AppState { engine });

    web::serve(&config.server.bind_addr(), state).await?;
    Ok(())
}

/// Report on the local index.
#[inline]
pub async fn show_status(config: Config) -> Result<()> {
    let index_dir = config.index_dir();

    if !index_is_present(&index_dir) {
        println!("No local index at {}", index_dir.display());
        match config.index.archive_url.as_deref() {
            Some(url) => println!("A prebuilt index would be fetched from {}", url),
            None => println!("Run `askdocs build` to create one"),
        }
        return Ok(());
    }

    let store = VectorStore::open(&index_dir).await?;
    let chunk_count = store.count().await?;

    println!("Index: {}", index_dir.display());
    println!("  Chunks: {}", chunk_count);

    Ok(())
}
