#[cfg(test)]
mod tests;

use tracing::{debug, info};

use crate::AskError;
use crate::embeddings::openai::OpenAiClient;
use crate::index::store::{RetrievedChunk, VectorStore};

/// Number of chunks retrieved per question. Fixed by design.
pub const DEFAULT_TOP_K: usize = 4;

/// Fixed prompt skeleton filled per request.
const PROMPT_TEMPLATE: &str = "\
You are a helpful assistant answering questions about a fixed collection of documents.
Answer sincerely and kindly, based on the context below. If the context does not
contain the answer, say so instead of guessing.

Context:
{context}

Question:
{question}
";

/// Retrieval-augmented answering over a loaded index.
///
/// Holds the index handle and the model client for the lifetime of the
/// process; every method takes `&self`, so one engine is shared read-only
/// across requests.
pub struct AnswerEngine {
    store: VectorStore,
    client: OpenAiClient,
    temperature: f32,
    top_k: usize,
}

impl AnswerEngine {
    #[inline]
    pub fn new(store: VectorStore, client: OpenAiClient, temperature: f32) -> Self {
        Self {
            store,
            client,
            temperature,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Answer one question against the loaded index.
    ///
    /// A failure anywhere in the pipeline is fatal to this request only;
    /// the engine stays usable for subsequent questions.
    #[inline]
    pub async fn ask(&self, question: &str) -> Result<String, AskError> {
        debug!(
            "Answering question ({} characters)",
            question.chars().count()
        );

        // The question must be embedded in the same space the index was
        // built with. Nothing verifies that; a mismatch degrades retrieval
        // without a detectable error.
        let query_vector = self
            .client
            .embed(question)
            .map_err(|e| AskError::Query(format!("Failed to embed question: {:#}", e)))?;

        let retrieved = self
            .store
            .search(&query_vector, self.top_k)
            .await
            .map_err(|e| AskError::Query(format!("Retrieval failed: {}", e)))?;
        debug!("Retrieved {} context chunks", retrieved.len());

        let context = build_context(&retrieved);
        let prompt = fill_prompt(&context, question);

        let answer = self
            .client
            .complete(&prompt, self.temperature)
            .map_err(|e| AskError::Query(format!("Model call failed: {:#}", e)))?;

        info!(
            "Answered question with {} characters",
            answer.chars().count()
        );
        Ok(answer)
    }
}

/// Concatenate retrieved chunk texts into the context block.
fn build_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| chunk.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Fill the fixed template with the context block and the question.
fn fill_prompt(context: &str, question: &str) -> String {
    PROMPT_TEMPLATE
        .replacen("{context}", context, 1)
        .replacen("{question}", question, 1)
}
