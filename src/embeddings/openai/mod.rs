#[cfg(test)]
mod tests;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::ApiConfig;

const DEFAULT_TIMEOUT_SECONDS: u64 = 60;

/// Blocking client for OpenAI-compatible embedding and chat-completion
/// endpoints. Failures propagate on first error; this system does not retry.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    embeddings_url: String,
    chat_url: String,
    auth_header: String,
    embedding_model: String,
    chat_model: String,
    batch_size: u32,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl OpenAiClient {
    #[inline]
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let api_key = config
            .require_key()
            .context("Failed to resolve the model API key")?;

        let base = config.base_url.trim_end_matches('/');

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)))
            .build()
            .into();

        Ok(Self {
            embeddings_url: format!("{}/embeddings", base),
            chat_url: format!("{}/chat/completions", base),
            auth_header: format!("Bearer {}", api_key),
            embedding_model: config.embedding_model.clone(),
            chat_model: config.chat_model.clone(),
            batch_size: config.batch_size,
            agent,
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        self
    }

    /// Generate an embedding for a single text input
    #[inline]
    pub fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let inputs = [text.to_string()];
        let mut embeddings = self.request_embeddings(&inputs)?;
        embeddings
            .pop()
            .ok_or_else(|| anyhow!("Embedding endpoint returned no vectors"))
    }

    /// Generate embeddings for multiple text inputs, batched to avoid
    /// oversized requests. Any failed batch aborts the whole operation.
    #[inline]
    pub fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut results = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size as usize) {
            let embeddings = self
                .request_embeddings(batch)
                .with_context(|| format!("Failed to embed batch of {} texts", batch.len()))?;
            results.extend(embeddings);
        }

        debug!("Generated {} embeddings total", results.len());
        Ok(results)
    }

    /// Run a chat completion for the given prompt and return the model's
    /// text verbatim.
    #[inline]
    pub fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        debug!(
            "Requesting chat completion (prompt length: {})",
            prompt.len()
        );

        let request = ChatRequest {
            model: &self.chat_model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature,
        };

        let request_json =
            serde_json::to_string(&request).context("Failed to serialize chat request")?;
        let response_text = self.post_json(&self.chat_url, &request_json)?;

        parse_chat_response(&response_text)
    }

    fn request_embeddings(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingsRequest {
            model: &self.embedding_model,
            input: inputs,
        };

        let request_json =
            serde_json::to_string(&request).context("Failed to serialize embeddings request")?;
        let response_text = self.post_json(&self.embeddings_url, &request_json)?;

        parse_embeddings_response(&response_text, inputs.len())
    }

    fn post_json(&self, url: &str, body: &str) -> Result<String> {
        let mut response = self
            .agent
            .post(url)
            .header("Authorization", &self.auth_header)
            .header("Content-Type", "application/json")
            .send(body)
            .map_err(|error| match error {
                ureq::Error::StatusCode(status) => {
                    anyhow!("API request to {} failed with HTTP {}", url, status)
                }
                other => anyhow!("API request to {} failed: {}", url, other),
            })?;

        response
            .body_mut()
            .read_to_string()
            .context("Failed to read API response body")
    }
}

fn parse_embeddings_response(body: &str, expected: usize) -> Result<Vec<Vec<f32>>> {
    let mut response: EmbeddingsResponse =
        serde_json::from_str(body).context("Failed to parse embeddings response")?;

    if response.data.len() != expected {
        return Err(anyhow!(
            "Embedding endpoint returned {} vectors for {} inputs",
            response.data.len(),
            expected
        ));
    }

    // The endpoint is not required to preserve input order.
    response.data.sort_by_key(|entry| entry.index);

    Ok(response
        .data
        .into_iter()
        .map(|entry| entry.embedding)
        .collect())
}

fn parse_chat_response(body: &str) -> Result<String> {
    let response: ChatResponse =
        serde_json::from_str(body).context("Failed to parse chat completion response")?;

    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| anyhow!("Chat endpoint returned no choices"))
}
