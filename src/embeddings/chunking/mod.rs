
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A chunk of document text ready for embedding.
///
/// Every chunk is a contiguous slice of the source text. Consecutive chunks
/// from the same document overlap by exactly the configured amount, so
/// concatenating them while dropping each successor's overlap prefix
/// reconstructs the document.
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    /// The chunk text
    pub content: String,
    /// The index of this chunk within the document
    pub chunk_index: usize,
}

/// Configuration for text chunking. All sizes are in characters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk length
    pub max_chunk_size: usize,
    /// Overlap between consecutive chunks
    pub overlap_size: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            max_chunk_size: 500,
            overlap_size: 50,
        }
    }
}

/// Split one document's text into overlapping chunks.
///
/// Cuts land preferentially at a paragraph break, then at a sentence end,
/// then at whitespace within the window, falling back to a hard cut at the
/// size limit. A document no longer than the limit yields exactly one chunk
/// containing the full text; empty input yields none.
#[inline]
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Vec<TextChunk> {
    debug_assert!(config.overlap_size < config.max_chunk_size);

    if text.is_empty() {
        return Vec::new();
    }

    // Byte offset of every character boundary, so cuts counted in characters
    // can be mapped back to valid slice positions.
    let mut boundaries: Vec<usize> = text.char_indices().map(|(offset, _)| offset).collect();
    boundaries.push(text.len());
    let total_chars = boundaries.len() - 1;

    if total_chars <= config.max_chunk_size {
        return vec![TextChunk {
            content: text.to_string(),
            chunk_index: 0,
        }];
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;

    loop {
        let window_end = (start + config.max_chunk_size).min(total_chars);

        let cut = if window_end == total_chars {
            total_chars
        } else {
            let window = &text[boundaries[start]..boundaries[window_end]];
            find_cut(window, config.overlap_size)
                .map_or(window_end, |rel_bytes| {
                    char_offset_at(&boundaries, boundaries[start] + rel_bytes)
                })
        };

        chunks.push(TextChunk {
            content: text[boundaries[start]..boundaries[cut]].to_string(),
            chunk_index: chunks.len(),
        });

        if cut == total_chars {
            break;
        }
        start = cut - config.overlap_size;
    }

    debug!(
        "Chunked {} characters into {} chunks",
        total_chars,
        chunks.len()
    );

    chunks
}

/// Find the best cut position (in bytes, relative to the window start)
/// within a full-size window, or `None` to cut hard at the window end.
///
/// A cut is only usable when it lies more than `overlap_size` characters
/// into the window; otherwise the next chunk would not advance.
fn find_cut(window: &str, overlap_size: usize) -> Option<usize> {
    let usable = |cut: &usize| window[..*cut].chars().count() > overlap_size;
    paragraph_cut(window)
        .filter(usable)
        .or_else(|| sentence_cut(window).filter(usable))
        .or_else(|| whitespace_cut(window).filter(usable))
}

/// Cut just after the last paragraph break in the window.
fn paragraph_cut(window: &str) -> Option<usize> {
    window.rfind("\n\n").map(|pos| pos + 2)
}

/// Cut just after the last sentence end in the window.
fn sentence_cut(window: &str) -> Option<usize> {
    [". ", "! ", "? ", "。"]
        .iter()
        .filter_map(|sep| window.rfind(sep).map(|pos| pos + sep.len()))
        .max()
}

/// Cut just after the last whitespace character in the window.
fn whitespace_cut(window: &str) -> Option<usize> {
    window
        .char_indices()
        .filter(|(_, c)| c.is_whitespace())
        .next_back()
        .map(|(pos, c)| pos + c.len_utf8())
}

/// Map a byte offset back to its character offset via the boundary table.
fn char_offset_at(boundaries: &[usize], byte_offset: usize) -> usize {
    boundaries
        .binary_search(&byte_offset)
        .unwrap_or_else(|insertion| insertion)
}
