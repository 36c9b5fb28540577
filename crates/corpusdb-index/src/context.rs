//! Greedy assembly of retrieved chunks into a bounded context block.

use corpusdb_core::types::{ContextBlock, ScoredChunk};

/// Separator placed between chunk texts in an assembled block. Counts
/// toward the size budget.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Packs ranked chunks into a block of at most `max_size` characters.
///
/// Chunks are taken in the given order and never split; assembly stops
/// at the first chunk that would not fit whole. An empty block is a
/// valid outcome.
pub struct ContextAssembler {
    max_size: usize,
}

impl ContextAssembler {
    pub fn new(max_size: usize) -> Self {
        Self { max_size }
    }

    pub fn assemble(&self, chunks: &[ScoredChunk]) -> ContextBlock {
        let separator_len = CONTEXT_SEPARATOR.chars().count();
        let mut text = String::new();
        let mut chunk_ids = Vec::new();
        let mut used = 0usize;
        for chunk in chunks {
            let span = chunk.text.chars().count();
            let sep = if chunk_ids.is_empty() { 0 } else { separator_len };
            if used + sep + span > self.max_size {
                break;
            }
            if sep > 0 {
                text.push_str(CONTEXT_SEPARATOR);
            }
            text.push_str(&chunk.text);
            used += sep + span;
            chunk_ids.push(chunk.id.clone());
        }
        tracing::debug!(
            candidates = chunks.len(),
            included = chunk_ids.len(),
            used,
            budget = self.max_size,
            "assembled context block"
        );
        ContextBlock { text, chunk_ids }
    }
}
