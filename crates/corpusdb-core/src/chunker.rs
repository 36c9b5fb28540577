use crate::error::{Error, Result};
use crate::types::{Chunk, ChunkId};

/// Splits document text into overlapping fixed-size spans.
///
/// Spans are measured in chars so boundaries never split a multi-byte
/// encoding. Chunk i starts at `i * (max_size - overlap)` and ends
/// `max_size` chars later, clamped to the text length; the final chunk
/// may be shorter. Splitting is deterministic and has no side effects.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    max_size: usize,
    overlap: usize,
}

impl Chunker {
    pub fn new(max_size: usize, overlap: usize) -> Result<Self> {
        if max_size == 0 {
            return Err(Error::InvalidConfiguration(
                "chunk max_size must be at least 1".to_string(),
            ));
        }
        if overlap >= max_size {
            return Err(Error::InvalidConfiguration(format!(
                "chunk overlap {} must be smaller than max_size {}",
                overlap, max_size
            )));
        }
        Ok(Self { max_size, overlap })
    }

    /// Chunk `text` into spans. Empty input yields an empty sequence.
    pub fn chunk(&self, source_id: &str, text: &str) -> Vec<Chunk> {
        let units: Vec<char> = text.chars().collect();
        if units.is_empty() {
            return Vec::new();
        }
        let step = self.max_size - self.overlap;
        let mut chunks = Vec::new();
        let mut position = 0usize;
        loop {
            let start = position * step;
            let end = (start + self.max_size).min(units.len());
            let span: String = units[start..end].iter().collect();
            chunks.push(Chunk {
                id: derive_chunk_id(source_id, position, &span),
                source_id: source_id.to_string(),
                position,
                text: span,
                start,
                end,
                total_chunks: 0,
            });
            // the chunk that reaches the end of the text is the last one
            if end >= units.len() {
                break;
            }
            position += 1;
        }
        let total = chunks.len();
        for chunk in &mut chunks {
            chunk.total_chunks = total;
        }
        chunks
    }
}

/// Stable chunk identifier: `source:position:hash16`. Identical source,
/// position, and text always produce the same id, so re-ingesting
/// unchanged content overwrites in place instead of duplicating.
pub fn derive_chunk_id(source_id: &str, position: usize, text: &str) -> ChunkId {
    let digest = blake3::hash(text.as_bytes()).to_hex();
    format!("{}:{}:{}", source_id, position, &digest.as_str()[..16])
}
