//! Domain types shared across the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

pub type ChunkId = String;

/// A bounded contiguous span of a document's text, the unit of embedding
/// and retrieval.
///
/// - `id`: stable identifier derived from (source, position, content hash)
/// - `source_id`: document identity (file stem or external id)
/// - `position`: ordinal of this chunk within the document
/// - `start`/`end`: char offsets of the span within the document text
/// - `total_chunks`: chunk count of the generation this chunk belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub source_id: String,
    pub position: usize,
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub total_chunks: usize,
}

/// Similarity metric an index is provisioned with. Scores are always
/// "higher is better" regardless of metric.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityMetric {
    Cosine,
    DotProduct,
    Euclidean,
}

impl Default for SimilarityMetric {
    fn default() -> Self {
        SimilarityMetric::Cosine
    }
}

impl fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SimilarityMetric::Cosine => "cosine",
            SimilarityMetric::DotProduct => "dotproduct",
            SimilarityMetric::Euclidean => "euclidean",
        };
        write!(f, "{}", name)
    }
}

/// Provisioning state reported by the index provider. Creation is not
/// synchronous: an index can be visible but not yet queryable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IndexState {
    Creating,
    Ready,
}

/// What `describe_index` reports for an existing index.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IndexStatus {
    pub dimension: usize,
    pub metric: SimilarityMetric,
    pub state: IndexState,
}

/// A verified, ready-to-use index handle returned by the index manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDescriptor {
    pub name: String,
    pub dimension: usize,
    pub metric: SimilarityMetric,
}

/// Metadata stored alongside each vector so queries can return the chunk
/// text without a second lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source_id: String,
    pub position: usize,
    pub text: String,
}

/// One (id, vector, metadata) tuple written to an index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: ChunkId,
    pub vector: Vec<f32>,
    pub metadata: ChunkMetadata,
}

/// A raw provider match, before normalization by the retriever.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMatch {
    pub id: ChunkId,
    pub score: f32,
    pub metadata: ChunkMetadata,
}

/// A retrieved chunk with its similarity score. Higher is better.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub id: ChunkId,
    pub source_id: String,
    pub position: usize,
    pub text: String,
    pub score: f32,
}

/// Result of one nearest-neighbor query: at most k matches, sorted by
/// descending score, ties broken by chunk position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub query_vector: Vec<f32>,
    pub matches: Vec<ScoredChunk>,
}

/// Bounded concatenation of retrieved chunk texts, with the ids that
/// made it in, in inclusion order. Recomputed per query, no identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextBlock {
    pub text: String,
    pub chunk_ids: Vec<ChunkId>,
}

impl ContextBlock {
    pub fn is_empty(&self) -> bool {
        self.chunk_ids.is_empty()
    }
}

/// Why a chunk was excluded from an upsert before any network call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SkipReason {
    EmptyText,
    DuplicateId,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::EmptyText => write!(f, "empty text"),
            SkipReason::DuplicateId => write!(f, "duplicate id"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedChunk {
    pub id: ChunkId,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedChunk {
    pub id: ChunkId,
    pub error: String,
}

/// Per-chunk outcome of one upsert call. A chunk lands in exactly one of
/// the three lists; nothing is silently dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpsertReport {
    pub written: Vec<ChunkId>,
    pub skipped: Vec<SkippedChunk>,
    pub failed: Vec<FailedChunk>,
}

impl UpsertReport {
    /// True when every accepted chunk was written.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
