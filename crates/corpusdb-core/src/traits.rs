//! Contracts for the two external collaborators. The pipeline depends
//! only on these shapes, never on a concrete provider.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{IndexMatch, IndexStatus, SimilarityMetric, VectorRecord};

/// Maps text to fixed-length vectors. Every vector from one client has
/// the same dimensionality.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Stable identifier of the embedding model behind this client.
    fn model_id(&self) -> &str;

    /// Dimensionality of every vector this client produces.
    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Batched variant; the output order matches the input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Nearest-neighbor store holding named indexes. Writes are assumed
/// eventually consistent and index creation is assumed asynchronous.
#[async_trait]
pub trait VectorIndexProvider: Send + Sync {
    async fn create_index(
        &self,
        name: &str,
        dimension: usize,
        metric: SimilarityMetric,
    ) -> Result<()>;

    /// `None` when no index with this name exists.
    async fn describe_index(&self, name: &str) -> Result<Option<IndexStatus>>;

    /// Insert-or-overwrite by record id.
    async fn upsert(&self, index: &str, records: &[VectorRecord]) -> Result<()>;

    async fn query(&self, index: &str, vector: &[f32], k: usize) -> Result<Vec<IndexMatch>>;

    /// Remove every record whose metadata carries this source identifier.
    async fn delete_by_source(&self, index: &str, source_id: &str) -> Result<()>;
}
