//! Nearest-neighbor retrieval with score normalization.

use std::sync::Arc;

use corpusdb_core::error::{Error, Result};
use corpusdb_core::traits::{EmbeddingClient, VectorIndexProvider};
use corpusdb_core::types::{IndexDescriptor, RetrievalResult, ScoredChunk, SimilarityMetric};

use crate::retry::{with_retry, RetryPolicy};

/// Embeds a query and returns the top-k chunks from an index.
///
/// Matches come back sorted by descending score; equal scores are
/// ordered by chunk position so results are stable across runs. The
/// result never holds more than k matches, whatever the provider
/// returns.
pub struct Retriever {
    provider: Arc<dyn VectorIndexProvider>,
    embedder: Arc<dyn EmbeddingClient>,
    retry: RetryPolicy,
}

impl Retriever {
    pub fn new(
        provider: Arc<dyn VectorIndexProvider>,
        embedder: Arc<dyn EmbeddingClient>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            provider,
            embedder,
            retry,
        }
    }

    pub async fn retrieve(
        &self,
        index: &IndexDescriptor,
        query: &str,
        k: usize,
    ) -> Result<RetrievalResult> {
        if k == 0 {
            return Err(Error::InvalidQuery(
                "requested match count must be at least 1".to_string(),
            ));
        }
        if query.trim().is_empty() {
            return Err(Error::InvalidQuery("query text must not be empty".to_string()));
        }

        let query_vector = with_retry(&self.retry, "embed_query", || self.embedder.embed(query))
            .await?;
        if query_vector.len() != index.dimension {
            return Err(Error::InvalidConfiguration(format!(
                "query embedding has dimension {}, index {} expects {}",
                query_vector.len(),
                index.name,
                index.dimension
            )));
        }

        let matches = with_retry(&self.retry, "query_index", || {
            self.provider.query(&index.name, &query_vector, k)
        })
        .await?;

        let mut scored: Vec<ScoredChunk> = matches
            .into_iter()
            .map(|m| ScoredChunk {
                id: m.id,
                source_id: m.metadata.source_id,
                position: m.metadata.position,
                text: m.metadata.text,
                score: normalize_score(index.metric, m.score),
            })
            .collect();
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.position.cmp(&b.position))
        });
        scored.truncate(k);

        tracing::debug!(index = %index.name, query_len = query.len(), returned = scored.len(), "retrieval complete");
        Ok(RetrievalResult {
            query_vector,
            matches: scored,
        })
    }
}

/// Cosine scores outside [-1, 1] are a provider artifact (usually float
/// drift); they are clamped rather than propagated.
fn normalize_score(metric: SimilarityMetric, score: f32) -> f32 {
    if metric == SimilarityMetric::Cosine && !(-1.0..=1.0).contains(&score) {
        let clamped = score.clamp(-1.0, 1.0);
        tracing::warn!(score, clamped, "cosine score outside [-1, 1], clamping");
        return clamped;
    }
    score
}
