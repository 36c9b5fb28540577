//! Batched, concurrent writes of embedded chunks.

use std::collections::HashSet;
use std::sync::Arc;

use futures::stream::{self, StreamExt};

use corpusdb_core::error::{Error, Result};
use corpusdb_core::traits::{EmbeddingClient, VectorIndexProvider};
use corpusdb_core::types::{
    Chunk, ChunkId, ChunkMetadata, FailedChunk, IndexDescriptor, SkipReason, SkippedChunk,
    UpsertReport, VectorRecord,
};

use crate::retry::{with_retry, RetryPolicy};

/// Batching and concurrency knobs for one coordinator.
#[derive(Debug, Clone, Copy)]
pub struct UpsertPolicy {
    /// Upper bound on records per provider write.
    pub batch_size: usize,
    pub max_concurrent_batches: usize,
    pub retry: RetryPolicy,
}

/// Embeds chunks and writes them to an index in bounded batches.
///
/// A batch either lands fully or fails fully; a failed batch never
/// aborts its siblings. The report accounts for every input chunk
/// exactly once, as written, skipped, or failed.
pub struct UpsertCoordinator {
    provider: Arc<dyn VectorIndexProvider>,
    embedder: Arc<dyn EmbeddingClient>,
    policy: UpsertPolicy,
}

impl UpsertCoordinator {
    pub fn new(
        provider: Arc<dyn VectorIndexProvider>,
        embedder: Arc<dyn EmbeddingClient>,
        policy: UpsertPolicy,
    ) -> Self {
        Self {
            provider,
            embedder,
            policy,
        }
    }

    pub async fn upsert(&self, index: &IndexDescriptor, chunks: &[Chunk]) -> Result<UpsertReport> {
        if self.embedder.dimension() != index.dimension {
            return Err(Error::InvalidConfiguration(format!(
                "embedding client produces dimension {}, index {} expects {}",
                self.embedder.dimension(),
                index.name,
                index.dimension
            )));
        }

        let mut seen = HashSet::new();
        let mut skipped = Vec::new();
        let mut accepted: Vec<&Chunk> = Vec::new();
        for chunk in chunks {
            if chunk.text.trim().is_empty() {
                skipped.push(SkippedChunk {
                    id: chunk.id.clone(),
                    reason: SkipReason::EmptyText,
                });
                continue;
            }
            if !seen.insert(chunk.id.clone()) {
                skipped.push(SkippedChunk {
                    id: chunk.id.clone(),
                    reason: SkipReason::DuplicateId,
                });
                continue;
            }
            accepted.push(chunk);
        }
        tracing::info!(
            index = %index.name,
            total = chunks.len(),
            accepted = accepted.len(),
            skipped = skipped.len(),
            "upserting chunks"
        );

        let batch_size = self.policy.batch_size.max(1);
        let batches: Vec<Vec<Chunk>> = accepted
            .chunks(batch_size)
            .map(|batch| batch.iter().map(|&chunk| chunk.clone()).collect())
            .collect();

        let outcomes: Vec<(Vec<ChunkId>, Vec<FailedChunk>)> = stream::iter(batches)
            .map(|batch| async move { self.process_batch(index, batch).await })
            .buffer_unordered(self.policy.max_concurrent_batches.max(1))
            .collect()
            .await;

        let mut written = Vec::new();
        let mut failed = Vec::new();
        for (batch_written, batch_failed) in outcomes {
            written.extend(batch_written);
            failed.extend(batch_failed);
        }
        written.sort();
        skipped.sort_by(|a, b| a.id.cmp(&b.id));
        failed.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(UpsertReport {
            written,
            skipped,
            failed,
        })
    }

    /// Batches are isolated: the failure of one is recorded per chunk
    /// and the rest keep going.
    async fn process_batch(
        &self,
        index: &IndexDescriptor,
        batch: Vec<Chunk>,
    ) -> (Vec<ChunkId>, Vec<FailedChunk>) {
        match self.embed_and_write(index, &batch).await {
            Ok(()) => (batch.into_iter().map(|chunk| chunk.id).collect(), Vec::new()),
            Err(err) => {
                tracing::warn!(
                    index = %index.name,
                    chunks = batch.len(),
                    error = %err,
                    "batch upsert failed"
                );
                let message = err.to_string();
                let failed = batch
                    .into_iter()
                    .map(|chunk| FailedChunk {
                        id: chunk.id,
                        error: message.clone(),
                    })
                    .collect();
                (Vec::new(), failed)
            }
        }
    }

    async fn embed_and_write(&self, index: &IndexDescriptor, batch: &[Chunk]) -> Result<()> {
        let texts: Vec<String> = batch.iter().map(|chunk| chunk.text.clone()).collect();
        let vectors = with_retry(&self.policy.retry, "embed_batch", || {
            self.embedder.embed_batch(&texts)
        })
        .await?;
        if vectors.len() != batch.len() {
            return Err(Error::EmbeddingPermanent(format!(
                "expected {} vectors, embedding client returned {}",
                batch.len(),
                vectors.len()
            )));
        }

        let mut records = Vec::with_capacity(batch.len());
        for (chunk, vector) in batch.iter().zip(vectors) {
            if vector.len() != index.dimension {
                return Err(Error::InvalidConfiguration(format!(
                    "embedding for chunk {} has dimension {}, index {} expects {}",
                    chunk.id,
                    vector.len(),
                    index.name,
                    index.dimension
                )));
            }
            records.push(VectorRecord {
                id: chunk.id.clone(),
                vector,
                metadata: ChunkMetadata {
                    source_id: chunk.source_id.clone(),
                    position: chunk.position,
                    text: chunk.text.clone(),
                },
            });
        }

        with_retry(&self.policy.retry, "upsert", || {
            self.provider.upsert(&index.name, &records)
        })
        .await?;
        tracing::debug!(index = %index.name, records = records.len(), "wrote upsert batch");
        Ok(())
    }
}
