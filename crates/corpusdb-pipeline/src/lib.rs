#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! End-to-end orchestration: documents in, ranked context out.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use corpusdb_core::chunker::Chunker;
use corpusdb_core::config::PipelineConfig;
use corpusdb_core::error::{Error, Result};
use corpusdb_core::traits::{EmbeddingClient, VectorIndexProvider};
use corpusdb_core::types::{ContextBlock, ScoredChunk, UpsertReport};
use corpusdb_index::{
    ContextAssembler, IndexManager, Retriever, RetryPolicy, UpsertCoordinator, UpsertPolicy,
};

/// Outcome of ingesting one document.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub source_id: String,
    pub chunk_count: usize,
    pub upsert: UpsertReport,
    pub completed_at: DateTime<Utc>,
}

/// Context block plus the ranked matches it was assembled from.
#[derive(Debug, Clone)]
pub struct QueryResponse {
    pub context: ContextBlock,
    pub matches: Vec<ScoredChunk>,
}

/// Wires the chunker, index manager, upsert coordinator, retriever, and
/// context assembler behind two entry points: [`ingest`](Self::ingest)
/// and [`query`](Self::query).
///
/// Re-ingesting a document replaces its previous chunks wholesale, so
/// an index never mixes chunks from two generations of the same source.
pub struct DocumentPipeline {
    config: PipelineConfig,
    provider: Arc<dyn VectorIndexProvider>,
    chunker: Chunker,
    manager: IndexManager,
    coordinator: UpsertCoordinator,
    retriever: Retriever,
    assembler: ContextAssembler,
}

impl DocumentPipeline {
    pub fn new(
        provider: Arc<dyn VectorIndexProvider>,
        embedder: Arc<dyn EmbeddingClient>,
        config: PipelineConfig,
    ) -> Result<Self> {
        config.validate()?;
        if embedder.dimension() != config.dimension {
            return Err(Error::InvalidConfiguration(format!(
                "embedding client {} produces dimension {}, configuration expects {}",
                embedder.model_id(),
                embedder.dimension(),
                config.dimension
            )));
        }

        let chunker = Chunker::new(config.chunk_size, config.overlap)?;
        let retry = RetryPolicy::new(
            config.retry_max_attempts,
            Duration::from_millis(config.retry_base_delay_ms),
        );
        let poll = RetryPolicy::new(
            config.poll_max_attempts,
            Duration::from_millis(config.poll_base_delay_ms),
        );
        let manager = IndexManager::new(provider.clone(), poll);
        let coordinator = UpsertCoordinator::new(
            provider.clone(),
            embedder.clone(),
            UpsertPolicy {
                batch_size: config.upsert_batch_size,
                max_concurrent_batches: config.max_concurrent_batches,
                retry,
            },
        );
        let retriever = Retriever::new(provider.clone(), embedder, retry);
        let assembler = ContextAssembler::new(config.max_context_size);

        Ok(Self {
            config,
            provider,
            chunker,
            manager,
            coordinator,
            retriever,
            assembler,
        })
    }

    /// Chunks a document, provisions the index, and writes the chunks,
    /// replacing any previous generation of the same source.
    pub async fn ingest(&self, source_id: &str, text: &str) -> Result<IngestReport> {
        // 1) chunk
        let chunks = self.chunker.chunk(source_id, text);
        tracing::info!(source_id, chunks = chunks.len(), "ingesting document");

        // 2) make sure the index exists and is ready
        let index = self.config.descriptor();
        self.manager.ensure_index(&index).await?;

        // 3) drop the previous generation, then write the new one
        self.provider.delete_by_source(&index.name, source_id).await?;
        let upsert = self.coordinator.upsert(&index, &chunks).await?;

        Ok(IngestReport {
            source_id: source_id.to_string(),
            chunk_count: chunks.len(),
            upsert,
            completed_at: Utc::now(),
        })
    }

    /// Retrieves the top-k chunks for a query and assembles them into a
    /// bounded context block. `k` falls back to the configured `top_k`.
    pub async fn query(&self, text: &str, k: Option<usize>) -> Result<QueryResponse> {
        let k = k.unwrap_or(self.config.top_k);
        let index = self.config.descriptor();
        self.manager.ensure_index(&index).await?;

        let retrieved = self.retriever.retrieve(&index, text, k).await?;
        let context = self.assembler.assemble(&retrieved.matches);
        tracing::info!(
            matches = retrieved.matches.len(),
            context_chunks = context.chunk_ids.len(),
            "query complete"
        );
        Ok(QueryResponse {
            context,
            matches: retrieved.matches,
        })
    }
}
