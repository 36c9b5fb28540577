//! In-process index provider used by the offline mode and the tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use corpusdb_core::error::{Error, Result};
use corpusdb_core::traits::VectorIndexProvider;
use corpusdb_core::types::{IndexMatch, IndexState, IndexStatus, SimilarityMetric, VectorRecord};

struct StoredIndex {
    dimension: usize,
    metric: SimilarityMetric,
    records: HashMap<String, VectorRecord>,
    polls_until_ready: usize,
}

/// Vector store backed by a `HashMap`, with exact nearest-neighbor scan.
///
/// Mimics the asynchronous-creation behavior of managed services: an
/// index built with [`with_creation_delay`](Self::with_creation_delay)
/// reports `Creating` for the first N `describe_index` calls after its
/// creation, then `Ready`. Counters expose provider traffic so tests can
/// assert how callers drive the contract.
pub struct InMemoryIndexProvider {
    indexes: RwLock<HashMap<String, StoredIndex>>,
    creation_delay_polls: usize,
    create_calls: AtomicUsize,
    fail_next_upserts: AtomicUsize,
}

impl InMemoryIndexProvider {
    pub fn new() -> Self {
        Self::with_creation_delay(0)
    }

    /// New indexes report `Creating` for the first `polls` status checks.
    pub fn with_creation_delay(polls: usize) -> Self {
        Self {
            indexes: RwLock::new(HashMap::new()),
            creation_delay_polls: polls,
            create_calls: AtomicUsize::new(0),
            fail_next_upserts: AtomicUsize::new(0),
        }
    }

    /// How many times `create_index` has been called, successful or not.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Makes the next `count` upsert calls fail with a transient error.
    pub fn fail_upserts(&self, count: usize) {
        self.fail_next_upserts.store(count, Ordering::SeqCst);
    }

    pub async fn record_count(&self, index: &str) -> usize {
        self.indexes
            .read()
            .await
            .get(index)
            .map_or(0, |stored| stored.records.len())
    }

    /// Record ids currently stored, sorted for stable assertions.
    pub async fn record_ids(&self, index: &str) -> Vec<String> {
        let mut ids: Vec<String> = self
            .indexes
            .read()
            .await
            .get(index)
            .map(|stored| stored.records.keys().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    fn take_injected_failure(&self) -> bool {
        self.fail_next_upserts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl Default for InMemoryIndexProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorIndexProvider for InMemoryIndexProvider {
    async fn create_index(
        &self,
        name: &str,
        dimension: usize,
        metric: SimilarityMetric,
    ) -> Result<()> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if dimension == 0 {
            return Err(Error::InvalidConfiguration(
                "index dimension must be at least 1".to_string(),
            ));
        }
        let mut indexes = self.indexes.write().await;
        if let Some(existing) = indexes.get(name) {
            if existing.dimension == dimension && existing.metric == metric {
                return Ok(());
            }
            return Err(Error::Provider(format!(
                "index {name} already exists with a different configuration"
            )));
        }
        indexes.insert(
            name.to_string(),
            StoredIndex {
                dimension,
                metric,
                records: HashMap::new(),
                polls_until_ready: self.creation_delay_polls,
            },
        );
        Ok(())
    }

    async fn describe_index(&self, name: &str) -> Result<Option<IndexStatus>> {
        let mut indexes = self.indexes.write().await;
        let Some(stored) = indexes.get_mut(name) else {
            return Ok(None);
        };
        let state = if stored.polls_until_ready > 0 {
            stored.polls_until_ready -= 1;
            IndexState::Creating
        } else {
            IndexState::Ready
        };
        Ok(Some(IndexStatus {
            dimension: stored.dimension,
            metric: stored.metric,
            state,
        }))
    }

    async fn upsert(&self, index: &str, records: &[VectorRecord]) -> Result<()> {
        if self.take_injected_failure() {
            return Err(Error::IndexUnavailable("injected upsert outage".to_string()));
        }
        let mut indexes = self.indexes.write().await;
        let stored = indexes
            .get_mut(index)
            .ok_or_else(|| Error::Provider(format!("index {index} does not exist")))?;
        for record in records {
            if record.vector.len() != stored.dimension {
                return Err(Error::InvalidConfiguration(format!(
                    "record {} has dimension {}, index {index} expects {}",
                    record.id,
                    record.vector.len(),
                    stored.dimension
                )));
            }
        }
        for record in records {
            stored.records.insert(record.id.clone(), record.clone());
        }
        Ok(())
    }

    async fn query(&self, index: &str, vector: &[f32], k: usize) -> Result<Vec<IndexMatch>> {
        let indexes = self.indexes.read().await;
        let stored = indexes
            .get(index)
            .ok_or_else(|| Error::Provider(format!("index {index} does not exist")))?;
        if vector.len() != stored.dimension {
            return Err(Error::InvalidConfiguration(format!(
                "query vector has dimension {}, index {index} expects {}",
                vector.len(),
                stored.dimension
            )));
        }
        let mut matches: Vec<IndexMatch> = stored
            .records
            .values()
            .map(|record| IndexMatch {
                id: record.id.clone(),
                score: score(stored.metric, vector, &record.vector),
                metadata: record.metadata.clone(),
            })
            .collect();
        // Ties resolve by position then id, never by map iteration
        // order, even when equal scores straddle the cut at k.
        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.metadata.position.cmp(&b.metadata.position))
                .then_with(|| a.id.cmp(&b.id))
        });
        matches.truncate(k);
        Ok(matches)
    }

    async fn delete_by_source(&self, index: &str, source_id: &str) -> Result<()> {
        let mut indexes = self.indexes.write().await;
        if let Some(stored) = indexes.get_mut(index) {
            let before = stored.records.len();
            stored
                .records
                .retain(|_, record| record.metadata.source_id != source_id);
            let removed = before - stored.records.len();
            if removed > 0 {
                tracing::debug!(index, source_id, removed, "deleted records by source");
            }
        }
        Ok(())
    }
}

fn score(metric: SimilarityMetric, a: &[f32], b: &[f32]) -> f32 {
    match metric {
        SimilarityMetric::Cosine => cosine_similarity(a, b),
        SimilarityMetric::DotProduct => dot(a, b),
        // Negated so that higher is always better.
        SimilarityMetric::Euclidean => -euclidean_distance(a, b),
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let norm_a = dot(a, a).sqrt();
    let norm_b = dot(b, b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot(a, b) / (norm_a * norm_b)
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
