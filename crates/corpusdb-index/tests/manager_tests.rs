use std::sync::Arc;
use std::time::Duration;

use corpusdb_core::error::Error;
use corpusdb_core::traits::VectorIndexProvider;
use corpusdb_core::types::{IndexDescriptor, SimilarityMetric};
use corpusdb_index::{IndexManager, InMemoryIndexProvider, RetryPolicy};

fn descriptor(name: &str, dimension: usize, metric: SimilarityMetric) -> IndexDescriptor {
    IndexDescriptor {
        name: name.to_string(),
        dimension,
        metric,
    }
}

fn fast_poll(attempts: usize) -> RetryPolicy {
    RetryPolicy::new(attempts, Duration::from_millis(1))
}

#[tokio::test]
async fn ensure_index_is_idempotent() -> anyhow::Result<()> {
    let provider = Arc::new(InMemoryIndexProvider::new());
    let manager = IndexManager::new(provider.clone(), fast_poll(5));
    let index = descriptor("documents", 8, SimilarityMetric::Cosine);

    manager.ensure_index(&index).await?;
    manager.ensure_index(&index).await?;

    assert_eq!(provider.create_calls(), 1, "second call must not re-create");
    Ok(())
}

#[tokio::test]
async fn concurrent_callers_create_the_index_once() -> anyhow::Result<()> {
    let provider = Arc::new(InMemoryIndexProvider::new());
    let manager = Arc::new(IndexManager::new(provider.clone(), fast_poll(5)));
    let index = descriptor("documents", 8, SimilarityMetric::Cosine);

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let manager = manager.clone();
        let index = index.clone();
        tasks.push(tokio::spawn(async move { manager.ensure_index(&index).await }));
    }
    for task in tasks {
        task.await??;
    }

    assert_eq!(provider.create_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn conflicting_configuration_fails_and_leaves_the_index_alone() -> anyhow::Result<()> {
    let provider = Arc::new(InMemoryIndexProvider::new());
    provider
        .create_index("documents", 768, SimilarityMetric::Cosine)
        .await?;
    let manager = IndexManager::new(provider.clone(), fast_poll(5));

    // Different dimension.
    let err = manager
        .ensure_index(&descriptor("documents", 1536, SimilarityMetric::Cosine))
        .await
        .expect_err("conflicting dimension must fail");
    match err {
        Error::IndexConfigurationConflict {
            existing_dimension,
            requested_dimension,
            ..
        } => {
            assert_eq!(existing_dimension, 768);
            assert_eq!(requested_dimension, 1536);
        }
        other => panic!("unexpected error: {other}"),
    }

    // Different metric.
    let err = manager
        .ensure_index(&descriptor("documents", 768, SimilarityMetric::DotProduct))
        .await
        .expect_err("conflicting metric must fail");
    assert!(matches!(err, Error::IndexConfigurationConflict { .. }));

    // Only the seeding call above ever created anything.
    assert_eq!(provider.create_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn waits_for_a_slow_index_to_become_ready() -> anyhow::Result<()> {
    let provider = Arc::new(InMemoryIndexProvider::with_creation_delay(2));
    let manager = IndexManager::new(provider, fast_poll(5));

    manager
        .ensure_index(&descriptor("documents", 8, SimilarityMetric::Cosine))
        .await?;
    Ok(())
}

#[tokio::test]
async fn gives_up_after_the_poll_budget_is_spent() -> anyhow::Result<()> {
    let provider = Arc::new(InMemoryIndexProvider::with_creation_delay(10));
    let manager = IndexManager::new(provider, fast_poll(2));

    let err = manager
        .ensure_index(&descriptor("documents", 8, SimilarityMetric::Cosine))
        .await
        .expect_err("provisioning must time out");
    match err {
        Error::IndexProvisioningTimeout { name, attempts } => {
            assert_eq!(name, "documents");
            assert_eq!(attempts, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}
