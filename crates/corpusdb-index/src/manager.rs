//! Idempotent index provisioning.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use corpusdb_core::error::{Error, Result};
use corpusdb_core::traits::VectorIndexProvider;
use corpusdb_core::types::{IndexDescriptor, IndexState, IndexStatus};

use crate::retry::RetryPolicy;

/// Brings a named index to the `Ready` state, creating it if needed.
///
/// Calls for the same name are serialized through a per-name lock, so
/// concurrent callers cannot race each other into duplicate creation.
/// An existing index whose dimension or metric differs from the request
/// is never touched; the call fails instead.
pub struct IndexManager {
    provider: Arc<dyn VectorIndexProvider>,
    poll: RetryPolicy,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl IndexManager {
    /// `poll` bounds the readiness wait: at most `max_attempts` status
    /// checks with exponential backoff between them.
    pub fn new(provider: Arc<dyn VectorIndexProvider>, poll: RetryPolicy) -> Self {
        Self {
            provider,
            poll,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub async fn ensure_index(&self, descriptor: &IndexDescriptor) -> Result<()> {
        let lock = self.lock_for(&descriptor.name).await;
        let _guard = lock.lock().await;

        match self.provider.describe_index(&descriptor.name).await? {
            Some(status) => {
                verify_configuration(descriptor, &status)?;
                if status.state == IndexState::Ready {
                    tracing::debug!(index = %descriptor.name, "index already provisioned");
                    return Ok(());
                }
                tracing::info!(index = %descriptor.name, "index still provisioning, waiting");
                self.wait_until_ready(descriptor).await
            }
            None => {
                tracing::info!(
                    index = %descriptor.name,
                    dimension = descriptor.dimension,
                    metric = %descriptor.metric,
                    "creating index"
                );
                self.provider
                    .create_index(&descriptor.name, descriptor.dimension, descriptor.metric)
                    .await?;
                self.wait_until_ready(descriptor).await
            }
        }
    }

    async fn wait_until_ready(&self, descriptor: &IndexDescriptor) -> Result<()> {
        for attempt in 0..self.poll.max_attempts {
            match self.provider.describe_index(&descriptor.name).await? {
                Some(status) => {
                    verify_configuration(descriptor, &status)?;
                    if status.state == IndexState::Ready {
                        tracing::info!(index = %descriptor.name, "index is ready");
                        return Ok(());
                    }
                }
                None => {
                    return Err(Error::IndexUnavailable(format!(
                        "index {} disappeared while provisioning",
                        descriptor.name
                    )));
                }
            }
            if attempt + 1 < self.poll.max_attempts {
                let delay = self.poll.delay_for(attempt);
                tracing::debug!(
                    index = %descriptor.name,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "index not ready yet"
                );
                tokio::time::sleep(delay).await;
            }
        }
        Err(Error::IndexProvisioningTimeout {
            name: descriptor.name.clone(),
            attempts: self.poll.max_attempts,
        })
    }

    async fn lock_for(&self, name: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(name.to_string()).or_default().clone()
    }
}

fn verify_configuration(descriptor: &IndexDescriptor, status: &IndexStatus) -> Result<()> {
    if status.dimension != descriptor.dimension || status.metric != descriptor.metric {
        return Err(Error::IndexConfigurationConflict {
            name: descriptor.name.clone(),
            existing_dimension: status.dimension,
            existing_metric: status.metric,
            requested_dimension: descriptor.dimension,
            requested_metric: descriptor.metric,
        });
    }
    Ok(())
}
