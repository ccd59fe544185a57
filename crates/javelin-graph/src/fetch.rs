//! The parallel metadata fetch stage.
//!
//! One fetch operation is submitted per qualifying edge; the whole batch is
//! awaited before attachment starts, so the driver never races its own
//! serial phases. Failures are captured per operation and surfaced when the
//! edge is attached.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::debug;

use javelin_core::metadata::ComponentMetadata;
use javelin_core::module::{ComponentId, ModuleVersionId};

use crate::interfaces::{ComponentMetadataResolver, ResolveFailure};
use crate::state::ComponentIdx;

/// One metadata fetch to perform.
#[derive(Debug, Clone)]
pub(crate) struct MetadataFetch {
    pub component: ComponentIdx,
    pub id: ComponentId,
    pub version_id: ModuleVersionId,
}

/// The result of one fetch, keyed back to the component it belongs to.
pub(crate) struct FetchOutcome {
    pub component: ComponentIdx,
    pub result: Result<ComponentMetadata, ResolveFailure>,
}

/// Dispatches a batch of fetches with bounded concurrency and barrier
/// semantics: `run_all` returns only when every operation has finished.
pub(crate) struct FetchExecutor {
    permits: Arc<Semaphore>,
}

impl FetchExecutor {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Run the whole batch, returning outcomes in submission order.
    pub async fn run_all(
        &self,
        resolver: Arc<dyn ComponentMetadataResolver>,
        batch: Vec<MetadataFetch>,
    ) -> Vec<FetchOutcome> {
        debug!(count = batch.len(), "dispatching metadata fetch batch");
        let mut join_set = JoinSet::new();
        for (position, fetch) in batch.into_iter().enumerate() {
            let resolver = Arc::clone(&resolver);
            let permits = Arc::clone(&self.permits);
            join_set.spawn(async move {
                let _permit = permits.acquire().await;
                let result = resolver.resolve(&fetch.id, &fetch.version_id).await;
                (
                    position,
                    FetchOutcome {
                        component: fetch.component,
                        result,
                    },
                )
            });
        }

        let mut outcomes: Vec<(usize, FetchOutcome)> = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => debug!(error = %err, "metadata fetch task failed to join"),
            }
        }
        outcomes.sort_by_key(|(position, _)| *position);
        outcomes.into_iter().map(|(_, outcome)| outcome).collect()
    }
}
