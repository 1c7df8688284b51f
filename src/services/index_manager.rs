//! Vector index lifecycle: replace, then wait out the build.

use std::sync::Arc;
use std::time::Duration;

use crate::error::IndexError;
use crate::models::{IndexKind, VectorIndexSpec};
use crate::services::store::DocumentStore;

/// Server message fragment that identifies a cluster-tier rejection.
const TIER_LIMIT_MARKER: &str = "not enabled for this cluster tier";

/// What a replace run did to the collection's indexes.
#[derive(Debug, Clone, Default)]
pub struct ReplaceOutcome {
    /// Names of the vector indexes dropped before creation.
    pub dropped: Vec<String>,

    /// Drop failures, reported but not fatal. The create step decides
    /// whether the run succeeded.
    pub warnings: Vec<String>,
}

/// Drops and recreates vector indexes so one definition per field is
/// active at a time.
pub struct IndexManager {
    store: Arc<dyn DocumentStore>,
}

impl IndexManager {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Drop every vector index on the given field.
    ///
    /// A failed drop is downgraded to a warning since a later creation
    /// will fail anyway if the stale index truly blocks it. A failed
    /// listing ends the run.
    pub async fn drop_vector_indexes(&self, field: &str) -> Result<ReplaceOutcome, IndexError> {
        let mut outcome = ReplaceOutcome::default();

        let existing = self.store.list_indexes().await?;
        for descriptor in existing.iter().filter(|d| d.marks_vector_field(field)) {
            match self.store.drop_index(&descriptor.name).await {
                Ok(()) => outcome.dropped.push(descriptor.name.clone()),
                Err(e) => outcome
                    .warnings
                    .push(format!("failed to drop index {}: {}", descriptor.name, e)),
            }
        }

        Ok(outcome)
    }

    /// Replace the vector index on the spec's field: drop every existing
    /// vector index on that field, then create the new one.
    pub async fn replace_vector_index(
        &self,
        spec: &VectorIndexSpec,
    ) -> Result<ReplaceOutcome, IndexError> {
        let outcome = self.drop_vector_indexes(&spec.field).await?;

        if let Err(e) = self.store.create_vector_index(spec).await {
            let remediation = remediation_for(spec.algorithm.kind(), &e.to_string());
            return Err(IndexError::CreateFailed {
                name: spec.index_name(),
                source: e,
                remediation,
            });
        }

        Ok(outcome)
    }

    /// Sleep out the fixed settle window for a freshly created index.
    /// The store offers no readiness probe, so this is a plain pause.
    pub async fn wait_until_settled(&self, kind: IndexKind) {
        tokio::time::sleep(settle_delay(kind)).await;
    }
}

/// Settle window after index creation. IVF clustering takes longer than
/// graph construction on small collections.
pub fn settle_delay(kind: IndexKind) -> Duration {
    match kind {
        IndexKind::Ivf => Duration::from_secs(3),
        IndexKind::Hnsw | IndexKind::DiskAnn => Duration::from_secs(2),
    }
}

/// Attach an operator hint when the server rejected the index for tier
/// reasons. The source error stays as the server sent it.
fn remediation_for(kind: IndexKind, message: &str) -> Option<String> {
    if !message.contains(TIER_LIMIT_MARKER) {
        return None;
    }

    Some(match kind {
        IndexKind::DiskAnn => {
            "diskann indexes require an M50 or higher cluster tier; \
             upgrade the cluster, or use hnsw (M40 and up) or ivf (all tiers)"
                .to_string()
        }
        IndexKind::Hnsw => "hnsw indexes require an M40 or higher cluster tier; \
             upgrade the cluster, or use ivf (all tiers)"
            .to_string(),
        IndexKind::Ivf => "this index kind is not enabled on the current cluster tier".to_string(),
    })
}
