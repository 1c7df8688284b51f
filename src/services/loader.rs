//! Batched bulk insertion into the document store.
//!
//! The loader never aborts a run: a batch that fails in whole or in part
//! is tallied and the next batch still goes out. Callers inspect the
//! returned stats to decide whether the load was good enough.

use indicatif::ProgressBar;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::models::{Config, Document};
use crate::services::store::DocumentStore;

/// Tuning for one load run.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    pub batch_size: usize,
    pub batch_pause: Duration,
}

impl LoaderOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            batch_size: config.load.batch_size as usize,
            batch_pause: Duration::from_millis(config.load.batch_pause_ms),
        }
    }
}

/// Outcome of a load run. `inserted + failed` always equals `total`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InsertStats {
    pub total: usize,
    pub inserted: usize,
    pub failed: usize,

    /// One message per failed document or failed batch.
    pub errors: Vec<String>,
}

/// Writes documents to the store in unordered batches.
pub struct BulkLoader {
    store: Arc<dyn DocumentStore>,
    options: LoaderOptions,
}

impl BulkLoader {
    pub fn new(store: Arc<dyn DocumentStore>, options: LoaderOptions) -> Self {
        Self { store, options }
    }

    /// Insert every document, batch by batch. Batches are unordered on
    /// the store side, so a bad document fails alone and the rest of its
    /// batch still lands.
    pub async fn insert_all(
        &self,
        documents: &[Document],
        progress: Option<&ProgressBar>,
    ) -> InsertStats {
        let batch_size = self.options.batch_size.max(1);
        let mut stats = InsertStats {
            total: documents.len(),
            ..InsertStats::default()
        };

        for (ordinal, batch) in documents.chunks(batch_size).enumerate() {
            let offset = ordinal * batch_size;
            match self.store.bulk_insert(batch).await {
                Ok(outcome) => {
                    stats.inserted += outcome.inserted;
                    stats.failed += batch.len() - outcome.inserted;
                    for failure in outcome.failures {
                        stats.errors.push(format!(
                            "document {}: {}",
                            offset + failure.index,
                            failure.message
                        ));
                    }
                }
                Err(e) => {
                    stats.failed += batch.len();
                    stats.errors.push(format!("batch {}: {}", ordinal + 1, e));
                }
            }

            if let Some(pb) = progress {
                pb.inc(batch.len() as u64);
            }

            // Pace every batch, the last one included, so the store gets
            // a settle window before whatever the caller does next.
            tokio::time::sleep(self.options.batch_pause).await;
        }

        stats
    }
}
