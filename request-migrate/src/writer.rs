//! Batched document writer.
//!
//! Writes accumulate in a single [`WriteBatch`]. Once `batch_size` writes are
//! staged the batch is committed, and the batch and counter reset whether
//! the commit succeeded or not. A failed commit is retried with exponential
//! backoff; if it still fails the batch is logged, its paths are recorded and
//! the run continues.

use std::sync::Arc;
use std::time::Duration;

use docstore::{Document, DocumentRef, DocumentStore, StoreError, WriteBatch};
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;
use tracing::{error, info, warn};

use crate::config::BatchConfig;

const RETRY_BASE_MILLIS: u64 = 10;
const RETRY_MAX_DELAY: Duration = Duration::from_secs(5);

/// Counters kept by the writer across the whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteStats {
    /// Writes handed to [`BatchWriter::stage`]
    pub staged: usize,
    /// Writes in batches that committed
    pub committed: usize,
    /// Writes in batches that were dropped
    pub failed: usize,
    pub batches_committed: usize,
    pub batches_failed: usize,
}

/// Outcome of a writer run.
#[derive(Debug, Clone, Default)]
pub struct WriteReport {
    pub stats: WriteStats,
    /// Paths of every write in a dropped batch, in staging order
    pub failed_documents: Vec<DocumentRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlushKind {
    Threshold,
    Final,
}

/// Stages document upserts and commits them in fixed-size batches.
pub struct BatchWriter {
    store: Arc<dyn DocumentStore>,
    config: BatchConfig,
    batch: WriteBatch,
    stats: WriteStats,
    failed_documents: Vec<DocumentRef>,
}

impl BatchWriter {
    pub fn new(store: Arc<dyn DocumentStore>, config: BatchConfig) -> Self {
        let batch = WriteBatch::with_capacity(config.batch_size);
        Self {
            store,
            config,
            batch,
            stats: WriteStats::default(),
            failed_documents: Vec::new(),
        }
    }

    /// Number of writes staged since the last flush.
    pub fn pending(&self) -> usize {
        self.batch.len()
    }

    /// Stage an upsert of `fields` at `document`, committing the batch when
    /// it reaches the configured size.
    pub async fn stage(&mut self, document: DocumentRef, fields: Document) {
        self.batch.set(document, fields);
        self.stats.staged += 1;

        if self.batch.len() >= self.config.batch_size {
            self.flush(FlushKind::Threshold).await;
        }
    }

    /// Commit whatever is still staged and return the run's report.
    pub async fn finish(mut self) -> WriteReport {
        if !self.batch.is_empty() {
            self.flush(FlushKind::Final).await;
        }

        WriteReport {
            stats: self.stats,
            failed_documents: self.failed_documents,
        }
    }

    async fn flush(&mut self, kind: FlushKind) {
        let batch = std::mem::replace(
            &mut self.batch,
            WriteBatch::with_capacity(self.config.batch_size),
        );
        let count = batch.len();

        match self.commit_with_retry(&batch).await {
            Ok(()) => {
                self.stats.committed += count;
                self.stats.batches_committed += 1;
                match kind {
                    FlushKind::Threshold => info!("Committed batch of {} operations.", count),
                    FlushKind::Final => info!("Committed final batch of {} operations.", count),
                }
            }
            Err(e) => {
                self.stats.failed += count;
                self.stats.batches_failed += 1;
                self.failed_documents.extend(batch.documents().cloned());
                match kind {
                    FlushKind::Threshold => error!("Batch commit failed: {}", e),
                    FlushKind::Final => error!("Final batch commit failed: {}", e),
                }
            }
        }
    }

    async fn commit_with_retry(&self, batch: &WriteBatch) -> Result<(), StoreError> {
        let strategy = ExponentialBackoff::from_millis(RETRY_BASE_MILLIS)
            .factor(2)
            .max_delay(RETRY_MAX_DELAY)
            .map(jitter)
            .take(self.config.max_retries);

        let store = &self.store;
        Retry::spawn(strategy, move || async move {
            let result = store.commit(batch).await;
            if let Err(e) = &result {
                warn!(operations = batch.len(), error = %e, "Commit attempt failed");
            }
            result
        })
        .await
    }
}
