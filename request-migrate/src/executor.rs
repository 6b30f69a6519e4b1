// Migration executor - orchestrates the migration flow
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use docstore::{CollectionRef, DocumentRef, DocumentStore};
use tracing::{info, warn};

use crate::config::{
    MigrationConfig, OFFERS_TABLE, REQUESTS_COLLECTION, REQUESTS_TABLE, TUTOR_OFFERS_COLLECTION,
};
use crate::errors::MigrationError;
use crate::indexer::{record_key, OfferIndex};
use crate::loader::load_table;
use crate::mapper::{map_offer, map_request};
use crate::writer::{BatchWriter, WriteStats};

/// What a migration run did.
#[derive(Debug, Clone)]
pub struct MigrationSummary {
    /// Request documents staged
    pub requests: usize,
    /// Tutor offer documents staged
    pub offers: usize,
    /// Offers with no matching request, never written
    pub orphaned_offers: usize,
    pub stats: WriteStats,
    /// Documents in batches that could not be committed
    pub failed_documents: Vec<DocumentRef>,
    pub elapsed: Duration,
}

impl MigrationSummary {
    /// True when every staged document was committed.
    pub fn is_complete(&self) -> bool {
        self.failed_documents.is_empty()
    }
}

/// Migration executor that coordinates the migration process
pub struct MigrationExecutor {
    store: Arc<dyn DocumentStore>,
    config: MigrationConfig,
}

impl MigrationExecutor {
    /// Create a new migration executor
    pub fn new(store: Arc<dyn DocumentStore>, config: MigrationConfig) -> Self {
        Self { store, config }
    }

    /// Execute the full migration process
    pub async fn execute(&self) -> Result<MigrationSummary, MigrationError> {
        let start_time = Instant::now();

        // Step 1: Read exports
        info!("=== Reading exports ===");
        let requests =
            load_table(&self.config.requests_path, self.config.layout, REQUESTS_TABLE).await?;
        let offers = load_table(&self.config.offers_path, self.config.layout, OFFERS_TABLE).await?;
        info!(
            "Found {} requests and {} tutor offers.",
            requests.len(),
            offers.len()
        );

        // Step 2: Group offers under their request
        let index = OfferIndex::build(offers)?;
        let request_keys = requests
            .iter()
            .map(|request| record_key(request, "request", "id"))
            .collect::<Result<Vec<_>, _>>()?;
        // Offer keys resolve here too, so a bad key aborts before any commit
        let offer_keys = request_keys
            .iter()
            .map(|request_id| {
                index
                    .offers_for(request_id)
                    .iter()
                    .map(|offer| record_key(offer, "tutor offer", "id"))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        let known: HashSet<&str> = request_keys.iter().map(String::as_str).collect();
        let orphaned_offers = index.orphaned_count(&known);
        if orphaned_offers > 0 {
            warn!(
                orphaned_offers,
                "Tutor offers reference requests missing from the export and will not be migrated"
            );
        }

        // Step 3: Map and write
        info!("=== Writing documents ===");
        let requests_collection = CollectionRef::new(REQUESTS_COLLECTION);
        let mut writer = BatchWriter::new(self.store.clone(), self.config.batch.clone());
        let total = requests.len();
        let mut offers_staged = 0;

        let planned = requests.iter().zip(&request_keys).zip(&offer_keys);
        for (position, ((request, request_id), offer_ids)) in planned.enumerate() {
            let request_ref = requests_collection.doc(request_id.as_str());
            let document = map_request(request, self.config.deadline_format)?;
            writer.stage(request_ref.clone(), document).await;

            let offers_collection = request_ref.collection(TUTOR_OFFERS_COLLECTION);
            for (offer, offer_id) in index.offers_for(request_id).iter().zip(offer_ids) {
                writer
                    .stage(offers_collection.doc(offer_id.as_str()), map_offer(offer)?)
                    .await;
                offers_staged += 1;
            }

            let processed = position + 1;
            if processed % self.config.progress_interval == 0 {
                info!("Progress: {}/{} requests...", processed, total);
            }
        }

        let report = writer.finish().await;

        // Step 4: Report statistics
        let summary = MigrationSummary {
            requests: total,
            offers: offers_staged,
            orphaned_offers,
            stats: report.stats,
            failed_documents: report.failed_documents,
            elapsed: start_time.elapsed(),
        };

        info!("=== Migration Complete ===");
        info!("Total time: {:.2}s", summary.elapsed.as_secs_f64());
        info!("Requests: {}", summary.requests);
        info!("Tutor offers: {}", summary.offers);
        info!(
            "Operations committed: {} in {} batches",
            summary.stats.committed, summary.stats.batches_committed
        );
        if !summary.is_complete() {
            warn!(
                failed_operations = summary.stats.failed,
                failed_batches = summary.stats.batches_failed,
                "Some batches could not be committed"
            );
        }

        Ok(summary)
    }
}
