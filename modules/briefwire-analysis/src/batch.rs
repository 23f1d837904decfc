use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::stream::{self, StreamExt};
use tracing::{info, warn};
use uuid::Uuid;

use briefwire_common::BatchProgress;

use crate::pipeline::AnalysisPipeline;

/// Runs classification + extraction over a set of article ids on a
/// background task and tracks progress per batch.
///
/// Each batch owns its progress record, keyed by a generated batch id:
/// concurrent batches cannot corrupt each other's counters, and callers
/// look progress up by id. A per-item failure is logged and counted as
/// done; it never stalls or aborts the batch. A started batch runs to
/// completion; there is no cancellation.
#[derive(Clone)]
pub struct BatchCoordinator {
    pipeline: Arc<AnalysisPipeline>,
    concurrency: usize,
    registry: Arc<Mutex<HashMap<Uuid, BatchProgress>>>,
}

impl BatchCoordinator {
    pub fn new(pipeline: Arc<AnalysisPipeline>, concurrency: usize) -> Self {
        Self {
            pipeline,
            concurrency: concurrency.max(1),
            registry: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Queue a batch and return immediately with its id. Items are
    /// processed in the order supplied, at most `concurrency` in flight.
    pub fn start(&self, article_ids: Vec<Uuid>) -> Uuid {
        let batch_id = Uuid::new_v4();
        let total = article_ids.len();

        self.registry.lock().expect("batch registry poisoned").insert(
            batch_id,
            BatchProgress {
                total,
                done: 0,
                running: true,
            },
        );

        info!(%batch_id, total, "Batch queued");

        let coordinator = self.clone();
        tokio::spawn(async move {
            coordinator.drain(batch_id, article_ids).await;
        });

        batch_id
    }

    /// Current progress of a batch, if it is known to this process.
    pub fn progress(&self, batch_id: Uuid) -> Option<BatchProgress> {
        self.registry
            .lock()
            .expect("batch registry poisoned")
            .get(&batch_id)
            .copied()
    }

    async fn drain(&self, batch_id: Uuid, article_ids: Vec<Uuid>) {
        stream::iter(article_ids)
            .for_each_concurrent(self.concurrency, |article_id| {
                let pipeline = self.pipeline.clone();
                async move {
                    if let Err(e) = pipeline.process_article(article_id).await {
                        warn!(%batch_id, %article_id, error = %e, "Batch item failed");
                    }
                    self.bump(batch_id);
                }
            })
            .await;

        let mut registry = self.registry.lock().expect("batch registry poisoned");
        if let Some(progress) = registry.get_mut(&batch_id) {
            progress.running = false;
        }
        info!(%batch_id, "Batch complete");
    }

    fn bump(&self, batch_id: Uuid) {
        let mut registry = self.registry.lock().expect("batch registry poisoned");
        if let Some(progress) = registry.get_mut(&batch_id) {
            progress.done += 1;
        }
    }
}
