// Batch coordination: per-batch progress, failure counting, isolation
// between concurrent batches.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use briefwire_analysis::testing::{FixedEmbedder, MemoryStore, StubChat};
use briefwire_analysis::{AnalysisPipeline, BatchCoordinator};
use briefwire_common::{BatchProgress, RelevancePolicy};
use briefwire_store::ArticleStore;

async fn wait_until_done(coordinator: &BatchCoordinator, batch_id: Uuid) -> BatchProgress {
    for _ in 0..500 {
        if let Some(progress) = coordinator.progress(batch_id) {
            if !progress.running {
                return progress;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("batch {batch_id} did not complete in time");
}

/// Store with one project and `n` linked articles; every LLM call is
/// served a default that drives the pipeline through its fail-open paths.
async fn seeded(n: usize) -> (Arc<MemoryStore>, Vec<Uuid>) {
    let store = Arc::new(MemoryStore::new());
    let source = store.add_source("Wire", "https://wire.example.com/rss");
    let project = store.add_project("Influence watch", "policy influence coverage media");

    let mut ids = Vec::new();
    for i in 0..n {
        let article = store.add_article(
            source.id,
            "Policy influence coverage",
            "Report about policy influence coverage reaching media audiences",
            &format!("https://wire.example.com/batch-{i}"),
        );
        store.link_article(project.id, article.id).await.unwrap();
        ids.push(article.id);
    }
    (store, ids)
}

fn coordinator(store: Arc<MemoryStore>, concurrency: usize) -> BatchCoordinator {
    let pipeline = Arc::new(AnalysisPipeline::new(
        store,
        Arc::new(StubChat::new().with_default("{}")),
        Arc::new(FixedEmbedder::new()),
        0.38,
        RelevancePolicy::Adjudicated,
    ));
    BatchCoordinator::new(pipeline, concurrency)
}

#[tokio::test]
async fn clean_batch_reaches_done_equals_total() {
    let (store, ids) = seeded(3).await;
    let coordinator = coordinator(store, 1);

    let batch_id = coordinator.start(ids);

    let started = coordinator.progress(batch_id).expect("progress registered");
    assert_eq!(started.total, 3);

    let finished = wait_until_done(&coordinator, batch_id).await;
    assert_eq!(finished.done, finished.total);
    assert!(!finished.running);
}

#[tokio::test]
async fn per_item_failures_still_count_toward_done() {
    let (store, mut ids) = seeded(2).await;
    // An id with no article behind it fails with not-found mid-batch.
    ids.insert(1, Uuid::new_v4());
    let coordinator = coordinator(store, 1);

    let batch_id = coordinator.start(ids);
    let finished = wait_until_done(&coordinator, batch_id).await;

    assert_eq!(finished.total, 3);
    assert_eq!(finished.done, 3, "failures count as completed-with-error");
}

#[tokio::test]
async fn concurrent_batches_keep_isolated_counters() {
    let (store, ids) = seeded(3).await;
    let coordinator = coordinator(store, 1);

    let first = coordinator.start(ids[..2].to_vec());
    let second = coordinator.start(ids[2..].to_vec());

    let first_done = wait_until_done(&coordinator, first).await;
    let second_done = wait_until_done(&coordinator, second).await;

    assert_eq!(first_done.total, 2);
    assert_eq!(first_done.done, 2);
    assert_eq!(second_done.total, 1);
    assert_eq!(second_done.done, 1);
}

#[tokio::test]
async fn unknown_batch_has_no_progress() {
    let (store, _) = seeded(0).await;
    let coordinator = coordinator(store, 1);

    assert!(coordinator.progress(Uuid::new_v4()).is_none());
}

#[tokio::test]
async fn empty_batch_completes_immediately() {
    let (store, _) = seeded(0).await;
    let coordinator = coordinator(store, 4);

    let batch_id = coordinator.start(Vec::new());
    let finished = wait_until_done(&coordinator, batch_id).await;

    assert_eq!(finished.total, 0);
    assert_eq!(finished.done, 0);
}
