use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ai_client::OpenAi;
use briefwire_analysis::{AnalysisPipeline, BatchCoordinator};
use briefwire_common::Config;
use briefwire_store::{ArticleStore, PgStore};

/// Bulk (re)processing runner: queues every `raw` article into one batch
/// and follows its progress to completion.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("briefwire=info".parse()?))
        .init();

    info!("Briefwire batch runner starting...");

    let config = Config::from_env();

    let pg = PgStore::connect(&config.database_url).await?;
    pg.migrate().await?;
    let store: Arc<dyn ArticleStore> = Arc::new(pg);

    let chat = Arc::new(
        OpenAi::new(&config.llm_api_key, &config.llm_model)
            .with_base_url(&config.llm_base_url)
            .with_timeout(Duration::from_secs(config.llm_timeout_secs)),
    );
    let embedder = Arc::new(
        OpenAi::new(&config.embedding_api_key, &config.embedding_model)
            .with_base_url(&config.embedding_base_url)
            .with_embedding_model(&config.embedding_model)
            .with_timeout(Duration::from_secs(config.llm_timeout_secs)),
    );

    let pipeline = Arc::new(AnalysisPipeline::new(
        store.clone(),
        chat,
        embedder,
        config.relevance_threshold,
        config.relevance_policy,
    ));
    let coordinator = BatchCoordinator::new(pipeline, config.batch_concurrency);

    let ids = store.raw_article_ids().await?;
    if ids.is_empty() {
        info!("No raw articles to process");
        return Ok(());
    }

    let batch_id = coordinator.start(ids);

    loop {
        tokio::time::sleep(Duration::from_secs(2)).await;
        let Some(progress) = coordinator.progress(batch_id) else {
            break;
        };
        info!(
            done = progress.done,
            total = progress.total,
            "Batch progress"
        );
        if !progress.running {
            break;
        }
    }

    info!("Batch run complete");
    Ok(())
}
