use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use briefwire_analysis::InsightSynthesizer;
use briefwire_common::{BriefwireError, NewArticle};
use briefwire_store::ArticleStore;

use crate::fetcher::ContentFetcher;

/// Counters from one scrape run.
#[derive(Debug, Default)]
pub struct ScrapeStats {
    pub source_name: String,
    pub new_items: u32,
    pub reused_items: u32,
    pub skipped_no_url: u32,
    pub projects_notified: u32,
}

impl std::fmt::Display for ScrapeStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} new, {} reused, {} skipped (no url), {} projects notified",
            self.source_name,
            self.new_items,
            self.reused_items,
            self.skipped_no_url,
            self.projects_notified
        )
    }
}

/// Scrapes one source into the global corpus: deduplicates articles by
/// locator, links every article to every subscribed project exactly once,
/// and kicks off insight synthesis for the affected projects without
/// blocking the caller.
pub struct Ingestor {
    store: Arc<dyn ArticleStore>,
    fetcher: Arc<dyn ContentFetcher>,
    synthesizer: Arc<InsightSynthesizer>,
}

impl Ingestor {
    pub fn new(
        store: Arc<dyn ArticleStore>,
        fetcher: Arc<dyn ContentFetcher>,
        synthesizer: Arc<InsightSynthesizer>,
    ) -> Self {
        Self {
            store,
            fetcher,
            synthesizer,
        }
    }

    pub async fn scrape_source(&self, source_id: Uuid) -> anyhow::Result<ScrapeStats> {
        let source = self
            .store
            .get_source(source_id)
            .await?
            .ok_or_else(|| BriefwireError::NotFound(format!("source {source_id}")))?;

        // One subscriber resolution per run; every entry fans out to these.
        let projects = self.store.projects_for_source(source_id).await?;

        let entries = self.fetcher.feed(&source.feed_url).await;

        let mut stats = ScrapeStats {
            source_name: source.name.clone(),
            ..Default::default()
        };

        for entry in entries {
            if entry.url.trim().is_empty() {
                stats.skipped_no_url += 1;
                continue;
            }

            match self.store.find_article_by_url(&entry.url).await? {
                Some(existing) => {
                    stats.reused_items += 1;
                    for project in &projects {
                        self.store.link_article(project.id, existing.id).await?;
                    }
                }
                None => {
                    let body = self.fetcher.article_text(&entry.url).await;
                    let article = self
                        .store
                        .insert_article(&NewArticle {
                            source_id,
                            raw_title: entry.title,
                            raw_text: body,
                            url: entry.url,
                            published_at: entry.published_at,
                        })
                        .await?;
                    stats.new_items += 1;
                    for project in &projects {
                        self.store.link_article(project.id, article.id).await?;
                    }
                }
            }
        }

        // New evidence invalidates prior insight snapshots. Synthesis runs
        // detached so it never blocks the scrape response, and one
        // project's failure never reaches its siblings.
        if stats.new_items + stats.reused_items > 0 {
            for project in &projects {
                let synthesizer = self.synthesizer.clone();
                let project_id = project.id;
                let project_title = project.title.clone();
                tokio::spawn(async move {
                    if let Err(e) = synthesizer.synthesize_project(project_id).await {
                        warn!(
                            %project_id,
                            project = %project_title,
                            error = %e,
                            "Post-scrape insight synthesis failed"
                        );
                    }
                });
            }
            stats.projects_notified = projects.len() as u32;
        }

        info!(
            source = %stats.source_name,
            new_items = stats.new_items,
            reused_items = stats.reused_items,
            skipped = stats.skipped_no_url,
            "Scrape run complete"
        );

        Ok(stats)
    }
}
