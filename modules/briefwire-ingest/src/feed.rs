use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

/// One candidate entry parsed from a feed. `url` may be empty when the
/// feed carried no usable link; the ingestor skips those.
#[derive(Debug, Clone)]
pub struct FeedEntry {
    pub title: String,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// Fetches and parses RSS/Atom feeds into candidate entries.
///
/// Malformed or temporarily unreachable feeds are expected, so a feed-level
/// failure yields an empty result set rather than an error.
pub struct FeedFetcher {
    client: reqwest::Client,
}

impl FeedFetcher {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build feed HTTP client");
        Self { client }
    }

    pub async fn fetch(&self, feed_url: &str) -> Vec<FeedEntry> {
        match self.try_fetch(feed_url).await {
            Ok(entries) => {
                info!(feed_url, entries = entries.len(), "Feed parsed");
                entries
            }
            Err(e) => {
                warn!(feed_url, error = %e, "Failed to fetch feed");
                Vec::new()
            }
        }
    }

    async fn try_fetch(&self, feed_url: &str) -> Result<Vec<FeedEntry>> {
        let resp = self
            .client
            .get(feed_url)
            .header("User-Agent", "briefwire/0.1")
            .send()
            .await
            .context("Feed fetch failed")?;

        let bytes = resp.bytes().await.context("Failed to read feed body")?;
        let feed = feed_rs::parser::parse(&bytes[..]).context("Failed to parse RSS/Atom feed")?;

        Ok(feed
            .entries
            .into_iter()
            .map(|entry| {
                let url = entry
                    .links
                    .first()
                    .map(|l| l.href.clone())
                    .or_else(|| entry.id.starts_with("http").then(|| entry.id.clone()))
                    .unwrap_or_default();

                FeedEntry {
                    title: entry.title.map(|t| t.content).unwrap_or_default(),
                    url,
                    published_at: entry
                        .published
                        .or(entry.updated)
                        .map(|dt| dt.with_timezone(&Utc)),
                }
            })
            .collect())
    }
}
