// ContentFetcher: all feed and page fetching behind one trait, so the
// ingestor tests run with a HashMap-backed mock. No network.

use std::time::Duration;

use async_trait::async_trait;

use crate::feed::{FeedEntry, FeedFetcher};
use crate::page::PageFetcher;

#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Parse a feed into candidate entries. Empty on feed-level failure.
    async fn feed(&self, feed_url: &str) -> Vec<FeedEntry>;

    /// Best-effort article body text. Empty on failure.
    async fn article_text(&self, url: &str) -> String;
}

/// Production fetcher: HTTP feed parsing + HTTP page extraction.
pub struct HttpFetcher {
    feeds: FeedFetcher,
    pages: PageFetcher,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            feeds: FeedFetcher::new(timeout),
            pages: PageFetcher::new(timeout),
        }
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn feed(&self, feed_url: &str) -> Vec<FeedEntry> {
        self.feeds.fetch(feed_url).await
    }

    async fn article_text(&self, url: &str) -> String {
        self.pages.article_text(url).await
    }
}
