use std::time::Duration;

use anyhow::{Context, Result};
use scraper::{Html, Selector};
use tracing::warn;

/// Fetches article pages and extracts their main body text.
///
/// Best-effort by contract: any fetch or parse failure degrades to an
/// empty body (the article is still ingested; title-only fallback happens
/// downstream).
pub struct PageFetcher {
    client: reqwest::Client,
}

impl PageFetcher {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build page HTTP client");
        Self { client }
    }

    pub async fn article_text(&self, url: &str) -> String {
        match self.try_fetch(url).await {
            Ok(text) => text,
            Err(e) => {
                warn!(url, error = %e, "Article fetch failed");
                String::new()
            }
        }
    }

    async fn try_fetch(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .header("User-Agent", "briefwire/0.1")
            .send()
            .await
            .context("Article request failed")?;

        let html = resp.text().await.context("Failed to read article body")?;
        Ok(extract_paragraph_text(&html))
    }
}

/// Join paragraph text from a page: the semantic `<article>` container's
/// paragraphs when one exists, otherwise every paragraph on the page.
pub fn extract_paragraph_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let article_p = Selector::parse("article p").expect("valid selector");
    let any_p = Selector::parse("p").expect("valid selector");

    let mut paragraphs: Vec<String> = document
        .select(&article_p)
        .map(paragraph_text)
        .filter(|p| !p.is_empty())
        .collect();

    if paragraphs.is_empty() {
        paragraphs = document
            .select(&any_p)
            .map(paragraph_text)
            .filter(|p| !p.is_empty())
            .collect();
    }

    paragraphs.join(" ")
}

fn paragraph_text(element: scraper::ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_article_container() {
        let html = r#"
            <html><body>
            <nav><p>Menu item</p></nav>
            <article><p>First  para.</p><p>Second para.</p></article>
            </body></html>
        "#;
        assert_eq!(extract_paragraph_text(html), "First para. Second para.");
    }

    #[test]
    fn falls_back_to_all_paragraphs() {
        let html = "<html><body><div><p>Only</p><p>paragraphs</p></div></body></html>";
        assert_eq!(extract_paragraph_text(html), "Only paragraphs");
    }

    #[test]
    fn empty_page_yields_empty_text() {
        assert_eq!(extract_paragraph_text("<html><body></body></html>"), "");
    }
}
