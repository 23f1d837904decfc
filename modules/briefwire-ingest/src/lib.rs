//! Feed ingestion: fetch syndicated feeds, extract article bodies, and
//! fan deduplicated articles out to every subscribed project.

pub mod feed;
pub mod fetcher;
pub mod ingestor;
pub mod page;

pub use feed::{FeedEntry, FeedFetcher};
pub use fetcher::{ContentFetcher, HttpFetcher};
pub use ingestor::{Ingestor, ScrapeStats};
pub use page::PageFetcher;
