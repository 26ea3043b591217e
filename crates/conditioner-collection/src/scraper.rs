use async_trait::async_trait;
use conditioner_types::{Result, ScrapedPost};

/// The external scraper collaborator (§6): fetches recent posts from a
/// subreddit. Real transports hit Reddit's API; tests use a fake. Any `Err`
/// is treated as a transport failure and retried by the orchestrator.
#[async_trait]
pub trait PostScraper: Send + Sync {
    async fn scrape(&self, subreddit: &str) -> Result<Vec<ScrapedPost>>;
}
