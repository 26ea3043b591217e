use std::collections::HashMap;

use async_trait::async_trait;
use conditioner_collection::PostScraper;
use conditioner_types::{ConditionerError, Result, ScrapedPost};
use parking_lot::Mutex;

/// Serves a fixed set of posts per subreddit, optionally failing the first
/// `N` calls for a given subreddit before succeeding — enough to exercise
/// C3's retry-then-recover and permanent-failure-isolation paths without a
/// real scraper.
pub struct FakePostScraper {
    posts_by_subreddit: HashMap<String, Vec<ScrapedPost>>,
    fail_remaining: Mutex<HashMap<String, u32>>,
}

impl FakePostScraper {
    #[must_use]
    pub fn new(posts_by_subreddit: HashMap<String, Vec<ScrapedPost>>) -> Self {
        Self { posts_by_subreddit, fail_remaining: Mutex::new(HashMap::new()) }
    }

    #[must_use]
    pub fn failing_first(mut self, subreddit: impl Into<String>, times: u32) -> Self {
        self.fail_remaining.get_mut().insert(subreddit.into(), times);
        self
    }
}

#[async_trait]
impl PostScraper for FakePostScraper {
    async fn scrape(&self, subreddit: &str) -> Result<Vec<ScrapedPost>> {
        let mut fail_remaining = self.fail_remaining.lock();
        let remaining = fail_remaining.entry(subreddit.to_string()).or_insert(0);
        if *remaining > 0 {
            *remaining -= 1;
            return Err(ConditionerError::ScraperFailure {
                subreddit: subreddit.to_string(),
                reason: "fake scraper scripted failure".to_string(),
            });
        }
        Ok(self.posts_by_subreddit.get(subreddit).cloned().unwrap_or_default())
    }
}
