use async_trait::async_trait;
use conditioner_shadow::{HttpCheckResult, PostStats, PostStatsFetcher, PostVisibilityChecker};
use conditioner_types::Result;

/// Returns the same authenticated/anonymous pair for every post, regardless
/// of `post_url` — enough to exercise C11's classification rules without a
/// real dual-perspective HTTP check.
pub struct FakePostVisibilityChecker {
    pub authenticated: HttpCheckResult,
    pub anonymous: HttpCheckResult,
}

#[async_trait]
impl PostVisibilityChecker for FakePostVisibilityChecker {
    async fn check_authenticated(&self, _post_url: &str) -> Result<HttpCheckResult> {
        Ok(self.authenticated)
    }

    async fn check_anonymous(&self, _post_url: &str) -> Result<HttpCheckResult> {
        Ok(self.anonymous)
    }
}

/// Returns the same engagement stats for every post.
pub struct FakePostStatsFetcher(pub PostStats);

#[async_trait]
impl PostStatsFetcher for FakePostStatsFetcher {
    async fn fetch_stats(&self, _post_url: &str) -> Result<PostStats> {
        Ok(self.0)
    }
}
