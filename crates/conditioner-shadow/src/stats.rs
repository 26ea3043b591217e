use async_trait::async_trait;
use conditioner_types::Result;

/// A post's current engagement stats, as needed by the audit engine (§4.12)
/// to classify `SocialSuccess`/`Rejection`/`Inertia`. `ShadowEntry` itself
/// carries no engagement fields (§3), so this is fetched fresh at audit time
/// from the same external surface the scraper reads from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostStats {
    pub upvote_ratio: f64,
    pub comment_count: u32,
}

#[async_trait]
pub trait PostStatsFetcher: Send + Sync {
    async fn fetch_stats(&self, post_url: &str) -> Result<PostStats>;
}
