use async_trait::async_trait;
use conditioner_types::Result;

/// Outcome of a single-perspective visibility probe (§4.11).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpCheckResult {
    Visible,
    NotFound,
    RemovedByModerator,
}

/// The external "dual-perspective HTTP check" collaborator: one request as
/// the authenticated post author, one anonymous request from a different
/// network identity. Real transports hit Reddit; tests use a fake. An `Err`
/// is a transient transport error — the caller does not transition state on
/// it and does not count it as a check.
#[async_trait]
pub trait PostVisibilityChecker: Send + Sync {
    async fn check_authenticated(&self, post_url: &str) -> Result<HttpCheckResult>;
    async fn check_anonymous(&self, post_url: &str) -> Result<HttpCheckResult>;
}
