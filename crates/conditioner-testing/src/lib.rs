//! Shared test doubles, mirroring `dashflow-testing`'s `MockChatModel`/
//! `MockTool` pattern: scriptable fakes for every external collaborator
//! (§6) any crate's tests can reuse instead of rolling their own, plus
//! fixture builders for the entities tests construct over and over.

mod fixtures;
mod gateway;
mod scraper;
mod shadow;

pub use fixtures::sample_campaign_spec;
pub use gateway::FakeLlmGateway;
pub use scraper::FakePostScraper;
pub use shadow::{FakePostStatsFetcher, FakePostVisibilityChecker};
