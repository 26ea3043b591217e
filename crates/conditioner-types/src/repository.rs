use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{
    BlacklistEntry, Campaign, CampaignStatus, CommunityProfile, DraftStatus, GeneratedDraft,
    RawPost, ShadowEntry, UsageRecord,
};
use crate::error::Result;
use crate::ids::{CampaignId, DraftId, Owner, ShadowEntryId};

/// §3 ownership: every repository method that reads or writes a single row
/// takes the caller's `Owner` and must not return or mutate a row belonging
/// to a different owner (surfaced as `NotFound`, never leaked).
#[async_trait]
pub trait CampaignRepository: Send + Sync {
    async fn insert(&self, campaign: Campaign) -> Result<Campaign>;
    async fn get(&self, owner: Owner, id: CampaignId) -> Result<Campaign>;
    async fn set_status(&self, owner: Owner, id: CampaignId, status: CampaignStatus) -> Result<Campaign>;
    /// Cascade-deletes the campaign's RawPosts, Drafts, and ShadowEntries (§3).
    async fn delete(&self, owner: Owner, id: CampaignId) -> Result<()>;
}

#[async_trait]
pub trait RawPostRepository: Send + Sync {
    /// Upsert on the `(campaign_id, source_post_id)` key (§3); returns `true`
    /// if a new row was inserted, `false` if an existing row was ignored
    /// (duplicate-ignore semantics per §4.3 step 5).
    async fn upsert(&self, post: RawPost) -> Result<bool>;
    async fn list_by_subreddit(&self, campaign_id: CampaignId, subreddit: &str) -> Result<Vec<RawPost>>;
    /// Number of raw posts per subreddit for a campaign, used by C4 to decide
    /// which subreddits meet `sample_size >= 10`.
    async fn counts_by_subreddit(&self, campaign_id: CampaignId) -> Result<HashMap<String, usize>>;
    async fn delete_by_campaign(&self, campaign_id: CampaignId) -> Result<()>;
}

#[async_trait]
pub trait CommunityProfileRepository: Send + Sync {
    /// Upsert keyed on `(campaign_id, subreddit)` (§3); mutates only under a
    /// full recompute.
    async fn upsert(&self, profile: CommunityProfile) -> Result<CommunityProfile>;
    async fn get(&self, campaign_id: CampaignId, subreddit: &str) -> Result<Option<CommunityProfile>>;
    async fn list_by_campaign(&self, campaign_id: CampaignId) -> Result<Vec<CommunityProfile>>;
}

#[async_trait]
pub trait DraftRepository: Send + Sync {
    async fn insert(&self, draft: GeneratedDraft) -> Result<GeneratedDraft>;
    async fn get(&self, owner: Owner, id: DraftId) -> Result<GeneratedDraft>;
    /// Enforces §3's monotonic status lifecycle and that the body is mutable
    /// only while `status ∈ {generated, edited}`.
    async fn update_status(
        &self,
        owner: Owner,
        id: DraftId,
        status: DraftStatus,
        user_edits: Option<String>,
    ) -> Result<GeneratedDraft>;
    async fn delete_by_campaign(&self, campaign_id: CampaignId) -> Result<()>;
}

#[async_trait]
pub trait ShadowEntryRepository: Send + Sync {
    /// Unique on `post_url` (§3, §5).
    async fn insert(&self, entry: ShadowEntry) -> Result<ShadowEntry>;
    async fn get(&self, id: ShadowEntryId) -> Result<ShadowEntry>;
    /// Replaces the stored row. Implementations must reject any update once
    /// `audit_completed_at` is set (§3 ShadowEntry lifecycle: "after
    /// `audit_completed_at` the entry is immutable").
    async fn update(&self, entry: ShadowEntry) -> Result<ShadowEntry>;
    /// Entries with `status = Active` and `last_check_at + check_interval_hours <= now`.
    async fn due_for_check(&self, now: DateTime<Utc>) -> Result<Vec<ShadowEntry>>;
    /// Entries with `audit_due_at <= now` and `audit_result` unset.
    async fn due_for_audit(&self, now: DateTime<Utc>) -> Result<Vec<ShadowEntry>>;
    async fn delete_by_campaign(&self, campaign_id: CampaignId) -> Result<()>;
}

#[async_trait]
pub trait BlacklistRepository: Send + Sync {
    /// Idempotent via `(COALESCE(subreddit,"*"), forbidden_pattern)`;
    /// conflicting insert raises `AlreadyExists` (§4.5).
    async fn insert(&self, entry: BlacklistEntry) -> Result<BlacklistEntry>;
    /// Raises `confidence` on an existing entry, capped at `1.0` (§4.12).
    async fn bump_confidence(
        &self,
        subreddit: Option<&str>,
        forbidden_pattern: &str,
        delta: f64,
    ) -> Result<BlacklistEntry>;
    /// Union of global, subreddit-scoped, and campaign-scoped
    /// (`is_system_detected = false`) entries (§4.5).
    async fn load_for(&self, subreddit: &str, campaign_id: Option<CampaignId>) -> Result<Vec<BlacklistEntry>>;
}

#[async_trait]
pub trait UsageRepository: Send + Sync {
    async fn append(&self, record: UsageRecord) -> Result<UsageRecord>;
    async fn sum_cost_in_period(
        &self,
        owner: Owner,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> Result<f64>;
}
