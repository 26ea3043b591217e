use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{
    BlacklistEntryId, CampaignId, CommunityProfileId, DraftId, Owner, RawPostId, ShadowEntryId,
    UsageRecordId,
};

/// Closed variant for narrative style (glossary: Archetype). Modeled as a
/// tagged enum, not a subtype hierarchy, so C7/C8 select behavior by matching
/// on the tag rather than dynamic dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    Journey,
    ProblemSolution,
    Feedback,
    Unclassified,
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Journey => "journey",
            Self::ProblemSolution => "problem_solution",
            Self::Feedback => "feedback",
            Self::Unclassified => "unclassified",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Active,
    Paused,
    Archived,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub owner: Owner,
    pub name: String,
    pub product_context: String,
    pub product_url: Option<String>,
    pub keywords: Vec<String>,
    pub target_subreddits: Vec<String>,
    pub status: CampaignStatus,
}

/// Input used to create a [`Campaign`]; validated against §7 `ValidationError`
/// (keywords out of `[5, 15]`, empty `target_subreddits`) before a `Campaign`
/// is constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignSpec {
    pub name: String,
    pub product_context: String,
    pub product_url: Option<String>,
    pub keywords: Vec<String>,
    pub target_subreddits: Vec<String>,
}

/// A post record as returned by the external scraper collaborator (§6), before
/// C2 scoring or C1 classification. Never persisted directly; C3 turns a
/// surviving, scored, and possibly-classified `ScrapedPost` into a `RawPost`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedPost {
    pub source_post_id: String,
    pub title: String,
    pub body: String,
    pub url: String,
    pub author: String,
    pub author_karma: i64,
    pub score: i64,
    pub upvote_ratio: f64,
    pub comment_count: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPost {
    pub id: RawPostId,
    pub campaign_id: CampaignId,
    pub owner: Owner,
    pub subreddit: String,
    pub source_post_id: String,
    pub source_url: String,
    pub author: String,
    pub author_karma: i64,
    pub title: String,
    pub raw_text: String,
    pub comment_count: u32,
    pub upvote_ratio: f64,
    pub archetype: Archetype,
    pub success_score: f64,
    pub is_ai_processed: bool,
    pub rhythm_metadata: HashMap<String, f64>,
    pub source_created_at: DateTime<Utc>,
    pub collected_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IscTier {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl IscTier {
    #[must_use]
    pub fn for_score(score: f64) -> Self {
        if score < 4.0 {
            Self::Low
        } else if score < 6.5 {
            Self::Moderate
        } else if score < 8.5 {
            Self::High
        } else {
            Self::VeryHigh
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityProfile {
    pub id: CommunityProfileId,
    pub campaign_id: CampaignId,
    pub subreddit: String,
    pub isc_score: f64,
    pub avg_sentence_length: f64,
    pub dominant_tone: String,
    pub formality_level: f64,
    pub top_success_hooks: Vec<String>,
    pub forbidden_patterns: HashMap<BlacklistCategory, u32>,
    pub archetype_distribution: HashMap<Archetype, u32>,
    pub style_metrics: HashMap<String, f64>,
    pub style_guide: String,
    pub sample_size: usize,
    pub last_analyzed_at: DateTime<Utc>,
}

impl CommunityProfile {
    /// §3: "Requires `sample_size ≥ 10` to be considered valid".
    pub const MIN_SAMPLE_SIZE: usize = 10;

    #[must_use]
    pub fn isc_tier(&self) -> IscTier {
        IscTier::for_score(self.isc_score)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    Generated,
    Edited,
    Approved,
    Posted,
    Discarded,
}

impl DraftStatus {
    /// §5: draft status transitions are monotonic through
    /// `generated → edited? → approved? → posted | discarded`, never backward.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        use DraftStatus::{Approved, Discarded, Edited, Generated, Posted};
        if self == next {
            return true;
        }
        matches!(
            (self, next),
            (Generated, Edited)
                | (Generated, Approved)
                | (Generated, Posted)
                | (Generated, Discarded)
                | (Edited, Approved)
                | (Edited, Posted)
                | (Edited, Discarded)
                | (Approved, Posted)
                | (Approved, Discarded)
        )
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Posted | Self::Discarded)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedDraft {
    pub id: DraftId,
    pub campaign_id: CampaignId,
    pub owner: Owner,
    pub subreddit: String,
    pub archetype: Archetype,
    pub title: String,
    pub body: String,
    pub vulnerability_score: f64,
    pub rhythm_match_score: f64,
    pub blacklist_violations: u32,
    pub model_used: String,
    pub token_count: u64,
    pub token_cost: f64,
    pub status: DraftStatus,
    pub user_edits: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    New,
    WarmingUp,
    Established,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowStatus {
    Active,
    Removed,
    NotFound,
    Shadowbanned,
    Audited,
}

impl ShadowStatus {
    /// §4.11 state machine: every non-`Active` status is terminal.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        if self == next {
            return true;
        }
        self == Self::Active && next != Self::Active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditResult {
    SocialSuccess,
    Rejection,
    Inertia,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShadowEntry {
    pub id: ShadowEntryId,
    pub draft_id: Option<DraftId>,
    pub campaign_id: CampaignId,
    pub owner: Owner,
    pub post_url: String,
    pub subreddit: String,
    pub status: ShadowStatus,
    pub isc_at_post: f64,
    pub account_status: AccountStatus,
    pub check_interval_hours: u32,
    pub total_checks: u32,
    pub last_check_status: Option<ShadowStatus>,
    pub last_check_at: Option<DateTime<Utc>>,
    pub audit_result: Option<AuditResult>,
    pub audit_completed_at: Option<DateTime<Utc>>,
    pub submitted_at: DateTime<Utc>,
    pub audit_due_at: DateTime<Utc>,
    /// Running count of consecutive checks where the authenticated view saw
    /// the post and the anonymous view did not; reset whenever a check
    /// doesn't reproduce that pattern. Drives the "for two consecutive
    /// checks" shadowban rule in §4.11.
    pub consecutive_anonymous_misses: u32,
}

impl ShadowEntry {
    pub const AUDIT_BOUNDARY: Duration = Duration::days(7);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlacklistCategory {
    Promotional,
    SelfReferential,
    Link,
    LowEffort,
    Spam,
    OffTopic,
}

impl fmt::Display for BlacklistCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Promotional => "promotional",
            Self::SelfReferential => "self_referential",
            Self::Link => "link",
            Self::LowEffort => "low_effort",
            Self::Spam => "spam",
            Self::OffTopic => "off_topic",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlacklistFailureType {
    AdminRemoval,
    SocialRejection,
    Shadowban,
    Inertia,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlacklistEntry {
    pub id: BlacklistEntryId,
    pub subreddit: Option<String>,
    pub campaign_id: Option<CampaignId>,
    pub forbidden_pattern: String,
    pub category: BlacklistCategory,
    pub failure_type: Option<BlacklistFailureType>,
    pub source_shadow_id: Option<ShadowEntryId>,
    pub confidence: f64,
    pub is_global: bool,
    pub is_system_detected: bool,
    pub added_at: DateTime<Utc>,
}

impl BlacklistEntry {
    /// §3 uniqueness invariant key: `(COALESCE(subreddit, "*"), forbidden_pattern)`.
    #[must_use]
    pub fn conflict_key(subreddit: Option<&str>, forbidden_pattern: &str) -> String {
        format!("{}\u{0}{}", subreddit.unwrap_or("*"), forbidden_pattern)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageAction {
    Collect,
    Analyze,
    Generate,
    MonitorRegister,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    pub id: UsageRecordId,
    pub owner: Owner,
    pub action: UsageAction,
    pub campaign_id: Option<CampaignId>,
    pub token_count: u64,
    pub cost: f64,
    pub occurred_at: DateTime<Utc>,
}

/// Task type closed set consumed by the inference client (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    ClassifyArchetype,
    ExtractPatterns,
    ScorePost,
    GenerateDraft,
    StyleGuide,
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ClassifyArchetype => "classify_archetype",
            Self::ExtractPatterns => "extract_patterns",
            Self::ScorePost => "score_post",
            Self::GenerateDraft => "generate_draft",
            Self::StyleGuide => "style_guide",
        };
        f.write_str(s)
    }
}

/// Named task state (§4.13).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskState {
    Pending,
    Progress,
    Success,
    Failure,
}
