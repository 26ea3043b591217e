//! Blacklist store facade (§4.5): the exact column projection the prompt
//! builder is allowed to see, plus the idempotent mining path C12 and C11
//! use to record forbidden-pattern candidates discovered from failures.

use conditioner_types::{
    BlacklistCategory, BlacklistEntry, BlacklistEntryId, BlacklistFailureType, BlacklistRepository, CampaignId,
    ConditionerError, Result, ShadowEntryId,
};

/// Column set the prompt builder is allowed to see (§4.5: "adapters must
/// not rename these").
#[derive(Debug, Clone, PartialEq)]
pub struct PromptBlacklistEntry {
    pub forbidden_pattern: String,
    pub category: BlacklistCategory,
    pub failure_type: Option<BlacklistFailureType>,
    pub confidence: f64,
}

impl From<BlacklistEntry> for PromptBlacklistEntry {
    fn from(entry: BlacklistEntry) -> Self {
        Self {
            forbidden_pattern: entry.forbidden_pattern,
            category: entry.category,
            failure_type: entry.failure_type,
            confidence: entry.confidence,
        }
    }
}

/// §4.5 contract: union of global, subreddit-scoped, and campaign-scoped
/// (non-system-detected) entries, projected to the prompt-safe columns.
pub async fn load_for(
    repo: &(impl BlacklistRepository + ?Sized),
    subreddit: &str,
    campaign_id: Option<CampaignId>,
) -> Result<Vec<PromptBlacklistEntry>> {
    let entries = repo.load_for(subreddit, campaign_id).await?;
    Ok(entries.into_iter().map(PromptBlacklistEntry::from).collect())
}

/// A forbidden-pattern candidate mined from an audit failure or a
/// shadowban, ready for §4.12's idempotent insert.
#[derive(Debug, Clone)]
pub struct MinedPattern {
    pub subreddit: Option<String>,
    pub campaign_id: Option<CampaignId>,
    pub forbidden_pattern: String,
    pub category: BlacklistCategory,
    pub failure_type: BlacklistFailureType,
    pub source_shadow_id: ShadowEntryId,
}

/// §4.12 contract: insert a system-detected candidate at `confidence=0.5`;
/// a duplicate conflict is treated as idempotent success and instead raises
/// the existing entry's confidence by `0.1`, capped at `1.0`.
pub async fn mine(repo: &(impl BlacklistRepository + ?Sized), candidate: MinedPattern) -> Result<BlacklistEntry> {
    let entry = BlacklistEntry {
        id: BlacklistEntryId::new(),
        subreddit: candidate.subreddit.clone(),
        campaign_id: candidate.campaign_id,
        forbidden_pattern: candidate.forbidden_pattern.clone(),
        category: candidate.category,
        failure_type: Some(candidate.failure_type),
        source_shadow_id: Some(candidate.source_shadow_id),
        confidence: 0.5,
        is_global: false,
        is_system_detected: true,
        added_at: chrono::Utc::now(),
    };

    match repo.insert(entry).await {
        Ok(inserted) => Ok(inserted),
        Err(ConditionerError::AlreadyExists { .. }) => {
            repo.bump_confidence(candidate.subreddit.as_deref(), &candidate.forbidden_pattern, 0.1)
                .await
        }
        Err(other) => Err(other),
    }
}
