use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use conditioner_types::{
    BlacklistEntry, BlacklistRepository, Campaign, CampaignId, CampaignRepository, CampaignStatus,
    CommunityProfile, CommunityProfileRepository, ConditionerError, DraftId, DraftRepository,
    DraftStatus, GeneratedDraft, Owner, RawPost, RawPostRepository, Result, ShadowEntry,
    ShadowEntryId, ShadowEntryRepository, ShadowStatus, UsageRecord, UsageRepository,
};
use dashmap::DashMap;

/// DashMap-backed repository set, used by fast deterministic tests and by
/// anything that doesn't need the data to outlive the process.
#[derive(Default)]
pub struct InMemoryStore {
    campaigns: DashMap<CampaignId, Campaign>,
    raw_posts: DashMap<RawPostKey, ()>,
    raw_posts_by_id: DashMap<conditioner_types::RawPostId, RawPost>,
    profiles: DashMap<(CampaignId, String), CommunityProfile>,
    drafts: DashMap<DraftId, GeneratedDraft>,
    shadow_entries: DashMap<ShadowEntryId, ShadowEntry>,
    shadow_urls: DashMap<String, ShadowEntryId>,
    blacklist: DashMap<(String, String), BlacklistEntry>,
    usage: DashMap<conditioner_types::UsageRecordId, UsageRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RawPostKey(CampaignId, String);

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CampaignRepository for InMemoryStore {
    async fn insert(&self, campaign: Campaign) -> Result<Campaign> {
        self.campaigns.insert(campaign.id, campaign.clone());
        Ok(campaign)
    }

    async fn get(&self, owner: Owner, id: CampaignId) -> Result<Campaign> {
        self.campaigns
            .get(&id)
            .filter(|c| c.owner == owner)
            .map(|c| c.clone())
            .ok_or_else(|| ConditionerError::NotFound {
                resource: "Campaign".into(),
                id: id.to_string(),
            })
    }

    async fn set_status(&self, owner: Owner, id: CampaignId, status: CampaignStatus) -> Result<Campaign> {
        let mut entry = self
            .campaigns
            .get_mut(&id)
            .filter(|c| c.owner == owner)
            .ok_or_else(|| ConditionerError::NotFound {
                resource: "Campaign".into(),
                id: id.to_string(),
            })?;
        entry.status = status;
        Ok(entry.clone())
    }

    async fn delete(&self, owner: Owner, id: CampaignId) -> Result<()> {
        let found = self.campaigns.get(&id).filter(|c| c.owner == owner).is_some();
        if !found {
            return Err(ConditionerError::NotFound {
                resource: "Campaign".into(),
                id: id.to_string(),
            });
        }
        self.campaigns.remove(&id);
        self.raw_posts.retain(|k, _| k.0 != id);
        self.raw_posts_by_id.retain(|_, v| v.campaign_id != id);
        self.profiles.retain(|k, _| k.0 != id);
        self.drafts.retain(|_, v| v.campaign_id != id);
        let removed_urls: Vec<String> = self
            .shadow_entries
            .iter()
            .filter(|e| e.campaign_id == id)
            .map(|e| e.post_url.clone())
            .collect();
        self.shadow_entries.retain(|_, v| v.campaign_id != id);
        for url in removed_urls {
            self.shadow_urls.remove(&url);
        }
        Ok(())
    }
}

#[async_trait]
impl RawPostRepository for InMemoryStore {
    async fn upsert(&self, post: RawPost) -> Result<bool> {
        let key = RawPostKey(post.campaign_id, post.source_post_id.clone());
        if self.raw_posts.contains_key(&key) {
            return Ok(false);
        }
        self.raw_posts.insert(key, ());
        self.raw_posts_by_id.insert(post.id, post);
        Ok(true)
    }

    async fn list_by_subreddit(&self, campaign_id: CampaignId, subreddit: &str) -> Result<Vec<RawPost>> {
        Ok(self
            .raw_posts_by_id
            .iter()
            .filter(|p| p.campaign_id == campaign_id && p.subreddit == subreddit)
            .map(|p| p.clone())
            .collect())
    }

    async fn counts_by_subreddit(&self, campaign_id: CampaignId) -> Result<HashMap<String, usize>> {
        let mut out = HashMap::new();
        for p in self.raw_posts_by_id.iter().filter(|p| p.campaign_id == campaign_id) {
            *out.entry(p.subreddit.clone()).or_insert(0) += 1;
        }
        Ok(out)
    }

    async fn delete_by_campaign(&self, campaign_id: CampaignId) -> Result<()> {
        self.raw_posts.retain(|k, _| k.0 != campaign_id);
        self.raw_posts_by_id.retain(|_, v| v.campaign_id != campaign_id);
        Ok(())
    }
}

#[async_trait]
impl CommunityProfileRepository for InMemoryStore {
    async fn upsert(&self, profile: CommunityProfile) -> Result<CommunityProfile> {
        self.profiles
            .insert((profile.campaign_id, profile.subreddit.clone()), profile.clone());
        Ok(profile)
    }

    async fn get(&self, campaign_id: CampaignId, subreddit: &str) -> Result<Option<CommunityProfile>> {
        Ok(self
            .profiles
            .get(&(campaign_id, subreddit.to_string()))
            .map(|p| p.clone()))
    }

    async fn list_by_campaign(&self, campaign_id: CampaignId) -> Result<Vec<CommunityProfile>> {
        Ok(self
            .profiles
            .iter()
            .filter(|e| e.key().0 == campaign_id)
            .map(|e| e.value().clone())
            .collect())
    }
}

#[async_trait]
impl DraftRepository for InMemoryStore {
    async fn insert(&self, draft: GeneratedDraft) -> Result<GeneratedDraft> {
        self.drafts.insert(draft.id, draft.clone());
        Ok(draft)
    }

    async fn get(&self, owner: Owner, id: DraftId) -> Result<GeneratedDraft> {
        self.drafts
            .get(&id)
            .filter(|d| d.owner == owner)
            .map(|d| d.clone())
            .ok_or_else(|| ConditionerError::NotFound {
                resource: "GeneratedDraft".into(),
                id: id.to_string(),
            })
    }

    async fn update_status(
        &self,
        owner: Owner,
        id: DraftId,
        status: DraftStatus,
        user_edits: Option<String>,
    ) -> Result<GeneratedDraft> {
        let mut entry = self
            .drafts
            .get_mut(&id)
            .filter(|d| d.owner == owner)
            .ok_or_else(|| ConditionerError::NotFound {
                resource: "GeneratedDraft".into(),
                id: id.to_string(),
            })?;
        if !entry.status.can_transition_to(status) {
            return Err(ConditionerError::Validation {
                field: "status".into(),
                reason: format!("cannot transition draft from {:?} to {:?}", entry.status, status),
            });
        }
        entry.status = status;
        if let Some(edits) = user_edits {
            entry.user_edits = Some(edits);
        }
        Ok(entry.clone())
    }

    async fn delete_by_campaign(&self, campaign_id: CampaignId) -> Result<()> {
        self.drafts.retain(|_, v| v.campaign_id != campaign_id);
        Ok(())
    }
}

#[async_trait]
impl ShadowEntryRepository for InMemoryStore {
    async fn insert(&self, entry: ShadowEntry) -> Result<ShadowEntry> {
        if self.shadow_urls.contains_key(&entry.post_url) {
            return Err(ConditionerError::AlreadyExists {
                resource: "ShadowEntry".into(),
                key: entry.post_url.clone(),
            });
        }
        self.shadow_urls.insert(entry.post_url.clone(), entry.id);
        self.shadow_entries.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn get(&self, id: ShadowEntryId) -> Result<ShadowEntry> {
        self.shadow_entries
            .get(&id)
            .map(|e| e.clone())
            .ok_or_else(|| ConditionerError::NotFound {
                resource: "ShadowEntry".into(),
                id: id.to_string(),
            })
    }

    async fn update(&self, entry: ShadowEntry) -> Result<ShadowEntry> {
        let mut existing = self
            .shadow_entries
            .get_mut(&entry.id)
            .ok_or_else(|| ConditionerError::NotFound {
                resource: "ShadowEntry".into(),
                id: entry.id.to_string(),
            })?;
        if existing.audit_completed_at.is_some() {
            return Err(ConditionerError::Validation {
                field: "status".into(),
                reason: "shadow entry is immutable after audit_completed_at is set".into(),
            });
        }
        if !existing.status.can_transition_to(entry.status) {
            return Err(ConditionerError::Validation {
                field: "status".into(),
                reason: format!(
                    "cannot transition shadow entry from {:?} to {:?}",
                    existing.status, entry.status
                ),
            });
        }
        *existing = entry.clone();
        Ok(entry)
    }

    async fn due_for_check(&self, now: DateTime<Utc>) -> Result<Vec<ShadowEntry>> {
        Ok(self
            .shadow_entries
            .iter()
            .filter(|e| e.status == ShadowStatus::Active)
            .filter_map(|e| {
                let due_at = e
                    .last_check_at
                    .map_or(e.submitted_at, |t| t + chrono::Duration::hours(i64::from(e.check_interval_hours)));
                (due_at <= now).then(|| e.clone())
            })
            .collect())
    }

    async fn due_for_audit(&self, now: DateTime<Utc>) -> Result<Vec<ShadowEntry>> {
        Ok(self
            .shadow_entries
            .iter()
            .filter(|e| e.audit_due_at <= now && e.audit_result.is_none())
            .map(|e| e.clone())
            .collect())
    }

    async fn delete_by_campaign(&self, campaign_id: CampaignId) -> Result<()> {
        let removed_urls: Vec<String> = self
            .shadow_entries
            .iter()
            .filter(|e| e.campaign_id == campaign_id)
            .map(|e| e.post_url.clone())
            .collect();
        self.shadow_entries.retain(|_, v| v.campaign_id != campaign_id);
        for url in removed_urls {
            self.shadow_urls.remove(&url);
        }
        Ok(())
    }
}

#[async_trait]
impl BlacklistRepository for InMemoryStore {
    async fn insert(&self, entry: BlacklistEntry) -> Result<BlacklistEntry> {
        let scope_key = entry.subreddit.clone().unwrap_or_else(|| "*".to_string());
        let key = (scope_key, entry.forbidden_pattern.clone());
        if self.blacklist.contains_key(&key) {
            return Err(ConditionerError::AlreadyExists {
                resource: "BlacklistEntry".into(),
                key: entry.forbidden_pattern.clone(),
            });
        }
        self.blacklist.insert(key, entry.clone());
        Ok(entry)
    }

    async fn bump_confidence(
        &self,
        subreddit: Option<&str>,
        forbidden_pattern: &str,
        delta: f64,
    ) -> Result<BlacklistEntry> {
        let key = (subreddit.unwrap_or("*").to_string(), forbidden_pattern.to_string());
        let mut entry = self
            .blacklist
            .get_mut(&key)
            .ok_or_else(|| ConditionerError::NotFound {
                resource: "BlacklistEntry".into(),
                id: forbidden_pattern.to_string(),
            })?;
        entry.confidence = (entry.confidence + delta).min(1.0);
        Ok(entry.clone())
    }

    async fn load_for(&self, subreddit: &str, campaign_id: Option<CampaignId>) -> Result<Vec<BlacklistEntry>> {
        Ok(self
            .blacklist
            .iter()
            .filter(|e| {
                e.is_global
                    || e.subreddit.as_deref() == Some(subreddit)
                    || (campaign_id.is_some() && e.campaign_id == campaign_id && !e.is_system_detected)
            })
            .map(|e| e.value().clone())
            .collect())
    }
}

#[async_trait]
impl UsageRepository for InMemoryStore {
    async fn append(&self, record: UsageRecord) -> Result<UsageRecord> {
        self.usage.insert(record.id, record.clone());
        Ok(record)
    }

    async fn sum_cost_in_period(
        &self,
        owner: Owner,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> Result<f64> {
        Ok(self
            .usage
            .iter()
            .filter(|r| r.owner == owner && r.occurred_at >= period_start && r.occurred_at < period_end)
            .map(|r| r.cost)
            .sum())
    }
}
