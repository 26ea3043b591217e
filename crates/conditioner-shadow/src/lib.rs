//! Shadow monitor (C11) and audit engine (C12): dual-perspective visibility
//! checks, shadowban detection, and post-hoc pattern mining into C5. Kept in
//! one crate since C11 invokes C12's mining synchronously on shadowban
//! detection (§4.11).

mod audit;
mod checker;
mod mining;
mod monitor;
mod scheduling;
mod stats;

pub use audit::{run_audit, AuditSummary};
pub use checker::{HttpCheckResult, PostVisibilityChecker};
pub use mining::mine_from_draft_body;
pub use monitor::{run_shadow_checks, CheckSummary};
pub use scheduling::initial_check_interval_hours;
pub use stats::{PostStats, PostStatsFetcher};

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use conditioner_store::InMemoryStore;
    use conditioner_types::{
        AccountStatus, BlacklistRepository, Campaign, CampaignId, CampaignRepository, CampaignStatus, DraftId,
        DraftRepository, DraftStatus, GeneratedDraft, Owner, Result, ShadowEntry, ShadowEntryId, ShadowEntryRepository,
        ShadowStatus,
    };

    use super::*;

    struct ScriptedChecker {
        authenticated: HttpCheckResult,
        anonymous: Mutex<Vec<HttpCheckResult>>,
    }

    #[async_trait]
    impl PostVisibilityChecker for ScriptedChecker {
        async fn check_authenticated(&self, _post_url: &str) -> Result<HttpCheckResult> {
            Ok(self.authenticated)
        }

        async fn check_anonymous(&self, _post_url: &str) -> Result<HttpCheckResult> {
            let mut script = self.anonymous.lock().unwrap();
            Ok(if script.len() > 1 { script.remove(0) } else { script[0] })
        }
    }

    struct FixedStats(PostStats);

    #[async_trait]
    impl PostStatsFetcher for FixedStats {
        async fn fetch_stats(&self, _post_url: &str) -> Result<PostStats> {
            Ok(self.0)
        }
    }

    fn campaign(owner: Owner) -> Campaign {
        Campaign {
            id: CampaignId::new(),
            owner,
            name: "c".to_string(),
            product_context: "ctx".to_string(),
            product_url: None,
            keywords: vec!["a".to_string()],
            target_subreddits: vec!["rust".to_string()],
            status: CampaignStatus::Active,
        }
    }

    fn draft(campaign_id: CampaignId, owner: Owner, body: &str) -> GeneratedDraft {
        GeneratedDraft {
            id: DraftId::new(),
            campaign_id,
            owner,
            subreddit: "rust".to_string(),
            archetype: conditioner_types::Archetype::Feedback,
            title: "title".to_string(),
            body: body.to_string(),
            vulnerability_score: 0.5,
            rhythm_match_score: 0.5,
            blacklist_violations: 0,
            model_used: "claude-3-5-sonnet-latest".to_string(),
            token_count: 100,
            token_cost: 0.01,
            status: DraftStatus::Posted,
            user_edits: None,
            created_at: Utc::now(),
        }
    }

    fn entry(campaign_id: CampaignId, owner: Owner, draft_id: DraftId, submitted_at: chrono::DateTime<Utc>) -> ShadowEntry {
        ShadowEntry {
            id: ShadowEntryId::new(),
            draft_id: Some(draft_id),
            campaign_id,
            owner,
            post_url: "https://reddit.com/r/rust/abc".to_string(),
            subreddit: "rust".to_string(),
            status: ShadowStatus::Active,
            isc_at_post: 3.0,
            account_status: AccountStatus::Established,
            check_interval_hours: 4,
            total_checks: 0,
            last_check_status: None,
            last_check_at: None,
            audit_result: None,
            audit_completed_at: None,
            submitted_at,
            audit_due_at: submitted_at + ShadowEntry::AUDIT_BOUNDARY,
            consecutive_anonymous_misses: 0,
        }
    }

    #[tokio::test]
    async fn two_consecutive_misses_shadowbans_and_mines_the_draft() {
        let store = InMemoryStore::new();
        let owner = Owner::new();
        let c = campaign(owner);
        CampaignRepository::insert(&store, c.clone()).await.unwrap();
        let d = draft(c.id, owner, "check out my product at https://spammy.example.com");
        DraftRepository::insert(&store, d.clone()).await.unwrap();

        let submitted = Utc::now() - Duration::hours(10);
        let mut e = entry(c.id, owner, d.id, submitted);
        e.last_check_at = Some(Utc::now() - Duration::hours(5));
        e.consecutive_anonymous_misses = 1;
        ShadowEntryRepository::insert(&store, e).await.unwrap();

        let checker = ScriptedChecker {
            authenticated: HttpCheckResult::Visible,
            anonymous: Mutex::new(vec![HttpCheckResult::NotFound]),
        };

        let mut shadowbanned_alerts = Vec::new();
        let summary = run_shadow_checks(Utc::now(), &store, &store, &store, &store, &checker, |e| shadowbanned_alerts.push(e.id))
            .await
            .unwrap();

        assert_eq!(summary.checked, 1);
        assert_eq!(summary.shadowbanned, 1);
        assert_eq!(shadowbanned_alerts.len(), 1);

        let entries = BlacklistRepository::load_for(&store, "rust", Some(c.id)).await.unwrap();
        assert!(!entries.is_empty());
    }

    #[tokio::test]
    async fn paused_campaign_entries_are_skipped_silently() {
        let store = InMemoryStore::new();
        let owner = Owner::new();
        let mut c = campaign(owner);
        c.status = CampaignStatus::Paused;
        CampaignRepository::insert(&store, c.clone()).await.unwrap();
        let d = draft(c.id, owner, "a perfectly normal post");
        DraftRepository::insert(&store, d.clone()).await.unwrap();

        let submitted = Utc::now() - Duration::hours(10);
        let mut e = entry(c.id, owner, d.id, submitted);
        e.last_check_at = Some(Utc::now() - Duration::hours(5));
        ShadowEntryRepository::insert(&store, e).await.unwrap();

        let checker = ScriptedChecker {
            authenticated: HttpCheckResult::Visible,
            anonymous: Mutex::new(vec![HttpCheckResult::Visible]),
        };

        let summary = run_shadow_checks(Utc::now(), &store, &store, &store, &store, &checker, |_| {}).await.unwrap();
        assert_eq!(summary.checked, 0);
        assert_eq!(summary.skipped_paused, 1);
    }

    #[tokio::test]
    async fn audit_classifies_social_success() {
        let store = InMemoryStore::new();
        let owner = Owner::new();
        let c = campaign(owner);
        CampaignRepository::insert(&store, c.clone()).await.unwrap();
        let d = draft(c.id, owner, "a perfectly normal post");
        DraftRepository::insert(&store, d.clone()).await.unwrap();

        let submitted = Utc::now() - Duration::days(8);
        let e = entry(c.id, owner, d.id, submitted);
        ShadowEntryRepository::insert(&store, e).await.unwrap();

        let stats = FixedStats(PostStats { upvote_ratio: 0.95, comment_count: 20 });
        let summary = run_audit(Utc::now(), &store, &store, &store, 0.8, 0.3, &stats).await.unwrap();

        assert_eq!(summary.audited, 1);
        assert_eq!(summary.social_success, 1);
    }

    #[tokio::test]
    async fn audit_mines_patterns_on_rejection() {
        let store = InMemoryStore::new();
        let owner = Owner::new();
        let c = campaign(owner);
        CampaignRepository::insert(&store, c.clone()).await.unwrap();
        let d = draft(c.id, owner, "check out my product, use code SAVE10 now");
        DraftRepository::insert(&store, d.clone()).await.unwrap();

        let submitted = Utc::now() - Duration::days(8);
        let e = entry(c.id, owner, d.id, submitted);
        ShadowEntryRepository::insert(&store, e).await.unwrap();

        let stats = FixedStats(PostStats { upvote_ratio: 0.1, comment_count: 0 });
        let summary = run_audit(Utc::now(), &store, &store, &store, 0.8, 0.3, &stats).await.unwrap();

        assert_eq!(summary.rejection, 1);
        let entries = BlacklistRepository::load_for(&store, "rust", Some(c.id)).await.unwrap();
        assert!(!entries.is_empty());
    }
}
