use chrono::{DateTime, Utc};
use conditioner_types::{
    AuditResult, BlacklistFailureType, BlacklistRepository, DraftRepository, Result, ShadowEntryRepository,
    ShadowStatus,
};

use crate::mining::mine_from_draft_body;
use crate::stats::PostStatsFetcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuditSummary {
    pub audited: usize,
    pub social_success: usize,
    pub rejection: usize,
    pub inertia: usize,
}

/// §4.12 contract: classify every entry with `audit_due_at <= now` and no
/// `audit_result`, set the result once, and transition to `Audited`. On
/// `Rejection`, mine forbidden-pattern candidates from the draft body.
pub async fn run_audit<E, D, B, F>(
    now: DateTime<Utc>,
    entries: &E,
    drafts: &D,
    blacklist: &B,
    success_upvote_threshold: f64,
    rejection_upvote_threshold: f64,
    stats: &F,
) -> Result<AuditSummary>
where
    E: ShadowEntryRepository,
    D: DraftRepository,
    B: BlacklistRepository,
    F: PostStatsFetcher,
{
    let due = entries.due_for_audit(now).await?;
    let mut summary = AuditSummary::default();

    for entry in due {
        let Ok(post_stats) = stats.fetch_stats(&entry.post_url).await else {
            tracing::debug!(post_url = %entry.post_url, "stats fetch failed, deferring audit to next tick");
            continue;
        };

        let rejected_by_status = matches!(entry.status, ShadowStatus::Removed | ShadowStatus::Shadowbanned);
        let result = if rejected_by_status || post_stats.upvote_ratio < rejection_upvote_threshold {
            summary.rejection += 1;
            AuditResult::Rejection
        } else if post_stats.upvote_ratio >= success_upvote_threshold && post_stats.comment_count >= 10 {
            summary.social_success += 1;
            AuditResult::SocialSuccess
        } else {
            summary.inertia += 1;
            AuditResult::Inertia
        };

        let mut updated = entry.clone();
        updated.audit_result = Some(result);
        updated.audit_completed_at = Some(now);
        updated.status = ShadowStatus::Audited;
        entries.update(updated.clone()).await?;
        summary.audited += 1;

        if result == AuditResult::Rejection {
            if let Some(draft_id) = updated.draft_id {
                if let Ok(draft) = drafts.get(updated.owner, draft_id).await {
                    let failure_type = match entry.status {
                        ShadowStatus::Shadowbanned => BlacklistFailureType::Shadowban,
                        ShadowStatus::Removed => BlacklistFailureType::AdminRemoval,
                        _ => BlacklistFailureType::SocialRejection,
                    };
                    mine_from_draft_body(blacklist, &updated, &draft.body, failure_type).await?;
                }
            }
        }
    }

    Ok(summary)
}
