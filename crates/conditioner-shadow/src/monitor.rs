use chrono::{DateTime, Utc};
use conditioner_types::{
    BlacklistFailureType, BlacklistRepository, CampaignRepository, CampaignStatus, DraftRepository, Result,
    ShadowEntry, ShadowEntryRepository, ShadowStatus,
};

use crate::checker::{HttpCheckResult, PostVisibilityChecker};
use crate::mining::mine_from_draft_body;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CheckSummary {
    pub checked: usize,
    pub transitioned: usize,
    pub shadowbanned: usize,
    pub skipped_paused: usize,
}

/// §4.11 contract. Runs `check(entry)` for every due, active entry, oldest
/// submission first. `on_shadowban` fires the alert consumed by external
/// collaborators the instant a shadowban is detected.
pub async fn run_shadow_checks<E, C, D, B, V>(
    now: DateTime<Utc>,
    entries: &E,
    campaigns: &C,
    drafts: &D,
    blacklist: &B,
    checker: &V,
    mut on_shadowban: impl FnMut(&ShadowEntry),
) -> Result<CheckSummary>
where
    E: ShadowEntryRepository,
    C: CampaignRepository,
    D: DraftRepository,
    B: BlacklistRepository,
    V: PostVisibilityChecker,
{
    let mut due = entries.due_for_check(now).await?;
    due.sort_by_key(|e| e.submitted_at);

    let mut summary = CheckSummary::default();

    for entry in due {
        match campaigns.get(entry.owner, entry.campaign_id).await {
            Ok(campaign) if campaign.status != CampaignStatus::Active => {
                summary.skipped_paused += 1;
                continue;
            }
            Err(_) => {
                summary.skipped_paused += 1;
                continue;
            }
            Ok(_) => {}
        }

        let auth = checker.check_authenticated(&entry.post_url).await;
        let anon = checker.check_anonymous(&entry.post_url).await;
        let (auth, anon) = match (auth, anon) {
            (Ok(a), Ok(b)) => (a, b),
            _ => {
                tracing::debug!(post_url = %entry.post_url, "transient visibility check error, leaving status unchanged");
                continue;
            }
        };

        summary.checked += 1;
        let mut updated = entry.clone();
        updated.last_check_at = Some(now);
        updated.total_checks += 1;

        let new_status = classify(auth, anon, &mut updated.consecutive_anonymous_misses);
        updated.last_check_status = Some(new_status);
        updated.status = new_status;

        entries.update(updated.clone()).await?;

        if new_status != ShadowStatus::Active {
            summary.transitioned += 1;
        }

        if new_status == ShadowStatus::Shadowbanned {
            summary.shadowbanned += 1;
            on_shadowban(&updated);
            if let Some(draft_id) = updated.draft_id {
                if let Ok(draft) = drafts.get(updated.owner, draft_id).await {
                    mine_from_draft_body(blacklist, &updated, &draft.body, BlacklistFailureType::Shadowban).await?;
                }
            }
        }
    }

    Ok(summary)
}

/// §4.11's dual-perspective classification. A post visible anonymously is
/// visible to the world regardless of the authenticated view, so that check
/// wins outright and resets the shadowban counter; otherwise an
/// authenticated-visible/anonymous-missing pair only shadowbans after it
/// reproduces for two consecutive checks.
fn classify(auth: HttpCheckResult, anon: HttpCheckResult, consecutive_anonymous_misses: &mut u32) -> ShadowStatus {
    if anon == HttpCheckResult::Visible {
        *consecutive_anonymous_misses = 0;
        return ShadowStatus::Active;
    }

    if auth == HttpCheckResult::Visible {
        *consecutive_anonymous_misses += 1;
        return if *consecutive_anonymous_misses >= 2 {
            ShadowStatus::Shadowbanned
        } else {
            ShadowStatus::Active
        };
    }

    if auth == HttpCheckResult::RemovedByModerator || anon == HttpCheckResult::RemovedByModerator {
        ShadowStatus::Removed
    } else {
        ShadowStatus::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_visible_is_active_and_resets_misses() {
        let mut misses = 1;
        assert_eq!(classify(HttpCheckResult::Visible, HttpCheckResult::Visible, &mut misses), ShadowStatus::Active);
        assert_eq!(misses, 0);
    }

    #[test]
    fn single_anonymous_miss_stays_active() {
        let mut misses = 0;
        let status = classify(HttpCheckResult::Visible, HttpCheckResult::NotFound, &mut misses);
        assert_eq!(status, ShadowStatus::Active);
        assert_eq!(misses, 1);
    }

    #[test]
    fn two_consecutive_anonymous_misses_is_shadowbanned() {
        let mut misses = 1;
        let status = classify(HttpCheckResult::Visible, HttpCheckResult::NotFound, &mut misses);
        assert_eq!(status, ShadowStatus::Shadowbanned);
        assert_eq!(misses, 2);
    }

    #[test]
    fn both_not_found_without_moderator_signature_is_not_found() {
        let mut misses = 0;
        let status = classify(HttpCheckResult::NotFound, HttpCheckResult::NotFound, &mut misses);
        assert_eq!(status, ShadowStatus::NotFound);
    }

    #[test]
    fn moderator_removal_signature_is_removed() {
        let mut misses = 0;
        let status = classify(HttpCheckResult::RemovedByModerator, HttpCheckResult::NotFound, &mut misses);
        assert_eq!(status, ShadowStatus::Removed);
    }
}
