use conditioner_blacklist::{mine, MinedPattern};
use conditioner_patterns::scan_with_matches;
use conditioner_types::{BlacklistFailureType, BlacklistRepository, Result, ShadowEntry};

/// §4.12: on `Rejection` or `Shadowbanned`, run the same lexicon scan C4
/// uses on raw posts against the draft body and mine each hit into C5.
/// Duplicate conflicts are idempotent successes (`mine` already bumps
/// confidence on conflict), so a failed insert here is always real.
pub async fn mine_from_draft_body(
    blacklist: &(impl BlacklistRepository + ?Sized),
    entry: &ShadowEntry,
    draft_body: &str,
    failure_type: BlacklistFailureType,
) -> Result<()> {
    for (category, forbidden_pattern) in scan_with_matches(draft_body) {
        mine(
            blacklist,
            MinedPattern {
                subreddit: Some(entry.subreddit.clone()),
                campaign_id: Some(entry.campaign_id),
                forbidden_pattern,
                category,
                failure_type,
                source_shadow_id: entry.id,
            },
        )
        .await?;
    }
    Ok(())
}
