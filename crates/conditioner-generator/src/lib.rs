//! Generator (C8): the single place that turns a request into a persisted
//! `GeneratedDraft`, walking the ten-step sequence in order with no
//! regeneration loop (§4.8: "a single generation followed by deterministic
//! humanization is the contract").

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use conditioner_blacklist::{load_for, PromptBlacklistEntry};
use conditioner_gating::gate;
use conditioner_humanize::{detect, humanize, Intensity};
use conditioner_inference::{InferenceClient, LlmGateway};
use conditioner_patterns::{rhythm_metadata, scan_forbidden_patterns, vulnerability_weight};
use conditioner_prompts::build as build_prompt;
use conditioner_types::{
    AccountStatus, Archetype, BlacklistCategory, BlacklistRepository, CampaignId, CommunityProfile,
    CommunityProfileRepository, ConditionerError, DraftId, DraftRepository, DraftStatus, GeneratedDraft, Owner,
    Result, TaskType,
};

const FALLBACK_ISC_SCORE: f64 = 5.0;
const FALLBACK_FORMALITY: f64 = 0.5;
const FALLBACK_AVG_SENTENCE_LENGTH: f64 = 15.0;

/// Step names reported to `progress_cb`, matching the §4.8 sequence.
pub const STEPS: [&str; 10] = [
    "load_profile",
    "load_blacklist",
    "gate",
    "build_prompt",
    "call_inference",
    "humanize",
    "detect_ai_patterns",
    "validate_blacklist",
    "score_draft",
    "persist",
];

/// §4.8 contract. `progress_cb` is invoked with one of [`STEPS`] before each
/// stage runs.
#[allow(clippy::too_many_arguments)]
pub async fn generate<P, B, D, G, U>(
    campaign_id: CampaignId,
    owner: Owner,
    subreddit: &str,
    requested_archetype: Archetype,
    user_context: Option<&str>,
    account_status: AccountStatus,
    monthly_cap: f64,
    now: DateTime<Utc>,
    profiles: &P,
    blacklist: &B,
    drafts: &D,
    inference: &InferenceClient<G, U>,
    mut progress_cb: impl FnMut(&str),
) -> Result<GeneratedDraft>
where
    P: CommunityProfileRepository,
    B: BlacklistRepository,
    D: DraftRepository,
    G: LlmGateway,
    U: conditioner_types::UsageRepository,
{
    if requested_archetype == Archetype::Unclassified {
        return Err(ConditionerError::Validation {
            field: "requested_archetype".to_string(),
            reason: "Unclassified is not a requestable archetype".to_string(),
        });
    }

    progress_cb(STEPS[0]);
    let profile = profiles.get(campaign_id, subreddit).await?;
    let isc_score = profile.as_ref().map_or(FALLBACK_ISC_SCORE, |p| p.isc_score);

    progress_cb(STEPS[1]);
    let blacklist_entries = load_for(blacklist, subreddit, Some(campaign_id)).await?;
    let community_risk_categories: HashSet<BlacklistCategory> = profile
        .as_ref()
        .map(|p| p.forbidden_patterns.iter().filter(|(_, count)| **count > 0).map(|(c, _)| *c).collect())
        .unwrap_or_default();

    progress_cb(STEPS[2]);
    let gate_result = gate(account_status, isc_score, requested_archetype);

    progress_cb(STEPS[3]);
    let prompt = build_prompt(
        profile.as_ref(),
        gate_result.allowed_archetype,
        &blacklist_entries,
        &gate_result.constraints,
        user_context,
    );

    progress_cb(STEPS[4]);
    let outcome = inference
        .call(
            TaskType::GenerateDraft,
            owner,
            Some(campaign_id),
            monthly_cap,
            Some(&prompt.system),
            &prompt.user,
            now,
        )
        .await?;

    progress_cb(STEPS[5]);
    let intensity = humanize_intensity(profile.as_ref().map_or(FALLBACK_FORMALITY, |p| p.formality_level));
    let humanized = humanize(&outcome.text, intensity);

    progress_cb(STEPS[6]);
    let ai_violations = detect(&humanized);
    if ai_violations > 0 {
        tracing::debug!(ai_violations, "draft carries residual AI-pattern tells (advisory, not blocking)");
    }

    progress_cb(STEPS[7]);
    let blacklist_violations = count_blacklist_violations(&humanized, &blacklist_entries, &community_risk_categories);

    progress_cb(STEPS[8]);
    let vulnerability_score = vulnerability_weight(&humanized);
    let rhythm_match_score = rhythm_match(&humanized, profile.as_ref());

    progress_cb(STEPS[9]);
    let (title, body) = split_title_body(&humanized);
    let draft = GeneratedDraft {
        id: DraftId::new(),
        campaign_id,
        owner,
        subreddit: subreddit.to_string(),
        archetype: gate_result.allowed_archetype,
        title,
        body,
        vulnerability_score,
        rhythm_match_score,
        blacklist_violations,
        model_used: outcome.model_used,
        token_count: outcome.token_count,
        token_cost: outcome.cost,
        status: DraftStatus::Generated,
        user_edits: None,
        created_at: now,
    };

    drafts.insert(draft).await
}

/// §4.8 step 6: "casual communities get heavy humanization, formal
/// communities light", scaled off `formality_level`.
fn humanize_intensity(formality_level: f64) -> Intensity {
    if formality_level < 0.35 {
        Intensity::Heavy
    } else if formality_level < 0.65 {
        Intensity::Moderate
    } else {
        Intensity::Light
    }
}

/// §4.8 step 8: match each blacklist entry against the draft body, "regex
/// or substring per `category`" — `Link` entries are matched as a regex
/// (forbidden link patterns are usually a host/path shape), every other
/// category as a case-insensitive substring. Also tallies a hit for any
/// category the community's own forbidden-pattern bag flags as risky, even
/// without a concrete C5 entry for it, since `profile.forbidden_patterns`
/// carries no pattern text to merge as real entries (§3: it's a frequency
/// bag, not a list of strings).
fn count_blacklist_violations(
    body: &str,
    entries: &[PromptBlacklistEntry],
    community_risk_categories: &HashSet<BlacklistCategory>,
) -> u32 {
    let mut violations = 0;
    let lower_body = body.to_lowercase();

    for entry in entries {
        let hit = if entry.category == BlacklistCategory::Link {
            regex::Regex::new(&entry.forbidden_pattern).is_ok_and(|re| re.is_match(body))
        } else {
            lower_body.contains(&entry.forbidden_pattern.to_lowercase())
        };
        if hit {
            violations += 1;
        }
    }

    let body_categories: HashSet<BlacklistCategory> = scan_forbidden_patterns(body).into_iter().collect();
    violations += community_risk_categories.intersection(&body_categories).count() as u32;

    violations
}

fn rhythm_match(body: &str, profile: Option<&CommunityProfile>) -> f64 {
    let draft_metrics = rhythm_metadata(body);
    let draft_avg_len = draft_metrics.get("avg_sentence_length").copied().unwrap_or(0.0);
    let baseline = profile.map_or(FALLBACK_AVG_SENTENCE_LENGTH, |p| p.avg_sentence_length);
    if baseline <= 0.0 {
        return 0.0;
    }
    (1.0 - (draft_avg_len - baseline).abs() / baseline).clamp(0.0, 1.0)
}

/// The model output has no structural title/body separation; the first line
/// is treated as the title, the remainder as the body, falling back to a
/// truncated first sentence when the output is a single line.
fn split_title_body(text: &str) -> (String, String) {
    match text.split_once('\n') {
        Some((title, rest)) if !title.trim().is_empty() && !rest.trim().is_empty() => {
            (title.trim().to_string(), rest.trim().to_string())
        }
        _ => {
            let title: String = text.chars().take(80).collect();
            (title, text.to_string())
        }
    }
}
