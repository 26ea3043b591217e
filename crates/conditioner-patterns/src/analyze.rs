use std::collections::HashMap;

use chrono::{DateTime, Utc};
use conditioner_inference::{InferenceClient, LlmGateway};
use conditioner_types::{
    Archetype, BlacklistCategory, CampaignId, CommunityProfile, CommunityProfileId, CommunityProfileRepository,
    Owner, RawPost, RawPostRepository, Result, TaskType, UsageRepository,
};

use crate::forbidden::{marketing_jargon_penalty, scan};
use crate::rhythm::{corpus_avg_sentence_length, dominant_tone, formality_level};
use crate::scoring::isc_score;

/// §4.4 warning for a subreddit that did not meet `sample_size >= 10`.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisWarning {
    pub subreddit: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub profiles_created: usize,
    pub warnings: Vec<AnalysisWarning>,
}

/// Progress callback payload, matching §4.3/§4.4's per-subreddit progress
/// contract until C13's event bus is wired in by the facade.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisProgress {
    pub subreddit: String,
    pub current_step: &'static str,
}

const LOW_SCORE_THRESHOLD: f64 = 3.0;
const TOP_HOOKS_COUNT: usize = 5;
const HOOK_SENTENCES: usize = 2;

/// §4.4 contract: for each subreddit with `>= 10` raw posts, compute ISC,
/// rhythm, formality, archetype distribution, top hooks, and forbidden
/// pattern frequencies, then upsert a `CommunityProfile`. Subreddits below
/// the threshold yield a warning and no profile.
///
/// `force = false` reuses an existing profile untouched (no recompute, not
/// counted towards `profiles_created`); `force = true` always recomputes.
/// This is not stated explicitly in the source contract and is a documented
/// interpretation, not a guess at an unstated mechanism.
#[allow(clippy::too_many_arguments)]
pub async fn analyze<R, P, G, U>(
    campaign_id: CampaignId,
    owner: Owner,
    force: bool,
    monthly_cap: f64,
    now: DateTime<Utc>,
    raw_posts: &R,
    profiles: &P,
    inference: &InferenceClient<G, U>,
    mut progress_cb: impl FnMut(AnalysisProgress),
) -> Result<AnalysisResult>
where
    R: RawPostRepository,
    P: CommunityProfileRepository,
    G: LlmGateway,
    U: UsageRepository,
{
    let counts = raw_posts.counts_by_subreddit(campaign_id).await?;
    let mut profiles_created = 0;
    let mut warnings = Vec::new();

    for (subreddit, count) in counts {
        progress_cb(AnalysisProgress {
            subreddit: subreddit.clone(),
            current_step: "start",
        });

        if count < CommunityProfile::MIN_SAMPLE_SIZE {
            warnings.push(AnalysisWarning {
                subreddit: subreddit.clone(),
                reason: "insufficient_data".to_string(),
            });
            continue;
        }

        if !force {
            if let Some(existing) = profiles.get(campaign_id, &subreddit).await? {
                tracing::debug!(subreddit = %subreddit, "skipping recompute, profile already exists and force=false");
                let _ = existing;
                continue;
            }
        }

        let posts = raw_posts.list_by_subreddit(campaign_id, &subreddit).await?;
        progress_cb(AnalysisProgress {
            subreddit: subreddit.clone(),
            current_step: "metrics",
        });

        let profile_id = match profiles.get(campaign_id, &subreddit).await? {
            Some(existing) => existing.id,
            None => CommunityProfileId::new(),
        };

        let style_guide = build_style_guide(inference, owner, campaign_id, monthly_cap, now, &subreddit, &posts).await;
        progress_cb(AnalysisProgress {
            subreddit: subreddit.clone(),
            current_step: "style_guide",
        });

        let profile = compute_profile(profile_id, campaign_id, &subreddit, &posts, style_guide);
        profiles.upsert(profile).await?;
        profiles_created += 1;

        progress_cb(AnalysisProgress {
            subreddit,
            current_step: "done",
        });
    }

    Ok(AnalysisResult { profiles_created, warnings })
}

fn compute_profile(
    id: CommunityProfileId,
    campaign_id: CampaignId,
    subreddit: &str,
    posts: &[RawPost],
    style_guide: String,
) -> CommunityProfile {
    let texts: Vec<&str> = posts.iter().map(|p| p.raw_text.as_str()).collect();

    let avg_sentence_length = corpus_avg_sentence_length(&texts);
    let tone = dominant_tone(&texts);
    let formality_values: Vec<f64> = texts.iter().map(|t| formality_level(t)).collect();
    let formality_mean = mean(&formality_values);

    let mut archetype_distribution: HashMap<Archetype, u32> = HashMap::new();
    for post in posts {
        if post.archetype != Archetype::Unclassified {
            *archetype_distribution.entry(post.archetype).or_insert(0) += 1;
        }
    }

    let low_scoring: Vec<&RawPost> = posts.iter().filter(|p| p.success_score < LOW_SCORE_THRESHOLD).collect();
    let mut forbidden_patterns: HashMap<BlacklistCategory, u32> = HashMap::new();
    for post in &low_scoring {
        for category in scan(&post.raw_text) {
            *forbidden_patterns.entry(category).or_insert(0) += 1;
        }
    }

    let total_hits: u32 = forbidden_patterns.values().sum();
    let forbidden_hit_rate = if posts.is_empty() { 0.0 } else { f64::from(total_hits) / posts.len() as f64 };
    let jargon_values: Vec<f64> = texts.iter().map(|t| marketing_jargon_penalty(t)).collect();
    let jargon_mean = mean(&jargon_values);
    let upvote_values: Vec<f64> = posts.iter().map(|p| p.upvote_ratio).collect();
    let upvote_mean = mean(&upvote_values);
    let isc = isc_score(forbidden_hit_rate, jargon_mean, upvote_mean);

    let mut ranked: Vec<&RawPost> = posts.iter().collect();
    ranked.sort_by(|a, b| b.success_score.partial_cmp(&a.success_score).unwrap_or(std::cmp::Ordering::Equal));
    let top_success_hooks: Vec<String> = ranked
        .into_iter()
        .take(TOP_HOOKS_COUNT)
        .map(|post| {
            let sentences = crate::tokenize::split_sentences(&post.raw_text);
            sentences.into_iter().take(HOOK_SENTENCES).collect::<Vec<_>>().join(" ")
        })
        .filter(|hook| !hook.is_empty())
        .collect();

    let mut style_metrics = HashMap::new();
    style_metrics.insert("formality_mean".to_string(), formality_mean);
    style_metrics.insert("jargon_mean".to_string(), jargon_mean);
    style_metrics.insert("upvote_mean".to_string(), upvote_mean);

    CommunityProfile {
        id,
        campaign_id,
        subreddit: subreddit.to_string(),
        isc_score: isc,
        avg_sentence_length,
        dominant_tone: tone.as_str().to_string(),
        formality_level: formality_mean,
        top_success_hooks,
        forbidden_patterns,
        archetype_distribution,
        style_metrics,
        style_guide,
        sample_size: posts.len(),
        last_analyzed_at: Utc::now(),
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// §4.4: "one C1 `style_guide` call per subreddit ... may be skipped if
/// budget would be exceeded (profile is still created with empty
/// style_guide)". Any inference failure degrades to an empty guide rather
/// than failing the whole analysis pass.
async fn build_style_guide<G, U>(
    inference: &InferenceClient<G, U>,
    owner: Owner,
    campaign_id: CampaignId,
    monthly_cap: f64,
    now: DateTime<Utc>,
    subreddit: &str,
    posts: &[RawPost],
) -> String
where
    G: LlmGateway,
    U: UsageRepository,
{
    let sample: Vec<&str> = posts.iter().take(5).map(|p| p.raw_text.as_str()).collect();
    let prompt = format!(
        "Subreddit: r/{subreddit}\nSample posts:\n{}\n\nDescribe this community's voice, vocabulary, and formatting in a short narrative.",
        sample.join("\n---\n")
    );

    match inference
        .call(TaskType::StyleGuide, owner, Some(campaign_id), monthly_cap, None, &prompt, now)
        .await
    {
        Ok(outcome) => outcome.text,
        Err(err) => {
            tracing::warn!(subreddit, error = %err, "style guide call skipped, profile will have an empty style_guide");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use conditioner_inference::{GatewayError, GatewayResponse, LlmGateway, ModelRegistry};
    use conditioner_store::InMemoryStore;
    use conditioner_types::{CampaignRepository, Owner, RawPostId};

    use super::*;

    struct AlwaysFailGateway;

    #[async_trait]
    impl LlmGateway for AlwaysFailGateway {
        async fn complete(
            &self,
            model: &str,
            _system_prompt: Option<&str>,
            _user_prompt: &str,
            _max_tokens: u32,
            _temperature: f32,
        ) -> std::result::Result<GatewayResponse, GatewayError> {
            Err(GatewayError::Transport {
                model: model.to_string(),
                reason: "test gateway never succeeds".to_string(),
            })
        }
    }

    fn make_post(campaign_id: CampaignId, owner: Owner, subreddit: &str, idx: usize, text: &str) -> RawPost {
        RawPost {
            id: RawPostId::new(),
            campaign_id,
            owner,
            subreddit: subreddit.to_string(),
            source_post_id: format!("post-{idx}"),
            source_url: format!("https://reddit.com/{idx}"),
            author: "someone".to_string(),
            author_karma: 100,
            title: "title".to_string(),
            raw_text: text.to_string(),
            comment_count: 5,
            upvote_ratio: 0.8,
            archetype: Archetype::Feedback,
            success_score: 6.0,
            is_ai_processed: true,
            rhythm_metadata: HashMap::new(),
            source_created_at: Utc::now(),
            collected_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn subreddits_below_threshold_yield_warnings_and_no_profile() {
        let store = InMemoryStore::new();
        let owner = Owner::new();
        let campaign_id = CampaignId::new();
        CampaignRepository::insert(
            &store,
            conditioner_types::Campaign {
                id: campaign_id,
                owner,
                name: "c".into(),
                product_context: "ctx".into(),
                product_url: None,
                keywords: vec!["a".into()],
                target_subreddits: vec!["rust".into()],
                status: conditioner_types::CampaignStatus::Active,
            },
        )
        .await
        .unwrap();

        for i in 0..3 {
            RawPostRepository::upsert(&store, make_post(campaign_id, owner, "rust", i, "short text here")).await.unwrap();
        }

        let usage_store = InMemoryStore::new();
        let inference = InferenceClient::new(Arc::new(AlwaysFailGateway), Arc::new(usage_store), ModelRegistry::default());

        let result = analyze(
            campaign_id,
            owner,
            false,
            1000.0,
            Utc::now(),
            &store,
            &store,
            &inference,
            |_| {},
        )
        .await
        .unwrap();

        assert_eq!(result.profiles_created, 0);
        assert_eq!(result.warnings, vec![AnalysisWarning { subreddit: "rust".to_string(), reason: "insufficient_data".to_string() }]);
    }
}
