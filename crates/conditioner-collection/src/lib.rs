//! Collection orchestrator (C3): scrape → filter → sample → classify →
//! persist, per subreddit, tolerant of per-subreddit failure.

mod classify;
mod sampling;
mod scraper;
mod validate;

use std::time::Duration;

use chrono::{DateTime, Utc};
use conditioner_inference::{InferenceClient, LlmGateway};
use conditioner_patterns::{rhythm_metadata, success_score, SuccessInputs};
use conditioner_types::{
    Campaign, ConditionerError, RawPost, RawPostId, RawPostRepository, Result, UsageRepository,
};

pub use scraper::PostScraper;

const RETRY_BACKOFFS: [Duration; 2] = [Duration::from_secs(5), Duration::from_secs(15)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStatus {
    Success,
    Partial,
    Failure,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubredditError {
    pub subreddit: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionResult {
    pub status: CollectionStatus,
    pub scraped: usize,
    pub filtered: usize,
    pub classified: usize,
    pub errors: Vec<SubredditError>,
}

/// Progress payload matching §4.3's `{current_step, total_steps,
/// current_subreddit, scraped, filtered, classified, warnings[]}` contract.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionProgress {
    pub current_step: &'static str,
    pub total_steps: usize,
    pub current_subreddit: String,
    pub scraped: usize,
    pub filtered: usize,
    pub classified: usize,
    pub warnings: Vec<String>,
}

/// §4.3 contract, with the retry backoff schedule exposed so tests don't pay
/// the real 5s/15s wait. [`run_collection`] is the production entry point.
#[allow(clippy::too_many_arguments)]
pub async fn run_collection_with_backoffs<S, R, G, U>(
    campaign: &Campaign,
    monthly_cap: f64,
    now: DateTime<Utc>,
    scraper: &S,
    raw_posts: &R,
    inference: &InferenceClient<G, U>,
    backoffs: &[Duration],
    mut progress_cb: impl FnMut(CollectionProgress),
) -> Result<CollectionResult>
where
    S: PostScraper,
    R: RawPostRepository,
    G: LlmGateway,
    U: UsageRepository,
{
    for subreddit in &campaign.target_subreddits {
        if !validate::is_valid_subreddit_name(subreddit) {
            return Err(ConditionerError::Validation {
                field: "target_subreddits".to_string(),
                reason: format!("'{subreddit}' is not a valid subreddit name"),
            });
        }
    }

    let total_steps = campaign.target_subreddits.len();
    let mut total_scraped = 0usize;
    let mut total_filtered = 0usize;
    let mut total_classified = 0usize;
    let mut errors = Vec::new();

    for subreddit in &campaign.target_subreddits {
        progress_cb(CollectionProgress {
            current_step: "start",
            total_steps,
            current_subreddit: subreddit.clone(),
            scraped: total_scraped,
            filtered: total_filtered,
            classified: total_classified,
            warnings: Vec::new(),
        });

        match collect_subreddit(campaign, monthly_cap, now, subreddit, scraper, raw_posts, inference, backoffs, &mut progress_cb, total_steps, &mut total_scraped, &mut total_filtered, &mut total_classified).await {
            Ok(()) => {}
            Err(err) => errors.push(SubredditError {
                subreddit: subreddit.clone(),
                reason: err.to_string(),
            }),
        }
    }

    let status = if total_scraped == 0 && !campaign.target_subreddits.is_empty() {
        CollectionStatus::Failure
    } else if errors.is_empty() {
        CollectionStatus::Success
    } else {
        CollectionStatus::Partial
    };

    Ok(CollectionResult {
        status,
        scraped: total_scraped,
        filtered: total_filtered,
        classified: total_classified,
        errors,
    })
}

/// Production entry point: real 5s/15s retry backoff.
#[allow(clippy::too_many_arguments)]
pub async fn run_collection<S, R, G, U>(
    campaign: &Campaign,
    monthly_cap: f64,
    now: DateTime<Utc>,
    scraper: &S,
    raw_posts: &R,
    inference: &InferenceClient<G, U>,
    progress_cb: impl FnMut(CollectionProgress),
) -> Result<CollectionResult>
where
    S: PostScraper,
    R: RawPostRepository,
    G: LlmGateway,
    U: UsageRepository,
{
    run_collection_with_backoffs(campaign, monthly_cap, now, scraper, raw_posts, inference, &RETRY_BACKOFFS, progress_cb).await
}

#[allow(clippy::too_many_arguments)]
async fn collect_subreddit<S, R, G, U>(
    campaign: &Campaign,
    monthly_cap: f64,
    now: DateTime<Utc>,
    subreddit: &str,
    scraper: &S,
    raw_posts: &R,
    inference: &InferenceClient<G, U>,
    backoffs: &[Duration],
    progress_cb: &mut impl FnMut(CollectionProgress),
    total_steps: usize,
    total_scraped: &mut usize,
    total_filtered: &mut usize,
    total_classified: &mut usize,
) -> Result<()>
where
    S: PostScraper,
    R: RawPostRepository,
    G: LlmGateway,
    U: UsageRepository,
{
    let scraped_posts = scrape_with_retry(scraper, subreddit, backoffs).await?;
    *total_scraped += scraped_posts.len();
    progress_cb(CollectionProgress {
        current_step: "scrape",
        total_steps,
        current_subreddit: subreddit.to_string(),
        scraped: *total_scraped,
        filtered: *total_filtered,
        classified: *total_classified,
        warnings: Vec::new(),
    });

    let scored = conditioner_filter::filter(scraped_posts, &campaign.keywords);
    *total_filtered += scored.len();
    progress_cb(CollectionProgress {
        current_step: "filter",
        total_steps,
        current_subreddit: subreddit.to_string(),
        scraped: *total_scraped,
        filtered: *total_filtered,
        classified: *total_classified,
        warnings: Vec::new(),
    });

    let sample_indices = sampling::top_tenth_percent_indices(&scored);
    let sample_indices: std::collections::HashSet<usize> = sample_indices.into_iter().collect();

    for (i, scored_post) in scored.into_iter().enumerate() {
        let is_sampled = sample_indices.contains(&i);
        let archetype = if is_sampled {
            let a = classify::classify_archetype(
                inference,
                campaign.owner,
                campaign.id,
                monthly_cap,
                now,
                &scored_post.post.title,
                &scored_post.post.body,
            )
            .await;
            *total_classified += 1;
            a
        } else {
            conditioner_types::Archetype::Unclassified
        };

        let post = build_raw_post(campaign, subreddit, scored_post, archetype, now);
        raw_posts.upsert(post).await?;
    }

    progress_cb(CollectionProgress {
        current_step: "classify",
        total_steps,
        current_subreddit: subreddit.to_string(),
        scraped: *total_scraped,
        filtered: *total_filtered,
        classified: *total_classified,
        warnings: Vec::new(),
    });

    Ok(())
}

async fn scrape_with_retry<S: PostScraper>(
    scraper: &S,
    subreddit: &str,
    backoffs: &[Duration],
) -> Result<Vec<conditioner_types::ScrapedPost>> {
    let mut last_reason = String::new();
    for (attempt, backoff) in std::iter::once(None).chain(backoffs.iter().map(Some)).enumerate() {
        if let Some(delay) = backoff {
            tokio::time::sleep(*delay).await;
        }
        match scraper.scrape(subreddit).await {
            Ok(posts) => return Ok(posts),
            Err(err) => {
                tracing::warn!(subreddit, attempt, error = %err, "scrape attempt failed");
                last_reason = err.to_string();
            }
        }
    }
    Err(ConditionerError::ScraperFailure {
        subreddit: subreddit.to_string(),
        reason: last_reason,
    })
}

fn build_raw_post(
    campaign: &Campaign,
    subreddit: &str,
    scored_post: conditioner_filter::ScoredPost,
    archetype: conditioner_types::Archetype,
    now: DateTime<Utc>,
) -> RawPost {
    let post = scored_post.post;
    let text = format!("{}\n{}", post.title, post.body);
    let rhythm = rhythm_metadata(&text);
    let score = success_score(&SuccessInputs {
        text: &text,
        rhythm_metadata: &rhythm,
        upvote_ratio: post.upvote_ratio,
        comment_count: post.comment_count,
    });

    RawPost {
        id: RawPostId::new(),
        campaign_id: campaign.id,
        owner: campaign.owner,
        subreddit: subreddit.to_string(),
        source_post_id: post.source_post_id,
        source_url: post.url,
        author: post.author,
        author_karma: post.author_karma,
        title: post.title,
        raw_text: post.body,
        comment_count: post.comment_count,
        upvote_ratio: post.upvote_ratio,
        archetype,
        success_score: score,
        is_ai_processed: archetype != conditioner_types::Archetype::Unclassified,
        rhythm_metadata: rhythm,
        source_created_at: post.created_at,
        collected_at: now,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;
    use conditioner_inference::{GatewayError, GatewayResponse, InferenceClient, LlmGateway, ModelRegistry};
    use conditioner_store::InMemoryStore;
    use conditioner_types::{CampaignStatus, Owner, ScrapedPost};

    use super::*;

    struct FakeScraper {
        posts_by_subreddit: std::collections::HashMap<String, Vec<ScrapedPost>>,
        fail_until: Mutex<std::collections::HashMap<String, u32>>,
    }

    #[async_trait]
    impl PostScraper for FakeScraper {
        async fn scrape(&self, subreddit: &str) -> Result<Vec<ScrapedPost>> {
            let mut fail_until = self.fail_until.lock().unwrap();
            let remaining = fail_until.entry(subreddit.to_string()).or_insert(0);
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ConditionerError::ScraperFailure {
                    subreddit: subreddit.to_string(),
                    reason: "transport timeout".to_string(),
                });
            }
            Ok(self.posts_by_subreddit.get(subreddit).cloned().unwrap_or_default())
        }
    }

    struct AlwaysSucceedGateway;

    #[async_trait]
    impl LlmGateway for AlwaysSucceedGateway {
        async fn complete(
            &self,
            _model: &str,
            _system_prompt: Option<&str>,
            _user_prompt: &str,
            _max_tokens: u32,
            _temperature: f32,
        ) -> std::result::Result<GatewayResponse, GatewayError> {
            Ok(GatewayResponse {
                text: "\"journey\"".to_string(),
                token_count: 20,
            })
        }
    }

    fn long_post(id: &str, upvote_ratio: f64) -> ScrapedPost {
        ScrapedPost {
            source_post_id: id.to_string(),
            title: "a reasonably descriptive title".to_string(),
            body: "a".repeat(120),
            url: format!("https://reddit.com/r/test/{id}"),
            author: "someone".to_string(),
            author_karma: 500,
            score: 10,
            upvote_ratio,
            comment_count: 3,
            created_at: Utc::now(),
        }
    }

    fn campaign(owner: Owner, subreddits: Vec<&str>) -> Campaign {
        Campaign {
            id: conditioner_types::CampaignId::new(),
            owner,
            name: "campaign".to_string(),
            product_context: "ctx".to_string(),
            product_url: None,
            keywords: vec!["thing".to_string()],
            target_subreddits: subreddits.into_iter().map(str::to_string).collect(),
            status: CampaignStatus::Active,
        }
    }

    #[tokio::test]
    async fn invalid_subreddit_name_rejects_before_scraping() {
        let store = InMemoryStore::new();
        let scraper = FakeScraper {
            posts_by_subreddit: std::collections::HashMap::new(),
            fail_until: Mutex::new(std::collections::HashMap::new()),
        };
        let inference = InferenceClient::new(std::sync::Arc::new(AlwaysSucceedGateway), std::sync::Arc::new(InMemoryStore::new()), ModelRegistry::default());
        let campaign = campaign(Owner::new(), vec!["r/rust"]);

        let err = run_collection_with_backoffs(&campaign, 1000.0, Utc::now(), &scraper, &store, &inference, &[], |_| {})
            .await
            .unwrap_err();

        assert!(matches!(err, ConditionerError::Validation { .. }));
    }

    #[tokio::test]
    async fn successful_collection_persists_posts_and_samples_top_tenth() {
        let store = InMemoryStore::new();
        let mut posts = std::collections::HashMap::new();
        posts.insert("rust".to_string(), (0..10).map(|i| long_post(&i.to_string(), 0.9)).collect());
        let scraper = FakeScraper {
            posts_by_subreddit: posts,
            fail_until: Mutex::new(std::collections::HashMap::new()),
        };
        let inference = InferenceClient::new(std::sync::Arc::new(AlwaysSucceedGateway), std::sync::Arc::new(InMemoryStore::new()), ModelRegistry::default());
        let campaign = campaign(Owner::new(), vec!["rust"]);

        let result = run_collection_with_backoffs(&campaign, 1000.0, Utc::now(), &scraper, &store, &inference, &[], |_| {})
            .await
            .unwrap();

        assert_eq!(result.status, CollectionStatus::Success);
        assert_eq!(result.scraped, 10);
        assert_eq!(result.filtered, 10);
        assert_eq!(result.classified, 1);
        assert!(result.errors.is_empty());

        let counts = RawPostRepository::counts_by_subreddit(&store, campaign.id).await.unwrap();
        assert_eq!(counts.get("rust"), Some(&10));
    }

    #[tokio::test]
    async fn transient_scrape_failure_recovers_via_retry() {
        let store = InMemoryStore::new();
        let mut posts = std::collections::HashMap::new();
        posts.insert("rust".to_string(), vec![long_post("1", 0.9)]);
        let mut fail_until = std::collections::HashMap::new();
        fail_until.insert("rust".to_string(), 1);
        let scraper = FakeScraper {
            posts_by_subreddit: posts,
            fail_until: Mutex::new(fail_until),
        };
        let inference = InferenceClient::new(std::sync::Arc::new(AlwaysSucceedGateway), std::sync::Arc::new(InMemoryStore::new()), ModelRegistry::default());
        let campaign = campaign(Owner::new(), vec!["rust"]);

        let result = run_collection_with_backoffs(&campaign, 1000.0, Utc::now(), &scraper, &store, &inference, &[Duration::from_millis(1)], |_| {})
            .await
            .unwrap();

        assert_eq!(result.status, CollectionStatus::Success);
        assert_eq!(result.scraped, 1);
    }

    #[tokio::test]
    async fn permanent_scrape_failure_is_isolated_to_one_subreddit() {
        let store = InMemoryStore::new();
        let mut posts = std::collections::HashMap::new();
        posts.insert("python".to_string(), (0..10).map(|i| long_post(&format!("p{i}"), 0.9)).collect());
        let mut fail_until = std::collections::HashMap::new();
        fail_until.insert("rust".to_string(), 99);
        let scraper = FakeScraper {
            posts_by_subreddit: posts,
            fail_until: Mutex::new(fail_until),
        };
        let inference = InferenceClient::new(std::sync::Arc::new(AlwaysSucceedGateway), std::sync::Arc::new(InMemoryStore::new()), ModelRegistry::default());
        let campaign = campaign(Owner::new(), vec!["rust", "python"]);

        let result = run_collection_with_backoffs(&campaign, 1000.0, Utc::now(), &scraper, &store, &inference, &[Duration::from_millis(1), Duration::from_millis(1)], |_| {})
            .await
            .unwrap();

        assert_eq!(result.status, CollectionStatus::Partial);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].subreddit, "rust");
        assert_eq!(result.scraped, 10);
    }

    #[tokio::test]
    async fn zero_posts_across_all_subreddits_is_failure() {
        let store = InMemoryStore::new();
        let scraper = FakeScraper {
            posts_by_subreddit: std::collections::HashMap::new(),
            fail_until: Mutex::new(std::collections::HashMap::new()),
        };
        let inference = InferenceClient::new(std::sync::Arc::new(AlwaysSucceedGateway), std::sync::Arc::new(InMemoryStore::new()), ModelRegistry::default());
        let campaign = campaign(Owner::new(), vec!["rust"]);

        let result = run_collection_with_backoffs(&campaign, 1000.0, Utc::now(), &scraper, &store, &inference, &[], |_| {})
            .await
            .unwrap();

        assert_eq!(result.status, CollectionStatus::Failure);
    }

    #[tokio::test]
    async fn running_collection_twice_produces_no_duplicate_posts() {
        let store = InMemoryStore::new();
        let mut posts = std::collections::HashMap::new();
        posts.insert("rust".to_string(), (0..10).map(|i| long_post(&i.to_string(), 0.9)).collect());
        let scraper = FakeScraper {
            posts_by_subreddit: posts,
            fail_until: Mutex::new(std::collections::HashMap::new()),
        };
        let inference = InferenceClient::new(std::sync::Arc::new(AlwaysSucceedGateway), std::sync::Arc::new(InMemoryStore::new()), ModelRegistry::default());
        let campaign = campaign(Owner::new(), vec!["rust"]);

        run_collection_with_backoffs(&campaign, 1000.0, Utc::now(), &scraper, &store, &inference, &[], |_| {}).await.unwrap();
        run_collection_with_backoffs(&campaign, 1000.0, Utc::now(), &scraper, &store, &inference, &[], |_| {}).await.unwrap();

        let counts = RawPostRepository::counts_by_subreddit(&store, campaign.id).await.unwrap();
        assert_eq!(counts.get("rust"), Some(&10));
    }
}
