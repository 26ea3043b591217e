use std::sync::Arc;

use chrono::Utc;
use conditioner_events::{EventBus, ProgressMeta};
use conditioner_inference::{InferenceClient, LlmGateway, ModelRegistry};
use conditioner_shadow::{AuditSummary, CheckSummary, PostStatsFetcher, PostVisibilityChecker};
use conditioner_types::{
    AccountStatus, Archetype, Campaign, CampaignId, CampaignRepository, CampaignSpec, CampaignStatus,
    CommunityProfile, CommunityProfileRepository, ConditionerError, DraftId, DraftRepository, Owner, Result,
    ShadowEntry, ShadowEntryId, ShadowEntryRepository, ShadowStatus, TaskId, TaskState,
};
use dashmap::{DashMap, DashSet};

use crate::config::Config;

const MIN_KEYWORDS: usize = 5;
const MAX_KEYWORDS: usize = 15;

/// The external-facing API (§6), wiring every component crate together
/// behind a scheduler-agnostic interface. Long-running operations
/// (collection, analysis, generation) are spawned as `tokio` tasks reporting
/// through the shared [`EventBus`]; request-handler-tier operations
/// (`create_campaign`, `register_post`, `get_community_profile`) run inline.
///
/// Generic over the store (which must implement every repository trait, the
/// way `InMemoryStore`/`SqliteStore` do) and every external collaborator
/// trait, so callers plug in real transports without this crate depending
/// on them.
pub struct Conditioner<St, G, S, V, F>
where
    St: CampaignRepository
        + conditioner_types::RawPostRepository
        + CommunityProfileRepository
        + DraftRepository
        + ShadowEntryRepository
        + conditioner_types::BlacklistRepository
        + conditioner_types::UsageRepository
        + 'static,
    G: LlmGateway + 'static,
    S: conditioner_collection::PostScraper + 'static,
    V: PostVisibilityChecker + 'static,
    F: PostStatsFetcher + 'static,
{
    store: Arc<St>,
    inference: Arc<InferenceClient<G, St>>,
    scraper: Arc<S>,
    checker: Arc<V>,
    stats: Arc<F>,
    events: Arc<EventBus>,
    active_collections: Arc<DashSet<CampaignId>>,
    account_status_cache: Arc<DashMap<Owner, AccountStatus>>,
    post_ordinals: Arc<DashMap<Owner, u32>>,
    config: Config,
}

impl<St, G, S, V, F> Conditioner<St, G, S, V, F>
where
    St: CampaignRepository
        + conditioner_types::RawPostRepository
        + CommunityProfileRepository
        + DraftRepository
        + ShadowEntryRepository
        + conditioner_types::BlacklistRepository
        + conditioner_types::UsageRepository
        + Send
        + Sync
        + 'static,
    G: LlmGateway + Send + Sync + 'static,
    S: conditioner_collection::PostScraper + Send + Sync + 'static,
    V: PostVisibilityChecker + Send + Sync + 'static,
    F: PostStatsFetcher + Send + Sync + 'static,
{
    pub fn new(store: St, gateway: G, registry: ModelRegistry, scraper: S, checker: V, stats: F, config: Config) -> Self {
        let store = Arc::new(store);
        let inference = Arc::new(InferenceClient::new(Arc::new(gateway), store.clone(), registry));
        Self {
            store,
            inference,
            scraper: Arc::new(scraper),
            checker: Arc::new(checker),
            stats: Arc::new(stats),
            events: Arc::new(EventBus::new()),
            active_collections: Arc::new(DashSet::new()),
            account_status_cache: Arc::new(DashMap::new()),
            post_ordinals: Arc::new(DashMap::new()),
            config,
        }
    }

    /// §7 `ValidationError`: `keywords` out of `[5, 15]`, or `target_subreddits` empty.
    pub async fn create_campaign(&self, owner: Owner, spec: CampaignSpec) -> Result<Campaign> {
        if !(MIN_KEYWORDS..=MAX_KEYWORDS).contains(&spec.keywords.len()) {
            return Err(ConditionerError::Validation {
                field: "keywords".to_string(),
                reason: format!("must contain between {MIN_KEYWORDS} and {MAX_KEYWORDS} keywords, got {}", spec.keywords.len()),
            });
        }
        if spec.target_subreddits.is_empty() {
            return Err(ConditionerError::Validation {
                field: "target_subreddits".to_string(),
                reason: "must name at least one subreddit".to_string(),
            });
        }

        let campaign = Campaign {
            id: CampaignId::new(),
            owner,
            name: spec.name,
            product_context: spec.product_context,
            product_url: spec.product_url,
            keywords: spec.keywords,
            target_subreddits: spec.target_subreddits,
            status: CampaignStatus::Active,
        };
        CampaignRepository::insert(&*self.store, campaign).await
    }

    /// §5 "at most one active collection per campaign": refuses to start a
    /// second collection task for a campaign with one already running.
    ///
    /// # Errors
    /// Returns [`ConditionerError::CollectionInProgress`] if a collection for
    /// `campaign_id` is already running.
    pub async fn start_collection(&self, owner: Owner, campaign_id: CampaignId) -> Result<TaskId> {
        if !self.active_collections.insert(campaign_id) {
            return Err(ConditionerError::CollectionInProgress { campaign_id: campaign_id.to_string() });
        }

        let task_id = self.events.create_task();
        let store = self.store.clone();
        let inference = self.inference.clone();
        let scraper = self.scraper.clone();
        let events = self.events.clone();
        let active_collections = self.active_collections.clone();
        let monthly_cap = self.config.monthly_cap;

        tokio::spawn(async move {
            let outcome = run_collection_task(&store, &inference, &scraper, &events, task_id, owner, campaign_id, monthly_cap).await;
            active_collections.remove(&campaign_id);
            match outcome {
                Ok(should_analyze) if should_analyze => {
                    let analysis_task_id = events.create_task();
                    tracing::info!(campaign_id = %campaign_id, analysis_task_id = %analysis_task_id, "auto-enqueued analysis after collection");
                    spawn_analysis_task(store, inference, events, analysis_task_id, owner, campaign_id, false, monthly_cap);
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(campaign_id = %campaign_id, error = %err, "collection task failed");
                    let _ = events.update_state(
                        task_id,
                        TaskState::Failure,
                        ProgressMeta { error: Some(err.to_string()), ..Default::default() },
                    );
                }
            }
        });

        Ok(task_id)
    }

    /// Auto-enqueued as `C3 → C4` when [`Self::start_collection`] finishes
    /// successfully (§2 flow), or invoked directly by a scheduler.
    pub async fn start_analysis(&self, owner: Owner, campaign_id: CampaignId, force: bool) -> Result<TaskId> {
        let task_id = self.events.create_task();
        spawn_analysis_task(self.store.clone(), self.inference.clone(), self.events.clone(), task_id, owner, campaign_id, force, self.config.monthly_cap);
        Ok(task_id)
    }

    /// §4.8: `account_status` is always explicit, never inferred from prior
    /// behavior. Since this entry point takes no `account_status` argument
    /// (§6), the facade reuses whatever was last given to
    /// [`Self::register_post`] for this owner, defaulting to `Established`
    /// for an owner never seen before.
    pub async fn generate_draft(
        &self,
        owner: Owner,
        campaign_id: CampaignId,
        subreddit: String,
        archetype: Archetype,
        user_context: Option<String>,
    ) -> Result<TaskId> {
        let task_id = self.events.create_task();
        let store = self.store.clone();
        let inference = self.inference.clone();
        let events = self.events.clone();
        let monthly_cap = self.config.monthly_cap;
        let account_status = self.account_status_cache.get(&owner).map_or(AccountStatus::Established, |s| *s);

        tokio::spawn(async move {
            let now = Utc::now();
            let result = conditioner_generator::generate(
                campaign_id,
                owner,
                &subreddit,
                archetype,
                user_context.as_deref(),
                account_status,
                monthly_cap,
                now,
                &*store,
                &*store,
                &*store,
                &inference,
                |step| {
                    let _ = events.update_state(task_id, TaskState::Progress, ProgressMeta { current_step: Some(step.to_string()), ..Default::default() });
                },
            )
            .await;

            match result {
                Ok(draft) => {
                    let _ = events.update_state(
                        task_id,
                        TaskState::Success,
                        ProgressMeta { current_step: Some(draft.id.to_string()), ..Default::default() },
                    );
                }
                Err(err) => {
                    tracing::warn!(campaign_id = %campaign_id, error = %err, "generation task failed");
                    let _ = events.update_state(task_id, TaskState::Failure, ProgressMeta { error: Some(err.to_string()), ..Default::default() });
                }
            }
        });

        Ok(task_id)
    }

    /// §3 ShadowEntry creation. `account_status`, if given, both drives this
    /// entry's check cadence and becomes the cached status
    /// [`Self::generate_draft`] will use for this owner from now on — the
    /// one place account status is allowed to change (§2 "account-status is
    /// always an explicit input, never inferred").
    pub async fn register_post(
        &self,
        owner: Owner,
        draft_id: Option<DraftId>,
        campaign_id: CampaignId,
        post_url: String,
        account_status: Option<AccountStatus>,
    ) -> Result<ShadowEntry> {
        if let Some(status) = account_status {
            self.account_status_cache.insert(owner, status);
        }
        let account_status = account_status.unwrap_or_else(|| self.account_status_cache.get(&owner).map_or(AccountStatus::Established, |s| *s));

        let mut ordinal_entry = self.post_ordinals.entry(owner).or_insert(0);
        *ordinal_entry += 1;
        let post_ordinal = *ordinal_entry;
        drop(ordinal_entry);

        let (subreddit, draft_body_id) = match draft_id {
            Some(id) => {
                let draft = DraftRepository::get(&*self.store, owner, id).await?;
                (draft.subreddit, Some(draft.id))
            }
            None => ("unknown".to_string(), None),
        };

        let isc_at_post = CommunityProfileRepository::get(&*self.store, campaign_id, &subreddit).await?.map_or(5.0, |p| p.isc_score);
        let check_interval_hours = conditioner_shadow::initial_check_interval_hours(account_status, post_ordinal);
        let now = Utc::now();

        let entry = ShadowEntry {
            id: ShadowEntryId::new(),
            draft_id: draft_body_id,
            campaign_id,
            owner,
            post_url,
            subreddit,
            status: ShadowStatus::Active,
            isc_at_post,
            account_status,
            check_interval_hours,
            total_checks: 0,
            last_check_status: None,
            last_check_at: None,
            audit_result: None,
            audit_completed_at: None,
            submitted_at: now,
            audit_due_at: now + ShadowEntry::AUDIT_BOUNDARY,
            consecutive_anonymous_misses: 0,
        };
        ShadowEntryRepository::insert(&*self.store, entry).await
    }

    pub async fn get_community_profile(&self, campaign_id: CampaignId, subreddit: &str) -> Result<Option<CommunityProfile>> {
        CommunityProfileRepository::get(&*self.store, campaign_id, subreddit).await
    }

    /// # Errors
    /// Returns [`ConditionerError::NotFound`] if `task_id` is unknown.
    pub fn subscribe_task_progress(&self, task_id: TaskId) -> Result<tokio::sync::watch::Receiver<conditioner_events::ProgressSnapshot>> {
        self.events.subscribe(task_id)
    }

    /// The external scheduler collaborator's entry point into C11 (§6).
    pub async fn run_monitor_tick(&self, on_shadowban: impl FnMut(&ShadowEntry)) -> Result<CheckSummary> {
        conditioner_shadow::run_shadow_checks(Utc::now(), &*self.store, &*self.store, &*self.store, &*self.store, &*self.checker, on_shadowban).await
    }

    /// The external scheduler collaborator's entry point into C12 (§6).
    pub async fn run_audit_tick(&self) -> Result<AuditSummary> {
        conditioner_shadow::run_audit(
            Utc::now(),
            &*self.store,
            &*self.store,
            &*self.store,
            self.config.audit_success_upvote_threshold,
            self.config.audit_rejection_upvote_threshold,
            &*self.stats,
        )
        .await
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_collection_task<St, G, S>(
    store: &Arc<St>,
    inference: &Arc<InferenceClient<G, St>>,
    scraper: &Arc<S>,
    events: &Arc<EventBus>,
    task_id: TaskId,
    owner: Owner,
    campaign_id: CampaignId,
    monthly_cap: f64,
) -> Result<bool>
where
    St: CampaignRepository + conditioner_types::RawPostRepository + conditioner_types::UsageRepository + Send + Sync + 'static,
    G: LlmGateway + Send + Sync + 'static,
    S: conditioner_collection::PostScraper + Send + Sync + 'static,
{
    let campaign = CampaignRepository::get(&**store, owner, campaign_id).await?;
    let now = Utc::now();

    let result = conditioner_collection::run_collection(&campaign, monthly_cap, now, &**scraper, &**store, inference, |p| {
        let _ = events.update_state(
            task_id,
            TaskState::Progress,
            ProgressMeta {
                current_step: Some(p.current_step.to_string()),
                total_steps: Some(p.total_steps as u32),
                current_subreddit: Some(p.current_subreddit),
                scraped: Some(p.scraped as u32),
                filtered: Some(p.filtered as u32),
                classified: Some(p.classified as u32),
                ..Default::default()
            },
        );
    })
    .await?;

    let warnings = result.errors.iter().map(|e| format!("{}: {}", e.subreddit, e.reason)).collect();
    let succeeded = result.status != conditioner_collection::CollectionStatus::Failure;
    let final_state = if succeeded { TaskState::Success } else { TaskState::Failure };
    let _ = events.update_state(
        task_id,
        final_state,
        ProgressMeta {
            scraped: Some(result.scraped as u32),
            filtered: Some(result.filtered as u32),
            classified: Some(result.classified as u32),
            warnings: Some(warnings),
            ..Default::default()
        },
    );

    Ok(succeeded)
}

/// Runs C4 analysis as its own tracked task, reporting through `events`.
/// Shared by [`Conditioner::start_analysis`] and the automatic `C3 → C4`
/// enqueue after a successful collection.
#[allow(clippy::too_many_arguments)]
fn spawn_analysis_task<St, G>(
    store: Arc<St>,
    inference: Arc<InferenceClient<G, St>>,
    events: Arc<EventBus>,
    task_id: TaskId,
    owner: Owner,
    campaign_id: CampaignId,
    force: bool,
    monthly_cap: f64,
) where
    St: CampaignRepository
        + conditioner_types::RawPostRepository
        + CommunityProfileRepository
        + conditioner_types::UsageRepository
        + Send
        + Sync
        + 'static,
    G: LlmGateway + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let now = Utc::now();
        let result = conditioner_patterns::analyze(campaign_id, owner, force, monthly_cap, now, &*store, &*store, &inference, |p| {
            let _ = events.update_state(
                task_id,
                TaskState::Progress,
                ProgressMeta { current_subreddit: Some(p.subreddit), current_step: Some(p.current_step.to_string()), ..Default::default() },
            );
        })
        .await;

        match result {
            Ok(analysis) => {
                let warnings = analysis.warnings.iter().map(|w| format!("{}: {}", w.subreddit, w.reason)).collect();
                let _ = events.update_state(
                    task_id,
                    TaskState::Success,
                    ProgressMeta { current: Some(analysis.profiles_created as u32), warnings: Some(warnings), ..Default::default() },
                );
            }
            Err(err) => {
                tracing::warn!(campaign_id = %campaign_id, error = %err, "analysis task failed");
                let _ = events.update_state(task_id, TaskState::Failure, ProgressMeta { error: Some(err.to_string()), ..Default::default() });
            }
        }
    });
}
