use thiserror::Error;

/// Error taxonomy (§7). Each kind is surfaced to callers with a stable,
/// machine-readable variant rather than an opaque string so API boundaries
/// can map it 1:1 to an error code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConditionerError {
    #[error("validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    #[error("{resource} already exists: {key}")]
    AlreadyExists { resource: String, key: String },

    #[error("plan limit reached: {limit}")]
    PlanLimitReached { limit: String },

    #[error("budget exhausted for owner {owner}: used {used:.4} + projected {projected:.4} > cap {cap:.4}")]
    BudgetExhausted {
        owner: String,
        used: f64,
        projected: f64,
        cap: f64,
    },

    #[error("collection already in progress for campaign {campaign_id}")]
    CollectionInProgress { campaign_id: String },

    #[error("inference failed: primary ({primary}) and fallback ({fallback}) both failed: {reason}")]
    InferenceFailure {
        primary: String,
        fallback: String,
        reason: String,
    },

    #[error("model returned a malformed response for task {task_type}: {reason}")]
    MalformedResponse { task_type: String, reason: String },

    #[error("scraper failed for {subreddit}: {reason}")]
    ScraperFailure { subreddit: String, reason: String },

    #[error("persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("task cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, ConditionerError>;
