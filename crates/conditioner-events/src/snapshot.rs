use conditioner_types::TaskState;
use serde::{Deserialize, Serialize};

/// Per-step progress metadata (§6 "wire data for progress snapshots"). Every
/// field is optional since different task kinds populate different subsets:
/// a collection task reports `current_subreddit`/`scraped`/`filtered`, while
/// pattern extraction reports `current`/`total` over the post sample.
///
/// `current_step` has no alias — consumers must read that exact field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressMeta {
    pub current_step: Option<String>,
    pub total_steps: Option<u32>,
    pub current_subreddit: Option<String>,
    pub scraped: Option<u32>,
    pub filtered: Option<u32>,
    pub classified: Option<u32>,
    pub current: Option<u32>,
    pub total: Option<u32>,
    pub warnings: Option<Vec<String>>,
    pub error: Option<String>,
}

/// A task's state plus its latest metadata, as delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub state: TaskState,
    #[serde(flatten)]
    pub meta: ProgressMeta,
}
