use std::collections::HashMap;

use conditioner_types::TaskType;

/// Per-task routing: which model is tried first, which model is the
/// documented fallback, and the sampling defaults for that task (§4.1).
#[derive(Debug, Clone)]
pub struct ModelRoute {
    pub primary_model: String,
    pub fallback_model: String,
    pub default_max_tokens: u32,
    pub default_temperature: f32,
    pub primary_cost_per_1k_tokens: f64,
    pub fallback_cost_per_1k_tokens: f64,
    /// Whether the response must parse as the task's structured format
    /// (JSON); free-text tasks like draft/style-guide generation don't.
    pub structured: bool,
}

/// `HashMap<TaskType, ModelRoute>`, built from task-appropriate defaults but
/// overridable per deployment (cheaper/faster models for classification,
/// a stronger model for drafting).
#[derive(Debug, Clone)]
pub struct ModelRegistry(HashMap<TaskType, ModelRoute>);

impl ModelRegistry {
    #[must_use]
    pub fn new(routes: HashMap<TaskType, ModelRoute>) -> Self {
        Self(routes)
    }

    #[must_use]
    pub fn route(&self, task_type: TaskType) -> Option<&ModelRoute> {
        self.0.get(&task_type)
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        let mut routes = HashMap::new();
        routes.insert(
            TaskType::ClassifyArchetype,
            ModelRoute {
                primary_model: "claude-3-5-haiku-latest".into(),
                fallback_model: "claude-3-5-sonnet-latest".into(),
                default_max_tokens: 256,
                default_temperature: 0.0,
                primary_cost_per_1k_tokens: 0.0008,
                fallback_cost_per_1k_tokens: 0.003,
                structured: true,
            },
        );
        routes.insert(
            TaskType::ExtractPatterns,
            ModelRoute {
                primary_model: "claude-3-5-sonnet-latest".into(),
                fallback_model: "claude-3-5-haiku-latest".into(),
                default_max_tokens: 1024,
                default_temperature: 0.1,
                primary_cost_per_1k_tokens: 0.003,
                fallback_cost_per_1k_tokens: 0.0008,
                structured: true,
            },
        );
        routes.insert(
            TaskType::ScorePost,
            ModelRoute {
                primary_model: "claude-3-5-haiku-latest".into(),
                fallback_model: "claude-3-5-sonnet-latest".into(),
                default_max_tokens: 128,
                default_temperature: 0.0,
                primary_cost_per_1k_tokens: 0.0008,
                fallback_cost_per_1k_tokens: 0.003,
                structured: true,
            },
        );
        routes.insert(
            TaskType::GenerateDraft,
            ModelRoute {
                primary_model: "claude-3-5-sonnet-latest".into(),
                fallback_model: "claude-3-5-haiku-latest".into(),
                default_max_tokens: 1024,
                default_temperature: 0.8,
                primary_cost_per_1k_tokens: 0.003,
                fallback_cost_per_1k_tokens: 0.0008,
                structured: false,
            },
        );
        routes.insert(
            TaskType::StyleGuide,
            ModelRoute {
                primary_model: "claude-3-5-sonnet-latest".into(),
                fallback_model: "claude-3-5-haiku-latest".into(),
                default_max_tokens: 512,
                default_temperature: 0.3,
                primary_cost_per_1k_tokens: 0.003,
                fallback_cost_per_1k_tokens: 0.0008,
                structured: false,
            },
        );
        Self(routes)
    }
}
