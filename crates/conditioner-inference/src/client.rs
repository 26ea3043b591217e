use std::sync::Arc;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use conditioner_types::{
    CampaignId, ConditionerError, Owner, Result, TaskType, UsageAction, UsageRecord,
    UsageRecordId, UsageRepository,
};

use crate::gateway::{GatewayError, LlmGateway};
use crate::registry::ModelRegistry;

#[derive(Debug, Clone)]
pub struct InferenceOutcome {
    pub text: String,
    pub model_used: String,
    pub token_count: u64,
    pub cost: f64,
}

fn task_to_usage_action(task_type: TaskType) -> UsageAction {
    match task_type {
        TaskType::ClassifyArchetype | TaskType::ExtractPatterns | TaskType::ScorePost => {
            UsageAction::Analyze
        }
        TaskType::GenerateDraft | TaskType::StyleGuide => UsageAction::Generate,
    }
}

/// First instant of the calendar month (UTC) containing `now`, and the first
/// instant of the following month — the billing period boundaries (§2).
fn billing_period(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc
        .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .expect("first of month is unambiguous");
    let (next_year, next_month) = if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };
    let end = Utc
        .with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0)
        .single()
        .expect("first of month is unambiguous");
    (start, end)
}

/// §4.1 budget predicate: `cap == 0` always blocks (expired plans); otherwise
/// blocks when this month's spend plus the projected call would exceed cap.
#[must_use]
pub fn can_proceed(monthly_cap: f64, used: f64, projected_cost: f64) -> bool {
    if monthly_cap == 0.0 {
        return false;
    }
    used + projected_cost <= monthly_cap
}

/// Task-typed model router: one outbound call per task, at most one
/// fallback, with cost accounting against the owner's monthly cap (§4.1).
pub struct InferenceClient<G: LlmGateway, U: UsageRepository> {
    gateway: Arc<G>,
    usage: Arc<U>,
    registry: ModelRegistry,
}

impl<G: LlmGateway, U: UsageRepository> InferenceClient<G, U> {
    pub fn new(gateway: Arc<G>, usage: Arc<U>, registry: ModelRegistry) -> Self {
        Self {
            gateway,
            usage,
            registry,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn call(
        &self,
        task_type: TaskType,
        owner: Owner,
        campaign_id: Option<CampaignId>,
        monthly_cap: f64,
        system_prompt: Option<&str>,
        user_prompt: &str,
        now: DateTime<Utc>,
    ) -> Result<InferenceOutcome> {
        let route = self.registry.route(task_type).ok_or_else(|| ConditionerError::Validation {
            field: "task_type".into(),
            reason: format!("no model route configured for {task_type}"),
        })?;

        let projected_cost =
            f64::from(route.default_max_tokens) / 1000.0 * route.primary_cost_per_1k_tokens;
        let (period_start, period_end) = billing_period(now);
        let used = self.usage.sum_cost_in_period(owner, period_start, period_end).await?;
        if !can_proceed(monthly_cap, used, projected_cost) {
            return Err(ConditionerError::BudgetExhausted {
                owner: owner.to_string(),
                used,
                projected: projected_cost,
                cap: monthly_cap,
            });
        }

        let primary = self
            .gateway
            .complete(
                &route.primary_model,
                system_prompt,
                user_prompt,
                route.default_max_tokens,
                route.default_temperature,
            )
            .await;

        let (text, token_count, model_used, cost_per_1k) = match primary {
            Ok(resp) if !route.structured || is_valid_json(&resp.text) => {
                (resp.text, resp.token_count, route.primary_model.clone(), route.primary_cost_per_1k_tokens)
            }
            primary_outcome => {
                let primary_reason = match &primary_outcome {
                    Ok(_) => "primary response failed structured-output validation".to_string(),
                    Err(GatewayError::Transport { reason, .. }) => reason.clone(),
                };
                let fallback = self
                    .gateway
                    .complete(
                        &route.fallback_model,
                        system_prompt,
                        user_prompt,
                        route.default_max_tokens,
                        route.default_temperature,
                    )
                    .await;
                match fallback {
                    Err(GatewayError::Transport { reason, .. }) => {
                        return Err(ConditionerError::InferenceFailure {
                            primary: route.primary_model.clone(),
                            fallback: route.fallback_model.clone(),
                            reason: format!("primary: {primary_reason}; fallback: {reason}"),
                        });
                    }
                    Ok(resp) if route.structured && !is_valid_json(&resp.text) => {
                        return Err(ConditionerError::MalformedResponse {
                            task_type: task_type.to_string(),
                            reason: "fallback response is not valid JSON".into(),
                        });
                    }
                    Ok(resp) => (
                        resp.text,
                        resp.token_count,
                        route.fallback_model.clone(),
                        route.fallback_cost_per_1k_tokens,
                    ),
                }
            }
        };

        let cost = token_count as f64 / 1000.0 * cost_per_1k;
        self.usage
            .append(UsageRecord {
                id: UsageRecordId::new(),
                owner,
                action: task_to_usage_action(task_type),
                campaign_id,
                token_count,
                cost,
                occurred_at: now,
            })
            .await?;

        Ok(InferenceOutcome {
            text,
            model_used,
            token_count,
            cost,
        })
    }
}

fn is_valid_json(text: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(text.trim()).is_ok()
}
