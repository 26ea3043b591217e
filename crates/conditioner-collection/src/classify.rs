use chrono::{DateTime, Utc};
use conditioner_inference::{InferenceClient, LlmGateway};
use conditioner_types::{Archetype, CampaignId, Owner, TaskType, UsageRepository};

/// §4.3 step 4: one C1 `classify_archetype` call per sampled post. A failed
/// or malformed call degrades the post to `Unclassified` rather than
/// aborting the subreddit, mirroring how C4 degrades a missing style guide.
pub async fn classify_archetype<G, U>(
    inference: &InferenceClient<G, U>,
    owner: Owner,
    campaign_id: CampaignId,
    monthly_cap: f64,
    now: DateTime<Utc>,
    title: &str,
    body: &str,
) -> Archetype
where
    G: LlmGateway,
    U: UsageRepository,
{
    let prompt = format!("Title: {title}\nBody: {body}\n\nClassify this post as one of: journey, problem_solution, feedback.");

    match inference
        .call(TaskType::ClassifyArchetype, owner, Some(campaign_id), monthly_cap, None, &prompt, now)
        .await
    {
        Ok(outcome) => parse_archetype(&outcome.text),
        Err(err) => {
            tracing::warn!(error = %err, "archetype classification failed, leaving post unclassified");
            Archetype::Unclassified
        }
    }
}

fn parse_archetype(text: &str) -> Archetype {
    let label = serde_json::from_str::<String>(text.trim()).unwrap_or_default();
    match label.as_str() {
        "journey" => Archetype::Journey,
        "problem_solution" => Archetype::ProblemSolution,
        "feedback" => Archetype::Feedback,
        _ => Archetype::Unclassified,
    }
}

#[cfg(test)]
mod tests {
    use super::parse_archetype;
    use conditioner_types::Archetype;

    #[test]
    fn parses_known_labels() {
        assert_eq!(parse_archetype("\"journey\""), Archetype::Journey);
        assert_eq!(parse_archetype("\"problem_solution\""), Archetype::ProblemSolution);
        assert_eq!(parse_archetype("\"feedback\""), Archetype::Feedback);
    }

    #[test]
    fn unrecognized_or_malformed_labels_are_unclassified() {
        assert_eq!(parse_archetype("\"gibberish\""), Archetype::Unclassified);
        assert_eq!(parse_archetype("not json"), Archetype::Unclassified);
    }
}
