use conditioner_types::CampaignSpec;

/// A `CampaignSpec` that passes §7 validation out of the box (5-15 keywords,
/// non-empty `target_subreddits`), for tests that don't care about the
/// specific values.
#[must_use]
pub fn sample_campaign_spec() -> CampaignSpec {
    CampaignSpec {
        name: "sample campaign".to_string(),
        product_context: "a developer productivity tool".to_string(),
        product_url: Some("https://example.com".to_string()),
        keywords: vec![
            "rust".to_string(),
            "async".to_string(),
            "tooling".to_string(),
            "cli".to_string(),
            "developer".to_string(),
        ],
        target_subreddits: vec!["rust".to_string(), "programming".to_string()],
    }
}
