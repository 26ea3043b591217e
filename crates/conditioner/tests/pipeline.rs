use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use conditioner_events::ProgressSnapshot;
use conditioner_inference::ModelRegistry;
use conditioner_shadow::{HttpCheckResult, PostStats};
use conditioner_store::InMemoryStore;
use conditioner_testing::{sample_campaign_spec, FakeLlmGateway, FakePostScraper, FakePostStatsFetcher, FakePostVisibilityChecker};
use conditioner_types::{Archetype, Owner, ScrapedPost, TaskState};
use conditioner::{Conditioner, Config};

fn post(id: &str) -> ScrapedPost {
    ScrapedPost {
        source_post_id: id.to_string(),
        title: "a reasonably descriptive title about async rust".to_string(),
        body: "a".repeat(150),
        url: format!("https://reddit.com/r/rust/{id}"),
        author: "someone".to_string(),
        author_karma: 500,
        score: 20,
        upvote_ratio: 0.92,
        comment_count: 5,
        created_at: Utc::now(),
    }
}

async fn wait_for_terminal(mut rx: tokio::sync::watch::Receiver<ProgressSnapshot>) -> ProgressSnapshot {
    loop {
        let snapshot = rx.borrow_and_update().clone();
        if matches!(snapshot.state, TaskState::Success | TaskState::Failure) {
            return snapshot;
        }
        rx.changed().await.unwrap();
    }
}

/// End to end: create a campaign, collect posts, let analysis auto-enqueue,
/// generate a draft, register it for shadow-checking, and run both
/// scheduler-driven ticks — exercising every external interface of §6.
#[tokio::test]
async fn full_pipeline_from_campaign_creation_through_audit() {
    let mut posts_by_subreddit = HashMap::new();
    posts_by_subreddit.insert("rust".to_string(), (0..10).map(|i| post(&i.to_string())).collect());
    posts_by_subreddit.insert("programming".to_string(), (0..10).map(|i| post(&format!("p{i}"))).collect());

    let conditioner = Conditioner::new(
        InMemoryStore::new(),
        FakeLlmGateway::always_succeeding("\"journey\""),
        ModelRegistry::default(),
        FakePostScraper::new(posts_by_subreddit),
        FakePostVisibilityChecker { authenticated: HttpCheckResult::Visible, anonymous: HttpCheckResult::Visible },
        FakePostStatsFetcher(PostStats { upvote_ratio: 0.9, comment_count: 12 }),
        Config::default(),
    );

    let owner = Owner::new();
    let campaign = conditioner.create_campaign(owner, sample_campaign_spec()).await.unwrap();

    let collection_task = conditioner.start_collection(owner, campaign.id).await.unwrap();
    let collection_rx = conditioner.subscribe_task_progress(collection_task).unwrap();
    let collection_result = wait_for_terminal(collection_rx).await;
    assert_eq!(collection_result.state, TaskState::Success);
    assert!(collection_result.meta.scraped.unwrap() > 0);

    // Analysis was auto-enqueued by the collection task; poll until the
    // community profile it creates becomes visible.
    let profile = loop {
        if let Some(profile) = conditioner.get_community_profile(campaign.id, "rust").await.unwrap() {
            break profile;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    };
    assert!(profile.isc_score >= 0.0);

    let draft_task = conditioner.generate_draft(owner, campaign.id, "rust".to_string(), Archetype::Journey, None).await.unwrap();
    let draft_rx = conditioner.subscribe_task_progress(draft_task).unwrap();
    let draft_result = wait_for_terminal(draft_rx).await;
    assert_eq!(draft_result.state, TaskState::Success);

    let entry = conditioner
        .register_post(owner, None, campaign.id, "https://reddit.com/r/rust/mypost".to_string(), None)
        .await
        .unwrap();
    assert_eq!(entry.owner, owner);
    assert_eq!(entry.campaign_id, campaign.id);

    // `due_for_check` treats a never-checked entry as due from `submitted_at`,
    // so the freshly-registered post is checked on this very first tick.
    let monitor_summary = conditioner.run_monitor_tick(|_entry| {}).await.unwrap();
    assert_eq!(monitor_summary.checked, 1);

    let audit_summary = conditioner.run_audit_tick().await.unwrap();
    assert_eq!(audit_summary.audited, 0, "entry isn't past the audit boundary yet");
}

/// §5: a second `start_collection` for the same campaign while one is still
/// running is rejected, not queued.
#[tokio::test]
async fn concurrent_collection_for_same_campaign_is_rejected() {
    let mut posts_by_subreddit = HashMap::new();
    posts_by_subreddit.insert("rust".to_string(), vec![post("0")]);

    let conditioner = Arc::new(Conditioner::new(
        InMemoryStore::new(),
        FakeLlmGateway::always_succeeding("\"journey\""),
        ModelRegistry::default(),
        FakePostScraper::new(posts_by_subreddit),
        FakePostVisibilityChecker { authenticated: HttpCheckResult::Visible, anonymous: HttpCheckResult::Visible },
        FakePostStatsFetcher(PostStats { upvote_ratio: 0.9, comment_count: 12 }),
        Config::default(),
    ));

    let owner = Owner::new();
    let campaign = conditioner.create_campaign(owner, sample_campaign_spec()).await.unwrap();

    let first = conditioner.start_collection(owner, campaign.id).await.unwrap();
    let second = conditioner.start_collection(owner, campaign.id).await;
    assert!(second.is_err());

    let rx = conditioner.subscribe_task_progress(first).unwrap();
    wait_for_terminal(rx).await;
}
