//! Thin demo binary for the facade crate. Stands in for the HTTP surface
//! that is explicitly out of scope: everything here is driven off
//! `conditioner-store::InMemoryStore` and the scriptable fakes from
//! `conditioner-testing`, so a single process can walk the whole
//! campaign -> collection -> analysis -> draft -> shadow-check pipeline
//! without any real network collaborator.

use std::collections::HashMap;

use anyhow::Result;
use clap::{Parser, Subcommand};
use conditioner::{Conditioner, Config};
use conditioner_inference::ModelRegistry;
use conditioner_shadow::{HttpCheckResult, PostStats};
use conditioner_store::InMemoryStore;
use conditioner_testing::{sample_campaign_spec, FakeLlmGateway, FakePostScraper, FakePostStatsFetcher, FakePostVisibilityChecker};
use conditioner_types::{Archetype, Owner, ScrapedPost, TaskState};

#[derive(Parser)]
#[command(name = "conditioner")]
#[command(about = "Demo driver for the content conditioning core", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full campaign -> collection -> analysis -> draft pipeline
    /// against a scripted, in-memory collaborator set and print progress.
    Demo {
        /// Subreddit to generate a draft for once analysis completes.
        #[arg(long, default_value = "rust")]
        subreddit: String,
    },
}

fn sample_post(id: &str) -> ScrapedPost {
    ScrapedPost {
        source_post_id: id.to_string(),
        title: "spent way too long debugging an async deadlock today".to_string(),
        body: "a".repeat(200),
        url: format!("https://reddit.com/r/rust/{id}"),
        author: "someone".to_string(),
        author_karma: 800,
        score: 42,
        upvote_ratio: 0.94,
        comment_count: 11,
        created_at: chrono::Utc::now(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Demo { subreddit } => run_demo(&subreddit).await,
    }
}

async fn run_demo(subreddit: &str) -> Result<()> {
    let mut posts_by_subreddit = HashMap::new();
    posts_by_subreddit.insert(subreddit.to_string(), (0..10).map(|i| sample_post(&i.to_string())).collect());

    let conditioner = Conditioner::new(
        InMemoryStore::new(),
        FakeLlmGateway::always_succeeding("\"journey\""),
        ModelRegistry::default(),
        FakePostScraper::new(posts_by_subreddit),
        FakePostVisibilityChecker { authenticated: HttpCheckResult::Visible, anonymous: HttpCheckResult::Visible },
        FakePostStatsFetcher(PostStats { upvote_ratio: 0.9, comment_count: 20 }),
        Config::default(),
    );

    let owner = Owner::new();
    let mut spec = sample_campaign_spec();
    spec.target_subreddits = vec![subreddit.to_string()];
    let campaign = conditioner.create_campaign(owner, spec).await?;
    println!("created campaign {} for owner {owner}", campaign.id);

    let collection_task = conditioner.start_collection(owner, campaign.id).await?;
    let mut rx = conditioner.subscribe_task_progress(collection_task)?;
    loop {
        let snapshot = rx.borrow_and_update().clone();
        println!("collection: {:?} {:?}", snapshot.state, snapshot.meta.current_step);
        if matches!(snapshot.state, TaskState::Success | TaskState::Failure) {
            break;
        }
        rx.changed().await?;
    }

    println!("waiting for auto-enqueued analysis to populate the community profile...");
    let profile = loop {
        if let Some(profile) = conditioner.get_community_profile(campaign.id, subreddit).await? {
            break profile;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    };
    println!("community profile for r/{subreddit}: isc_score={:.2} sample_size={}", profile.isc_score, profile.sample_size);

    let draft_task = conditioner.generate_draft(owner, campaign.id, subreddit.to_string(), Archetype::Journey, None).await?;
    let mut rx = conditioner.subscribe_task_progress(draft_task)?;
    loop {
        let snapshot = rx.borrow_and_update().clone();
        println!("draft: {:?} {:?}", snapshot.state, snapshot.meta.current_step);
        if matches!(snapshot.state, TaskState::Success | TaskState::Failure) {
            break;
        }
        rx.changed().await?;
    }

    let entry = conditioner
        .register_post(owner, None, campaign.id, format!("https://reddit.com/r/{subreddit}/demo"), None)
        .await?;
    println!("registered shadow entry {} (check interval {}h)", entry.id, entry.check_interval_hours);

    let monitor_summary = conditioner.run_monitor_tick(|e| println!("shadowban detected for {}", e.post_url)).await?;
    println!("monitor tick: {monitor_summary:?}");

    let audit_summary = conditioner.run_audit_tick().await?;
    println!("audit tick: {audit_summary:?}");

    Ok(())
}
