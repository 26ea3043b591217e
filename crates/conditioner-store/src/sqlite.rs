use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use conditioner_types::{
    AccountStatus, Archetype, BlacklistCategory, BlacklistEntry, BlacklistFailureType,
    BlacklistRepository, Campaign, CampaignId, CampaignRepository, CampaignStatus,
    CommunityProfile, CommunityProfileRepository, ConditionerError, DraftId, DraftRepository,
    DraftStatus, GeneratedDraft, Owner, RawPost, RawPostRepository, Result, ShadowEntry,
    ShadowEntryId, ShadowEntryRepository, ShadowStatus, UsageRecord, UsageRepository,
};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use crate::codec::{from_json, from_rfc3339, from_rfc3339_opt, to_json, to_rfc3339, to_rfc3339_opt};

fn db_err(e: rusqlite::Error) -> ConditionerError {
    ConditionerError::PersistenceFailure(e.to_string())
}

/// SQLite-backed implementation of every repository trait, one table per
/// aggregate. Migrations are inline `CREATE TABLE IF NOT EXISTS` statements
/// run at `open()` time rather than through a separate migration runner
/// (schema migration tooling is an external collaborator concern, §1).
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(db_err)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS campaigns (
                id TEXT PRIMARY KEY,
                owner TEXT NOT NULL,
                name TEXT NOT NULL,
                product_context TEXT NOT NULL,
                product_url TEXT,
                keywords TEXT NOT NULL,
                target_subreddits TEXT NOT NULL,
                status TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS raw_posts (
                id TEXT PRIMARY KEY,
                campaign_id TEXT NOT NULL,
                owner TEXT NOT NULL,
                subreddit TEXT NOT NULL,
                source_post_id TEXT NOT NULL,
                source_url TEXT NOT NULL,
                author TEXT NOT NULL,
                author_karma INTEGER NOT NULL,
                title TEXT NOT NULL,
                raw_text TEXT NOT NULL,
                comment_count INTEGER NOT NULL,
                upvote_ratio REAL NOT NULL,
                archetype TEXT NOT NULL,
                success_score REAL NOT NULL,
                is_ai_processed INTEGER NOT NULL,
                rhythm_metadata TEXT NOT NULL,
                source_created_at TEXT NOT NULL,
                collected_at TEXT NOT NULL,
                UNIQUE (campaign_id, source_post_id)
            );

            CREATE TABLE IF NOT EXISTS community_profiles (
                id TEXT PRIMARY KEY,
                campaign_id TEXT NOT NULL,
                subreddit TEXT NOT NULL,
                isc_score REAL NOT NULL,
                avg_sentence_length REAL NOT NULL,
                dominant_tone TEXT NOT NULL,
                formality_level REAL NOT NULL,
                top_success_hooks TEXT NOT NULL,
                forbidden_patterns TEXT NOT NULL,
                archetype_distribution TEXT NOT NULL,
                style_metrics TEXT NOT NULL,
                style_guide TEXT NOT NULL,
                sample_size INTEGER NOT NULL,
                last_analyzed_at TEXT NOT NULL,
                UNIQUE (campaign_id, subreddit)
            );

            CREATE TABLE IF NOT EXISTS drafts (
                id TEXT PRIMARY KEY,
                campaign_id TEXT NOT NULL,
                owner TEXT NOT NULL,
                subreddit TEXT NOT NULL,
                archetype TEXT NOT NULL,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                vulnerability_score REAL NOT NULL,
                rhythm_match_score REAL NOT NULL,
                blacklist_violations INTEGER NOT NULL,
                model_used TEXT NOT NULL,
                token_count INTEGER NOT NULL,
                token_cost REAL NOT NULL,
                status TEXT NOT NULL,
                user_edits TEXT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS shadow_entries (
                id TEXT PRIMARY KEY,
                draft_id TEXT,
                campaign_id TEXT NOT NULL,
                owner TEXT NOT NULL,
                post_url TEXT NOT NULL UNIQUE,
                subreddit TEXT NOT NULL,
                status TEXT NOT NULL,
                isc_at_post REAL NOT NULL,
                account_status TEXT NOT NULL,
                check_interval_hours INTEGER NOT NULL,
                total_checks INTEGER NOT NULL,
                last_check_status TEXT,
                last_check_at TEXT,
                audit_result TEXT,
                audit_completed_at TEXT,
                submitted_at TEXT NOT NULL,
                audit_due_at TEXT NOT NULL,
                consecutive_anonymous_misses INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS blacklist_entries (
                id TEXT PRIMARY KEY,
                subreddit TEXT,
                scope_key TEXT NOT NULL,
                campaign_id TEXT,
                forbidden_pattern TEXT NOT NULL,
                category TEXT NOT NULL,
                failure_type TEXT,
                source_shadow_id TEXT,
                confidence REAL NOT NULL,
                is_global INTEGER NOT NULL,
                is_system_detected INTEGER NOT NULL,
                added_at TEXT NOT NULL,
                UNIQUE (scope_key, forbidden_pattern)
            );

            CREATE TABLE IF NOT EXISTS usage_records (
                id TEXT PRIMARY KEY,
                owner TEXT NOT NULL,
                action TEXT NOT NULL,
                campaign_id TEXT,
                token_count INTEGER NOT NULL,
                cost REAL NOT NULL,
                occurred_at TEXT NOT NULL
            );
            ",
        )
        .map_err(db_err)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------
// Campaigns
// ---------------------------------------------------------------------

#[async_trait]
impl CampaignRepository for SqliteStore {
    async fn insert(&self, campaign: Campaign) -> Result<Campaign> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO campaigns (id, owner, name, product_context, product_url, keywords, target_subreddits, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                campaign.id.0.to_string(),
                campaign.owner.0.to_string(),
                campaign.name,
                campaign.product_context,
                campaign.product_url,
                to_json(&campaign.keywords)?,
                to_json(&campaign.target_subreddits)?,
                to_json(&campaign.status)?,
            ],
        )
        .map_err(db_err)?;
        Ok(campaign)
    }

    async fn get(&self, owner: Owner, id: CampaignId) -> Result<Campaign> {
        let conn = self.conn.lock();
        let row = conn
            .query_row(
                "SELECT id, owner, name, product_context, product_url, keywords, target_subreddits, status
                 FROM campaigns WHERE id = ?1 AND owner = ?2",
                params![id.0.to_string(), owner.0.to_string()],
                row_to_campaign,
            )
            .optional()
            .map_err(db_err)?;
        row.ok_or_else(|| ConditionerError::NotFound {
            resource: "Campaign".into(),
            id: id.to_string(),
        })
    }

    async fn set_status(&self, owner: Owner, id: CampaignId, status: CampaignStatus) -> Result<Campaign> {
        {
            let conn = self.conn.lock();
            let changed = conn
                .execute(
                    "UPDATE campaigns SET status = ?1 WHERE id = ?2 AND owner = ?3",
                    params![to_json(&status)?, id.0.to_string(), owner.0.to_string()],
                )
                .map_err(db_err)?;
            if changed == 0 {
                return Err(ConditionerError::NotFound {
                    resource: "Campaign".into(),
                    id: id.to_string(),
                });
            }
        }
        CampaignRepository::get(self, owner, id).await
    }

    async fn delete(&self, owner: Owner, id: CampaignId) -> Result<()> {
        let conn = self.conn.lock();
        let changed = conn
            .execute(
                "DELETE FROM campaigns WHERE id = ?1 AND owner = ?2",
                params![id.0.to_string(), owner.0.to_string()],
            )
            .map_err(db_err)?;
        if changed == 0 {
            return Err(ConditionerError::NotFound {
                resource: "Campaign".into(),
                id: id.to_string(),
            });
        }
        let cid = id.0.to_string();
        conn.execute("DELETE FROM raw_posts WHERE campaign_id = ?1", params![cid])
            .map_err(db_err)?;
        conn.execute("DELETE FROM drafts WHERE campaign_id = ?1", params![cid])
            .map_err(db_err)?;
        conn.execute(
            "DELETE FROM shadow_entries WHERE campaign_id = ?1",
            params![cid],
        )
        .map_err(db_err)?;
        conn.execute(
            "DELETE FROM community_profiles WHERE campaign_id = ?1",
            params![cid],
        )
        .map_err(db_err)?;
        Ok(())
    }
}

fn row_to_campaign(row: &rusqlite::Row<'_>) -> rusqlite::Result<Campaign> {
    let id: String = row.get(0)?;
    let owner: String = row.get(1)?;
    let keywords_json: String = row.get(5)?;
    let subs_json: String = row.get(6)?;
    let status_json: String = row.get(7)?;
    Ok(Campaign {
        id: uuid::Uuid::parse_str(&id).unwrap_or_default().into(),
        owner: uuid::Uuid::parse_str(&owner).unwrap_or_default().into(),
        name: row.get(2)?,
        product_context: row.get(3)?,
        product_url: row.get(4)?,
        keywords: from_json(&keywords_json).unwrap_or_default(),
        target_subreddits: from_json(&subs_json).unwrap_or_default(),
        status: from_json(&status_json).unwrap_or(CampaignStatus::Active),
    })
}

// ---------------------------------------------------------------------
// Raw posts
// ---------------------------------------------------------------------

#[async_trait]
impl RawPostRepository for SqliteStore {
    async fn upsert(&self, post: RawPost) -> Result<bool> {
        let conn = self.conn.lock();
        let changed = conn
            .execute(
                "INSERT OR IGNORE INTO raw_posts
                 (id, campaign_id, owner, subreddit, source_post_id, source_url, author, author_karma,
                  title, raw_text, comment_count, upvote_ratio, archetype, success_score, is_ai_processed,
                  rhythm_metadata, source_created_at, collected_at)
                 VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18)",
                params![
                    post.id.0.to_string(),
                    post.campaign_id.0.to_string(),
                    post.owner.0.to_string(),
                    post.subreddit,
                    post.source_post_id,
                    post.source_url,
                    post.author,
                    post.author_karma,
                    post.title,
                    post.raw_text,
                    post.comment_count,
                    post.upvote_ratio,
                    to_json(&post.archetype)?,
                    post.success_score,
                    post.is_ai_processed as i64,
                    to_json(&post.rhythm_metadata)?,
                    to_rfc3339(&post.source_created_at),
                    to_rfc3339(&post.collected_at),
                ],
            )
            .map_err(db_err)?;
        Ok(changed > 0)
    }

    async fn list_by_subreddit(&self, campaign_id: CampaignId, subreddit: &str) -> Result<Vec<RawPost>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, campaign_id, owner, subreddit, source_post_id, source_url, author, author_karma,
                        title, raw_text, comment_count, upvote_ratio, archetype, success_score, is_ai_processed,
                        rhythm_metadata, source_created_at, collected_at
                 FROM raw_posts WHERE campaign_id = ?1 AND subreddit = ?2",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(
                params![campaign_id.0.to_string(), subreddit],
                row_to_raw_post,
            )
            .map_err(db_err)?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r.map_err(db_err)?);
        }
        Ok(out)
    }

    async fn counts_by_subreddit(&self, campaign_id: CampaignId) -> Result<HashMap<String, usize>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT subreddit, COUNT(*) FROM raw_posts WHERE campaign_id = ?1 GROUP BY subreddit")
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![campaign_id.0.to_string()], |row| {
                let subreddit: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok((subreddit, count as usize))
            })
            .map_err(db_err)?;
        let mut out = HashMap::new();
        for r in rows {
            let (subreddit, count) = r.map_err(db_err)?;
            out.insert(subreddit, count);
        }
        Ok(out)
    }

    async fn delete_by_campaign(&self, campaign_id: CampaignId) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "DELETE FROM raw_posts WHERE campaign_id = ?1",
            params![campaign_id.0.to_string()],
        )
        .map_err(db_err)?;
        Ok(())
    }
}

fn row_to_raw_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawPost> {
    let archetype_json: String = row.get(12)?;
    let rhythm_json: String = row.get(15)?;
    let is_ai: i64 = row.get(14)?;
    let created: String = row.get(16)?;
    let collected: String = row.get(17)?;
    Ok(RawPost {
        id: uuid::Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default().into(),
        campaign_id: uuid::Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default().into(),
        owner: uuid::Uuid::parse_str(&row.get::<_, String>(2)?).unwrap_or_default().into(),
        subreddit: row.get(3)?,
        source_post_id: row.get(4)?,
        source_url: row.get(5)?,
        author: row.get(6)?,
        author_karma: row.get(7)?,
        title: row.get(8)?,
        raw_text: row.get(9)?,
        comment_count: row.get(10)?,
        upvote_ratio: row.get(11)?,
        archetype: from_json(&archetype_json).unwrap_or(Archetype::Unclassified),
        success_score: row.get(13)?,
        is_ai_processed: is_ai != 0,
        rhythm_metadata: from_json(&rhythm_json).unwrap_or_default(),
        source_created_at: from_rfc3339(&created).unwrap_or_else(|_| Utc::now()),
        collected_at: from_rfc3339(&collected).unwrap_or_else(|_| Utc::now()),
    })
}

// ---------------------------------------------------------------------
// Community profiles
// ---------------------------------------------------------------------

#[async_trait]
impl CommunityProfileRepository for SqliteStore {
    async fn upsert(&self, profile: CommunityProfile) -> Result<CommunityProfile> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO community_profiles
             (id, campaign_id, subreddit, isc_score, avg_sentence_length, dominant_tone, formality_level,
              top_success_hooks, forbidden_patterns, archetype_distribution, style_metrics, style_guide,
              sample_size, last_analyzed_at)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14)
             ON CONFLICT (campaign_id, subreddit) DO UPDATE SET
                isc_score = excluded.isc_score,
                avg_sentence_length = excluded.avg_sentence_length,
                dominant_tone = excluded.dominant_tone,
                formality_level = excluded.formality_level,
                top_success_hooks = excluded.top_success_hooks,
                forbidden_patterns = excluded.forbidden_patterns,
                archetype_distribution = excluded.archetype_distribution,
                style_metrics = excluded.style_metrics,
                style_guide = excluded.style_guide,
                sample_size = excluded.sample_size,
                last_analyzed_at = excluded.last_analyzed_at",
            params![
                profile.id.0.to_string(),
                profile.campaign_id.0.to_string(),
                profile.subreddit,
                profile.isc_score,
                profile.avg_sentence_length,
                profile.dominant_tone,
                profile.formality_level,
                to_json(&profile.top_success_hooks)?,
                to_json(&profile.forbidden_patterns)?,
                to_json(&profile.archetype_distribution)?,
                to_json(&profile.style_metrics)?,
                profile.style_guide,
                profile.sample_size,
                to_rfc3339(&profile.last_analyzed_at),
            ],
        )
        .map_err(db_err)?;
        Ok(profile)
    }

    async fn get(&self, campaign_id: CampaignId, subreddit: &str) -> Result<Option<CommunityProfile>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, campaign_id, subreddit, isc_score, avg_sentence_length, dominant_tone, formality_level,
                    top_success_hooks, forbidden_patterns, archetype_distribution, style_metrics, style_guide,
                    sample_size, last_analyzed_at
             FROM community_profiles WHERE campaign_id = ?1 AND subreddit = ?2",
            params![campaign_id.0.to_string(), subreddit],
            row_to_profile,
        )
        .optional()
        .map_err(db_err)
    }

    async fn list_by_campaign(&self, campaign_id: CampaignId) -> Result<Vec<CommunityProfile>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, campaign_id, subreddit, isc_score, avg_sentence_length, dominant_tone, formality_level,
                        top_success_hooks, forbidden_patterns, archetype_distribution, style_metrics, style_guide,
                        sample_size, last_analyzed_at
                 FROM community_profiles WHERE campaign_id = ?1",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![campaign_id.0.to_string()], row_to_profile)
            .map_err(db_err)?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r.map_err(db_err)?);
        }
        Ok(out)
    }
}

fn row_to_profile(row: &rusqlite::Row<'_>) -> rusqlite::Result<CommunityProfile> {
    let hooks: String = row.get(7)?;
    let forbidden: String = row.get(8)?;
    let dist: String = row.get(9)?;
    let style_metrics: String = row.get(10)?;
    let last_analyzed: String = row.get(13)?;
    Ok(CommunityProfile {
        id: uuid::Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default().into(),
        campaign_id: uuid::Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default().into(),
        subreddit: row.get(2)?,
        isc_score: row.get(3)?,
        avg_sentence_length: row.get(4)?,
        dominant_tone: row.get(5)?,
        formality_level: row.get(6)?,
        top_success_hooks: from_json(&hooks).unwrap_or_default(),
        forbidden_patterns: from_json(&forbidden).unwrap_or_default(),
        archetype_distribution: from_json(&dist).unwrap_or_default(),
        style_metrics: from_json(&style_metrics).unwrap_or_default(),
        style_guide: row.get(11)?,
        sample_size: row.get::<_, i64>(12)? as usize,
        last_analyzed_at: from_rfc3339(&last_analyzed).unwrap_or_else(|_| Utc::now()),
    })
}

// ---------------------------------------------------------------------
// Drafts
// ---------------------------------------------------------------------

#[async_trait]
impl DraftRepository for SqliteStore {
    async fn insert(&self, draft: GeneratedDraft) -> Result<GeneratedDraft> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO drafts
             (id, campaign_id, owner, subreddit, archetype, title, body, vulnerability_score,
              rhythm_match_score, blacklist_violations, model_used, token_count, token_cost, status,
              user_edits, created_at)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16)",
            params![
                draft.id.0.to_string(),
                draft.campaign_id.0.to_string(),
                draft.owner.0.to_string(),
                draft.subreddit,
                to_json(&draft.archetype)?,
                draft.title,
                draft.body,
                draft.vulnerability_score,
                draft.rhythm_match_score,
                draft.blacklist_violations,
                draft.model_used,
                draft.token_count,
                draft.token_cost,
                to_json(&draft.status)?,
                draft.user_edits,
                to_rfc3339(&draft.created_at),
            ],
        )
        .map_err(db_err)?;
        Ok(draft)
    }

    async fn get(&self, owner: Owner, id: DraftId) -> Result<GeneratedDraft> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, campaign_id, owner, subreddit, archetype, title, body, vulnerability_score,
                    rhythm_match_score, blacklist_violations, model_used, token_count, token_cost, status,
                    user_edits, created_at
             FROM drafts WHERE id = ?1 AND owner = ?2",
            params![id.0.to_string(), owner.0.to_string()],
            row_to_draft,
        )
        .optional()
        .map_err(db_err)?
        .ok_or_else(|| ConditionerError::NotFound {
            resource: "GeneratedDraft".into(),
            id: id.to_string(),
        })
    }

    async fn update_status(
        &self,
        owner: Owner,
        id: DraftId,
        status: DraftStatus,
        user_edits: Option<String>,
    ) -> Result<GeneratedDraft> {
        let current = DraftRepository::get(self, owner, id).await?;
        if !current.status.can_transition_to(status) {
            return Err(ConditionerError::Validation {
                field: "status".into(),
                reason: format!("cannot transition draft from {:?} to {:?}", current.status, status),
            });
        }
        {
            let conn = self.conn.lock();
            conn.execute(
                "UPDATE drafts SET status = ?1, user_edits = COALESCE(?2, user_edits) WHERE id = ?3 AND owner = ?4",
                params![
                    to_json(&status)?,
                    user_edits,
                    id.0.to_string(),
                    owner.0.to_string()
                ],
            )
            .map_err(db_err)?;
        }
        DraftRepository::get(self, owner, id).await
    }

    async fn delete_by_campaign(&self, campaign_id: CampaignId) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "DELETE FROM drafts WHERE campaign_id = ?1",
            params![campaign_id.0.to_string()],
        )
        .map_err(db_err)?;
        Ok(())
    }
}

fn row_to_draft(row: &rusqlite::Row<'_>) -> rusqlite::Result<GeneratedDraft> {
    let archetype: String = row.get(4)?;
    let status: String = row.get(13)?;
    let created: String = row.get(15)?;
    Ok(GeneratedDraft {
        id: uuid::Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default().into(),
        campaign_id: uuid::Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default().into(),
        owner: uuid::Uuid::parse_str(&row.get::<_, String>(2)?).unwrap_or_default().into(),
        subreddit: row.get(3)?,
        archetype: from_json(&archetype).unwrap_or(Archetype::Unclassified),
        title: row.get(5)?,
        body: row.get(6)?,
        vulnerability_score: row.get(7)?,
        rhythm_match_score: row.get(8)?,
        blacklist_violations: row.get(9)?,
        model_used: row.get(10)?,
        token_count: row.get::<_, i64>(11)? as u64,
        token_cost: row.get(12)?,
        status: from_json(&status).unwrap_or(DraftStatus::Generated),
        user_edits: row.get(14)?,
        created_at: from_rfc3339(&created).unwrap_or_else(|_| Utc::now()),
    })
}

// ---------------------------------------------------------------------
// Shadow entries
// ---------------------------------------------------------------------

#[async_trait]
impl ShadowEntryRepository for SqliteStore {
    async fn insert(&self, entry: ShadowEntry) -> Result<ShadowEntry> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO shadow_entries
             (id, draft_id, campaign_id, owner, post_url, subreddit, status, isc_at_post, account_status,
              check_interval_hours, total_checks, last_check_status, last_check_at, audit_result,
              audit_completed_at, submitted_at, audit_due_at, consecutive_anonymous_misses)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18)",
            params![
                entry.id.0.to_string(),
                entry.draft_id.map(|d| d.0.to_string()),
                entry.campaign_id.0.to_string(),
                entry.owner.0.to_string(),
                entry.post_url,
                entry.subreddit,
                to_json(&entry.status)?,
                entry.isc_at_post,
                to_json(&entry.account_status)?,
                entry.check_interval_hours,
                entry.total_checks,
                entry.last_check_status.map(|s| to_json(&s)).transpose()?,
                to_rfc3339_opt(entry.last_check_at.as_ref()),
                entry.audit_result.map(|r| to_json(&r)).transpose()?,
                to_rfc3339_opt(entry.audit_completed_at.as_ref()),
                to_rfc3339(&entry.submitted_at),
                to_rfc3339(&entry.audit_due_at),
                entry.consecutive_anonymous_misses,
            ],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(ref se, _)
                if se.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                ConditionerError::AlreadyExists {
                    resource: "ShadowEntry".into(),
                    key: entry.post_url.clone(),
                }
            }
            other => db_err(other),
        })?;
        Ok(entry)
    }

    async fn get(&self, id: ShadowEntryId) -> Result<ShadowEntry> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, draft_id, campaign_id, owner, post_url, subreddit, status, isc_at_post, account_status,
                    check_interval_hours, total_checks, last_check_status, last_check_at, audit_result,
                    audit_completed_at, submitted_at, audit_due_at, consecutive_anonymous_misses
             FROM shadow_entries WHERE id = ?1",
            params![id.0.to_string()],
            row_to_shadow_entry,
        )
        .optional()
        .map_err(db_err)?
        .ok_or_else(|| ConditionerError::NotFound {
            resource: "ShadowEntry".into(),
            id: id.to_string(),
        })
    }

    async fn update(&self, entry: ShadowEntry) -> Result<ShadowEntry> {
        let existing = ShadowEntryRepository::get(self, entry.id).await?;
        if existing.audit_completed_at.is_some() {
            return Err(ConditionerError::Validation {
                field: "status".into(),
                reason: "shadow entry is immutable after audit_completed_at is set".into(),
            });
        }
        if !existing.status.can_transition_to(entry.status) {
            return Err(ConditionerError::Validation {
                field: "status".into(),
                reason: format!(
                    "cannot transition shadow entry from {:?} to {:?}",
                    existing.status, entry.status
                ),
            });
        }
        {
            let conn = self.conn.lock();
            conn.execute(
                "UPDATE shadow_entries SET
                    status = ?1, total_checks = ?2, last_check_status = ?3, last_check_at = ?4,
                    audit_result = ?5, audit_completed_at = ?6, check_interval_hours = ?7,
                    consecutive_anonymous_misses = ?8
                 WHERE id = ?9",
                params![
                    to_json(&entry.status)?,
                    entry.total_checks,
                    entry.last_check_status.map(|s| to_json(&s)).transpose()?,
                    to_rfc3339_opt(entry.last_check_at.as_ref()),
                    entry.audit_result.map(|r| to_json(&r)).transpose()?,
                    to_rfc3339_opt(entry.audit_completed_at.as_ref()),
                    entry.check_interval_hours,
                    entry.consecutive_anonymous_misses,
                    entry.id.0.to_string(),
                ],
            )
            .map_err(db_err)?;
        }
        ShadowEntryRepository::get(self, entry.id).await
    }

    async fn due_for_check(&self, now: DateTime<Utc>) -> Result<Vec<ShadowEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, draft_id, campaign_id, owner, post_url, subreddit, status, isc_at_post, account_status,
                        check_interval_hours, total_checks, last_check_status, last_check_at, audit_result,
                        audit_completed_at, submitted_at, audit_due_at, consecutive_anonymous_misses
                 FROM shadow_entries WHERE status = ?1
                 ORDER BY submitted_at ASC",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![to_json(&ShadowStatus::Active)?], row_to_shadow_entry)
            .map_err(db_err)?;
        let mut out = Vec::new();
        for r in rows {
            let entry = r.map_err(db_err)?;
            let due_at = entry
                .last_check_at
                .map_or(entry.submitted_at, |t| t + chrono::Duration::hours(i64::from(entry.check_interval_hours)));
            if due_at <= now {
                out.push(entry);
            }
        }
        Ok(out)
    }

    async fn due_for_audit(&self, now: DateTime<Utc>) -> Result<Vec<ShadowEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, draft_id, campaign_id, owner, post_url, subreddit, status, isc_at_post, account_status,
                        check_interval_hours, total_checks, last_check_status, last_check_at, audit_result,
                        audit_completed_at, submitted_at, audit_due_at, consecutive_anonymous_misses
                 FROM shadow_entries WHERE audit_due_at <= ?1 AND audit_result IS NULL
                 ORDER BY submitted_at ASC",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![to_rfc3339(&now)], row_to_shadow_entry)
            .map_err(db_err)?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r.map_err(db_err)?);
        }
        Ok(out)
    }

    async fn delete_by_campaign(&self, campaign_id: CampaignId) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "DELETE FROM shadow_entries WHERE campaign_id = ?1",
            params![campaign_id.0.to_string()],
        )
        .map_err(db_err)?;
        Ok(())
    }
}

fn row_to_shadow_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<ShadowEntry> {
    let draft_id: Option<String> = row.get(1)?;
    let status: String = row.get(6)?;
    let account_status: String = row.get(8)?;
    let last_check_status: Option<String> = row.get(11)?;
    let last_check_at: Option<String> = row.get(12)?;
    let audit_result: Option<String> = row.get(13)?;
    let audit_completed_at: Option<String> = row.get(14)?;
    let submitted: String = row.get(15)?;
    let audit_due: String = row.get(16)?;
    Ok(ShadowEntry {
        id: uuid::Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default().into(),
        draft_id: draft_id.map(|d| uuid::Uuid::parse_str(&d).unwrap_or_default().into()),
        campaign_id: uuid::Uuid::parse_str(&row.get::<_, String>(2)?).unwrap_or_default().into(),
        owner: uuid::Uuid::parse_str(&row.get::<_, String>(3)?).unwrap_or_default().into(),
        post_url: row.get(4)?,
        subreddit: row.get(5)?,
        status: from_json(&status).unwrap_or(ShadowStatus::Active),
        isc_at_post: row.get(7)?,
        account_status: from_json(&account_status).unwrap_or(AccountStatus::Established),
        check_interval_hours: row.get(9)?,
        total_checks: row.get(10)?,
        last_check_status: last_check_status.map(|s| from_json(&s).unwrap_or(ShadowStatus::Active)),
        last_check_at: from_rfc3339_opt(last_check_at).unwrap_or(None),
        audit_result: audit_result.map(|r| from_json(&r).unwrap_or(conditioner_types::AuditResult::Inertia)),
        audit_completed_at: from_rfc3339_opt(audit_completed_at).unwrap_or(None),
        submitted_at: from_rfc3339(&submitted).unwrap_or_else(|_| Utc::now()),
        audit_due_at: from_rfc3339(&audit_due).unwrap_or_else(|_| Utc::now()),
        consecutive_anonymous_misses: row.get(17)?,
    })
}

// ---------------------------------------------------------------------
// Blacklist entries
// ---------------------------------------------------------------------

#[async_trait]
impl BlacklistRepository for SqliteStore {
    async fn insert(&self, entry: BlacklistEntry) -> Result<BlacklistEntry> {
        let conn = self.conn.lock();
        let scope_key = entry
            .subreddit
            .clone()
            .unwrap_or_else(|| "*".to_string());
        conn.execute(
            "INSERT INTO blacklist_entries
             (id, subreddit, scope_key, campaign_id, forbidden_pattern, category, failure_type,
              source_shadow_id, confidence, is_global, is_system_detected, added_at)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12)",
            params![
                entry.id.0.to_string(),
                entry.subreddit,
                scope_key,
                entry.campaign_id.map(|c| c.0.to_string()),
                entry.forbidden_pattern,
                to_json(&entry.category)?,
                entry.failure_type.map(|f| to_json(&f)).transpose()?,
                entry.source_shadow_id.map(|s| s.0.to_string()),
                entry.confidence,
                entry.is_global as i64,
                entry.is_system_detected as i64,
                to_rfc3339(&entry.added_at),
            ],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(ref se, _)
                if se.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                ConditionerError::AlreadyExists {
                    resource: "BlacklistEntry".into(),
                    key: entry.forbidden_pattern.clone(),
                }
            }
            other => db_err(other),
        })?;
        Ok(entry)
    }

    async fn bump_confidence(
        &self,
        subreddit: Option<&str>,
        forbidden_pattern: &str,
        delta: f64,
    ) -> Result<BlacklistEntry> {
        let scope_key = subreddit.unwrap_or("*").to_string();
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE blacklist_entries SET confidence = MIN(1.0, confidence + ?1)
             WHERE scope_key = ?2 AND forbidden_pattern = ?3",
            params![delta, scope_key, forbidden_pattern],
        )
        .map_err(db_err)?;
        conn.query_row(
            "SELECT id, subreddit, campaign_id, forbidden_pattern, category, failure_type,
                    source_shadow_id, confidence, is_global, is_system_detected, added_at
             FROM blacklist_entries WHERE scope_key = ?1 AND forbidden_pattern = ?2",
            params![scope_key, forbidden_pattern],
            row_to_blacklist_entry,
        )
        .optional()
        .map_err(db_err)?
        .ok_or_else(|| ConditionerError::NotFound {
            resource: "BlacklistEntry".into(),
            id: forbidden_pattern.to_string(),
        })
    }

    async fn load_for(&self, subreddit: &str, campaign_id: Option<CampaignId>) -> Result<Vec<BlacklistEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, subreddit, campaign_id, forbidden_pattern, category, failure_type,
                        source_shadow_id, confidence, is_global, is_system_detected, added_at
                 FROM blacklist_entries
                 WHERE is_global = 1
                    OR subreddit = ?1
                    OR (campaign_id = ?2 AND is_system_detected = 0)",
            )
            .map_err(db_err)?;
        let campaign_str = campaign_id.map(|c| c.0.to_string()).unwrap_or_default();
        let rows = stmt
            .query_map(params![subreddit, campaign_str], row_to_blacklist_entry)
            .map_err(db_err)?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r.map_err(db_err)?);
        }
        Ok(out)
    }
}

fn row_to_blacklist_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<BlacklistEntry> {
    let campaign_id: Option<String> = row.get(2)?;
    let category: String = row.get(4)?;
    let failure_type: Option<String> = row.get(5)?;
    let source_shadow_id: Option<String> = row.get(6)?;
    let is_global: i64 = row.get(8)?;
    let is_system: i64 = row.get(9)?;
    let added_at: String = row.get(10)?;
    Ok(BlacklistEntry {
        id: uuid::Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default().into(),
        subreddit: row.get(1)?,
        campaign_id: campaign_id.map(|c| uuid::Uuid::parse_str(&c).unwrap_or_default().into()),
        forbidden_pattern: row.get(3)?,
        category: from_json(&category).unwrap_or(BlacklistCategory::LowEffort),
        failure_type: failure_type.map(|f| from_json(&f).unwrap_or(BlacklistFailureType::Inertia)),
        source_shadow_id: source_shadow_id.map(|s| uuid::Uuid::parse_str(&s).unwrap_or_default().into()),
        confidence: row.get(7)?,
        is_global: is_global != 0,
        is_system_detected: is_system != 0,
        added_at: from_rfc3339(&added_at).unwrap_or_else(|_| Utc::now()),
    })
}

// ---------------------------------------------------------------------
// Usage records
// ---------------------------------------------------------------------

#[async_trait]
impl UsageRepository for SqliteStore {
    async fn append(&self, record: UsageRecord) -> Result<UsageRecord> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO usage_records (id, owner, action, campaign_id, token_count, cost, occurred_at)
             VALUES (?1,?2,?3,?4,?5,?6,?7)",
            params![
                record.id.0.to_string(),
                record.owner.0.to_string(),
                to_json(&record.action)?,
                record.campaign_id.map(|c| c.0.to_string()),
                record.token_count,
                record.cost,
                to_rfc3339(&record.occurred_at),
            ],
        )
        .map_err(db_err)?;
        Ok(record)
    }

    async fn sum_cost_in_period(
        &self,
        owner: Owner,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> Result<f64> {
        let conn = self.conn.lock();
        let sum: Option<f64> = conn
            .query_row(
                "SELECT SUM(cost) FROM usage_records WHERE owner = ?1 AND occurred_at >= ?2 AND occurred_at < ?3",
                params![
                    owner.0.to_string(),
                    to_rfc3339(&period_start),
                    to_rfc3339(&period_end)
                ],
                |row| row.get(0),
            )
            .map_err(db_err)?;
        Ok(sum.unwrap_or(0.0))
    }
}
