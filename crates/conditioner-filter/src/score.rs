use conditioner_types::ScrapedPost;

use crate::patterns::signals;

const MIN_BODY_LEN: usize = 50;
const LONG_BODY_LEN: usize = 200;
const KEYWORD_BONUS_PER_HIT: f64 = 2.0;
const KEYWORD_BONUS_CAP: f64 = 4.0;
const MAX_SCORE: f64 = 10.0;

/// §4.2 hard rejects, applied before any scoring. `true` means the post is
/// dropped outright.
pub(crate) fn is_hard_rejected(post: &ScrapedPost) -> bool {
    if post.body.trim().chars().count() < MIN_BODY_LEN {
        return true;
    }
    let author = post.author.to_ascii_lowercase();
    if author == "[deleted]" || author == "[removed]" {
        return true;
    }
    let stripped = signals::url().replace_all(&post.body, "");
    if stripped.trim().is_empty() {
        return true;
    }
    if signals::bot_signature().is_match(&post.body) {
        return true;
    }
    false
}

/// Additive score from every signal except the batch-relative engagement
/// tertile bonus, which [`crate::filter`] applies afterward across the batch.
pub(crate) fn base_score(post: &ScrapedPost, keywords: &[String]) -> f64 {
    let mut score = 0.0;
    let haystack = format!("{} {}", post.title, post.body).to_ascii_lowercase();

    let keyword_hits = keywords
        .iter()
        .filter(|kw| !kw.is_empty() && haystack.contains(&kw.to_ascii_lowercase()))
        .count();
    score += (keyword_hits as f64 * KEYWORD_BONUS_PER_HIT).min(KEYWORD_BONUS_CAP);

    if signals::first_person().is_match(&post.body) {
        score += 1.0;
    }
    if post.body.contains('?') {
        score += 1.0;
    }
    if signals::emotional_lexicon().is_match(&post.body) {
        score += 1.0;
    }
    if signals::metric().is_match(&post.body) {
        score += 1.0;
    }
    if post.body.chars().count() >= LONG_BODY_LEN {
        score += 1.0;
    }

    score
}

/// The engagement metric used to rank a batch before awarding the top-tertile
/// bonus: `upvote_ratio * ln(1 + score)`.
pub(crate) fn engagement_metric(post: &ScrapedPost) -> f64 {
    post.upvote_ratio * (1.0 + post.score.max(0) as f64).ln()
}

pub(crate) fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, MAX_SCORE)
}
