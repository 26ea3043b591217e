//! Pure regex-based relevance scoring for freshly scraped posts (§4.2). No
//! I/O, no randomness: identical `(posts, keywords)` always produce identical
//! scores, so callers can reorder or parallelize freely.

mod patterns;
mod score;

use conditioner_types::ScrapedPost;

/// A post that survived hard-reject filtering, carrying its `relevance_score`.
#[derive(Debug, Clone)]
pub struct ScoredPost {
    pub post: ScrapedPost,
    pub relevance_score: f64,
}

/// §4.2 contract: drops hard-rejected posts, scores the rest, and applies the
/// batch-relative top-tertile engagement bonus.
#[must_use]
pub fn filter(posts: Vec<ScrapedPost>, keywords: &[String]) -> Vec<ScoredPost> {
    let survivors: Vec<ScrapedPost> = posts.into_iter().filter(|p| !score::is_hard_rejected(p)).collect();

    let mut ranked: Vec<(usize, f64)> = survivors
        .iter()
        .enumerate()
        .map(|(i, p)| (i, score::engagement_metric(p)))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    let top_tertile_count = ranked.len().div_ceil(3);
    let top_tertile_indices: std::collections::HashSet<usize> =
        ranked.into_iter().take(top_tertile_count).map(|(i, _)| i).collect();

    survivors
        .into_iter()
        .enumerate()
        .map(|(i, post)| {
            let mut s = score::base_score(&post, keywords);
            if top_tertile_indices.contains(&i) {
                s += 1.0;
            }
            ScoredPost {
                post,
                relevance_score: score::clamp_score(s),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use conditioner_types::ScrapedPost;
    use proptest::prelude::*;

    use super::filter;

    fn post(body: &str, author: &str, upvote_ratio: f64, score: i64) -> ScrapedPost {
        ScrapedPost {
            source_post_id: "abc".into(),
            title: "a title with no signal".into(),
            body: body.into(),
            url: "https://reddit.com/r/test/abc".into(),
            author: author.into(),
            author_karma: 100,
            score,
            upvote_ratio,
            comment_count: 3,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn rejects_short_bodies() {
        let posts = vec![post("too short", "someone", 0.9, 10)];
        assert!(filter(posts, &[]).is_empty());
    }

    #[test]
    fn rejects_deleted_authors() {
        let posts = vec![post(&"a".repeat(60), "[deleted]", 0.9, 10)];
        assert!(filter(posts, &[]).is_empty());
    }

    #[test]
    fn rejects_link_only_bodies() {
        let posts = vec![post("https://example.com/some/very/long/path/that/is/long/enough", "someone", 0.9, 10)];
        assert!(filter(posts, &[]).is_empty());
    }

    #[test]
    fn rejects_bot_signatures() {
        let body = format!("{} I am a bot, and this action was performed automatically.", "filler ".repeat(10));
        let posts = vec![post(&body, "AutoModerator", 0.9, 10)];
        assert!(filter(posts, &[]).is_empty());
    }

    #[test]
    fn scores_rise_with_keyword_hits_and_first_person_and_question() {
        let body = "I finally found a workflow that works for my notes, have you tried it? It took me 3 months but I'm thrilled.";
        let posts = vec![post(body, "someone", 0.9, 50)];
        let scored = filter(posts, &["notes".to_string(), "workflow".to_string()]);
        assert_eq!(scored.len(), 1);
        assert!(scored[0].relevance_score >= 5.0, "score was {}", scored[0].relevance_score);
    }

    #[test]
    fn score_never_exceeds_ten() {
        let body = "I finally found my workflow, have you tried it? incredible, amazing, 3 months, $500 saved. ".repeat(5);
        let posts = vec![post(&body, "someone", 1.0, 1000)];
        let scored = filter(posts, &["workflow".to_string()]);
        assert!(scored[0].relevance_score <= 10.0);
    }

    #[test]
    fn top_tertile_of_batch_gets_engagement_bonus() {
        let low = post("filler body text that is long enough to pass the minimum length check", "a", 0.5, 1);
        let high = post("filler body text that is long enough to pass the minimum length check", "b", 0.99, 5000);
        let mid = post("filler body text that is long enough to pass the minimum length check", "c", 0.7, 50);
        let scored = filter(vec![low, mid, high], &[]);
        let high_score = scored.iter().find(|s| s.post.author == "b").unwrap().relevance_score;
        let low_score = scored.iter().find(|s| s.post.author == "a").unwrap().relevance_score;
        assert!(high_score > low_score);
    }

    proptest! {
        #[test]
        fn filter_is_deterministic(bodies in proptest::collection::vec("[a-zA-Z0-9 .,!?]{0,300}", 0..8)) {
            let make_posts = || bodies.iter().enumerate().map(|(i, b)| post(b, "someone", 0.8, i as i64 * 10)).collect::<Vec<_>>();
            let keywords = vec!["notes".to_string()];
            let first = filter(make_posts(), &keywords);
            let second = filter(make_posts(), &keywords);
            let first_scores: Vec<f64> = first.iter().map(|s| s.relevance_score).collect();
            let second_scores: Vec<f64> = second.iter().map(|s| s.relevance_score).collect();
            prop_assert_eq!(first_scores, second_scores);
        }

        #[test]
        fn relevance_score_always_in_bounds(body in "[a-zA-Z0-9 .,!?$%]{50,400}") {
            let posts = vec![post(&body, "someone", 0.8, 20)];
            let scored = filter(posts, &["notes".to_string()]);
            if let Some(s) = scored.first() {
                prop_assert!(s.relevance_score >= 0.0 && s.relevance_score <= 10.0);
            }
        }
    }
}
