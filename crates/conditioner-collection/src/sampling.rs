use conditioner_filter::ScoredPost;

/// §4.3 step 4: indices of the top 10% by `relevance_score`, at least one
/// when at least one post survived filtering.
#[must_use]
pub fn top_tenth_percent_indices(posts: &[ScoredPost]) -> Vec<usize> {
    if posts.is_empty() {
        return Vec::new();
    }
    let sample_size = ((posts.len() as f64) * 0.1).ceil().max(1.0) as usize;

    let mut ranked: Vec<usize> = (0..posts.len()).collect();
    ranked.sort_by(|&a, &b| posts[b].relevance_score.total_cmp(&posts[a].relevance_score));
    ranked.truncate(sample_size);
    ranked
}

#[cfg(test)]
mod tests {
    use conditioner_types::ScrapedPost;

    use super::*;

    fn scored(relevance_score: f64) -> ScoredPost {
        ScoredPost {
            post: ScrapedPost {
                source_post_id: "id".into(),
                title: "t".into(),
                body: "b".into(),
                url: "u".into(),
                author: "a".into(),
                author_karma: 1,
                score: 1,
                upvote_ratio: 0.9,
                comment_count: 1,
                created_at: chrono::Utc::now(),
            },
            relevance_score,
        }
    }

    #[test]
    fn empty_input_yields_no_sample() {
        assert!(top_tenth_percent_indices(&[]).is_empty());
    }

    #[test]
    fn at_least_one_selected_when_any_post_passes() {
        let posts = vec![scored(1.0), scored(2.0), scored(3.0)];
        assert_eq!(top_tenth_percent_indices(&posts).len(), 1);
    }

    #[test]
    fn selects_highest_scoring_indices() {
        let posts: Vec<ScoredPost> = (0..20).map(|i| scored(i as f64)).collect();
        let indices = top_tenth_percent_indices(&posts);
        assert_eq!(indices.len(), 2);
        assert!(indices.contains(&19));
        assert!(indices.contains(&18));
    }
}
