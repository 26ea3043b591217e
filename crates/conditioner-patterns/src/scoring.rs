use std::collections::HashMap;

use crate::forbidden::{link_density_penalty, marketing_jargon_penalty};
use crate::lexicon;
use crate::rhythm::formality_level;

/// Inputs to §4.4's `success_score` formula, gathered at `RawPost` creation
/// time (before a community profile exists) so every sub-term is derivable
/// from a single post in isolation.
pub struct SuccessInputs<'a> {
    pub text: &'a str,
    pub rhythm_metadata: &'a HashMap<String, f64>,
    pub upvote_ratio: f64,
    pub comment_count: u32,
}

/// §4.4: `0.35*rhythm_adherence + 0.25*vulnerability_weight +
/// 0.15*formality_match + 0.10*thread_depth_weight -
/// 0.10*marketing_jargon_penalty - 0.05*link_density_penalty`, clipped to
/// `[0, 10]`.
///
/// No community profile exists yet when this runs (it is computed once, at
/// `RawPost` creation, consistent with the "never mutated" invariant), so
/// `rhythm_adherence`/`formality_match` are self-referential: a post's own
/// rhythm variety and formality level, rather than a deviation from a corpus
/// baseline that doesn't exist yet.
#[must_use]
pub fn success_score(inputs: &SuccessInputs<'_>) -> f64 {
    let stddev = inputs.rhythm_metadata.get("sentence_length_stddev").copied().unwrap_or(0.0);
    let avg_len = inputs.rhythm_metadata.get("avg_sentence_length").copied().unwrap_or(0.0);
    let rhythm_adherence = if avg_len > 0.0 { (stddev / avg_len).min(1.0) } else { 0.0 };

    let vulnerability_weight = vulnerability_weight(inputs.text);
    let formality_match = formality_level(inputs.text);
    let thread_depth_weight = (f64::from(inputs.comment_count).ln_1p() / 50f64.ln_1p()).min(1.0);
    let jargon_penalty = marketing_jargon_penalty(inputs.text);
    let link_penalty = link_density_penalty(inputs.text);

    let raw = 0.35 * rhythm_adherence + 0.25 * vulnerability_weight + 0.15 * formality_match
        + 0.10 * thread_depth_weight
        - 0.10 * jargon_penalty
        - 0.05 * link_penalty;

    // upvote_ratio tempers the raw blend: a post the community downvoted
    // cannot score as a "success" regardless of how it reads structurally.
    (raw * 10.0 * inputs.upvote_ratio.clamp(0.0, 1.0)).clamp(0.0, 10.0)
}

/// Also used directly by the generator (§4.8 step 9) to compute a draft's
/// `vulnerability_score` from the humanized text, "the same metrics C4 uses
/// on raw posts".
#[must_use]
pub fn vulnerability_weight(text: &str) -> f64 {
    let words = crate::tokenize::split_words(text).len().max(1);
    let first_person = lexicon::self_referential().find_iter(text).count() as f64;
    let emotional_hits =
        (lexicon::supportive().find_iter(text).count() + lexicon::critical().find_iter(text).count()) as f64;
    ((first_person + emotional_hits) / words as f64 * 10.0).min(1.0)
}

/// §4.4 `isc_score`: monotonic in forbidden-pattern hit rate and mean
/// marketing-jargon penalty, inverse in mean upvote ratio. `[1, 10]`.
#[must_use]
pub fn isc_score(forbidden_hit_rate: f64, mean_jargon_penalty: f64, mean_upvote_ratio: f64) -> f64 {
    let hostility = 0.5 * forbidden_hit_rate.clamp(0.0, 1.0) + 0.5 * mean_jargon_penalty.clamp(0.0, 1.0);
    let receptiveness = mean_upvote_ratio.clamp(0.0, 1.0);
    let normalized = (hostility - 0.5 * receptiveness + 0.5).clamp(0.0, 1.0);
    (1.0 + 9.0 * normalized).clamp(1.0, 10.0)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn success_score_is_zero_for_fully_downvoted_post() {
        let metadata = HashMap::from([("avg_sentence_length".to_string(), 10.0), ("sentence_length_stddev".to_string(), 3.0)]);
        let inputs = SuccessInputs {
            text: "a post body with some words in it",
            rhythm_metadata: &metadata,
            upvote_ratio: 0.0,
            comment_count: 5,
        };
        assert_eq!(success_score(&inputs), 0.0);
    }

    #[test]
    fn success_score_never_exceeds_ten() {
        let metadata = HashMap::from([("avg_sentence_length".to_string(), 10.0), ("sentence_length_stddev".to_string(), 10.0)]);
        let inputs = SuccessInputs {
            text: "I felt so supportive and proud of you, this worked great",
            rhythm_metadata: &metadata,
            upvote_ratio: 1.0,
            comment_count: 500,
        };
        assert!(success_score(&inputs) <= 10.0);
    }

    #[test]
    fn isc_score_rises_with_forbidden_hit_rate() {
        let low = isc_score(0.0, 0.0, 0.8);
        let high = isc_score(0.9, 0.9, 0.8);
        assert!(high > low);
    }

    #[test]
    fn isc_score_falls_with_upvote_ratio() {
        let receptive = isc_score(0.3, 0.3, 0.9);
        let hostile = isc_score(0.3, 0.3, 0.1);
        assert!(hostile > receptive);
    }

    #[test]
    fn isc_score_is_bounded() {
        assert!((1.0..=10.0).contains(&isc_score(0.0, 0.0, 1.0)));
        assert!((1.0..=10.0).contains(&isc_score(1.0, 1.0, 0.0)));
    }

    proptest! {
        #[test]
        fn success_score_always_in_bounds(
            avg_len in 0.0f64..50.0,
            stddev in 0.0f64..20.0,
            upvote_ratio in 0.0f64..1.0,
            comment_count in 0u32..1000,
        ) {
            let metadata = HashMap::from([
                ("avg_sentence_length".to_string(), avg_len),
                ("sentence_length_stddev".to_string(), stddev),
            ]);
            let inputs = SuccessInputs {
                text: "some sample body text with words",
                rhythm_metadata: &metadata,
                upvote_ratio,
                comment_count,
            };
            let score = success_score(&inputs);
            prop_assert!((0.0..=10.0).contains(&score));
        }

        #[test]
        fn isc_score_always_in_bounds(hit_rate in 0.0f64..1.0, jargon in 0.0f64..1.0, upvote in 0.0f64..1.0) {
            let score = isc_score(hit_rate, jargon, upvote);
            prop_assert!((1.0..=10.0).contains(&score));
        }
    }
}
