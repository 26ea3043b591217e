use std::collections::HashMap;

use crate::lexicon;
use crate::tokenize::{split_sentences, split_words};

/// Structural style evidence extracted locally from a single text, zero LLM
/// cost (§9 glossary, "Rhythm metadata"): sentence length distribution,
/// punctuation frequency, pronoun rate. Called once by the collection
/// orchestrator when a `RawPost` is created, and again on humanized drafts so
/// the two are comparable on the same metrics (§9, "Vulnerability score /
/// rhythm_match_score").
#[must_use]
pub fn rhythm_metadata(text: &str) -> HashMap<String, f64> {
    let sentences = split_sentences(text);
    let words = split_words(text);

    let mut metadata = HashMap::new();
    metadata.insert("avg_sentence_length".to_string(), avg_sentence_length_words(&sentences));
    metadata.insert("sentence_length_stddev".to_string(), sentence_length_stddev(&sentences));
    metadata.insert("punctuation_rate".to_string(), punctuation_rate(text));
    metadata.insert("pronoun_rate".to_string(), pronoun_rate(&words));
    metadata
}

fn words_in(sentence: &str) -> usize {
    split_words(sentence).len()
}

fn avg_sentence_length_words(sentences: &[&str]) -> f64 {
    if sentences.is_empty() {
        return 0.0;
    }
    let total: usize = sentences.iter().map(|s| words_in(s)).sum();
    total as f64 / sentences.len() as f64
}

fn sentence_length_stddev(sentences: &[&str]) -> f64 {
    if sentences.len() < 2 {
        return 0.0;
    }
    let lengths: Vec<f64> = sentences.iter().map(|s| words_in(s) as f64).collect();
    let mean = lengths.iter().sum::<f64>() / lengths.len() as f64;
    let variance = lengths.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / lengths.len() as f64;
    variance.sqrt()
}

fn punctuation_rate(text: &str) -> f64 {
    if text.is_empty() {
        return 0.0;
    }
    let punctuation = text.chars().filter(|c| ",.;:!?".contains(*c)).count();
    punctuation as f64 / text.chars().count() as f64
}

fn pronoun_rate(words: &[&str]) -> f64 {
    if words.is_empty() {
        return 0.0;
    }
    let pronouns = ["i", "me", "my", "mine", "we", "us", "our"];
    let hits = words.iter().filter(|w| pronouns.contains(&w.to_lowercase().as_str())).count();
    hits as f64 / words.len() as f64
}

/// §4.4 `avg_sentence_length`: mean over a corpus of texts, not a single post.
#[must_use]
pub fn corpus_avg_sentence_length(texts: &[&str]) -> f64 {
    let lengths: Vec<f64> = texts
        .iter()
        .flat_map(|t| split_sentences(t))
        .map(words_in)
        .map(|n| n as f64)
        .collect();
    if lengths.is_empty() {
        return 0.0;
    }
    lengths.iter().sum::<f64>() / lengths.len() as f64
}

/// §4.4 `formality_level`: weighted type-token ratio, mean word length, and
/// contraction rate, normalized to `[0, 1]`. Contractions pull the score
/// down (informal); type-token ratio and word length pull it up.
#[must_use]
pub fn formality_level(text: &str) -> f64 {
    let words = split_words(text);
    if words.is_empty() {
        return 0.0;
    }

    let unique: std::collections::HashSet<String> = words.iter().map(|w| w.to_lowercase()).collect();
    let type_token_ratio = unique.len() as f64 / words.len() as f64;

    let mean_word_length = words.iter().map(|w| w.chars().count()).sum::<usize>() as f64 / words.len() as f64;
    let word_length_score = (mean_word_length / 8.0).min(1.0);

    let contraction_hits = lexicon::contraction().find_iter(text).count();
    let contraction_rate = contraction_hits as f64 / words.len() as f64;

    let score = 0.4 * type_token_ratio + 0.4 * word_length_score + 0.2 * (1.0 - contraction_rate.min(1.0));
    score.clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Supportive,
    Critical,
    Technical,
    Casual,
    Formal,
}

impl Tone {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Supportive => "supportive",
            Self::Critical => "critical",
            Self::Technical => "technical",
            Self::Casual => "casual",
            Self::Formal => "formal",
        }
    }
}

/// §4.4 `dominant_tone`: rule-based lexicon match across a corpus; ties
/// broken by most-frequent hit count, then alphabetical on the tone name.
#[must_use]
pub fn dominant_tone(texts: &[&str]) -> Tone {
    let joined = texts.join(" ");
    let mut counts = [
        (Tone::Casual, lexicon::casual().find_iter(&joined).count()),
        (Tone::Critical, lexicon::critical().find_iter(&joined).count()),
        (Tone::Formal, lexicon::formal().find_iter(&joined).count()),
        (Tone::Supportive, lexicon::supportive().find_iter(&joined).count()),
        (Tone::Technical, lexicon::technical().find_iter(&joined).count()),
    ];
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));
    counts[0].0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rhythm_metadata_includes_all_four_metrics() {
        let metadata = rhythm_metadata("I tried this. It worked well! Did you see that?");
        assert!(metadata.contains_key("avg_sentence_length"));
        assert!(metadata.contains_key("sentence_length_stddev"));
        assert!(metadata.contains_key("punctuation_rate"));
        assert!(metadata.contains_key("pronoun_rate"));
    }

    #[test]
    fn empty_text_yields_zeroed_metadata() {
        let metadata = rhythm_metadata("");
        assert_eq!(metadata["avg_sentence_length"], 0.0);
        assert_eq!(metadata["pronoun_rate"], 0.0);
    }

    #[test]
    fn formal_text_scores_higher_formality_than_casual_text() {
        let formal = formality_level(
            "Furthermore, the comprehensive methodology demonstrates considerable improvement across evaluated metrics.",
        );
        let casual = formality_level("lol yeah it's kinda working i guess, gonna keep it");
        assert!(formal > casual);
    }

    #[test]
    fn dominant_tone_picks_highest_lexicon_hit_count() {
        let texts = vec![
            "this api has great throughput, solid architecture, and benchmark numbers from the latency config",
            "lol yeah works",
        ];
        assert_eq!(dominant_tone(&texts), Tone::Technical);
    }

    #[test]
    fn dominant_tone_ties_break_alphabetically() {
        // Neither lexicon matches: all counts 0, alphabetical order wins.
        assert_eq!(dominant_tone(&["nothing matches here at all"]), Tone::Casual);
    }
}
