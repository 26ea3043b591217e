//! Pattern engine (C4): per-subreddit community fingerprinting — ISC,
//! rhythm/formality metrics, dominant tone, archetype distribution, success
//! hooks, and forbidden-pattern frequencies. Also hosts the local
//! tokenization and lexicon-scan helpers that the collection orchestrator
//! (rhythm metadata at `RawPost` creation) and the audit engine (pattern
//! mining) reuse, per the contract that both draw on "the same lexicon
//! scan" (§4.12).

mod analyze;
mod forbidden;
mod lexicon;
mod rhythm;
mod scoring;
mod tokenize;

pub use analyze::{analyze, AnalysisProgress, AnalysisResult, AnalysisWarning};
pub use forbidden::{
    link_density_penalty, marketing_jargon_penalty, scan as scan_forbidden_patterns, scan_with_matches,
};
pub use rhythm::{corpus_avg_sentence_length, dominant_tone, formality_level, rhythm_metadata, Tone};
pub use scoring::{isc_score, success_score, vulnerability_weight, SuccessInputs};
pub use tokenize::{split_sentences, split_words};
