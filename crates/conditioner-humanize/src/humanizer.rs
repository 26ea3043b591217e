use std::sync::OnceLock;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intensity {
    Light,
    Moderate,
    Heavy,
}

impl Intensity {
    fn filler_probability(self) -> f64 {
        match self {
            Self::Light => 0.05,
            Self::Moderate => 0.15,
            Self::Heavy => 0.25,
        }
    }
}

const FILLERS: &[&str] = &["honestly", "tbh", "ngl", "like", "basically"];

fn opening_boilerplate() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?mi)^\s*(furthermore|in conclusion|moreover),\s*").expect("opening boilerplate pattern is valid")
    })
}

fn closing_boilerplate() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?mi)\s*(hope this helps!?|good luck!?)\s*$").expect("closing boilerplate pattern is valid")
    })
}

fn emoji_cluster() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[\u{1F300}-\u{1FAFF}\u{2600}-\u{27BF}]+").expect("emoji cluster pattern is valid")
    })
}

fn bold_italic_markup() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*{1,2}([^*]+)\*{1,2}").expect("markup pattern is valid"))
}

fn list_item() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*(?:[-*]|\d+\.)\s+.*$").expect("list item pattern is valid"))
}

fn closing_summary_sentence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(in summary|overall|to sum up|to summarize),").expect("closing summary pattern is valid")
    })
}

fn seed_from_text(text: &str) -> u64 {
    let digest = Sha256::digest(text.as_bytes());
    u64::from_le_bytes(digest[0..8].try_into().expect("sha256 digest is at least 8 bytes"))
}

fn strip_artifacts(text: &str) -> String {
    let text = opening_boilerplate().replace_all(text, "");
    let text = closing_boilerplate().replace_all(&text, "");
    let text = emoji_cluster().replace_all(&text, "");
    let text = bold_italic_markup().replace_all(&text, "$1");

    let list_lines: Vec<&str> = list_item().find_iter(&text).map(|m| m.as_str()).collect();
    let text = if list_lines.len() > 3 {
        list_item().replace_all(&text, "").to_string()
    } else {
        text.to_string()
    };
    text
}

fn casual_substitutions(text: &str) -> String {
    let text = text.replace(';', " —");
    let text = Regex::new(r"(?i)\badditionally\b")
        .expect("additionally pattern is valid")
        .replace_all(&text, "also")
        .to_string();
    Regex::new(r"(?i)\bconsequently\b")
        .expect("consequently pattern is valid")
        .replace_all(&text, "so")
        .to_string()
}

fn split_sentences(text: &str) -> Vec<String> {
    let re = Regex::new(r"[.!?]+\s+").expect("sentence boundary pattern is valid");
    let mut sentences = Vec::new();
    let mut last_end = 0;
    for m in re.find_iter(text) {
        sentences.push(text[last_end..m.end()].trim().to_string());
        last_end = m.end();
    }
    let tail = text[last_end..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences.into_iter().filter(|s| !s.is_empty()).collect()
}

fn inject_fillers(sentences: &mut [String], intensity: Intensity, rng: &mut StdRng) {
    let probability = intensity.filler_probability();
    for sentence in sentences.iter_mut() {
        if rng.gen::<f64>() < probability {
            let filler = FILLERS[rng.gen_range(0..FILLERS.len())];
            *sentence = format!("{filler}, {sentence}");
        }
    }
}

fn insert_self_corrections(sentences: &mut [String], rng: &mut StdRng) {
    if sentences.is_empty() {
        return;
    }
    let fragments = ["— wait actually …", "— or maybe …"];
    let insertions = rng.gen_range(1..=2.min(sentences.len()).max(1));
    for i in 0..insertions {
        if let Some(idx) = sentences.len().checked_sub(1).map(|max| (i * max / insertions.max(1)).min(max)) {
            let fragment = fragments[rng.gen_range(0..fragments.len())];
            sentences[idx] = format!("{} {fragment}", sentences[idx].trim_end());
        }
    }
}

fn lowercase_sentence_starts(sentences: &mut [String], rng: &mut StdRng) {
    for sentence in sentences.iter_mut() {
        if rng.gen::<f64>() < 0.3 {
            let mut chars = sentence.chars();
            if let Some(first) = chars.next() {
                *sentence = format!("{}{}", first.to_lowercase(), chars.as_str());
            }
        }
    }
}

fn remove_tidy_ending(sentences: &mut Vec<String>) {
    if let Some(last) = sentences.last() {
        if closing_summary_sentence().is_match(last) {
            sentences.pop();
        }
    }
}

/// §4.9 contract: applies the six deterministic transformations in order,
/// seeding the PRNG from a hash of the input text so identical `(text,
/// intensity)` pairs always humanize the same way.
#[must_use]
pub fn humanize(text: &str, intensity: Intensity) -> String {
    if text.trim().is_empty() {
        return text.to_string();
    }

    let paragraphs: Vec<&str> = text.split("\n\n").collect();
    let mut rng = StdRng::seed_from_u64(seed_from_text(text));

    let humanized_paragraphs: Vec<String> = paragraphs
        .into_iter()
        .map(|paragraph| {
            let stripped = strip_artifacts(paragraph);
            let substituted = casual_substitutions(&stripped);
            let mut sentences = split_sentences(&substituted);
            if sentences.is_empty() {
                return substituted;
            }
            inject_fillers(&mut sentences, intensity, &mut rng);
            if intensity == Intensity::Heavy {
                insert_self_corrections(&mut sentences, &mut rng);
            }
            if matches!(intensity, Intensity::Moderate | Intensity::Heavy) {
                lowercase_sentence_starts(&mut sentences, &mut rng);
            }
            remove_tidy_ending(&mut sentences);
            sentences.join(" ")
        })
        .collect();

    let result = humanized_paragraphs.join("\n\n");
    if result.trim().is_empty() {
        text.to_string()
    } else {
        result
    }
}
