use std::sync::OnceLock;

use regex::Regex;

fn formal_transitions() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(furthermore|moreover|additionally|consequently|in conclusion)\b")
            .expect("formal transition pattern is valid")
    })
}

fn model_signature() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(as an ai|i don't have personal|i cannot provide|as a language model)\b")
            .expect("model signature pattern is valid")
    })
}

fn corporate_buzzwords() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(leverage|synerg\w*|streamline|robust solution|game[- ]changer|unlock(?:ing|ed)? the (?:power|potential))\b")
            .expect("buzzword pattern is valid")
    })
}

fn bullet_list_dominance(text: &str) -> bool {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return false;
    }
    let bullets = lines
        .iter()
        .filter(|l| {
            let t = l.trim_start();
            t.starts_with('-') || t.starts_with('*') || t.chars().next().is_some_and(|c| c.is_ascii_digit())
        })
        .count();
    (bullets as f64 / lines.len() as f64) > 0.5
}

fn generic_greeting() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(great question|i'd be happy to|sure, here's|hope this helps)")
            .expect("generic greeting pattern is valid")
    })
}

fn so_opener() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?mi)^\s*so,\s").expect("so-opener pattern is valid"))
}

/// §4.10 contract: an informational count (0..=6) of structural AI tells
/// present in `text`. Never gates generation; the generator logs it for
/// observability only.
#[must_use]
pub fn detect(text: &str) -> u32 {
    let mut count = 0;
    if formal_transitions().is_match(text) {
        count += 1;
    }
    if model_signature().is_match(text) {
        count += 1;
    }
    if corporate_buzzwords().is_match(text) {
        count += 1;
    }
    if bullet_list_dominance(text) {
        count += 1;
    }
    if generic_greeting().is_match(text) {
        count += 1;
    }
    if so_opener().is_match(text) {
        count += 1;
    }
    count
}
