use conditioner_types::BlacklistCategory;

use crate::lexicon;

/// §4.4 `forbidden_patterns` / §4.12 pattern mining: scans `text` for hits in
/// each of the six noise categories. Shared between C4's corpus aggregation
/// and C12's audit-failure mining, per the contract that both reuse "the
/// same lexicon scan".
#[must_use]
pub fn scan(text: &str) -> Vec<BlacklistCategory> {
    let mut hits = Vec::new();
    if lexicon::promotional().is_match(text) {
        hits.push(BlacklistCategory::Promotional);
    }
    if lexicon::self_referential().is_match(text) {
        hits.push(BlacklistCategory::SelfReferential);
    }
    if lexicon::url().is_match(text) {
        hits.push(BlacklistCategory::Link);
    }
    if lexicon::low_effort().is_match(text) {
        hits.push(BlacklistCategory::LowEffort);
    }
    if lexicon::spam().is_match(text) {
        hits.push(BlacklistCategory::Spam);
    }
    if lexicon::off_topic().is_match(text) {
        hits.push(BlacklistCategory::OffTopic);
    }
    hits
}

/// Like [`scan`], but also returns the matched substring for each hit — the
/// concrete text C12 needs to mine a `BlacklistEntry.forbidden_pattern` from,
/// where [`scan`]'s category alone isn't enough.
#[must_use]
pub fn scan_with_matches(text: &str) -> Vec<(BlacklistCategory, String)> {
    let categorized = [
        (lexicon::promotional(), BlacklistCategory::Promotional),
        (lexicon::self_referential(), BlacklistCategory::SelfReferential),
        (lexicon::url(), BlacklistCategory::Link),
        (lexicon::low_effort(), BlacklistCategory::LowEffort),
        (lexicon::spam(), BlacklistCategory::Spam),
        (lexicon::off_topic(), BlacklistCategory::OffTopic),
    ];

    categorized
        .into_iter()
        .filter_map(|(re, category)| re.find(text).map(|m| (category, m.as_str().to_string())))
        .collect()
}

/// Marketing-jargon density used by both §4.4's `marketing_jargon_penalty`
/// term and §4.4's ISC computation: promotional/self-referential hits per
/// word, capped at `1.0`.
#[must_use]
pub fn marketing_jargon_penalty(text: &str) -> f64 {
    let words = crate::tokenize::split_words(text).len().max(1);
    let hits = lexicon::promotional().find_iter(text).count() + lexicon::self_referential().find_iter(text).count();
    (hits as f64 / words as f64 * 10.0).min(1.0)
}

/// Link density used by §4.4's `link_density_penalty` term: URL count per
/// sentence, capped at `1.0`.
#[must_use]
pub fn link_density_penalty(text: &str) -> f64 {
    let sentences = crate::tokenize::split_sentences(text).len().max(1);
    let hits = lexicon::url().find_iter(text).count();
    (hits as f64 / sentences as f64).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_detects_promotional_language() {
        assert!(scan("check out my product, use code SAVE10").contains(&BlacklistCategory::Promotional));
    }

    #[test]
    fn scan_detects_links() {
        assert!(scan("see https://example.com for details").contains(&BlacklistCategory::Link));
    }

    #[test]
    fn scan_detects_low_effort_replies() {
        assert!(scan("this!").contains(&BlacklistCategory::LowEffort));
    }

    #[test]
    fn scan_returns_empty_for_clean_text() {
        assert!(scan("I spent three months rebuilding this workflow from scratch.").is_empty());
    }

    #[test]
    fn scan_with_matches_returns_the_matched_text() {
        let hits = scan_with_matches("see https://example.com for details");
        assert!(hits.iter().any(|(c, m)| *c == BlacklistCategory::Link && m.contains("example.com")));
    }

    #[test]
    fn marketing_jargon_penalty_is_bounded() {
        let penalty = marketing_jargon_penalty("buy now use code now my product my app my startup we launched");
        assert!((0.0..=1.0).contains(&penalty));
    }

    #[test]
    fn link_density_penalty_is_bounded() {
        let penalty = link_density_penalty("https://a.com https://b.com https://c.com. one sentence only");
        assert!((0.0..=1.0).contains(&penalty));
    }
}
