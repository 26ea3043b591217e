use std::sync::OnceLock;

use regex::Regex;

/// Regex signals used by [`crate::score`], compiled once and reused across
/// every call (§4.2: "Patterns are compiled once at module initialization").
pub(crate) mod signals {
    use super::*;

    static FIRST_PERSON: OnceLock<Regex> = OnceLock::new();
    static EMOTIONAL_LEXICON: OnceLock<Regex> = OnceLock::new();
    static METRIC: OnceLock<Regex> = OnceLock::new();
    static BOT_SIGNATURE: OnceLock<Regex> = OnceLock::new();
    static URL: OnceLock<Regex> = OnceLock::new();

    pub fn first_person() -> &'static Regex {
        FIRST_PERSON.get_or_init(|| {
            Regex::new(r"(?i)\b(i|i'm|i've|i'll|i'd|my|mine|myself)\b")
                .expect("first-person pattern is valid")
        })
    }

    pub fn emotional_lexicon() -> &'static Regex {
        EMOTIONAL_LEXICON.get_or_init(|| {
            Regex::new(
                r"(?i)\b(amazing|incredible|frustrated|frustrating|excited|thrilled|love|loved|hate|hated|terrible|awful|fantastic|devastated|annoyed|grateful|anxious|nervous|overwhelmed|thankful|desperate|heartbroken)\b",
            )
            .expect("emotional lexicon pattern is valid")
        })
    }

    pub fn metric() -> &'static Regex {
        METRIC.get_or_init(|| {
            Regex::new(r"\$\d+(\.\d+)?|\b\d+(\.\d+)?\s?(%|x|lbs?|kg|hours?|hrs?|days?|weeks?|months?|years?)\b")
                .expect("metric pattern is valid")
        })
    }

    pub fn bot_signature() -> &'static Regex {
        BOT_SIGNATURE.get_or_init(|| {
            Regex::new(r"(?i)i am a bot|this action was performed automatically|contact the moderators of this subreddit")
                .expect("bot signature pattern is valid")
        })
    }

    pub fn url() -> &'static Regex {
        URL.get_or_init(|| Regex::new(r"https?://\S+").expect("url pattern is valid"))
    }
}
