use std::sync::OnceLock;

use regex::Regex;

fn compiled(pattern: &str) -> Regex {
    Regex::new(pattern).expect("lexicon pattern is valid")
}

pub(crate) fn supportive() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compiled(r"(?i)\b(you('re| are) not alone|sending support|rooting for you|proud of you|hang in there)\b"))
}

pub(crate) fn critical() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compiled(r"(?i)\b(disagree|wrong|flawed|overrated|terrible|doesn't work|bad idea)\b"))
}

pub(crate) fn technical() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compiled(r"(?i)\b(api|latency|throughput|architecture|algorithm|benchmark|config(uration)?)\b"))
}

pub(crate) fn casual() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compiled(r"(?i)\b(lol|lmao|gonna|kinda|ngl|tbh|yeah)\b"))
}

pub(crate) fn formal() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compiled(r"(?i)\b(furthermore|therefore|henceforth|pursuant|accordingly)\b"))
}

pub(crate) fn contraction() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compiled(r"(?i)\b\w+'(t|re|ve|ll|d|s|m)\b"))
}

pub(crate) fn promotional() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compiled(r"(?i)\b(check out|use code|limited time|sign up now|buy now|discount)\b"))
}

pub(crate) fn self_referential() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compiled(r"(?i)\b(i built|i made|my product|my app|my startup|we launched)\b"))
}

pub(crate) fn url() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compiled(r"https?://\S+"))
}

pub(crate) fn low_effort() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compiled(r"(?i)^\s*(this|same|agreed|\+1|this\s*!+)\s*\.?\s*$"))
}

pub(crate) fn spam() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compiled(r"(?i)\b(dm me|click here|free money|act now|subscribe to my)\b"))
}

pub(crate) fn off_topic() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compiled(r"(?i)\b(unrelated but|off[- ]topic|random question)\b"))
}
