/// Local sentence splitter (§9 "zero LLM cost" rhythm metadata): splits on
/// terminal punctuation, keeping the punctuation with the preceding text.
#[must_use]
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let bytes = text.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'.' || b == b'!' || b == b'?' {
            let candidate = text[start..=i].trim();
            if !candidate.is_empty() {
                sentences.push(candidate);
            }
            start = i + 1;
        }
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

/// Whitespace/punctuation word split, lowercased comparison left to callers.
#[must_use]
pub fn split_words(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
        .collect()
}
