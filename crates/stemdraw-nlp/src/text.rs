/// Shared text helpers for the extractor adapters.

/// Stable node id from a surface form: lowercase, alphanumerics kept,
/// everything else collapsed to single underscores.
pub fn slug(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_sep = true;
    for c in text.trim().chars() {
        if c.is_alphanumeric() {
            for lower in c.to_lowercase() {
                out.push(lower);
            }
            last_sep = false;
        } else if !last_sep {
            out.push('_');
            last_sep = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Split into sentences on terminal punctuation, keeping non-empty trims.
pub fn sentences(text: &str) -> Vec<&str> {
    text.split(|c| matches!(c, '.' | ';' | '!' | '?'))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Whitespace tokens with surrounding punctuation stripped.
pub fn tokens(sentence: &str) -> Vec<&str> {
    sentence
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric() && c != 'µ' && c != 'Ω' && c != 'κ'))
        .filter(|t| !t.is_empty())
        .collect()
}
