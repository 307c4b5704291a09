//! Free-text normalization and phrase matching.
//!
//! Indication text and drug names arrive as typed by a person or extracted
//! from a note: mixed case, underscores, hyphens, stray punctuation. Every
//! table lookup goes through `normalize` first and then matches whole words,
//! so "c_difficile", "C. difficile" and "c-difficile" all reach the same row
//! and "sepsis" never matches inside "antisepsis".

/// Lowercase, map separators to spaces, drop other punctuation and collapse
/// whitespace.
pub fn normalize(text: &str) -> String {
    let mapped: String = text
        .chars()
        .map(|c| match c {
            '_' | '-' | '/' | ',' | ';' | ':' | '(' | ')' | '.' => ' ',
            c => c.to_ascii_lowercase(),
        })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Return true if `phrase` occurs in `text` on word boundaries.
///
/// Both arguments must already be normalized.
pub fn contains_phrase(text: &str, phrase: &str) -> bool {
    if phrase.is_empty() {
        return false;
    }
    text.match_indices(phrase).any(|(start, _)| {
        let end = start + phrase.len();
        let before_ok = text[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = text[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}

/// Pick the entry whose key best matches `text`.
///
/// An exact key match wins outright; otherwise the entry with the longest key
/// contained in `text` as a phrase wins, and on equal length the earlier
/// entry. Keys are normalized before comparison.
pub fn best_match<'a, T, F>(text: &str, entries: &'a [T], keys: F) -> Option<&'a T>
where
    F: Fn(&T) -> &[&'static str],
{
    let text = normalize(text);
    if text.is_empty() {
        return None;
    }

    let mut best: Option<(&'a T, usize)> = None;
    for entry in entries {
        for key in keys(entry) {
            let key = normalize(key);
            if key == text {
                return Some(entry);
            }
            if contains_phrase(&text, &key) && best.map_or(true, |(_, len)| key.len() > len) {
                best = Some((entry, key.len()));
            }
        }
    }
    best.map(|(entry, _)| entry)
}

/// Return true if any of `phrases` occurs in `text`.
pub fn mentions_any(text: &str, phrases: &[&str]) -> bool {
    let text = normalize(text);
    phrases
        .iter()
        .any(|p| contains_phrase(&text, &normalize(p)))
}
