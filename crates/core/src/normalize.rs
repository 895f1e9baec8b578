use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use unicode_normalization::UnicodeNormalization;

/// Abbreviations expanded before intent and keyword detection, applied in
/// this order. Later entries see the output of earlier ones.
pub const ABBREVIATIONS: &[(&str, &str)] = &[
    ("tẩy", "tẩy trắng"),
    ("tẩy tr", "tẩy trắng"),
    ("trắng", "tẩy trắng"),
    ("nha khoa", "nhakhoa"),
];

// An explicit symbol set, not a `*`-to-`_` character range: `-` and `_`
// are single members, so digits are never stripped.
static PUNCTUATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"["'“”‘’()\[\]{}<>:;,.!?\\/|@#$%^&*\-_=+~`]+"#)
        .expect("valid punctuation regex")
});

static ABBREVIATION_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    ABBREVIATIONS
        .iter()
        .map(|(short, long)| {
            let pattern = format!(r"\b{}\b", regex::escape(short));
            (
                Regex::new(&pattern).expect("valid abbreviation regex"),
                *long,
            )
        })
        .collect()
});

/// Canonical form used by every matcher: NFC, lowercase, punctuation
/// replaced by spaces, whitespace collapsed. Idempotent.
pub fn normalize_text(input: &str) -> String {
    if input.trim().is_empty() {
        return String::new();
    }

    // Lowercasing can emit combining marks, so recompose afterwards too.
    let composed = input.nfc().collect::<String>().to_lowercase();
    let composed = composed.nfc().collect::<String>();
    let stripped = PUNCTUATION.replace_all(&composed, " ");

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whole-word replacement of the entries in [`ABBREVIATIONS`].
pub fn expand_abbreviations(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    let mut text = input.to_string();
    for (pattern, expansion) in ABBREVIATION_PATTERNS.iter() {
        text = pattern.replace_all(&text, NoExpand(expansion)).into_owned();
    }
    text
}
