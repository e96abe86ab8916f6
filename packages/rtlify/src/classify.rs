//! Right-to-left script ratio of a piece of text
//!
//! The ratio only looks at alphabetic characters, classified by their Unicode bidirectional
//! class. Whitespace, digits (including Arabic-Indic digits), combining marks, punctuation and
//! URL-like tokens count toward neither script.

use unicode_bidi::{BidiClass, bidi_class};

use crate::TagCategory;

const URL_PREFIXES: &[&str] = &["http://", "https://", "ftp://", "www.", "mailto:"];

/// Ratios closer than this are treated as the same classification
pub const RATIO_EPSILON: f32 = 0.01;

/// Strong right-to-left characters: Hebrew-like (`R`) and Arabic-like (`AL`) letters
pub fn is_rtl_char(c: char) -> bool {
    matches!(bidi_class(c), BidiClass::R | BidiClass::AL)
}

fn is_url_like(token: &str) -> bool {
    let lower = token.to_ascii_lowercase();
    URL_PREFIXES.iter().any(|prefix| lower.starts_with(prefix)) || lower.contains("://")
}

/// Share of right-to-left letters among all letters of `text`, in `0.0..=1.0`
pub fn ratio(text: &str) -> f32 {
    let mut rtl = 0usize;
    let mut total = 0usize;

    for token in text.split_whitespace().filter(|token| !is_url_like(token)) {
        // Combining marks take the direction of their base letter
        let letters = token
            .chars()
            .filter(|c| c.is_alphabetic() && bidi_class(*c) != BidiClass::NSM);
        for c in letters {
            total += 1;
            if is_rtl_char(c) {
                rtl += 1;
            }
        }
    }

    if total == 0 {
        0.0
    } else {
        rtl as f32 / total as f32
    }
}

/// Round to the two decimals stored in the ratio attribute
pub fn round_ratio(ratio: f32) -> f32 {
    (ratio * 100.0).round() / 100.0
}

/// Whether a node of `category` with the given ratio should be styled.
///
/// Always-checked categories qualify on any right-to-left content at all.
pub fn qualifies(category: TagCategory, ratio: f32, threshold: f32) -> bool {
    if category.always_check() {
        ratio > 0.0
    } else {
        ratio >= threshold
    }
}
