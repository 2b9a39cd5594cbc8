//! Canonical form used whenever two catalog strings are compared for identity.

use unicode_normalization::UnicodeNormalization;

/// Normalize text for identity comparison.
///
/// Performs:
/// - Unicode NFKC fold (full-width letters and digits become ASCII)
/// - Removal of every whitespace code point, including the ideographic space
/// - Lowercase conversion
///
/// The result is idempotent: `normalize(&normalize(s)) == normalize(s)`.
pub fn normalize(s: &str) -> String {
    let folded: String = s.nfkc().filter(|c| !c.is_whitespace()).collect();
    let lowered = folded.to_lowercase();
    // Lowercasing can produce sequences that are not NFKC-stable (e.g. U+0130).
    if lowered.nfkc().eq(lowered.chars()) {
        lowered
    } else {
        lowered.nfkc().filter(|c| !c.is_whitespace()).collect()
    }
}

/// Normalize an optional field, treating `None` as the empty string.
pub fn normalize_opt(s: Option<&str>) -> String {
    s.map(normalize).unwrap_or_default()
}

/// True when the value is absent or contains only whitespace.
pub fn is_blank(s: Option<&str>) -> bool {
    s.map_or(true, |s| s.trim().is_empty())
}
