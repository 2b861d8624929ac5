//! Text normalization for label/key matching
//!
//! Every comparison in the matching engine runs over normalized text:
//! - Unicode NFKC normalization
//! - Lowercase conversion
//! - Punctuation stripping
//! - Token extraction across `_`, `-`, `.` and whitespace boundaries

use unicode_normalization::UnicodeNormalization;

/// Normalize text to its comparison form: lowercase alphanumerics only.
///
/// Used for exact/alias/containment comparison; never displayed.
///
/// # Examples
///
/// ```
/// use formfill::normalize::normalize_text;
///
/// assert_eq!(normalize_text("First Name:*"), "firstname");
/// assert_eq!(normalize_text("e-mail_address"), "emailaddress");
/// ```
pub fn normalize_text(s: &str) -> String {
    s.nfkc()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Extract comparison tokens from a label or data key.
///
/// Splits on whitespace, punctuation, `_`, `-` and `.` so that
/// `"first_name"`, `"first-name"` and `"First Name"` all tokenize to
/// `["first", "name"]`.
pub fn extract_tokens(s: &str) -> Vec<String> {
    let folded: String = s.nfkc().collect();
    folded
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Token-sort form: normalized tokens, alphabetically sorted, space-joined.
///
/// Word order becomes irrelevant for similarity scoring over this form.
pub fn normalize_and_sort(s: &str) -> String {
    let mut tokens = extract_tokens(s);
    tokens.sort();
    tokens.join(" ")
}

/// Strip trailing `:` and `*` decoration from a visible label.
pub fn clean_label(s: &str) -> String {
    s.trim().trim_end_matches([':', '*']).trim().to_string()
}
