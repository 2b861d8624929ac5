//! Edit-distance similarity scoring
//!
//! Token-sort fuzzy ratio: both sides are tokenized, sorted and rejoined
//! before `strsim::levenshtein`, so `"Name, First"` and `"first name"`
//! score 1.0. This is the last-resort strategy in the match cascade.

use crate::normalize::normalize_and_sort;

/// Token-sorted Levenshtein similarity ratio in `[0, 1]`.
///
/// `1 - distance / max(len)` over the token-sort forms of both inputs.
/// Two empty strings are identical (ratio 1.0).
pub fn similarity_score(a: &str, b: &str) -> f32 {
    let s1 = normalize_and_sort(a);
    let s2 = normalize_and_sort(b);

    let max_len = s1.chars().count().max(s2.chars().count());
    if max_len == 0 {
        return 1.0;
    }

    let distance = strsim::levenshtein(&s1, &s2);
    1.0 - distance as f32 / max_len as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical() {
        assert_eq!(similarity_score("email", "email"), 1.0);
        assert_eq!(similarity_score("", ""), 1.0);
    }

    #[test]
    fn test_word_order_irrelevant() {
        assert_eq!(similarity_score("First Name", "name first"), 1.0);
        assert_eq!(similarity_score("first_name", "Name First"), 1.0);
    }

    #[test]
    fn test_typo_scores_high() {
        let score = similarity_score("phone number", "phone numer");
        assert!(score > 0.9, "got {score}");
    }

    #[test]
    fn test_unrelated_scores_low() {
        let score = similarity_score("salary expectation", "zip");
        assert!(score < 0.3, "got {score}");
    }
}
