//! Match strategy cascade
//!
//! Each strategy scores one (label, key) pair and declines unless it clears
//! its own internal cutoff; the engine runs them in order and takes the
//! first hit per hierarchy entry. The fuzzy fallback never declines, so
//! every usable entry contributes a score.

use crate::alias::AliasTable;
use crate::matching::MatchClass;
use crate::similarity::similarity_score;

/// Everything a strategy may look at for one hierarchy entry.
pub struct StrategyContext<'a> {
    /// Normalized label text of this entry.
    pub normalized_label: &'a str,
    /// Tokens of this entry's raw label.
    pub label_tokens: &'a [String],
    /// Normalized full data key path.
    pub normalized_key: &'a str,
    /// Tokens of the raw data key.
    pub key_tokens: &'a [String],
    /// Position of this entry in the hierarchy (0 = immediate).
    pub tier_index: usize,
    /// Raw label texts of all entries up to and including this one.
    pub path_so_far: &'a [&'a str],
    /// Stopwords dropped before contextual combination.
    pub stopwords: &'a [String],
    /// Alias dictionary.
    pub aliases: &'a AliasTable,
}

/// A strategy's accepted score and the match class it carries.
#[derive(Debug, Clone, Copy)]
pub struct StrategyHit {
    pub score: f32,
    pub class: MatchClass,
}

/// Common capability of every cascade member.
pub trait MatchStrategy {
    fn name(&self) -> &'static str;
    /// Score the entry, or decline when the internal cutoff is not met.
    fn score(&self, ctx: &StrategyContext<'_>) -> Option<StrategyHit>;
}

/// Normalized label equals normalized key.
pub struct ExactStrategy;

impl MatchStrategy for ExactStrategy {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn score(&self, ctx: &StrategyContext<'_>) -> Option<StrategyHit> {
        (!ctx.normalized_label.is_empty() && ctx.normalized_label == ctx.normalized_key).then_some(
            StrategyHit {
                score: 1.0,
                class: MatchClass::Exact,
            },
        )
    }
}

/// Canonical/alias dictionary lookup; engages above 0.9.
pub struct AliasStrategy;

impl MatchStrategy for AliasStrategy {
    fn name(&self) -> &'static str {
        "alias"
    }

    fn score(&self, ctx: &StrategyContext<'_>) -> Option<StrategyHit> {
        let score = ctx.aliases.score(ctx.normalized_label, ctx.normalized_key);
        (score > 0.9).then_some(StrategyHit {
            score,
            class: MatchClass::Alias,
        })
    }
}

/// Order-independent token coverage ("First Name" vs "first_name");
/// engages above 0.8.
pub struct MultiWordStrategy;

/// Coverage score for two token sets: ≥80% of label tokens must appear in
/// the key and ≥50% of key tokens in the label, yielding the larger
/// coverage ratio. Zero otherwise.
pub(crate) fn multi_word_score(label_tokens: &[String], key_tokens: &[String]) -> f32 {
    if label_tokens.is_empty() || key_tokens.is_empty() {
        return 0.0;
    }

    let matched = label_tokens
        .iter()
        .filter(|t| key_tokens.contains(t))
        .count();

    let label_coverage = matched as f32 / label_tokens.len() as f32;
    let key_coverage = matched as f32 / key_tokens.len() as f32;

    if label_coverage >= 0.8 && key_coverage >= 0.5 {
        label_coverage.max(key_coverage)
    } else {
        0.0
    }
}

impl MatchStrategy for MultiWordStrategy {
    fn name(&self) -> &'static str {
        "multi_word"
    }

    fn score(&self, ctx: &StrategyContext<'_>) -> Option<StrategyHit> {
        let score = multi_word_score(ctx.label_tokens, ctx.key_tokens);
        (score > 0.8).then_some(StrategyHit {
            score,
            class: MatchClass::Fuzzy,
        })
    }
}

/// Combined-path coverage ("References > Name > First" vs
/// "reference_name"); only considered past the immediate tier, engages
/// above 0.8 with a fixed 0.85 score.
pub struct ContextCombineStrategy;

impl MatchStrategy for ContextCombineStrategy {
    fn name(&self) -> &'static str {
        "context_combine"
    }

    fn score(&self, ctx: &StrategyContext<'_>) -> Option<StrategyHit> {
        if ctx.tier_index == 0 {
            return None;
        }

        let mut path_words: Vec<String> = Vec::new();
        for label in ctx.path_so_far {
            for word in crate::normalize::extract_tokens(label) {
                if ctx.stopwords.contains(&word) || path_words.contains(&word) {
                    continue;
                }
                path_words.push(word);
            }
        }
        if path_words.is_empty() {
            return None;
        }

        // A path word counts when it appears among the key's tokens, inside
        // the key, or itself contains a key token ("References" covers
        // "reference").
        let matched = path_words
            .iter()
            .filter(|w| {
                ctx.key_tokens.contains(w)
                    || ctx.normalized_key.contains(w.as_str())
                    || ctx
                        .key_tokens
                        .iter()
                        .any(|k| k.len() >= 4 && w.contains(k.as_str()))
            })
            .count();
        let coverage = matched as f32 / path_words.len() as f32;

        (coverage >= 0.6).then_some(StrategyHit {
            score: 0.85,
            class: MatchClass::Fuzzy,
        })
    }
}

/// Substring / token containment; engages above 0.7.
pub struct ContainmentStrategy;

/// Containment score: direct substring containment scores by length ratio
/// times 0.85; otherwise a mutually containing token pair with both sides
/// of at least four characters scores a flat 0.75.
pub(crate) fn containment_score(
    normalized_label: &str,
    normalized_key: &str,
    label_tokens: &[String],
    key_tokens: &[String],
) -> f32 {
    if normalized_label.is_empty() || normalized_key.is_empty() {
        return 0.0;
    }

    if normalized_label.contains(normalized_key) || normalized_key.contains(normalized_label) {
        let shorter = normalized_label.len().min(normalized_key.len()) as f32;
        let longer = normalized_label.len().max(normalized_key.len()) as f32;
        return shorter / longer * 0.85;
    }

    for label_word in label_tokens {
        for key_word in key_tokens {
            if label_word.len() >= 4
                && key_word.len() >= 4
                && (label_word.contains(key_word.as_str())
                    || key_word.contains(label_word.as_str()))
            {
                return 0.75;
            }
        }
    }

    0.0
}

impl MatchStrategy for ContainmentStrategy {
    fn name(&self) -> &'static str {
        "containment"
    }

    fn score(&self, ctx: &StrategyContext<'_>) -> Option<StrategyHit> {
        let score = containment_score(
            ctx.normalized_label,
            ctx.normalized_key,
            ctx.label_tokens,
            ctx.key_tokens,
        );
        (score > 0.7).then_some(StrategyHit {
            score,
            class: MatchClass::Fuzzy,
        })
    }
}

/// Token-sorted Levenshtein ratio; the last resort, never declines.
pub struct FuzzyStrategy;

impl MatchStrategy for FuzzyStrategy {
    fn name(&self) -> &'static str {
        "fuzzy"
    }

    fn score(&self, ctx: &StrategyContext<'_>) -> Option<StrategyHit> {
        Some(StrategyHit {
            score: similarity_score(ctx.normalized_label, ctx.normalized_key),
            class: MatchClass::Fuzzy,
        })
    }
}

/// The cascade in evaluation order.
pub fn default_cascade() -> Vec<Box<dyn MatchStrategy + Send + Sync>> {
    vec![
        Box::new(ExactStrategy),
        Box::new(AliasStrategy),
        Box::new(MultiWordStrategy),
        Box::new(ContextCombineStrategy),
        Box::new(ContainmentStrategy),
        Box::new(FuzzyStrategy),
    ]
}
