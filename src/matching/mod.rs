//! Contextual match engine
//!
//! Scores one control's label hierarchy against every flattened data key.
//! Per hierarchy entry the strategy cascade short-circuits on the first
//! strategy that clears its internal cutoff; entry scores are weighted by
//! tier and averaged over the weights actually used. Across keys the
//! highest score above threshold wins, ties broken by match class.

pub mod strategies;

use crate::alias::AliasTable;
use crate::config::MatchConfig;
use crate::hierarchy::LabelHierarchy;
use crate::normalize::{extract_tokens, normalize_text};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strategies::{default_cascade, MatchStrategy, StrategyContext};
use tracing::debug;

/// Categorical confidence tier; the primary tie-break ahead of score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchClass {
    Exact,
    Alias,
    Fuzzy,
}

impl MatchClass {
    /// Exact > Alias > Fuzzy.
    pub fn priority(self) -> u8 {
        match self {
            MatchClass::Exact => 3,
            MatchClass::Alias => 2,
            MatchClass::Fuzzy => 1,
        }
    }

    /// Keep the stronger of two classes.
    fn escalate(self, other: MatchClass) -> MatchClass {
        if other.priority() > self.priority() {
            other
        } else {
            self
        }
    }
}

/// Score and class for one (hierarchy, key) evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchOutcome {
    pub score: f32,
    pub class: MatchClass,
}

/// A surviving (control, key) candidate entering the assignment pool.
#[derive(Debug, Clone, Serialize)]
pub struct MatchCandidate {
    pub selector: String,
    pub data_key: String,
    pub score: f32,
    pub class: MatchClass,
}

/// The matching engine: config, alias table and strategy cascade.
pub struct MatchEngine<'a> {
    config: &'a MatchConfig,
    aliases: &'a AliasTable,
    cascade: Vec<Box<dyn MatchStrategy + Send + Sync>>,
}

impl<'a> MatchEngine<'a> {
    pub fn new(config: &'a MatchConfig, aliases: &'a AliasTable) -> Self {
        Self {
            config,
            aliases,
            cascade: default_cascade(),
        }
    }

    /// Replace the strategy cascade (order is evaluation order).
    pub fn with_cascade(mut self, cascade: Vec<Box<dyn MatchStrategy + Send + Sync>>) -> Self {
        self.cascade = cascade;
        self
    }

    /// Score one data key against a label hierarchy.
    ///
    /// Returns `None` when no hierarchy entry has usable text.
    pub fn contextual_match(&self, data_key: &str, hierarchy: &LabelHierarchy) -> Option<MatchOutcome> {
        let normalized_key = normalize_text(data_key);
        let key_tokens = extract_tokens(data_key);
        let path: Vec<&str> = hierarchy.iter().map(|c| c.text.as_str()).collect();

        let mut total_score = 0.0f32;
        let mut total_weight = 0.0f32;
        let mut class = MatchClass::Fuzzy;

        for (i, candidate) in hierarchy.iter().enumerate() {
            let normalized_label = normalize_text(&candidate.text);
            if normalized_label.is_empty() {
                continue;
            }
            let weight = self
                .config
                .tier_weights
                .get(i)
                .copied()
                .unwrap_or(0.1);
            total_weight += weight;

            let label_tokens = extract_tokens(&candidate.text);
            let ctx = StrategyContext {
                normalized_label: &normalized_label,
                label_tokens: &label_tokens,
                normalized_key: &normalized_key,
                key_tokens: &key_tokens,
                tier_index: i,
                path_so_far: &path[..=i],
                stopwords: &self.config.stopwords,
                aliases: self.aliases,
            };

            for strategy in &self.cascade {
                if let Some(hit) = strategy.score(&ctx) {
                    total_score += hit.score * weight;
                    class = class.escalate(hit.class);
                    break;
                }
            }
        }

        if total_weight == 0.0 {
            return None;
        }

        Some(MatchOutcome {
            score: total_score / total_weight,
            class,
        })
    }

    /// Best data key for one control's hierarchy, above the given
    /// threshold. Ties on score are broken by match class priority.
    pub fn best_match(
        &self,
        hierarchy: &LabelHierarchy,
        keys: &BTreeMap<String, String>,
        threshold: f32,
    ) -> Option<(String, MatchOutcome)> {
        if hierarchy.is_empty() {
            return None;
        }

        let mut best: Option<(String, MatchOutcome)> = None;
        for key in keys.keys() {
            let Some(outcome) = self.contextual_match(key, hierarchy) else {
                continue;
            };
            if outcome.score <= threshold {
                continue;
            }
            let better = match &best {
                None => true,
                Some((_, current)) => {
                    outcome.score > current.score
                        || (outcome.score == current.score
                            && outcome.class.priority() > current.class.priority())
                }
            };
            if better {
                best = Some((key.clone(), outcome));
            }
        }

        if let Some((key, outcome)) = &best {
            debug!(
                key = %key,
                score = outcome.score,
                class = ?outcome.class,
                "best match for hierarchy"
            );
        }
        best
    }
}
