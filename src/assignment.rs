//! Conflict-free assignment
//!
//! Turns the pool of surviving (control, key) candidates into a set of
//! commitments where every selector and every data key appears at most
//! once. Candidates are taken in strength order, class first, then score,
//! and a candidate is skipped when either side is already claimed.

use crate::matching::MatchCandidate;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

/// One committed fill: this selector gets this key's value.
#[derive(Debug, Clone, Serialize)]
pub struct Assignment {
    pub selector: String,
    pub data_key: String,
    pub score: f32,
    pub class: crate::matching::MatchClass,
}

/// Resolve the candidate pool greedily.
///
/// Ordering is (class priority desc, score desc); the input order only
/// matters between candidates identical on both. Each selector and each
/// data key is committed at most once.
pub fn resolve(mut pool: Vec<MatchCandidate>) -> Vec<Assignment> {
    pool.sort_by(|a, b| {
        b.class
            .priority()
            .cmp(&a.class.priority())
            .then(b.score.total_cmp(&a.score))
    });

    let mut claimed_selectors: BTreeSet<String> = BTreeSet::new();
    let mut claimed_keys: BTreeSet<String> = BTreeSet::new();
    let mut committed = Vec::new();

    for candidate in pool {
        if claimed_selectors.contains(&candidate.selector) || claimed_keys.contains(&candidate.data_key)
        {
            continue;
        }
        debug!(
            selector = %candidate.selector,
            key = %candidate.data_key,
            score = candidate.score,
            class = ?candidate.class,
            "committing assignment"
        );
        claimed_selectors.insert(candidate.selector.clone());
        claimed_keys.insert(candidate.data_key.clone());
        committed.push(Assignment {
            selector: candidate.selector,
            data_key: candidate.data_key,
            score: candidate.score,
            class: candidate.class,
        });
    }

    committed
}

/// Whether a piece of label text marks an upload-related control.
pub fn is_upload_related(text: &str, keywords: &[String]) -> bool {
    let lowered = text.to_lowercase();
    keywords.iter().any(|k| lowered.contains(k.as_str()))
}
