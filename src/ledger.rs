//! Outcome ledger
//!
//! Per-control record of what happened during a pass: which control was
//! filled, by which mechanism, or left unfilled. Entries are keyed by
//! selector and upserted, so re-running a pass or layering an action batch
//! over a fuzzy pass overwrites rather than duplicates.

use crate::form::{FormTree, NodeId};
use crate::hierarchy;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Mechanism that produced a field's final state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilledBy {
    FuzzyMatch,
    AiAutofill,
    Failed,
}

/// One ledger row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingEntry {
    pub field_name: String,
    pub full_label_path: String,
    pub required: bool,
    pub filled: bool,
    pub filled_by: Option<FilledBy>,
    pub selector: String,
}

/// Aggregate counts over the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LedgerSummary {
    pub total: usize,
    pub filled: usize,
    pub failed: usize,
    pub required_unfilled: usize,
}

/// The pass-scoped ledger. One instance per session; explicit, never
/// global.
#[derive(Debug, Default)]
pub struct TrackingLedger {
    entries: Vec<TrackingEntry>,
}

impl TrackingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[TrackingEntry] {
        &self.entries
    }

    fn position(&self, selector: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.selector == selector)
    }

    /// Record the outcome for one control, replacing any earlier entry for
    /// the same selector in place.
    pub fn track_control(
        &mut self,
        tree: &FormTree,
        node: NodeId,
        filled: bool,
        filled_by: Option<FilledBy>,
    ) {
        let selector = tree.selector(node);
        let entry = TrackingEntry {
            field_name: hierarchy::field_name(tree, node),
            full_label_path: hierarchy::full_label_path(tree, node),
            required: tree.is_required(node),
            filled,
            filled_by,
            selector: selector.clone(),
        };
        debug!(selector = %selector, filled, by = ?filled_by, "tracking control");
        match self.position(&selector) {
            Some(i) => self.entries[i] = entry,
            None => self.entries.push(entry),
        }
    }

    /// Finalize the pass: every interactive control not yet tracked is
    /// examined, and the still-empty ones are recorded as failures.
    /// Controls that already carry a value (user-prefilled, defaults) are
    /// left out of the ledger entirely.
    pub fn sweep_unfilled(&mut self, tree: &FormTree) {
        for node in tree.controls() {
            let selector = tree.selector(node);
            if self.position(&selector).is_some() {
                continue;
            }
            if !tree.is_empty_control(node) {
                continue;
            }
            self.track_control(tree, node, false, Some(FilledBy::Failed));
        }
    }

    pub fn summary(&self) -> LedgerSummary {
        LedgerSummary {
            total: self.entries.len(),
            filled: self.entries.iter().filter(|e| e.filled).count(),
            failed: self
                .entries
                .iter()
                .filter(|e| e.filled_by == Some(FilledBy::Failed))
                .count(),
            required_unfilled: self
                .entries
                .iter()
                .filter(|e| e.required && !e.filled)
                .count(),
        }
    }
}
