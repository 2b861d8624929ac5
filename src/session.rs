//! Pass orchestration
//!
//! [`AutofillSession`] owns one form snapshot and runs the two passes over
//! it: the local fuzzy pass, then the externally supplied action batch.
//! Every operation is idempotent; the fuzzy pass resets the ledger and the
//! claimed-selector set, and only ever touches empty controls.

use crate::actions::{self, ActionReport};
use crate::alias::AliasTable;
use crate::assignment::{self, Assignment};
use crate::config::MatchConfig;
use crate::error::Result;
use crate::fill;
use crate::form::{ControlKind, FileArtifact, FormTree, NodeId};
use crate::hierarchy;
use crate::ledger::{FilledBy, LedgerSummary, TrackingEntry, TrackingLedger};
use crate::matching::{MatchCandidate, MatchClass, MatchEngine};
use crate::normalize::normalize_text;
use crate::record::DataRecord;
use crate::similarity::similarity_score;
use crate::snapshot::{self, FormSnapshot};
use std::collections::BTreeSet;
use tracing::{debug, info, instrument};

/// One committed fill as reported to the caller.
#[derive(Debug, Clone, serde::Serialize)]
pub struct FillRecord {
    pub selector: String,
    pub data_key: String,
    pub score: f32,
    pub class: MatchClass,
}

/// Outcome of a fuzzy pass.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct FuzzyPassReport {
    pub success: bool,
    pub filled_count: usize,
    pub fills: Vec<FillRecord>,
    pub exact_count: usize,
    pub alias_count: usize,
    pub fuzzy_count: usize,
}

/// Stateful driver for one form.
pub struct AutofillSession {
    tree: FormTree,
    config: MatchConfig,
    aliases: AliasTable,
    ledger: TrackingLedger,
    filled_selectors: BTreeSet<String>,
    file_payload: Option<FileArtifact>,
}

impl AutofillSession {
    pub fn new(tree: FormTree) -> Self {
        Self {
            tree,
            config: MatchConfig::default(),
            aliases: AliasTable::builtin().clone(),
            ledger: TrackingLedger::new(),
            filled_selectors: BTreeSet::new(),
            file_payload: None,
        }
    }

    pub fn with_config(mut self, config: MatchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_aliases(mut self, aliases: AliasTable) -> Self {
        self.aliases = aliases;
        self
    }

    /// Inject the downloaded file payload used for upload controls. Without
    /// one, uploads fall back to an empty placeholder document.
    pub fn set_file_payload(&mut self, payload: FileArtifact) {
        self.file_payload = Some(payload);
    }

    pub fn tree(&self) -> &FormTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut FormTree {
        &mut self.tree
    }

    /// First pass: resolve and fill every control the record confidently
    /// covers. Non-empty controls are left alone, so re-running the pass on
    /// an already filled form commits nothing.
    #[instrument(skip_all, fields(url = %self.tree.url()))]
    pub fn run_fuzzy_pass(&mut self, record: &DataRecord) -> FuzzyPassReport {
        self.ledger.reset();
        self.filled_selectors.clear();

        let flat = record.flatten();

        let mut pool: Vec<MatchCandidate> = Vec::new();
        {
            let engine = MatchEngine::new(&self.config, &self.aliases);
            for node in self.tree.controls() {
                let kind = self.tree.control_kind(node);
                if kind.is_file() || !self.tree.is_empty_control(node) {
                    continue;
                }
                let hierarchy = hierarchy::build_hierarchy(&self.tree, node);
                if hierarchy.is_empty() {
                    continue;
                }
                if let Some((key, outcome)) =
                    engine.best_match(&hierarchy, &flat, self.config.threshold)
                {
                    pool.push(MatchCandidate {
                        selector: self.tree.selector(node),
                        data_key: key,
                        score: outcome.score,
                        class: outcome.class,
                    });
                }
            }
        }

        let assignments = assignment::resolve(pool);
        let mut report = FuzzyPassReport::default();
        for assignment in &assignments {
            let Some(node) = self.tree.resolve_selector(&assignment.selector) else {
                continue;
            };
            let Some(value) = flat
                .get(&assignment.data_key)
                .cloned()
                .or_else(|| record.lookup(&assignment.data_key))
            else {
                continue;
            };

            let filled = self.apply_fuzzy_fill(node, &value);
            let by = if filled { FilledBy::FuzzyMatch } else { FilledBy::Failed };
            self.ledger.track_control(&self.tree, node, filled, Some(by));
            if filled {
                self.filled_selectors.insert(assignment.selector.clone());
                self.record_fill(&mut report, assignment);
            }
        }

        self.run_file_pass(record, &flat, &mut report);

        self.ledger.sweep_unfilled(&self.tree);
        report.success = report.filled_count > 0;
        info!(filled = report.filled_count, "fuzzy pass complete");
        report
    }

    fn record_fill(&self, report: &mut FuzzyPassReport, assignment: &Assignment) {
        report.filled_count += 1;
        match assignment.class {
            MatchClass::Exact => report.exact_count += 1,
            MatchClass::Alias => report.alias_count += 1,
            MatchClass::Fuzzy => report.fuzzy_count += 1,
        }
        report.fills.push(FillRecord {
            selector: assignment.selector.clone(),
            data_key: assignment.data_key.clone(),
            score: assignment.score,
            class: assignment.class,
        });
    }

    /// Dispatch one committed value to the control's type-specific filler.
    fn apply_fuzzy_fill(&mut self, node: NodeId, value: &str) -> bool {
        match self.tree.control_kind(node) {
            ControlKind::Checkbox => {
                if fill::is_truthy(value) || self.value_names_control(node, value) {
                    fill::fill_checkbox(&mut self.tree, node, "yes")
                } else {
                    false
                }
            }
            ControlKind::Radio => {
                if self.value_names_control(node, value) {
                    fill::fill_radio(&mut self.tree, node)
                } else {
                    false
                }
            }
            ControlKind::Select => fill::fill_select(&mut self.tree, node, value, &self.config),
            ControlKind::MultiSelect => {
                let values: Vec<String> = value.split(", ").map(str::to_string).collect();
                fill::fill_multi_select(&mut self.tree, node, &values)
            }
            ControlKind::Date => fill::fill_date(&mut self.tree, node, value),
            ControlKind::File => false,
            _ => fill::fill_text(&mut self.tree, node, value),
        }
    }

    /// Gate for toggled controls: the committed value must resemble the
    /// control's own label or value attribute before anything is toggled.
    fn value_names_control(&self, node: NodeId, value: &str) -> bool {
        let mut own: Vec<String> = Vec::new();
        if let Some(label) = hierarchy::direct_label(&self.tree, node) {
            own.push(label);
        }
        if let Some(attr) = self.tree.attr(node, "value") {
            own.push(attr.to_string());
        }
        own.iter().any(|o| {
            normalize_text(o) == normalize_text(value) || similarity_score(o, value) > 0.7
        })
    }

    /// Separate resolution pass for file controls, which rarely carry
    /// conventional labels.
    fn run_file_pass(
        &mut self,
        record: &DataRecord,
        flat: &std::collections::BTreeMap<String, String>,
        report: &mut FuzzyPassReport,
    ) {
        let record_has_document = record.has_key_containing("resume") || record.has_key_containing("cv");
        let file_controls: Vec<NodeId> = self
            .tree
            .controls()
            .into_iter()
            .filter(|&n| self.tree.control_kind(n).is_file())
            .collect();

        for node in file_controls {
            let selector = self.tree.selector(node);
            if self.filled_selectors.contains(&selector) || !self.tree.files(node).is_empty() {
                continue;
            }

            let texts = hierarchy::file_label_texts(&self.tree, node);
            let upload_labelled = texts
                .iter()
                .any(|t| assignment::is_upload_related(t, &self.config.upload_keywords));
            if !upload_labelled {
                continue;
            }

            let file_hierarchy = hierarchy::build_file_hierarchy(&self.tree, node);
            let best = {
                let engine = MatchEngine::new(&self.config, &self.aliases);
                engine.best_match(&file_hierarchy, flat, self.config.file_threshold)
            };

            let key_names_document = best
                .as_ref()
                .map(|(key, _)| {
                    let lowered = key.to_lowercase();
                    lowered.contains("resume") || lowered.contains("cv")
                })
                .unwrap_or(false);
            if !key_names_document && !record_has_document {
                debug!(selector = %selector, "upload control without a document source");
                continue;
            }

            let artifact = self.file_artifact(record);
            if fill::fill_file(&mut self.tree, node, artifact) {
                self.ledger
                    .track_control(&self.tree, node, true, Some(FilledBy::FuzzyMatch));
                self.filled_selectors.insert(selector.clone());
                let (key, outcome) = best.unwrap_or_else(|| {
                    (
                        "resume".to_string(),
                        crate::matching::MatchOutcome {
                            score: self.config.file_threshold,
                            class: MatchClass::Fuzzy,
                        },
                    )
                });
                self.record_fill(
                    report,
                    &Assignment {
                        selector,
                        data_key: key,
                        score: outcome.score,
                        class: outcome.class,
                    },
                );
            }
        }
    }

    /// Artifact for uploads: the injected payload, else the fallback named
    /// after whatever document the record references.
    fn file_artifact(&self, record: &DataRecord) -> FileArtifact {
        if let Some(payload) = &self.file_payload {
            return payload.clone();
        }
        let named = record
            .lookup("resume")
            .or_else(|| record.lookup("cv"))
            .filter(|v| v.contains('.') && !v.contains('/') && v.len() < 80);
        match named {
            Some(name) => FileArtifact::fallback().named(&name),
            None => FileArtifact::fallback(),
        }
    }

    /// Serialize the current form for the external AI collaborator.
    pub fn capture_snapshot(&self) -> FormSnapshot {
        snapshot::capture(&self.tree, &self.filled_selectors)
    }

    /// Second pass: apply an externally produced action batch.
    #[instrument(skip_all)]
    pub fn execute_actions(&mut self, payload: &str) -> Result<ActionReport> {
        let report = actions::execute_batch(
            &mut self.tree,
            &mut self.ledger,
            &self.config,
            self.file_payload.as_ref(),
            payload,
        )?;
        self.filled_selectors.extend(report.filled_selectors.iter().cloned());
        self.ledger.sweep_unfilled(&self.tree);
        Ok(report)
    }

    /// Finalized ledger entries, with still-empty controls swept in.
    pub fn ledger(&mut self) -> &[TrackingEntry] {
        self.ledger.sweep_unfilled(&self.tree);
        self.ledger.entries()
    }

    pub fn ledger_summary(&mut self) -> LedgerSummary {
        self.ledger.sweep_unfilled(&self.tree);
        self.ledger.summary()
    }
}
