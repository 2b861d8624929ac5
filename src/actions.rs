//! AI action-batch execution
//!
//! The second pass: an externally generated batch of per-control
//! instructions, validated and applied one by one. A batch that cannot be
//! parsed is rejected whole; anything wrong with an individual instruction
//! (placeholder value, stale selector, incompatible control) downgrades to
//! a counted failure and execution continues.

use crate::config::MatchConfig;
use crate::error::{AutofillError, Result};
use crate::fill;
use crate::form::{ControlKind, FieldEvent, FileArtifact, FormTree, NodeId};
use crate::ledger::{FilledBy, TrackingLedger};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Instruction verbs the executor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Fill,
    Select,
    SelectMultiple,
    Check,
    Uncheck,
    Click,
    RadioSelect,
    FillDate,
    UploadFile,
    SpinIncrement,
    SpinDecrement,
}

impl ActionKind {
    /// Verbs that are meaningless without a concrete value.
    fn needs_value(self) -> bool {
        matches!(
            self,
            ActionKind::Fill | ActionKind::Select | ActionKind::SelectMultiple | ActionKind::FillDate
        )
    }
}

/// One instruction in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionInstruction {
    pub selector: String,
    pub action: ActionKind,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

/// A parsed batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionBatch {
    pub actions: Vec<ActionInstruction>,
}

/// Per-batch outcome counts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ActionReport {
    pub success: usize,
    pub failed: usize,
    pub errors: Vec<String>,
    /// Selectors whose controls were actually mutated.
    pub filled_selectors: Vec<String>,
}

/// Extract a usable string value, rejecting the placeholders AI payloads
/// are known to emit.
fn screen_value(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") || trimmed.eq_ignore_ascii_case("string")
    {
        return None;
    }
    Some(text)
}

/// Value list for a `select_multiple` instruction: a JSON array passes each
/// element through the screen individually, a scalar is screened whole and
/// split on `", "`.
fn screen_value_list(value: Option<&Value>) -> Vec<String> {
    if let Some(Value::Array(items)) = value {
        return items.iter().filter_map(|item| screen_value(Some(item))).collect();
    }
    match screen_value(value) {
        Some(joined) => joined.split(", ").map(str::to_string).collect(),
        None => Vec::new(),
    }
}

/// Parse and execute a raw batch payload against the form.
///
/// A payload that does not deserialize into a batch aborts with
/// [`AutofillError::MalformedBatch`] before any control or ledger mutation.
pub fn execute_batch(
    tree: &mut FormTree,
    ledger: &mut TrackingLedger,
    config: &MatchConfig,
    file_payload: Option<&FileArtifact>,
    payload: &str,
) -> Result<ActionReport> {
    let batch: ActionBatch = serde_json::from_str(payload).map_err(|e| AutofillError::MalformedBatch {
        reason: e.to_string(),
    })?;
    execute(tree, ledger, config, file_payload, &batch)
}

/// Execute an already-parsed batch.
pub fn execute(
    tree: &mut FormTree,
    ledger: &mut TrackingLedger,
    config: &MatchConfig,
    file_payload: Option<&FileArtifact>,
    batch: &ActionBatch,
) -> Result<ActionReport> {
    let mut report = ActionReport::default();

    for instruction in &batch.actions {
        let value = screen_value(instruction.value.as_ref());
        let values = if instruction.action == ActionKind::SelectMultiple {
            screen_value_list(instruction.value.as_ref())
        } else {
            Vec::new()
        };
        let usable = if instruction.action == ActionKind::SelectMultiple {
            !values.is_empty()
        } else {
            value.is_some()
        };
        if instruction.action.needs_value() && !usable {
            debug!(selector = %instruction.selector, "placeholder value, skipping");
            report.failed += 1;
            continue;
        }

        let Some(node) = tree.resolve_selector(&instruction.selector) else {
            warn!(selector = %instruction.selector, "selector did not resolve");
            report.errors.push(format!("unresolvable selector: {}", instruction.selector));
            report.failed += 1;
            continue;
        };

        match apply(tree, config, file_payload, node, instruction.action, value.as_deref(), &values) {
            Ok(true) => {
                report.success += 1;
                report.filled_selectors.push(instruction.selector.clone());
                ledger.track_control(tree, node, true, Some(FilledBy::AiAutofill));
            }
            Ok(false) => {
                report.failed += 1;
                ledger.track_control(tree, node, false, Some(FilledBy::Failed));
            }
            Err(reason) => {
                report.errors.push(format!("{}: {reason}", instruction.selector));
                report.failed += 1;
                ledger.track_control(tree, node, false, Some(FilledBy::Failed));
            }
        }
    }

    Ok(report)
}

/// Apply one verb to one resolved control. `Err` carries a description of
/// a verb/control mismatch; `Ok(false)` means the fill routine declined.
fn apply(
    tree: &mut FormTree,
    config: &MatchConfig,
    file_payload: Option<&FileArtifact>,
    node: NodeId,
    action: ActionKind,
    value: Option<&str>,
    values: &[String],
) -> std::result::Result<bool, String> {
    let kind = tree.control_kind(node);
    match action {
        ActionKind::Fill => match kind {
            ControlKind::Text | ControlKind::TextArea | ControlKind::Number => {
                Ok(fill::fill_text(tree, node, value.unwrap_or_default()))
            }
            ControlKind::Date => Ok(fill::fill_date(tree, node, value.unwrap_or_default())),
            ControlKind::Select => Ok(fill::fill_select(tree, node, value.unwrap_or_default(), config)),
            other => Err(format!("fill on {other:?} control")),
        },
        ActionKind::Select => match kind {
            ControlKind::Select => Ok(fill::fill_select(tree, node, value.unwrap_or_default(), config)),
            other => Err(format!("select on {other:?} control")),
        },
        ActionKind::SelectMultiple => match kind {
            ControlKind::MultiSelect => Ok(fill::fill_multi_select(tree, node, values)),
            other => Err(format!("select_multiple on {other:?} control")),
        },
        ActionKind::Check | ActionKind::Uncheck => match kind {
            ControlKind::Checkbox => {
                let wanted = action == ActionKind::Check;
                if tree.checked(node) == wanted {
                    // Already in the requested state; a no-op is a success.
                    return Ok(true);
                }
                Ok(fill::fill_checkbox(tree, node, if wanted { "yes" } else { "no" }))
            }
            other => Err(format!("check on {other:?} control")),
        },
        ActionKind::Click => match kind {
            ControlKind::Checkbox => {
                let toggled = !tree.checked(node);
                tree.set_checked(node, toggled);
                tree.dispatch(node, FieldEvent::Change);
                tree.dispatch(node, FieldEvent::Click);
                Ok(true)
            }
            ControlKind::Radio => Ok(fill::fill_radio(tree, node)),
            _ => {
                tree.dispatch(node, FieldEvent::Click);
                Ok(true)
            }
        },
        ActionKind::RadioSelect => match kind {
            ControlKind::Radio => Ok(fill::fill_radio(tree, node)),
            other => Err(format!("radio_select on {other:?} control")),
        },
        ActionKind::FillDate => match kind {
            ControlKind::Date | ControlKind::Text => {
                Ok(fill::fill_date(tree, node, value.unwrap_or_default()))
            }
            other => Err(format!("fill_date on {other:?} control")),
        },
        ActionKind::UploadFile => match kind {
            ControlKind::File => {
                let artifact = file_payload.cloned().unwrap_or_else(FileArtifact::fallback);
                Ok(fill::fill_file(tree, node, artifact))
            }
            other => Err(format!("upload_file on {other:?} control")),
        },
        ActionKind::SpinIncrement | ActionKind::SpinDecrement => match kind {
            ControlKind::Number => {
                let direction = if action == ActionKind::SpinIncrement {
                    fill::SpinDirection::Increment
                } else {
                    fill::SpinDirection::Decrement
                };
                Ok(fill::fill_spin(tree, node, direction))
            }
            other => Err(format!("spin on {other:?} control")),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::builder::FormBuilder;

    fn simple_form() -> FormTree {
        let mut b = FormBuilder::new("https://example.test/apply", "Apply");
        b.open("input");
        b.attr("type", "text");
        b.attr("id", "first-name");
        b.close();
        b.open("input");
        b.attr("type", "checkbox");
        b.attr("id", "agree");
        b.close();
        b.open("select");
        b.attr("id", "country");
        b.option("us", "United States", false);
        b.option("de", "Germany", false);
        b.close();
        b.finish()
    }

    fn run(tree: &mut FormTree, payload: &str) -> Result<(ActionReport, TrackingLedger)> {
        let mut ledger = TrackingLedger::new();
        let config = MatchConfig::default();
        let report = execute_batch(tree, &mut ledger, &config, None, payload)?;
        Ok((report, ledger))
    }

    #[test]
    fn test_malformed_batch_rejected_whole() {
        let mut tree = simple_form();
        let err = run(&mut tree, "{\"not_actions\": []}").unwrap_err();
        assert!(matches!(err, AutofillError::MalformedBatch { .. }));
        // Nothing was touched.
        assert!(tree.events().is_empty());
    }

    #[test]
    fn test_fill_and_check() {
        let mut tree = simple_form();
        let payload = r##"{"actions": [
            {"selector": "#first-name", "action": "fill", "value": "Ada", "reasoning": "name field"},
            {"selector": "#agree", "action": "check"}
        ]}"##;
        let (report, ledger) = run(&mut tree, payload).unwrap();
        assert_eq!(report.success, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(tree.value(tree.resolve_selector("#first-name").unwrap()), "Ada");
        assert!(tree.checked(tree.resolve_selector("#agree").unwrap()));
        assert!(ledger
            .entries()
            .iter()
            .all(|e| e.filled_by == Some(FilledBy::AiAutofill)));
    }

    #[test]
    fn test_placeholder_values_skipped() {
        let mut tree = simple_form();
        let payload = r##"{"actions": [
            {"selector": "#first-name", "action": "fill", "value": null},
            {"selector": "#first-name", "action": "fill", "value": "null"},
            {"selector": "#first-name", "action": "fill", "value": "string"},
            {"selector": "#first-name", "action": "fill", "value": ""}
        ]}"##;
        let (report, ledger) = run(&mut tree, payload).unwrap();
        assert_eq!(report.success, 0);
        assert_eq!(report.failed, 4);
        // Screened instructions never reach the ledger.
        assert!(ledger.entries().is_empty());
        assert!(tree.events().is_empty());
    }

    #[test]
    fn test_unresolvable_selector_counted() {
        let mut tree = simple_form();
        let payload = r##"{"actions": [
            {"selector": "#ghost", "action": "fill", "value": "x"}
        ]}"##;
        let (report, ledger) = run(&mut tree, payload).unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("#ghost"));
        assert!(ledger.entries().is_empty());
    }

    #[test]
    fn test_kind_mismatch_is_per_instruction() {
        let mut tree = simple_form();
        let payload = r##"{"actions": [
            {"selector": "#agree", "action": "select", "value": "yes"},
            {"selector": "#country", "action": "select", "value": "Germany"}
        ]}"##;
        let (report, _) = run(&mut tree, payload).unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.success, 1);
        let country = tree.resolve_selector("#country").unwrap();
        assert_eq!(tree.value(country), "de");
    }

    #[test]
    fn test_numeric_value_coerced() {
        let mut tree = simple_form();
        let payload = r##"{"actions": [
            {"selector": "#first-name", "action": "fill", "value": 42}
        ]}"##;
        let (report, _) = run(&mut tree, payload).unwrap();
        assert_eq!(report.success, 1);
        assert_eq!(tree.value(tree.resolve_selector("#first-name").unwrap()), "42");
    }

    #[test]
    fn test_check_already_checked_is_success() {
        let mut tree = simple_form();
        let agree = tree.resolve_selector("#agree").unwrap();
        tree.set_checked(agree, true);
        let payload = r##"{"actions": [{"selector": "#agree", "action": "check"}]}"##;
        let (report, _) = run(&mut tree, payload).unwrap();
        assert_eq!(report.success, 1);
        assert!(tree.checked(agree));
    }

    #[test]
    fn test_select_multiple_array_value() {
        let mut b = FormBuilder::new("https://example.test", "t");
        b.open("select");
        b.attr("id", "skills");
        b.attr("multiple", "multiple");
        b.option("rust", "Rust", false);
        b.option("go", "Go", false);
        b.option("python", "Python", false);
        b.close();
        let mut tree = b.finish();
        let payload = r##"{"actions": [
            {"selector": "#skills", "action": "select_multiple", "value": ["Rust", "Go"]}
        ]}"##;
        let (report, _) = run(&mut tree, payload).unwrap();
        assert_eq!(report.success, 1);
        let node = tree.resolve_selector("#skills").unwrap();
        let selected: Vec<&str> = tree
            .options(node)
            .iter()
            .filter(|o| o.selected)
            .map(|o| o.value.as_str())
            .collect();
        assert_eq!(selected, vec!["rust", "go"]);
    }

    #[test]
    fn test_select_multiple_placeholder_array_skipped() {
        let mut b = FormBuilder::new("https://example.test", "t");
        b.open("select");
        b.attr("id", "skills");
        b.attr("multiple", "multiple");
        b.option("rust", "Rust", false);
        b.close();
        let mut tree = b.finish();
        let payload = r##"{"actions": [
            {"selector": "#skills", "action": "select_multiple", "value": ["null", ""]}
        ]}"##;
        let (report, ledger) = run(&mut tree, payload).unwrap();
        assert_eq!(report.failed, 1);
        assert!(ledger.entries().is_empty());
        assert!(tree.events().is_empty());
    }

    #[test]
    fn test_upload_uses_fallback_artifact() {
        let mut b = FormBuilder::new("https://example.test", "t");
        b.open("input");
        b.attr("type", "file");
        b.attr("id", "resume");
        b.close();
        let mut tree = b.finish();
        let payload = r##"{"actions": [{"selector": "#resume", "action": "upload_file"}]}"##;
        let (report, _) = run(&mut tree, payload).unwrap();
        assert_eq!(report.success, 1);
        let node = tree.resolve_selector("#resume").unwrap();
        assert_eq!(tree.files(node)[0].name, "Resume.pdf");
    }
}
