//! Type-dispatched fill execution
//!
//! Each routine mutates one control and dispatches the event set that kind
//! of control would emit in a live document. Every routine returns whether
//! it filled anything; a `false` return means the control was left
//! untouched and nothing was dispatched.

use crate::config::MatchConfig;
use crate::form::{FieldEvent, FileArtifact, FormTree, NodeId};
use crate::matching::strategies::{containment_score, multi_word_score};
use crate::normalize::{extract_tokens, normalize_text};
use crate::similarity::similarity_score;
use tracing::debug;

/// Fill a text-like control (text, textarea, email, url and friends).
pub fn fill_text(tree: &mut FormTree, node: NodeId, value: &str) -> bool {
    tree.set_value(node, value);
    for event in [FieldEvent::Input, FieldEvent::Change, FieldEvent::Blur, FieldEvent::KeyUp] {
        tree.dispatch(node, event);
    }
    true
}

/// Score one option's text against the wanted value: exact short-circuits
/// at 1.0, otherwise the best of containment, multi-word overlap and plain
/// similarity.
fn option_score(option_text: &str, wanted: &str) -> f32 {
    let norm_opt = normalize_text(option_text);
    let norm_wanted = normalize_text(wanted);
    if norm_opt.is_empty() || norm_wanted.is_empty() {
        return 0.0;
    }
    if norm_opt == norm_wanted {
        return 1.0;
    }
    let opt_tokens = extract_tokens(option_text);
    let wanted_tokens = extract_tokens(wanted);
    let contained = containment_score(&norm_opt, &norm_wanted, &opt_tokens, &wanted_tokens);
    let multi = multi_word_score(&opt_tokens, &wanted_tokens);
    let multi = if multi > 0.7 { multi } else { 0.0 };
    contained.max(multi).max(similarity_score(option_text, wanted))
}

/// Select the best-scoring option of a single-select control.
///
/// Both option label and option value are scored; the winner must clear
/// the select threshold or the control is left untouched.
pub fn fill_select(tree: &mut FormTree, node: NodeId, value: &str, config: &MatchConfig) -> bool {
    let mut best: Option<(usize, f32)> = None;
    for (i, option) in tree.options(node).iter().enumerate() {
        let score = option_score(&option.label, value).max(option_score(&option.value, value));
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((i, score));
        }
    }
    let Some((index, score)) = best else {
        return false;
    };
    if score <= config.select_threshold {
        debug!(value, score, "no select option cleared threshold");
        return false;
    }
    tree.clear_selection(node);
    tree.set_option_selected(node, index, true);
    tree.dispatch(node, FieldEvent::Change);
    tree.dispatch(node, FieldEvent::Blur);
    true
}

/// Select every option matching one of the requested values.
///
/// Matching happens before any mutation: when no value matches an option,
/// the control keeps its existing selection and no events fire.
pub fn fill_multi_select(tree: &mut FormTree, node: NodeId, values: &[String]) -> bool {
    let mut chosen: Vec<usize> = Vec::new();
    for value in values {
        let norm_wanted = normalize_text(value);
        if norm_wanted.is_empty() {
            continue;
        }
        let wanted_tokens = extract_tokens(value);
        let hit = tree.options(node).iter().enumerate().find(|(i, option)| {
            if chosen.contains(i) {
                return false;
            }
            let norm_label = normalize_text(&option.label);
            let norm_value = normalize_text(&option.value);
            norm_label == norm_wanted
                || norm_value == norm_wanted
                || containment_score(
                    &norm_label,
                    &norm_wanted,
                    &extract_tokens(&option.label),
                    &wanted_tokens,
                ) > 0.0
        });
        if let Some((i, _)) = hit {
            chosen.push(i);
        }
    }
    if chosen.is_empty() {
        return false;
    }
    tree.clear_selection(node);
    for index in chosen {
        tree.set_option_selected(node, index, true);
    }
    tree.dispatch(node, FieldEvent::Change);
    tree.dispatch(node, FieldEvent::Blur);
    true
}

/// Values read as affirmative for checkbox fills.
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "yes" | "true" | "1" | "checked" | "on"
    )
}

/// Toggle a checkbox toward the wanted truth value. No mutation and no
/// events when the box is already in the wanted state.
pub fn fill_checkbox(tree: &mut FormTree, node: NodeId, value: &str) -> bool {
    let wanted = is_truthy(value);
    if tree.checked(node) == wanted {
        return false;
    }
    tree.set_checked(node, wanted);
    tree.dispatch(node, FieldEvent::Change);
    tree.dispatch(node, FieldEvent::Click);
    true
}

/// Check one radio button, unchecking the rest of its name group first.
/// An already-checked target is left alone and reports `false`.
pub fn fill_radio(tree: &mut FormTree, node: NodeId) -> bool {
    if let Some(name) = tree.attr(node, "name").map(str::to_string) {
        let group: Vec<NodeId> = tree
            .controls()
            .into_iter()
            .filter(|&n| n != node && tree.attr(n, "name") == Some(name.as_str()))
            .collect();
        for member in group {
            if tree.checked(member) {
                tree.set_checked(member, false);
                tree.dispatch(member, FieldEvent::Change);
            }
        }
    }
    if tree.checked(node) {
        return false;
    }
    tree.set_checked(node, true);
    tree.dispatch(node, FieldEvent::Change);
    tree.dispatch(node, FieldEvent::Click);
    true
}

/// Normalize a slash-separated date into `YYYY-MM-DD` and fill it.
///
/// `D/M/YYYY` and `YYYY/M/D` orderings are recognized by which part is
/// four digits; anything else is written through verbatim.
pub fn fill_date(tree: &mut FormTree, node: NodeId, value: &str) -> bool {
    let normalized = normalize_date(value).unwrap_or_else(|| value.to_string());
    tree.set_value(node, &normalized);
    for event in [FieldEvent::Input, FieldEvent::Change, FieldEvent::Blur] {
        tree.dispatch(node, event);
    }
    true
}

fn normalize_date(value: &str) -> Option<String> {
    let parts: Vec<&str> = value.split('/').collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty() || !p.chars().all(|c| c.is_ascii_digit())) {
        return None;
    }
    let (year, month, day) = if parts[2].len() == 4 {
        (parts[2], parts[1], parts[0])
    } else if parts[0].len() == 4 {
        (parts[0], parts[1], parts[2])
    } else {
        return None;
    };
    Some(format!("{year}-{:0>2}-{:0>2}", month, day))
}

/// Direction for a spinner nudge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinDirection {
    Increment,
    Decrement,
}

/// Step a numeric spinner by its declared `step` attribute (default 1),
/// clamped to its min/max attributes. The clamped value is written back
/// even when it equals the current one.
pub fn fill_spin(tree: &mut FormTree, node: NodeId, direction: SpinDirection) -> bool {
    let current: f64 = tree.value(node).trim().parse().unwrap_or(0.0);
    let step = tree
        .attr(node, "step")
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|s| *s != 0.0)
        .unwrap_or(1.0);
    let min = tree.attr(node, "min").and_then(|v| v.parse::<f64>().ok());
    let max = tree.attr(node, "max").and_then(|v| v.parse::<f64>().ok());
    let mut next = match direction {
        SpinDirection::Increment => current + step,
        SpinDirection::Decrement => current - step,
    };
    if let Some(min) = min {
        next = next.max(min);
    }
    if let Some(max) = max {
        next = next.min(max);
    }
    tree.set_value(node, &format_number(next));
    tree.dispatch(node, FieldEvent::Input);
    tree.dispatch(node, FieldEvent::Change);
    true
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Attach a file artifact to a file control.
///
/// Upload widgets typically listen on a wrapper, so the change burst is
/// repeated on up to three ancestor levels.
pub fn fill_file(tree: &mut FormTree, node: NodeId, artifact: FileArtifact) -> bool {
    tree.set_files(node, vec![artifact]);
    for event in [FieldEvent::Change, FieldEvent::Input, FieldEvent::Blur, FieldEvent::Focus] {
        tree.dispatch(node, event);
    }
    for ancestor in tree.ancestors(node).into_iter().take(3) {
        for event in [FieldEvent::Change, FieldEvent::Input, FieldEvent::Blur, FieldEvent::Focus] {
            tree.dispatch(ancestor, event);
        }
    }
    true
}
