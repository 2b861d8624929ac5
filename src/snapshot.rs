//! AI-facing form snapshot
//!
//! Serialized description of the form handed to the external AI
//! collaborator between the two passes. Wire casing is camelCase with two
//! historical snake_case holdouts (`filled_by`, `should_fill`). Controls
//! already committed by the fuzzy pass appear in reduced form so the AI
//! does not re-target them.

use crate::form::{ControlKind, FormTree, NodeId};
use crate::hierarchy;
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeSet;

/// Character cap on accepted heading text.
const MAX_HEADING_LEN: usize = 200;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSnapshot {
    pub url: String,
    pub title: String,
    /// RFC 3339 capture time.
    pub timestamp: String,
    pub sections: Vec<FormSection>,
    pub all_fields: Vec<FieldSnapshot>,
    pub metadata: SnapshotMetadata,
}

/// Fields grouped under one visual heading.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSection {
    pub heading: String,
    pub fields: Vec<FieldSnapshot>,
    pub subsections: Vec<FormSection>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSnapshot {
    pub selector: String,
    pub field_type: ControlKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<FieldLabels>,
    pub value: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<FieldOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<FieldValidation>,
    #[serde(rename = "filled_by", skip_serializing_if = "Option::is_none")]
    pub filled_by: Option<String>,
    #[serde(rename = "should_fill")]
    pub should_fill: bool,
}

/// Every label signal gathered for one control.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldLabels {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direct_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fieldset_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aria_label: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub preceding_labels: Vec<String>,
    pub context_text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldOptions {
    pub unselected: Vec<String>,
    pub selected: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValidation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMetadata {
    pub total_fields: usize,
    /// Controls the AI is asked to fill.
    pub empty_fields: usize,
    /// Controls the fuzzy pass already committed.
    pub prefilled_fields: usize,
    pub section_count: usize,
}

/// Whether a node reads as a visual section heading.
fn is_heading(tree: &FormTree, node: NodeId) -> bool {
    let tag = tree.tag(node);
    matches!(tag, "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "legend")
        || tree.class_contains(node, "header")
        || tree.class_contains(node, "section-title")
        || tree.attr(node, "role") == Some("heading")
        || tree.attr(node, "data-type") == Some("control_head")
}

fn heading_text(tree: &FormTree, node: NodeId) -> Option<String> {
    let text = tree.subtree_text(node);
    let text = text.trim();
    (!text.is_empty() && text.len() < MAX_HEADING_LEN).then(|| text.to_string())
}

fn validation(tree: &FormTree, node: NodeId) -> Option<FieldValidation> {
    let v = FieldValidation {
        pattern: tree.attr(node, "pattern").map(str::to_string),
        min_length: tree.attr(node, "minlength").map(str::to_string),
        max_length: tree.attr(node, "maxlength").map(str::to_string),
        min: tree.attr(node, "min").map(str::to_string),
        max: tree.attr(node, "max").map(str::to_string),
    };
    let any = v.pattern.is_some()
        || v.min_length.is_some()
        || v.max_length.is_some()
        || v.min.is_some()
        || v.max.is_some();
    any.then_some(v)
}

fn options(tree: &FormTree, node: NodeId) -> Option<FieldOptions> {
    let opts = tree.options(node);
    if opts.is_empty() {
        return None;
    }
    let (selected, unselected): (Vec<_>, Vec<_>) = opts.iter().partition(|o| o.selected);
    Some(FieldOptions {
        unselected: unselected.into_iter().map(|o| o.label.clone()).collect(),
        selected: selected.into_iter().map(|o| o.label.clone()).collect(),
    })
}

fn labels(tree: &FormTree, node: NodeId) -> FieldLabels {
    FieldLabels {
        direct_label: hierarchy::direct_label(tree, node),
        fieldset_label: hierarchy::fieldset_label(tree, node),
        group_label: hierarchy::role_group_label(tree, node),
        placeholder: tree.attr(node, "placeholder").map(str::to_string),
        aria_label: tree.attr(node, "aria-label").map(str::to_string),
        preceding_labels: hierarchy::preceding_heading(tree, node).into_iter().collect(),
        context_text: hierarchy::full_label_path(tree, node),
    }
}

fn field_snapshot(tree: &FormTree, node: NodeId, filled: &BTreeSet<String>) -> FieldSnapshot {
    let selector = tree.selector(node);
    if filled.contains(&selector) {
        // Reduced form: enough for the AI to know this control is taken.
        return FieldSnapshot {
            selector,
            field_type: tree.control_kind(node),
            labels: None,
            value: tree.value(node).to_string(),
            required: tree.is_required(node),
            options: None,
            validation: None,
            filled_by: Some("fuzzy_matching".to_string()),
            should_fill: false,
        };
    }
    FieldSnapshot {
        selector,
        field_type: tree.control_kind(node),
        labels: Some(labels(tree, node)),
        value: tree.value(node).to_string(),
        required: tree.is_required(node),
        options: options(tree, node),
        validation: validation(tree, node),
        filled_by: None,
        should_fill: tree.is_empty_control(node),
    }
}

/// Capture the whole form: sections by visual heading, every interactive
/// control exactly once, document order throughout. Controls preceding the
/// first heading land in an `Other Fields` section.
pub fn capture(tree: &FormTree, filled: &BTreeSet<String>) -> FormSnapshot {
    let control_set: BTreeSet<NodeId> = tree.controls().into_iter().collect();

    let mut sections: Vec<(String, Vec<FieldSnapshot>)> = Vec::new();
    let mut orphans: Vec<FieldSnapshot> = Vec::new();
    let mut all_fields: Vec<FieldSnapshot> = Vec::new();

    let mut nodes = vec![tree.root()];
    nodes.extend(tree.descendants(tree.root()));
    for node in nodes {
        if let Some(text) = is_heading(tree, node).then(|| heading_text(tree, node)).flatten() {
            sections.push((text, Vec::new()));
            continue;
        }
        if !control_set.contains(&node) {
            continue;
        }
        let field = field_snapshot(tree, node, filled);
        all_fields.push(field.clone());
        match sections.last_mut() {
            Some((_, fields)) => fields.push(field),
            None => orphans.push(field),
        }
    }

    if !orphans.is_empty() {
        sections.insert(0, ("Other Fields".to_string(), orphans));
    }

    let sections: Vec<FormSection> = sections
        .into_iter()
        .filter(|(_, fields)| !fields.is_empty())
        .map(|(heading, fields)| FormSection {
            heading,
            fields,
            subsections: Vec::new(),
        })
        .collect();

    let metadata = SnapshotMetadata {
        total_fields: all_fields.len(),
        empty_fields: all_fields.iter().filter(|f| f.should_fill).count(),
        prefilled_fields: all_fields.iter().filter(|f| f.filled_by.is_some()).count(),
        section_count: sections.len(),
    };

    FormSnapshot {
        url: tree.url().to_string(),
        title: tree.title().to_string(),
        timestamp: Utc::now().to_rfc3339(),
        sections,
        all_fields,
        metadata,
    }
}
