//! Label hierarchy derivation
//!
//! For every control the builder produces an ordered sequence of at most
//! three candidate labels, most specific first: the immediate label, the
//! enclosing group's label, and the enclosing section's heading. File
//! inputs rarely carry conventional labels, so they get a wider sweep over
//! ancestor wrapper text, sibling text, a synthetic accept-type token and
//! the control's own identifiers.

use crate::form::{ControlKind, FormTree, NodeId};
use crate::normalize::{clean_label, normalize_text};
use serde::Serialize;
use smallvec::SmallVec;

/// Hierarchy position of a label candidate. Determines its match weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelTier {
    Immediate,
    Group,
    Section,
}

const TIERS: [LabelTier; 3] = [LabelTier::Immediate, LabelTier::Group, LabelTier::Section];

/// One candidate human-readable name for a control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelCandidate {
    pub text: String,
    pub tier: LabelTier,
}

/// Ordered candidate labels for one control; at most three entries,
/// most specific first. May be empty, which callers must treat as
/// "unresolvable, skip".
pub type LabelHierarchy = SmallVec<[LabelCandidate; 3]>;

/// Maximum ancestor depth scanned for file-input label text and preceding
/// headings.
const ANCESTOR_SCAN_DEPTH: usize = 5;

/// Build the label hierarchy for a non-file control.
pub fn build_hierarchy(tree: &FormTree, control: NodeId) -> LabelHierarchy {
    let mut out = LabelHierarchy::new();

    let immediate = immediate_label(tree, control);
    if let Some(text) = &immediate {
        out.push(LabelCandidate {
            text: text.clone(),
            tier: LabelTier::Immediate,
        });
    }

    if let Some(text) = group_label(tree, control) {
        if immediate.as_deref() != Some(text.as_str()) {
            out.push(LabelCandidate {
                text,
                tier: LabelTier::Group,
            });
        }
    }

    if let Some(text) = section_heading(tree, control) {
        out.push(LabelCandidate {
            text,
            tier: LabelTier::Section,
        });
    }

    out.truncate(3);
    out
}

/// File-input hierarchy: gather every candidate text, then tier the first
/// three distinct entries. The full text list feeds upload-keyword
/// detection separately.
pub fn build_file_hierarchy(tree: &FormTree, control: NodeId) -> LabelHierarchy {
    let texts = file_label_texts(tree, control);
    let mut out = LabelHierarchy::new();
    for (i, text) in texts.into_iter().take(3).enumerate() {
        out.push(LabelCandidate {
            text,
            tier: TIERS[i],
        });
    }
    out
}

/// Every text fragment that may name a file input, most specific first.
pub fn file_label_texts(tree: &FormTree, control: NodeId) -> Vec<String> {
    let mut texts: Vec<String> = Vec::new();
    let mut seen: Vec<String> = Vec::new();

    let push = |texts: &mut Vec<String>, seen: &mut Vec<String>, raw: &str| {
        let cleaned = clean_label(raw);
        if cleaned.is_empty() {
            return;
        }
        let norm = normalize_text(&cleaned);
        if norm.is_empty() || seen.contains(&norm) {
            return;
        }
        seen.push(norm);
        texts.push(cleaned);
    };

    for candidate in build_hierarchy(tree, control) {
        push(&mut texts, &mut seen, &candidate.text);
    }

    // Ancestor wrappers frequently carry the only visible text near a file
    // input ("Drag and drop your resume here").
    let mut current = tree.parent(control);
    let mut depth = 0;
    while let Some(ancestor) = current {
        if depth >= ANCESTOR_SCAN_DEPTH {
            break;
        }
        let own_text = tree.text(ancestor).trim().to_string();
        if own_text.chars().count() > 3 && own_text.chars().count() < 200 {
            push(&mut texts, &mut seen, &own_text);
        }
        for node in tree.descendants(ancestor) {
            if tree.is_control(node) {
                continue;
            }
            if matches!(
                tree.tag(node),
                "p" | "span" | "div" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
            ) {
                let text = tree.subtree_text(node);
                let len = text.chars().count();
                if len > 5 && len < 200 {
                    push(&mut texts, &mut seen, &text);
                }
            }
        }
        current = tree.parent(ancestor);
        depth += 1;
    }

    for sibling in tree.siblings(control) {
        let text = tree.subtree_text(sibling);
        let len = text.chars().count();
        if len > 5 && len < 200 {
            push(&mut texts, &mut seen, &text);
        }
    }

    if let Some(accept) = tree.attr(control, "accept") {
        push(&mut texts, &mut seen, &format!("file_upload_{accept}"));
    }
    if let Some(id) = tree.attr(control, "id") {
        push(&mut texts, &mut seen, id);
    }
    if let Some(name) = tree.attr(control, "name") {
        push(&mut texts, &mut seen, name);
    }

    texts
}

fn immediate_label(tree: &FormTree, control: NodeId) -> Option<String> {
    // Explicit label-for association
    if let Some(id) = tree.attr(control, "id") {
        if let Some(label) = tree.label_for(id) {
            let text = clean_label(&tree.subtree_text(label));
            if !text.is_empty() {
                return Some(text);
            }
        }
    }

    // Enclosing label wrapper (its text minus the control's own)
    if let Some(wrapper) = tree.closest(control, |t, n| t.tag(n) == "label") {
        let text = clean_label(&tree.subtree_text(wrapper));
        if !text.is_empty() {
            return Some(text);
        }
    }

    if let Some(placeholder) = tree.attr(control, "placeholder") {
        let text = clean_label(placeholder);
        if !text.is_empty() {
            return Some(text);
        }
    }

    if let Some(name) = tree.attr(control, "name") {
        if !name.is_empty() {
            return Some(name.to_string());
        }
    }

    if let Some(aria) = tree.attr(control, "aria-label") {
        let text = clean_label(aria);
        if !text.is_empty() {
            return Some(text);
        }
    }

    None
}

fn group_label(tree: &FormTree, control: NodeId) -> Option<String> {
    if let Some(text) = fieldset_label(tree, control) {
        return Some(text);
    }
    if let Some(text) = role_group_label(tree, control) {
        return Some(text);
    }
    // Grouped-field containers a row-oriented form layout uses
    let line = tree.closest(control, |t, n| t.has_class(n, "form-line"))?;
    let label = tree
        .descendants(line)
        .into_iter()
        .find(|&n| tree.has_class(n, "form-label"))?;
    let text = clean_label(&tree.subtree_text(label));
    (!text.is_empty()).then_some(text)
}

/// Legend text of the nearest enclosing fieldset.
pub fn fieldset_label(tree: &FormTree, control: NodeId) -> Option<String> {
    let fieldset = tree.closest(control, |t, n| t.tag(n) == "fieldset")?;
    let legend = tree
        .children(fieldset)
        .iter()
        .copied()
        .find(|&n| tree.tag(n) == "legend")?;
    let text = clean_label(&tree.subtree_text(legend));
    (!text.is_empty()).then_some(text)
}

/// Accessible label of the nearest `role="group"` ancestor.
pub fn role_group_label(tree: &FormTree, control: NodeId) -> Option<String> {
    let group = tree.closest(control, |t, n| t.attr(n, "role") == Some("group"))?;
    if let Some(aria) = tree.attr(group, "aria-label") {
        let text = clean_label(aria);
        if !text.is_empty() {
            return Some(text);
        }
    }
    if let Some(labelled_by) = tree.attr(group, "aria-labelledby") {
        if let Some(label) = tree.resolve_selector(&format!("#{labelled_by}")) {
            let text = clean_label(&tree.subtree_text(label));
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

fn section_heading(tree: &FormTree, control: NodeId) -> Option<String> {
    // Walk ancestors until a section-like container carrying its own
    // heading is found.
    for ancestor in tree.ancestors(control) {
        let section_like = tree.has_class(ancestor, "form-section")
            || tree.tag(ancestor) == "section"
            || tree.class_contains(ancestor, "section");
        if !section_like {
            continue;
        }
        let heading = tree.descendants(ancestor).into_iter().find(|&n| {
            tree.has_class(n, "form-header")
                || matches!(tree.tag(n), "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
        });
        if let Some(heading) = heading {
            let text = clean_label(&tree.subtree_text(heading));
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// Display name for the ledger. Grouped inputs (checkbox/radio) prefer
/// their group's name over the individual option label.
pub fn field_name(tree: &FormTree, control: NodeId) -> String {
    let grouped = matches!(
        tree.control_kind(control),
        ControlKind::Checkbox | ControlKind::Radio
    );

    if grouped {
        if let Some(text) = fieldset_label(tree, control) {
            return text;
        }
        if let Some(text) = role_group_label(tree, control) {
            return text;
        }
    }

    if let Some(text) = direct_label(tree, control) {
        return text;
    }
    if let Some(aria) = tree.attr(control, "aria-label") {
        let text = clean_label(aria);
        if !text.is_empty() {
            return text;
        }
    }
    if !grouped {
        if let Some(text) = fieldset_label(tree, control) {
            return text;
        }
        if let Some(text) = role_group_label(tree, control) {
            return text;
        }
    }

    let hierarchy = build_hierarchy(tree, control);
    if let Some(head) = hierarchy.first() {
        return head.text.clone();
    }

    if let Some(placeholder) = tree.attr(control, "placeholder") {
        let text = clean_label(placeholder);
        if !text.is_empty() {
            return text;
        }
    }
    if let Some(name) = tree.attr(control, "name") {
        if !name.is_empty() {
            return name.to_string();
        }
    }
    if let Some(id) = tree.attr(control, "id") {
        if !id.is_empty() {
            return id.to_string();
        }
    }
    if let Some(text) = preceding_heading(tree, control) {
        return text;
    }

    tree.selector(control)
}

/// Explicit or wrapping label text for a control.
pub fn direct_label(tree: &FormTree, control: NodeId) -> Option<String> {
    if let Some(id) = tree.attr(control, "id") {
        if let Some(label) = tree.label_for(id) {
            let text = clean_label(&tree.subtree_text(label));
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    let wrapper = tree.closest(control, |t, n| t.tag(n) == "label")?;
    let text = clean_label(&tree.subtree_text(wrapper));
    (!text.is_empty()).then_some(text)
}

/// Nearest heading among preceding siblings, scanning up to five ancestor
/// levels. Catches fields sitting under bare section headings.
pub fn preceding_heading(tree: &FormTree, control: NodeId) -> Option<String> {
    let mut current = control;
    for _ in 0..ANCESTOR_SCAN_DEPTH {
        for prev in tree.preceding_siblings(current) {
            let heading_like = matches!(tree.tag(prev), "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
                || tree.has_class(prev, "heading")
                || tree.has_class(prev, "section-title")
                || tree.has_class(prev, "form-section")
                || tree.attr(prev, "data-type") == Some("control_head");
            if !heading_like {
                continue;
            }
            let text = clean_label(&tree.subtree_text(prev));
            if !text.is_empty() && text.chars().count() < 100 {
                return Some(text);
            }
        }
        current = tree.parent(current)?;
    }
    None
}

/// Full nested label path, rendered outermost first for display.
pub fn full_label_path(tree: &FormTree, control: NodeId) -> String {
    let hierarchy = if tree.control_kind(control).is_file() {
        build_file_hierarchy(tree, control)
    } else {
        build_hierarchy(tree, control)
    };

    let cleaned: Vec<String> = hierarchy
        .iter()
        .map(|c| clean_label(&c.text))
        .filter(|t| !t.is_empty())
        .collect();

    if cleaned.is_empty() {
        return field_name(tree, control);
    }

    cleaned.into_iter().rev().collect::<Vec<_>>().join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::builder::FormBuilder;

    fn nested_form() -> FormTree {
        let mut b = FormBuilder::new("https://example.com", "Test");
        b.open("div").class("form-section");
        b.open("h2").class("form-header").text("References").close();
        b.open("div").class("form-line");
        b.open("span").class("form-label").text("Name").close();
        b.open("label").attr("for", "ref-first").text("First").close();
        b.open("input").attr("id", "ref-first").attr("type", "text").close();
        b.close(); // form-line
        b.close(); // form-section
        b.finish()
    }

    #[test]
    fn test_three_tier_hierarchy() {
        let tree = nested_form();
        let control = tree.controls()[0];
        let hierarchy = build_hierarchy(&tree, control);

        assert_eq!(hierarchy.len(), 3);
        assert_eq!(hierarchy[0].text, "First");
        assert_eq!(hierarchy[0].tier, LabelTier::Immediate);
        assert_eq!(hierarchy[1].text, "Name");
        assert_eq!(hierarchy[1].tier, LabelTier::Group);
        assert_eq!(hierarchy[2].text, "References");
        assert_eq!(hierarchy[2].tier, LabelTier::Section);
    }

    #[test]
    fn test_hierarchy_never_exceeds_three() {
        let tree = nested_form();
        for control in tree.controls() {
            assert!(build_hierarchy(&tree, control).len() <= 3);
        }
    }

    #[test]
    fn test_placeholder_fallback() {
        let mut b = FormBuilder::new("", "");
        b.open("input").attr("type", "text").attr("placeholder", "Enter your email").close();
        let tree = b.finish();
        let hierarchy = build_hierarchy(&tree, tree.controls()[0]);
        assert_eq!(hierarchy[0].text, "Enter your email");
    }

    #[test]
    fn test_empty_hierarchy() {
        let mut b = FormBuilder::new("", "");
        b.open("input").attr("type", "text").close();
        let tree = b.finish();
        assert!(build_hierarchy(&tree, tree.controls()[0]).is_empty());
    }

    #[test]
    fn test_fieldset_legend_as_group() {
        let mut b = FormBuilder::new("", "");
        b.open("fieldset");
        b.open("legend").text("Work Authorization").close();
        b.open("label").attr("for", "auth").text("Authorized in the US").close();
        b.open("input").attr("id", "auth").attr("type", "checkbox").close();
        b.close();
        let tree = b.finish();
        let control = tree.controls()[0];

        let hierarchy = build_hierarchy(&tree, control);
        assert_eq!(hierarchy[0].text, "Authorized in the US");
        assert_eq!(hierarchy[1].text, "Work Authorization");
        // Grouped input display name prefers the fieldset legend
        assert_eq!(field_name(&tree, control), "Work Authorization");
    }

    #[test]
    fn test_file_labels_include_synthetic_token() {
        let mut b = FormBuilder::new("", "");
        b.open("div");
        b.open("p").text("Drag and drop your resume here").close();
        b.open("input")
            .attr("type", "file")
            .attr("id", "resume-upload")
            .attr("accept", ".pdf,.docx")
            .close();
        b.close();
        let tree = b.finish();
        let control = tree.controls()[0];

        let texts = file_label_texts(&tree, control);
        assert!(texts.iter().any(|t| t.contains("Drag and drop")));
        assert!(texts.iter().any(|t| t == "file_upload_.pdf,.docx"));
        assert!(texts.iter().any(|t| t == "resume-upload"));

        let hierarchy = build_file_hierarchy(&tree, control);
        assert!(hierarchy.len() <= 3 && !hierarchy.is_empty());
    }

    #[test]
    fn test_full_label_path_outermost_first() {
        let tree = nested_form();
        let control = tree.controls()[0];
        assert_eq!(
            full_label_path(&tree, control),
            "References -> Name -> First"
        );
    }

    #[test]
    fn test_label_decoration_stripped() {
        let mut b = FormBuilder::new("", "");
        b.open("label").attr("for", "ln").text("Last Name:*").close();
        b.open("input").attr("id", "ln").attr("type", "text").close();
        let tree = b.finish();
        let hierarchy = build_hierarchy(&tree, tree.controls()[0]);
        assert_eq!(hierarchy[0].text, "Last Name");
    }
}
