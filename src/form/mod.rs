//! Structural form model
//!
//! The rendered document is an external collaborator; the engine works over
//! a caller-built snapshot of it. [`FormTree`] is an arena of nodes (tag,
//! direct text, attributes, classes, parent/children) where interactive
//! controls carry mutable state. The capability surface the engine relies
//! on is deliberately small: ancestor walks, sibling enumeration, text,
//! attribute lookup. Tests build synthetic trees with
//! [`builder::FormBuilder`].
//!
//! Side effects are announced synchronously: every fill mutation calls
//! [`FormTree::dispatch`], which appends to an ordered event log that host
//! frameworks (and tests) observe.

pub mod builder;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Index into the form arena. Arena order is document order.
pub type NodeId = usize;

/// Interactive control categories the filler dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    Text,
    TextArea,
    Select,
    MultiSelect,
    Checkbox,
    Radio,
    Date,
    Number,
    File,
    Hidden,
    Submit,
    Button,
}

impl ControlKind {
    /// Controls the engine never resolves or fills.
    pub fn is_interactive(self) -> bool {
        !matches!(self, ControlKind::Hidden | ControlKind::Submit | ControlKind::Button)
    }

    pub fn is_file(self) -> bool {
        matches!(self, ControlKind::File)
    }
}

/// Events dispatched synchronously after control mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldEvent {
    Input,
    Change,
    Blur,
    KeyUp,
    Click,
    Focus,
}

/// One entry in a select control's option list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// A synthesized file attached to a file control.
#[derive(Debug, Clone, PartialEq)]
pub struct FileArtifact {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl FileArtifact {
    /// Static fallback used when no downloaded payload is available.
    pub fn fallback() -> Self {
        Self {
            name: "Resume.pdf".to_string(),
            mime: "application/pdf".to_string(),
            bytes: Vec::new(),
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

/// Mutable state carried by interactive controls.
#[derive(Debug, Clone, Default)]
pub struct ControlState {
    pub value: String,
    pub checked: bool,
    pub options: Vec<SelectOption>,
    pub files: Vec<FileArtifact>,
}

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    text: String,
    attrs: BTreeMap<String, String>,
    classes: Vec<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    control: Option<ControlState>,
}

/// A dispatched side-effect record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchedEvent {
    pub node: NodeId,
    pub event: FieldEvent,
}

/// Arena-backed snapshot of the document's interactive structure.
#[derive(Debug, Clone)]
pub struct FormTree {
    nodes: Vec<Node>,
    url: String,
    title: String,
    events: Vec<DispatchedEvent>,
}

impl FormTree {
    pub(crate) fn new(url: &str, title: &str) -> Self {
        let root = Node {
            tag: "body".to_string(),
            text: String::new(),
            attrs: BTreeMap::new(),
            classes: Vec::new(),
            parent: None,
            children: Vec::new(),
            control: None,
        };
        Self {
            nodes: vec![root],
            url: url.to_string(),
            title: title.to_string(),
            events: Vec::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn root(&self) -> NodeId {
        0
    }

    pub(crate) fn push_node(
        &mut self,
        parent: NodeId,
        tag: &str,
        control: Option<ControlState>,
    ) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            tag: tag.to_lowercase(),
            text: String::new(),
            attrs: BTreeMap::new(),
            classes: Vec::new(),
            parent: Some(parent),
            children: Vec::new(),
            control,
        });
        self.nodes[parent].children.push(id);
        id
    }

    pub fn tag(&self, node: NodeId) -> &str {
        &self.nodes[node].tag
    }

    /// Direct text content of the node (not descendants).
    pub fn text(&self, node: NodeId) -> &str {
        &self.nodes[node].text
    }

    pub(crate) fn set_text(&mut self, node: NodeId, text: &str) {
        let own = &mut self.nodes[node].text;
        if own.is_empty() {
            *own = text.to_string();
        } else {
            own.push(' ');
            own.push_str(text);
        }
    }

    pub fn attr(&self, node: NodeId, key: &str) -> Option<&str> {
        self.nodes[node].attrs.get(key).map(String::as_str)
    }

    pub(crate) fn set_attr(&mut self, node: NodeId, key: &str, value: &str) {
        self.nodes[node]
            .attrs
            .insert(key.to_string(), value.to_string());
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.nodes[node].classes.iter().any(|c| c == class)
    }

    /// Whether any class name contains the given fragment.
    pub fn class_contains(&self, node: NodeId, fragment: &str) -> bool {
        self.nodes[node].classes.iter().any(|c| c.contains(fragment))
    }

    pub(crate) fn add_class(&mut self, node: NodeId, class: &str) {
        self.nodes[node].classes.push(class.to_string());
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node].parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node].children
    }

    /// Ancestors of a node, nearest first (excluding the node itself).
    pub fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.nodes[node].parent;
        while let Some(id) = current {
            out.push(id);
            current = self.nodes[id].parent;
        }
        out
    }

    /// Nearest ancestor (or self) satisfying the predicate.
    pub fn closest<F>(&self, node: NodeId, pred: F) -> Option<NodeId>
    where
        F: Fn(&FormTree, NodeId) -> bool,
    {
        let mut current = Some(node);
        while let Some(id) = current {
            if pred(self, id) {
                return Some(id);
            }
            current = self.nodes[id].parent;
        }
        None
    }

    /// Element siblings preceding the node, nearest first.
    pub fn preceding_siblings(&self, node: NodeId) -> Vec<NodeId> {
        let Some(parent) = self.nodes[node].parent else {
            return Vec::new();
        };
        let siblings = &self.nodes[parent].children;
        let pos = siblings.iter().position(|&c| c == node).unwrap_or(0);
        siblings[..pos].iter().rev().copied().collect()
    }

    /// All element siblings other than the node itself, document order.
    pub fn siblings(&self, node: NodeId) -> Vec<NodeId> {
        let Some(parent) = self.nodes[node].parent else {
            return Vec::new();
        };
        self.nodes[parent]
            .children
            .iter()
            .copied()
            .filter(|&c| c != node)
            .collect()
    }

    /// Depth-first descendants of a node (excluding the node itself).
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[node].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            for &child in self.nodes[id].children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Concatenated text of a node and its descendants, control text
    /// excluded (the way a label's text reads once its embedded input is
    /// removed).
    pub fn subtree_text(&self, node: NodeId) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if !self.nodes[node].text.is_empty() {
            parts.push(&self.nodes[node].text);
        }
        for id in self.descendants(node) {
            if self.nodes[id].control.is_some() {
                continue;
            }
            if !self.nodes[id].text.is_empty() {
                parts.push(&self.nodes[id].text);
            }
        }
        parts.join(" ").trim().to_string()
    }

    /// All interactive controls in document order.
    pub fn controls(&self) -> Vec<NodeId> {
        (0..self.nodes.len())
            .filter(|&id| self.nodes[id].control.is_some())
            .filter(|&id| self.control_kind(id).is_interactive())
            .collect()
    }

    pub fn is_control(&self, node: NodeId) -> bool {
        self.nodes[node].control.is_some()
    }

    /// Control category, derived from tag and `type` attribute.
    pub fn control_kind(&self, node: NodeId) -> ControlKind {
        let n = &self.nodes[node];
        match n.tag.as_str() {
            "textarea" => ControlKind::TextArea,
            "select" => {
                if n.attrs.contains_key("multiple") {
                    ControlKind::MultiSelect
                } else {
                    ControlKind::Select
                }
            }
            _ => match n.attrs.get("type").map(String::as_str).unwrap_or("text") {
                "checkbox" => ControlKind::Checkbox,
                "radio" => ControlKind::Radio,
                "date" => ControlKind::Date,
                "number" => ControlKind::Number,
                "file" => ControlKind::File,
                "hidden" => ControlKind::Hidden,
                "submit" => ControlKind::Submit,
                "button" => ControlKind::Button,
                _ => ControlKind::Text,
            },
        }
    }

    fn control(&self, node: NodeId) -> &ControlState {
        self.nodes[node]
            .control
            .as_ref()
            .expect("node is not a control")
    }

    fn control_mut(&mut self, node: NodeId) -> &mut ControlState {
        self.nodes[node]
            .control
            .as_mut()
            .expect("node is not a control")
    }

    pub fn value(&self, node: NodeId) -> &str {
        &self.control(node).value
    }

    pub fn set_value(&mut self, node: NodeId, value: &str) {
        self.control_mut(node).value = value.to_string();
    }

    pub fn checked(&self, node: NodeId) -> bool {
        self.control(node).checked
    }

    pub fn set_checked(&mut self, node: NodeId, checked: bool) {
        self.control_mut(node).checked = checked;
    }

    pub fn options(&self, node: NodeId) -> &[SelectOption] {
        &self.control(node).options
    }

    pub(crate) fn push_option(&mut self, node: NodeId, option: SelectOption) {
        let state = self.control_mut(node);
        if option.selected {
            state.value = option.value.clone();
        }
        state.options.push(option);
    }

    pub fn set_option_selected(&mut self, node: NodeId, index: usize, selected: bool) {
        let state = self.control_mut(node);
        let Some(opt) = state.options.get_mut(index) else {
            return;
        };
        opt.selected = selected;
        let value = opt.value.clone();
        if selected {
            state.value = value;
        }
    }

    pub fn clear_selection(&mut self, node: NodeId) -> bool {
        let state = self.control_mut(node);
        let mut changed = false;
        for opt in &mut state.options {
            if opt.selected {
                opt.selected = false;
                changed = true;
            }
        }
        if changed {
            state.value.clear();
        }
        changed
    }

    pub fn files(&self, node: NodeId) -> &[FileArtifact] {
        &self.control(node).files
    }

    pub fn set_files(&mut self, node: NodeId, files: Vec<FileArtifact>) {
        self.control_mut(node).files = files;
    }

    /// Whether a control currently holds no user-visible value.
    pub fn is_empty_control(&self, node: NodeId) -> bool {
        match self.control_kind(node) {
            ControlKind::Checkbox | ControlKind::Radio => !self.checked(node),
            ControlKind::File => self.files(node).is_empty(),
            ControlKind::Select | ControlKind::MultiSelect => {
                !self.options(node).iter().any(|o| o.selected) && self.value(node).is_empty()
            }
            _ => self.value(node).is_empty(),
        }
    }

    /// Required flag: `required` attribute, `aria-required="true"`, or a
    /// `required` class.
    pub fn is_required(&self, node: NodeId) -> bool {
        self.attr(node, "required").is_some()
            || self.attr(node, "aria-required") == Some("true")
            || self.has_class(node, "required")
    }

    /// Stable structural selector for a node: `#id`, `[name="..."]`, or
    /// tag.classes:nth-child(n).
    pub fn selector(&self, node: NodeId) -> String {
        if let Some(id) = self.attr(node, "id") {
            return format!("#{id}");
        }
        if let Some(name) = self.attr(node, "name") {
            return format!("[name=\"{name}\"]");
        }
        let mut selector = self.nodes[node].tag.clone();
        for class in &self.nodes[node].classes {
            selector.push('.');
            selector.push_str(class);
        }
        if let Some(parent) = self.nodes[node].parent {
            let pos = self.nodes[parent]
                .children
                .iter()
                .position(|&c| c == node)
                .unwrap_or(0);
            selector.push_str(&format!(":nth-child({})", pos + 1));
        }
        selector
    }

    /// Resolve a selector produced by [`FormTree::selector`] (or the `#id` /
    /// `[name="..."]` forms an external caller uses) back to a node.
    pub fn resolve_selector(&self, selector: &str) -> Option<NodeId> {
        if let Some(id) = selector.strip_prefix('#') {
            return (0..self.nodes.len()).find(|&n| self.attr(n, "id") == Some(id));
        }
        if let Some(rest) = selector.strip_prefix("[name=\"") {
            let name = rest.strip_suffix("\"]")?;
            return (0..self.nodes.len()).find(|&n| self.attr(n, "name") == Some(name));
        }
        (0..self.nodes.len()).find(|&n| self.selector(n) == selector)
    }

    /// Find a `label` element whose `for` attribute names the given id.
    pub fn label_for(&self, id: &str) -> Option<NodeId> {
        (0..self.nodes.len())
            .find(|&n| self.nodes[n].tag == "label" && self.attr(n, "for") == Some(id))
    }

    /// Announce a side effect synchronously; the event log is the observer
    /// surface host frameworks react to.
    pub fn dispatch(&mut self, node: NodeId, event: FieldEvent) {
        self.events.push(DispatchedEvent { node, event });
    }

    pub fn events(&self) -> &[DispatchedEvent] {
        &self.events
    }

    /// Events dispatched on a specific node, in order.
    pub fn events_for(&self, node: NodeId) -> Vec<FieldEvent> {
        self.events
            .iter()
            .filter(|e| e.node == node)
            .map(|e| e.event)
            .collect()
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::builder::FormBuilder;
    use super::*;

    fn small_tree() -> FormTree {
        let mut b = FormBuilder::new("https://example.com/apply", "Application");
        b.open("div").class("form-section");
        b.open("h2").text("Contact").close();
        b.open("label").attr("for", "email").text("Email Address").close();
        b.open("input").attr("id", "email").attr("type", "text").close();
        b.close();
        b.finish()
    }

    #[test]
    fn test_controls_in_document_order() {
        let tree = small_tree();
        let controls = tree.controls();
        assert_eq!(controls.len(), 1);
        assert_eq!(tree.control_kind(controls[0]), ControlKind::Text);
    }

    #[test]
    fn test_selector_roundtrip() {
        let tree = small_tree();
        let control = tree.controls()[0];
        let selector = tree.selector(control);
        assert_eq!(selector, "#email");
        assert_eq!(tree.resolve_selector(&selector), Some(control));
        assert_eq!(tree.resolve_selector("#missing"), None);
    }

    #[test]
    fn test_label_for() {
        let tree = small_tree();
        let label = tree.label_for("email").unwrap();
        assert_eq!(tree.subtree_text(label), "Email Address");
    }

    #[test]
    fn test_dispatch_order() {
        let mut tree = small_tree();
        let control = tree.controls()[0];
        tree.dispatch(control, FieldEvent::Input);
        tree.dispatch(control, FieldEvent::Change);
        assert_eq!(
            tree.events_for(control),
            vec![FieldEvent::Input, FieldEvent::Change]
        );
    }

    #[test]
    fn test_empty_control_detection() {
        let mut tree = small_tree();
        let control = tree.controls()[0];
        assert!(tree.is_empty_control(control));
        tree.set_value(control, "ada@example.com");
        assert!(!tree.is_empty_control(control));
    }

    #[test]
    fn test_hidden_controls_excluded() {
        let mut b = FormBuilder::new("", "");
        b.open("input").attr("type", "hidden").close();
        b.open("input").attr("type", "submit").close();
        b.open("input").attr("type", "text").close();
        let tree = b.finish();
        assert_eq!(tree.controls().len(), 1);
    }
}
