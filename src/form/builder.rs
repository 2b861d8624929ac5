//! Synthetic form construction
//!
//! Stack-style builder used by tests and by hosts converting a rendered
//! document snapshot into a [`FormTree`]. Nodes are opened in document
//! order, so arena order matches document order.

use super::{ControlState, FormTree, NodeId, SelectOption};

/// Builds a [`FormTree`] depth-first.
pub struct FormBuilder {
    tree: FormTree,
    stack: Vec<NodeId>,
}

impl FormBuilder {
    pub fn new(url: &str, title: &str) -> Self {
        let tree = FormTree::new(url, title);
        let root = tree.root();
        Self {
            tree,
            stack: vec![root],
        }
    }

    fn current(&self) -> NodeId {
        *self.stack.last().expect("builder stack never empty")
    }

    /// Open a child element under the current node. `input`, `select` and
    /// `textarea` become controls.
    pub fn open(&mut self, tag: &str) -> &mut Self {
        let control = matches!(tag, "input" | "select" | "textarea").then(ControlState::default);
        let parent = self.current();
        let id = self.tree.push_node(parent, tag, control);
        self.stack.push(id);
        self
    }

    /// Set an attribute on the current node. `value` and `checked` seed the
    /// control state the way document attributes seed a live control.
    pub fn attr(&mut self, key: &str, value: &str) -> &mut Self {
        let node = self.current();
        self.tree.set_attr(node, key, value);
        if self.tree.is_control(node) {
            match key {
                "value" => self.tree.set_value(node, value),
                "checked" => self.tree.set_checked(node, true),
                _ => {}
            }
        }
        self
    }

    pub fn class(&mut self, class: &str) -> &mut Self {
        let node = self.current();
        self.tree.add_class(node, class);
        self
    }

    /// Append direct text content to the current node.
    pub fn text(&mut self, text: &str) -> &mut Self {
        let node = self.current();
        self.tree.set_text(node, text);
        self
    }

    /// Append an option to the current select control.
    pub fn option(&mut self, value: &str, label: &str, selected: bool) -> &mut Self {
        let node = self.current();
        debug_assert!(self.tree.is_control(node), "option outside a select");
        self.tree.push_option(
            node,
            SelectOption {
                value: value.to_string(),
                label: label.to_string(),
                selected,
            },
        );
        self
    }

    pub fn close(&mut self) -> &mut Self {
        debug_assert!(self.stack.len() > 1, "cannot close the root");
        self.stack.pop();
        self
    }

    pub fn finish(self) -> FormTree {
        debug_assert!(self.stack.len() == 1, "unclosed elements at finish");
        self.tree
    }
}
