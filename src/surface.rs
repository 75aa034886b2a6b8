//! Retained render surface: the crate's stand-in for the page DOM.
//!
//! Nodes are addressed by id, the way the widget scripts address elements by
//! selector. Every mutator is a no-op when the target id is absent: the
//! "missing DOM element" rule: a widget whose elements are not on the page
//! must degrade silently, never throw.

use std::collections::{BTreeMap, BTreeSet, HashMap};

/// One renderable node: text content, inline styles, attributes, classes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    pub text: String,
    pub styles: BTreeMap<String, String>,
    pub attrs: BTreeMap<String, String>,
    pub classes: BTreeSet<String>,
}

impl Node {
    pub fn style(&self, name: &str) -> Option<&str> {
        self.styles.get(name).map(String::as_str)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }
}

/// The node tree. The only shared mutable resource in the system; widgets
/// own disjoint id ranges so no two writers contend for the same node.
#[derive(Debug, Default)]
pub struct Surface {
    nodes: HashMap<String, Node>,
    writes: u64,
}

impl Surface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an empty node under `id`, replacing any existing one.
    pub fn insert(&mut self, id: &str) {
        self.nodes.insert(id.to_string(), Node::default());
    }

    /// Safe lookup, the `$()` analog: absent ids are `None`, never an error.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Total mutating writes applied; used to verify idempotence.
    pub fn write_count(&self) -> u64 {
        self.writes
    }

    pub fn set_text(&mut self, id: &str, text: &str) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.text = text.to_string();
                self.writes += 1;
                true
            }
            None => false,
        }
    }

    pub fn set_style(&mut self, id: &str, name: &str, value: &str) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.styles.insert(name.to_string(), value.to_string());
                self.writes += 1;
                true
            }
            None => false,
        }
    }

    pub fn set_attr(&mut self, id: &str, name: &str, value: &str) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.attrs.insert(name.to_string(), value.to_string());
                self.writes += 1;
                true
            }
            None => false,
        }
    }

    pub fn toggle_class(&mut self, id: &str, class: &str, on: bool) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                if on {
                    node.classes.insert(class.to_string());
                } else {
                    node.classes.remove(class);
                }
                self.writes += 1;
                true
            }
            None => false,
        }
    }

    pub fn text(&self, id: &str) -> Option<&str> {
        self.node(id).map(|n| n.text.as_str())
    }

    /// One line per node, sorted by id; the stdout render for the demo bins.
    pub fn render_summary(&self) -> String {
        let mut ids: Vec<&String> = self.nodes.keys().collect();
        ids.sort();
        let mut out = String::new();
        for id in ids {
            let node = &self.nodes[id];
            out.push_str(&format!("  #{:<14} {:?}", id, node.text));
            if let Some(w) = node.style("width") {
                out.push_str(&format!(" width={}", w));
            }
            if !node.classes.is_empty() {
                let classes: Vec<&str> = node.classes.iter().map(String::as_str).collect();
                out.push_str(&format!(" .{}", classes.join(".")));
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_id_is_noop() {
        let mut s = Surface::new();
        assert!(!s.set_text("nope", "x"));
        assert!(!s.set_style("nope", "width", "10%"));
        assert!(!s.set_attr("nope", "aria-valuenow", "1"));
        assert!(!s.toggle_class("nope", "hit", true));
        assert_eq!(s.write_count(), 0);
    }

    #[test]
    fn test_writes_land_and_count() {
        let mut s = Surface::new();
        s.insert("pct");
        assert!(s.set_text("pct", "25.0%"));
        assert!(s.set_style("pct", "width", "25%"));
        assert_eq!(s.text("pct"), Some("25.0%"));
        assert_eq!(s.node("pct").unwrap().style("width"), Some("25%"));
        assert_eq!(s.write_count(), 2);
    }

    #[test]
    fn test_class_toggle() {
        let mut s = Surface::new();
        s.insert("ms-50");
        s.toggle_class("ms-50", "hit", true);
        assert!(s.node("ms-50").unwrap().has_class("hit"));
        s.toggle_class("ms-50", "hit", false);
        assert!(!s.node("ms-50").unwrap().has_class("hit"));
    }
}
