//! The Graph Assembler (§4.7): owns the node set and edge multimap, and
//! enforces the deduplication and anti-parallel-edge invariants.
//!
//! Internally the BFS works with tagged `(container, privilege)` states
//! (Design Notes §9); `GraphAssembler::add_edge` is the single point where
//! a state is rendered to its output-boundary string form
//! `container(PRIVILEGE_NAME)`. Nothing upstream of this module ever
//! splits or parses a node string.

use indexmap::{IndexMap, IndexSet};
use std::collections::HashSet;

use crate::privilege::Privilege;

/// `container(PRIVILEGE_NAME)`, e.g. `c1(VOS USER)`.
pub fn render_node(container: &str, privilege: Privilege) -> String {
    format!("{container}({})", privilege.node_label())
}

#[derive(Debug, Default)]
pub struct GraphAssembler {
    nodes: IndexSet<String>,
    edges: IndexMap<String, Vec<String>>,
    seen_edges: HashSet<(String, String)>,
}

impl GraphAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an edge from `(src_container, src_priv)` to
    /// `(dst_container, dst_priv)` labeled `label`. If the reverse edge
    /// has already been emitted between these two exact node strings, the
    /// new edge is dropped entirely and the existing reverse edge is left
    /// untouched (§4.6 anti-parallel-edge rule).
    pub fn add_edge(
        &mut self,
        src_container: &str,
        src_priv: Privilege,
        dst_container: &str,
        dst_priv: Privilege,
        label: &str,
    ) {
        let src_node = render_node(src_container, src_priv);
        let dst_node = render_node(dst_container, dst_priv);

        if self.seen_edges.contains(&(dst_node.clone(), src_node.clone())) {
            return;
        }
        self.seen_edges.insert((src_node.clone(), dst_node.clone()));

        self.nodes.insert(src_node.clone());
        self.nodes.insert(dst_node.clone());

        let key = format!("{src_node}|{dst_node}");
        self.edges.entry(key).or_default().push(label.to_string());
    }

    pub fn into_parts(self) -> (IndexSet<String>, IndexMap<String, Vec<String>>) {
        (self.nodes, self.edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_edge_renders_node_strings_and_creates_the_edge_key() {
        let mut g = GraphAssembler::new();
        g.add_edge("c1", Privilege::VosUser, "c2", Privilege::Admin, "CVE-1");
        let (nodes, edges) = g.into_parts();
        assert!(nodes.contains("c1(VOS USER)"));
        assert!(nodes.contains("c2(ADMIN)"));
        assert_eq!(edges["c1(VOS USER)|c2(ADMIN)"], vec!["CVE-1".to_string()]);
    }

    #[test]
    fn repeated_edge_between_the_same_states_appends_to_the_label_list() {
        let mut g = GraphAssembler::new();
        g.add_edge("c1", Privilege::User, "c2", Privilege::Admin, "CVE-1");
        g.add_edge("c1", Privilege::User, "c2", Privilege::Admin, "CVE-2");
        let (_, edges) = g.into_parts();
        assert_eq!(
            edges["c1(USER)|c2(ADMIN)"],
            vec!["CVE-1".to_string(), "CVE-2".to_string()]
        );
    }

    #[test]
    fn reverse_edge_is_dropped_once_the_forward_edge_exists() {
        let mut g = GraphAssembler::new();
        g.add_edge("c1", Privilege::User, "c2", Privilege::Admin, "CVE-1");
        g.add_edge("c2", Privilege::Admin, "c1", Privilege::User, "CVE-2");
        let (_, edges) = g.into_parts();
        assert!(edges.contains_key("c1(USER)|c2(ADMIN)"));
        assert!(!edges.contains_key("c2(ADMIN)|c1(USER)"));
        assert_eq!(edges["c1(USER)|c2(ADMIN)"], vec!["CVE-1".to_string()]);
    }
}
