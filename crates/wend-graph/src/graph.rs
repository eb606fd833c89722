//! The shared node arena.
//!
//! `ModuleGraph` owns every node of one traversal (or of several traversals
//! when used as a shared cache). Handles are cheap clones of an
//! `Arc<RwLock<_>>`; all lookups copy data out so no lock guard ever
//! escapes this module.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::node::{ContentKind, EdgeKind, Node, NodeId};

#[derive(Debug, Default)]
pub(crate) struct GraphInner {
    pub(crate) nodes: FxHashMap<NodeId, Node>,
}

impl GraphInner {
    /// Resolved dependency targets of `id` in deterministic order.
    pub(crate) fn dependencies_of(&self, id: &NodeId) -> Vec<NodeId> {
        self.nodes
            .get(id)
            .map(|node| node.edges.targets().cloned().collect())
            .unwrap_or_default()
    }
}

/// Cloneable handle to a dependency graph.
#[derive(Debug, Clone, Default)]
pub struct ModuleGraph {
    pub(crate) inner: Arc<RwLock<GraphInner>>,
}

impl ModuleGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up or create the node for `id`.
    ///
    /// Returns `true` iff the node was created by this call. A second
    /// request for an existing id never replaces the node and never
    /// touches its `is_entry`/`is_foreign` flags.
    pub fn get_or_create(&self, id: &NodeId, is_entry: bool) -> bool {
        let mut inner = self.inner.write();
        if inner.nodes.contains_key(id) {
            return false;
        }
        inner.nodes.insert(id.clone(), Node::new(id.clone(), is_entry));
        true
    }

    /// Lookup only; never creates.
    pub fn get(&self, id: &NodeId) -> Option<Node> {
        self.inner.read().nodes.get(id).cloned()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.inner.read().nodes.contains_key(id)
    }

    /// Record the edge `from -> to` of the given kind under the raw
    /// specifier that produced it, updating both directions under one
    /// lock. Re-adding an existing edge is a no-op.
    pub fn add_edge(&self, from: &NodeId, to: &NodeId, kind: EdgeKind, raw_specifier: &str) {
        let mut inner = self.inner.write();
        if let Some(node) = inner.nodes.get_mut(from) {
            node.edges
                .get_mut(kind)
                .insert(raw_specifier.to_string(), to.clone());
        }
        if let Some(node) = inner.nodes.get_mut(to) {
            node.dependents.insert(from.clone());
        }
    }

    /// Set a node's content kind and payload. The first write wins;
    /// populated nodes are left untouched (shared-graph runs rediscovering
    /// a node must not reprocess it). Returns whether the payload was
    /// stored by this call.
    pub fn set_payload(&self, id: &NodeId, kind: ContentKind, content: String) -> bool {
        let mut inner = self.inner.write();
        match inner.nodes.get_mut(id) {
            Some(node) if !node.has_content() => {
                node.kind = Some(kind);
                node.content = Some(content);
                true
            }
            _ => false,
        }
    }

    pub fn has_content(&self, id: &NodeId) -> bool {
        self.inner
            .read()
            .nodes
            .get(id)
            .is_some_and(Node::has_content)
    }

    /// Resolved dependency targets of `id`, kind order then insertion order.
    pub fn dependencies_of(&self, id: &NodeId) -> Vec<NodeId> {
        self.inner.read().dependencies_of(id)
    }

    /// Ids of nodes that depend on `id`.
    pub fn dependents_of(&self, id: &NodeId) -> Vec<NodeId> {
        self.inner
            .read()
            .nodes
            .get(id)
            .map(|node| node.dependents.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.inner.read().nodes.keys().cloned().collect()
    }

    pub fn entry_points(&self) -> Vec<NodeId> {
        self.inner
            .read()
            .nodes
            .values()
            .filter(|node| node.is_entry)
            .map(|node| node.id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().nodes.is_empty()
    }

    /// Copy every node out of the graph, sorted by id for stable output.
    pub fn snapshot(&self) -> Vec<Node> {
        let mut nodes: Vec<Node> = self.inner.read().nodes.values().cloned().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes
    }

    /// Serialize the snapshot as JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_create_is_idempotent() {
        let graph = ModuleGraph::new();
        let id = NodeId::new("/a.js");

        assert!(graph.get_or_create(&id, true));
        assert!(!graph.get_or_create(&id, false));
        assert_eq!(graph.len(), 1);

        // the second call must not demote the entry flag
        assert!(graph.get(&id).unwrap().is_entry);
    }

    #[test]
    fn add_edge_records_both_directions() {
        let graph = ModuleGraph::new();
        let a = NodeId::new("/a.js");
        let b = NodeId::new("/b.js");
        graph.get_or_create(&a, true);
        graph.get_or_create(&b, false);

        graph.add_edge(&a, &b, EdgeKind::Require, "./b");

        assert_eq!(graph.dependencies_of(&a), vec![b.clone()]);
        assert_eq!(graph.dependents_of(&b), vec![a.clone()]);
        let node = graph.get(&a).unwrap();
        assert_eq!(node.edges.require.get("./b"), Some(&b));
    }

    #[test]
    fn add_edge_is_idempotent() {
        let graph = ModuleGraph::new();
        let a = NodeId::new("/a.js");
        let b = NodeId::new("/b.js");
        graph.get_or_create(&a, false);
        graph.get_or_create(&b, false);

        graph.add_edge(&a, &b, EdgeKind::Require, "./b");
        graph.add_edge(&a, &b, EdgeKind::Require, "./b");

        assert_eq!(graph.dependencies_of(&a).len(), 1);
        assert_eq!(graph.dependents_of(&b).len(), 1);
    }

    #[test]
    fn payload_first_write_wins() {
        let graph = ModuleGraph::new();
        let a = NodeId::new("/a.js");
        graph.get_or_create(&a, false);

        assert!(graph.set_payload(&a, ContentKind::JavaScript, "one".into()));
        assert!(!graph.set_payload(&a, ContentKind::Json, "two".into()));

        let node = graph.get(&a).unwrap();
        assert_eq!(node.content.as_deref(), Some("one"));
        assert_eq!(node.kind, Some(ContentKind::JavaScript));
    }

    #[test]
    fn snapshot_is_sorted_and_serializable() {
        let graph = ModuleGraph::new();
        graph.get_or_create(&NodeId::new("/b.js"), false);
        graph.get_or_create(&NodeId::new("/a.js"), true);

        let ids: Vec<_> = graph.snapshot().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![NodeId::new("/a.js"), NodeId::new("/b.js")]);
        assert!(graph.to_json().unwrap().contains("/a.js"));
    }
}
