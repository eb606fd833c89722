use std::fmt;
use std::path::Path;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::pathspec;

/// Canonical identifier for a node in the graph.
///
/// Local modules are identified by their absolute filesystem path, foreign
/// modules by their bare package name. The id is the node's identity: the
/// graph never holds two nodes with the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// View the id as a filesystem path. Only meaningful for local ids.
    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }

    /// A foreign id names an external package rather than a file on disk.
    pub fn is_foreign(&self) -> bool {
        pathspec::is_foreign_id(&self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Reference kind of a dependency edge.
///
/// `require(x)` must resolve and load, `require.resolve(x)` asks only for
/// the path, `require.async(x)` defers loading. Each kind is tracked as a
/// separate edge map on the dependent node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Require,
    Resolve,
    Async,
}

impl EdgeKind {
    /// All kinds in their canonical processing order.
    pub const ALL: [EdgeKind; 3] = [EdgeKind::Require, EdgeKind::Resolve, EdgeKind::Async];

    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Require => "require",
            EdgeKind::Resolve => "resolve",
            EdgeKind::Async => "async",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of a node's content after the pipeline has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    JavaScript,
    Json,
    Binary,
    Other,
}

impl ContentKind {
    /// Derive the content kind from a file extension.
    ///
    /// Anything that is not `.json` or `.node` is treated as javascript;
    /// a registered compiler may override the classification afterwards.
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "json" => Self::Json,
            "node" => Self::Binary,
            _ => Self::JavaScript,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map_or(Self::JavaScript, Self::from_extension)
    }

    pub fn is_javascript(&self) -> bool {
        matches!(self, Self::JavaScript)
    }
}

/// Per-kind dependency edge maps: raw specifier string -> resolved node id.
///
/// Maps are insertion-ordered so the cycle reporter's "first discovered
/// path" is deterministic for a deterministic specifier-processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSets {
    pub require: IndexMap<String, NodeId>,
    pub resolve: IndexMap<String, NodeId>,
    #[serde(rename = "async")]
    pub deferred: IndexMap<String, NodeId>,
}

impl EdgeSets {
    pub fn get(&self, kind: EdgeKind) -> &IndexMap<String, NodeId> {
        match kind {
            EdgeKind::Require => &self.require,
            EdgeKind::Resolve => &self.resolve,
            EdgeKind::Async => &self.deferred,
        }
    }

    pub fn get_mut(&mut self, kind: EdgeKind) -> &mut IndexMap<String, NodeId> {
        match kind {
            EdgeKind::Require => &mut self.require,
            EdgeKind::Resolve => &mut self.resolve,
            EdgeKind::Async => &mut self.deferred,
        }
    }

    /// Resolved targets across all kinds, in kind order then insertion
    /// order, without deduplication.
    pub fn targets(&self) -> impl Iterator<Item = &NodeId> {
        EdgeKind::ALL
            .iter()
            .flat_map(move |kind| self.get(*kind).values())
    }

    pub fn is_empty(&self) -> bool {
        self.require.is_empty() && self.resolve.is_empty() && self.deferred.is_empty()
    }
}

/// One resolved module unit.
///
/// `is_entry` and `is_foreign` are fixed at creation. `kind` and `content`
/// stay unset until the content pipeline has run for the node, and foreign
/// nodes never receive them: they are terminal and are not walked further.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub is_entry: bool,
    pub is_foreign: bool,
    pub kind: Option<ContentKind>,
    pub content: Option<String>,
    pub edges: EdgeSets,
    /// Ids of nodes that declared an edge to this one. Back-references for
    /// diagnostics only; ownership stays with the graph.
    pub dependents: IndexSet<NodeId>,
}

impl Node {
    /// Construct a fresh node for `id`. Foreignness is derived from the id
    /// itself: anything that is not an absolute path is a package name.
    pub fn new(id: NodeId, is_entry: bool) -> Self {
        let is_foreign = id.is_foreign();
        Self {
            id,
            is_entry,
            is_foreign,
            kind: None,
            content: None,
            edges: EdgeSets::default(),
            dependents: IndexSet::new(),
        }
    }

    /// Whether the content pipeline has already populated this node.
    pub fn has_content(&self) -> bool {
        self.content.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn foreignness_derived_from_id() {
        assert!(Node::new(NodeId::new("lodash"), false).is_foreign);
        assert!(!Node::new(NodeId::new("/srv/app/a.js"), false).is_foreign);
    }

    #[test]
    fn content_kind_from_extension() {
        assert_eq!(ContentKind::from_path(Path::new("/a/b.json")), ContentKind::Json);
        assert_eq!(ContentKind::from_path(Path::new("/a/b.node")), ContentKind::Binary);
        assert_eq!(ContentKind::from_path(Path::new("/a/b.js")), ContentKind::JavaScript);
        // no extension means javascript until a compiler says otherwise
        assert_eq!(ContentKind::from_path(Path::new("/a/b")), ContentKind::JavaScript);
    }

    #[test]
    fn edge_sets_iterate_in_kind_then_insertion_order() {
        let mut edges = EdgeSets::default();
        edges.get_mut(EdgeKind::Async).insert("./z".into(), NodeId::new("/z.js"));
        edges.get_mut(EdgeKind::Require).insert("./b".into(), NodeId::new("/b.js"));
        edges.get_mut(EdgeKind::Require).insert("./a".into(), NodeId::new("/a.js"));

        let targets: Vec<_> = edges.targets().map(|id| id.as_str().to_string()).collect();
        assert_eq!(targets, vec!["/b.js", "/a.js", "/z.js"]);
    }
}
