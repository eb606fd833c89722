//! Incremental circular-dependency tracing.
//!
//! The walker asks, just before recording an edge `dependent -> dependency`,
//! whether the dependency can already reach the dependent through edges that
//! exist in the graph. If it can, the new edge closes a cycle and the path
//! that proves it is returned for diagnostics.

use rustc_hash::FxHashSet;

use crate::graph::{GraphInner, ModuleGraph};
use crate::node::NodeId;

impl ModuleGraph {
    /// Trace whether adding the edge `from -> to` would close a cycle.
    ///
    /// Searches depth-first from `to` over the dependency edges recorded so
    /// far, looking for `from`. The candidate edge itself must not be in
    /// the graph yet. A self-reference (`from == to`) is never a cycle.
    ///
    /// Returns the offending path with the starting node repeated at both
    /// ends: for the chain `A -> B -> C` plus the candidate edge `C -> A`,
    /// the result is `[A, B, C, A]`. The first path in depth-first order
    /// over edge-insertion order wins.
    pub fn trace(&self, from: &NodeId, to: &NodeId) -> Option<Vec<NodeId>> {
        if from == to {
            return None;
        }

        let inner = self.inner.read();
        let mut path = vec![to.clone()];
        let mut visited = FxHashSet::default();
        visited.insert(to.clone());

        if look_back(&inner, from, to, &mut path, &mut visited) {
            path.push(to.clone());
            Some(path)
        } else {
            None
        }
    }
}

/// Depth-first search for `target` starting at `current`'s dependencies.
/// `path` always ends with `current`; dead ends are popped on the way out.
fn look_back(
    inner: &GraphInner,
    target: &NodeId,
    current: &NodeId,
    path: &mut Vec<NodeId>,
    visited: &mut FxHashSet<NodeId>,
) -> bool {
    for dep in inner.dependencies_of(current) {
        if dep == *target {
            path.push(dep);
            return true;
        }
        if !visited.insert(dep.clone()) {
            continue;
        }
        path.push(dep.clone());
        if look_back(inner, target, &dep, path, visited) {
            return true;
        }
        path.pop();
    }
    false
}

/// Render a cycle trace for humans:
///
/// ```text
/// 1: /srv/a.js
/// 2: /srv/b.js
/// 3: /srv/c.js
///
/// [1] -> 2 -> 3 -> [1]
/// ```
///
/// `[1]` marks the repeated first/last node.
pub fn format_trace(trace: &[NodeId]) -> String {
    let list: Vec<String> = trace
        .iter()
        .take(trace.len().saturating_sub(1))
        .enumerate()
        .map(|(index, id)| format!("{}: {}", index + 1, id))
        .collect();

    let flow: Vec<String> = (1..=trace.len())
        .map(|position| {
            if position == 1 || position == trace.len() {
                "[1]".to_string()
            } else {
                position.to_string()
            }
        })
        .collect();

    format!("{}\n\n{}", list.join("\n"), flow.join(" -> "))
}
