//! # wend-graph
//!
//! Pure data structures for CommonJS dependency graphs.
//!
//! This crate provides the node/edge store and the incremental
//! circular-dependency tracer used by the `wend` walker. It contains no I/O
//! and no resolution logic: nodes are keyed by canonical id (an absolute
//! file path for local modules, a bare package name for foreign ones) and
//! edges are stored as id-to-id relations, so the graph owns every node and
//! nothing in it holds a live reference to anything else.
//!
//! ## Overview
//!
//! - [`ModuleGraph`] — a cloneable handle over the shared node arena.
//!   Creation is idempotent: asking for an id twice yields the same node,
//!   and only the first request reports "newly created".
//! - [`Node`] — one resolved module unit: entry/foreign flags, content kind
//!   and payload, per-reference-kind edge maps, and back-references used
//!   only for diagnostics.
//! - [`ModuleGraph::trace`] — answers "would the edge `from -> to` close a
//!   cycle?" against the edges recorded so far.
//! - [`Diagnostic`] — the warning/error record shared with the walker.
//!
//! ## Thread safety
//!
//! `ModuleGraph` wraps its state in `Arc<RwLock<_>>`, so handles are cheap
//! to clone and safe to share. The walker mutates the graph from a single
//! coordinating task; the lock exists so independent walks may share one
//! graph instance as an opt-in cache.

mod circular;
mod diagnostic;
mod graph;
mod node;
pub mod pathspec;

pub use circular::format_trace;
pub use diagnostic::{Diagnostic, DiagnosticCode, DiagnosticData};
pub use graph::ModuleGraph;
pub use node::{ContentKind, EdgeKind, EdgeSets, Node, NodeId};
