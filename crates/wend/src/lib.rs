//! # wend
//!
//! Static dependency-graph walker for CommonJS-style source trees.
//!
//! Given one or more entry files, wend parses each reachable file for
//! module references — `require(x)`, `require.resolve(x)`,
//! `require.async(x)` and their comment-annotation equivalents — resolves
//! every reference to a concrete file or a foreign package, and builds a
//! graph of typed dependency edges. Cycles are detected as the graph grows,
//! and registered compilers let non-JavaScript sources participate.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use wend::{WalkOptions, Walker};
//!
//! # async fn example() -> wend::Result<()> {
//! let mut walker = Walker::new(WalkOptions::default())?;
//! let report = walker.walk(["src/index.js"]).await?;
//!
//! for node in report.graph.snapshot() {
//!     println!("{} (foreign: {})", node.id, node.is_foreign);
//! }
//! for warning in &report.warnings {
//!     eprintln!("{warning}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Walker (scheduler)
//!   ├── Runtime          file reads, metadata (async, pluggable)
//!   ├── Pipeline         registered compilers, content classification
//!   ├── ReferenceExtractor   specifiers per reference kind
//!   ├── SpecifierResolver    extension fallback, directory resolution
//!   └── ModuleGraph      nodes, typed edges, cycle tracing (wend-graph)
//! ```
//!
//! Reads, compilation and extraction run concurrently up to the configured
//! bound; all graph mutation happens on the coordinating task, so the graph
//! is never observed half-updated.

pub mod alias;
pub mod compile;
pub mod error;
pub mod extract;
pub mod options;
pub mod resolver;
pub mod runtime;
pub mod walker;

#[cfg(test)]
mod tests;

pub use alias::solve_alias;
pub use compile::{Compile, CompileContext, CompileError, Compiled, CompilerRule};
pub use error::{Result, WalkError};
pub use extract::{CommonJsScanner, ExtractError, ExtractOptions, Extraction, ReferenceExtractor};
pub use options::{EXTS_NODE, WalkOptions};
pub use resolver::SpecifierResolver;
pub use runtime::native::NativeRuntime;
pub use runtime::{FileMetadata, Runtime, RuntimeError, RuntimeResult};
pub use walker::{WalkReport, WalkState, Walker};

// Re-export the graph vocabulary so most callers need only this crate.
pub use wend_graph::{
    ContentKind, Diagnostic, DiagnosticCode, DiagnosticData, EdgeKind, EdgeSets, ModuleGraph,
    Node, NodeId, format_trace, pathspec,
};

/// Test utilities (available with the `test-utils` feature).
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils {
    pub use crate::runtime::test_utils::*;
}

/// Walk a single entry with the given options.
///
/// Convenience wrapper over [`Walker`] for the common one-shot case.
pub async fn walk(entry: impl AsRef<std::path::Path>, options: WalkOptions) -> Result<WalkReport> {
    let mut walker = Walker::new(options)?;
    walker.walk([entry.as_ref()]).await
}
