//! The traversal scheduler.
//!
//! `Walker` drives a whole walk: it seeds the queue with the entry nodes,
//! keeps up to `concurrency` read+compile+extract tasks in flight, and
//! applies every task's extracted references to the shared graph from a
//! single coordinating loop — alias rewriting, specifier resolution, node
//! creation, edge recording and cycle checking all happen here, specifier
//! by specifier, so no task ever observes a half-updated graph.
//!
//! The first fatal error wins: queued work is discarded, in-flight results
//! are dropped, and the walk resolves exactly once with either the error or
//! the drained graph plus its buffered warnings.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use path_clean::PathClean;
use tokio::task::JoinSet;
use tracing::{debug, info};

use wend_graph::pathspec::is_relative_specifier;
use wend_graph::{
    ContentKind, Diagnostic, DiagnosticCode, DiagnosticData, EdgeKind, ModuleGraph, NodeId,
    format_trace,
};

use crate::alias::solve_alias;
use crate::compile::{CompilerRule, Pipeline};
use crate::error::{Result, WalkError};
use crate::extract::{
    CommonJsScanner, ExtractError, ExtractOptions, Extraction, ReferenceExtractor,
};
use crate::options::WalkOptions;
use crate::resolver::SpecifierResolver;
use crate::runtime::Runtime;
use crate::runtime::native::NativeRuntime;

/// Lifecycle of one walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkState {
    /// Constructed, not yet walking.
    Idle,
    /// At least one task queued or in flight.
    Running,
    /// Queue empty, all tasks completed, no fatal error.
    Drained,
    /// A fatal error occurred; the queue was stopped.
    Failed,
}

/// The result of a drained walk.
#[derive(Debug, Clone)]
pub struct WalkReport {
    /// The accumulated graph (a handle; shared-cache callers may hold more).
    pub graph: ModuleGraph,
    /// Non-fatal diagnostics in emission order.
    pub warnings: Vec<Diagnostic>,
}

type WarningSink = Arc<dyn Fn(&Diagnostic) + Send + Sync>;

/// Dependency-graph walker for CommonJS-style source trees.
///
/// ```rust,no_run
/// use wend::{WalkOptions, Walker};
///
/// # async fn example() -> wend::Result<()> {
/// let mut walker = Walker::new(WalkOptions::default())?;
/// let report = walker.walk(["src/index.js"]).await?;
/// println!("{} modules", report.graph.len());
/// # Ok(())
/// # }
/// ```
pub struct Walker {
    options: WalkOptions,
    runtime: Arc<dyn Runtime>,
    graph: ModuleGraph,
    rules: Vec<CompilerRule>,
    extractor: Arc<dyn ReferenceExtractor>,
    warning_sink: Option<WarningSink>,
    state: WalkState,
}

impl Walker {
    /// Build a walker, validating the options.
    pub fn new(options: WalkOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            options,
            runtime: Arc::new(NativeRuntime::new()),
            graph: ModuleGraph::new(),
            rules: Vec::new(),
            extractor: Arc::new(CommonJsScanner::new()),
            warning_sink: None,
            state: WalkState::Idle,
        })
    }

    /// Replace the filesystem runtime.
    pub fn with_runtime(mut self, runtime: Arc<dyn Runtime>) -> Self {
        self.runtime = runtime;
        self
    }

    /// Share an existing graph instead of owning a fresh one. Nodes already
    /// present are not reprocessed — this is cross-run memoization, opted
    /// into explicitly.
    pub fn with_graph(mut self, graph: ModuleGraph) -> Self {
        self.graph = graph;
        self
    }

    /// Replace the reference extractor (e.g. with an AST-based one).
    pub fn with_extractor(mut self, extractor: Arc<dyn ReferenceExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Register a live sink for warnings; they are delivered as they occur,
    /// in addition to the buffered list on the final report.
    pub fn on_warning(mut self, sink: impl Fn(&Diagnostic) + Send + Sync + 'static) -> Self {
        self.warning_sink = Some(Arc::new(sink));
        self
    }

    /// Register a content-transform rule. Rules apply in registration order.
    pub fn register(&mut self, rule: CompilerRule) -> &mut Self {
        self.rules.push(rule);
        self
    }

    /// A handle to the graph this walker feeds.
    pub fn graph(&self) -> ModuleGraph {
        self.graph.clone()
    }

    pub fn state(&self) -> WalkState {
        self.state
    }

    /// Walk the tree from one or more entry files.
    ///
    /// Entries are resolved against the configured `cwd` (or the runtime's
    /// working directory) and share one run: the walk drains when every
    /// subtree is exhausted. Re-walking a drained walker is allowed and
    /// skips everything the shared graph already knows.
    pub async fn walk<I, P>(&mut self, entries: I) -> Result<WalkReport>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        if self.state == WalkState::Failed {
            return Err(WalkError::InvalidConfig(
                "you should not call walk() after a failed run".to_string(),
            ));
        }
        self.state = WalkState::Running;

        if self.options.cwd.is_none() {
            let cwd = self.runtime.get_cwd().map_err(|e| {
                WalkError::InvalidConfig(format!("cannot determine working directory: {e}"))
            })?;
            self.options.cwd = Some(cwd);
        }
        let cwd = self.options.cwd.clone().unwrap_or_default();

        let mut pending = VecDeque::new();
        for entry in entries {
            let absolute = cwd.join(entry.as_ref()).clean();
            let id = NodeId::new(absolute.to_string_lossy());
            if self.graph.get_or_create(&id, true) {
                debug!(entry = %id, "seeded entry");
                pending.push_back(id);
            } else {
                debug!(entry = %id, "entry already known, skipping");
            }
        }

        let mut warnings = Vec::new();
        match self.run(pending, &mut warnings).await {
            Ok(()) => {
                self.state = WalkState::Drained;
                info!(
                    nodes = self.graph.len(),
                    warnings = warnings.len(),
                    "walk drained"
                );
                Ok(WalkReport {
                    graph: self.graph.clone(),
                    warnings,
                })
            }
            Err(err) => {
                self.state = WalkState::Failed;
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        mut pending: VecDeque<NodeId>,
        warnings: &mut Vec<Diagnostic>,
    ) -> Result<()> {
        let pipeline = Arc::new(Pipeline::new(self.rules.clone()));
        let resolver = SpecifierResolver::new(self.options.extensions.clone());
        let extract_options = ExtractOptions {
            comment_require: self.options.comment_require,
            require_resolve: self.options.require_resolve,
            require_async: self.options.require_async,
            allow_non_literal_require: self.options.allow_non_literal_require,
        };

        let mut in_flight: JoinSet<Result<ParsedFile>> = JoinSet::new();

        let result = loop {
            while in_flight.len() < self.options.concurrency {
                let Some(id) = pending.pop_front() else { break };
                debug!(node = %id, in_flight = in_flight.len(), "scheduling parse");
                in_flight.spawn(parse_file(
                    id,
                    Arc::clone(&self.runtime),
                    Arc::clone(&pipeline),
                    Arc::clone(&self.extractor),
                    extract_options.clone(),
                ));
            }

            let Some(joined) = in_flight.join_next().await else {
                break Ok(());
            };
            let parsed = match joined {
                Ok(Ok(parsed)) => parsed,
                Ok(Err(err)) => break Err(err),
                Err(join_err) => break Err(WalkError::Task(join_err.to_string())),
            };

            debug!(node = %parsed.id, kind = ?parsed.kind, "parsed");
            self.graph
                .set_payload(&parsed.id, parsed.kind, parsed.content);

            if let Some(extraction) = parsed.extraction {
                if let Err(err) = self
                    .record_references(&parsed.id, &extraction, &resolver, &mut pending, warnings)
                    .await
                {
                    break Err(err);
                }
            }
        };

        if result.is_err() {
            // Nothing queued may start once the walk has failed; in-flight
            // results after the first error are discarded.
            in_flight.shutdown().await;
        }
        result
    }

    async fn record_references(
        &self,
        from: &NodeId,
        extraction: &Extraction,
        resolver: &SpecifierResolver,
        pending: &mut VecDeque<NodeId>,
        warnings: &mut Vec<Diagnostic>,
    ) -> Result<()> {
        for kind in EdgeKind::ALL {
            for specifier in extraction.by_kind(kind) {
                self.record_one(from, specifier, kind, resolver, pending, warnings)
                    .await?;
            }
        }
        Ok(())
    }

    async fn record_one(
        &self,
        from: &NodeId,
        specifier: &str,
        kind: EdgeKind,
        resolver: &SpecifierResolver,
        pending: &mut VecDeque<NodeId>,
        warnings: &mut Vec<Diagnostic>,
    ) -> Result<()> {
        if specifier.starts_with('/') {
            if !self.options.allow_absolute_path {
                return Err(WalkError::NotAllowAbsolutePath {
                    specifier: specifier.to_string(),
                    path: from.clone(),
                });
            }
            self.emit(
                Diagnostic::new(
                    DiagnosticCode::NotAllowAbsolutePath,
                    format!("Requiring an absolute path '{specifier}' is not allowed in '{from}'"),
                    DiagnosticData {
                        dependency: Some(specifier.to_string()),
                        path: Some(from.to_string()),
                        trace: None,
                    },
                ),
                warnings,
            );
            return Ok(());
        }

        let mut dep = specifier.to_string();
        if !is_relative_specifier(&dep) {
            // only top-level bare ids are aliased
            if let Some(rewritten) = solve_alias(
                &dep,
                &self.options.aliases,
                self.options.cwd.as_deref(),
                from.as_path(),
            ) {
                debug!(from = %from, specifier, rewritten, "alias applied");
                dep = rewritten;
            }
        }

        if !is_relative_specifier(&dep) {
            // foreign package: terminal node, never parsed
            let target = NodeId::new(dep);
            return self.link(from, &target, kind, specifier, pending, warnings);
        }

        let containing_dir = from
            .as_path()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"));
        match resolver
            .resolve(&dep, &containing_dir, self.runtime.as_ref())
            .await
        {
            Some(real) => {
                let target = NodeId::new(real.to_string_lossy());
                self.link(from, &target, kind, specifier, pending, warnings)
            }
            None => Err(WalkError::ModuleNotFound {
                specifier: specifier.to_string(),
                path: from.clone(),
            }),
        }
    }

    /// Record the edge `from -> to`, creating the target node if needed and
    /// scheduling it for parsing when it is new and local. Existing targets
    /// are checked for a cycle against the edges present before this one.
    fn link(
        &self,
        from: &NodeId,
        to: &NodeId,
        kind: EdgeKind,
        raw: &str,
        pending: &mut VecDeque<NodeId>,
        warnings: &mut Vec<Diagnostic>,
    ) -> Result<()> {
        if self.graph.get_or_create(to, false) {
            self.graph.add_edge(from, to, kind, raw);
            if !to.is_foreign() {
                pending.push_back(to.clone());
            }
            return Ok(());
        }

        if from == to {
            self.graph.add_edge(from, to, kind, raw);
            if !self.options.allow_self_reference {
                self.emit(
                    Diagnostic::new(
                        DiagnosticCode::SelfReference,
                        format!("Module '{from}' requires itself"),
                        DiagnosticData {
                            dependency: Some(raw.to_string()),
                            path: Some(from.to_string()),
                            trace: None,
                        },
                    ),
                    warnings,
                );
            }
            return Ok(());
        }

        let trace = self.graph.trace(from, to);
        self.graph.add_edge(from, to, kind, raw);

        if let Some(trace) = trace {
            if !self.options.allow_cyclic {
                return Err(WalkError::CyclicDependency {
                    trace,
                    path: to.clone(),
                });
            }
            let message = format!("Cyclic dependency found: \n{}", format_trace(&trace));
            self.emit(
                Diagnostic::new(
                    DiagnosticCode::CyclicDependency,
                    message,
                    DiagnosticData {
                        dependency: None,
                        path: Some(to.to_string()),
                        trace: Some(trace),
                    },
                ),
                warnings,
            );
        }
        Ok(())
    }

    fn emit(&self, diagnostic: Diagnostic, warnings: &mut Vec<Diagnostic>) {
        debug!(code = %diagnostic.code, "warning emitted");
        if let Some(sink) = &self.warning_sink {
            sink(&diagnostic);
        }
        warnings.push(diagnostic);
    }
}

struct ParsedFile {
    id: NodeId,
    kind: ContentKind,
    content: String,
    extraction: Option<Extraction>,
}

/// The concurrent phase of one task: read, compile, extract. Everything
/// else happens on the coordinator.
async fn parse_file(
    id: NodeId,
    runtime: Arc<dyn Runtime>,
    pipeline: Arc<Pipeline>,
    extractor: Arc<dyn ReferenceExtractor>,
    options: ExtractOptions,
) -> Result<ParsedFile> {
    let path = id.as_path().to_path_buf();

    let raw = runtime
        .read_file(&path)
        .await
        .map_err(|source| WalkError::ReadFile {
            path: path.clone(),
            source,
        })?;

    let (kind, content) = pipeline
        .run(&path, raw)
        .await
        .map_err(|e| WalkError::Compile {
            path: path.clone(),
            message: e.message,
        })?;

    // only javascript content carries references
    let extraction = if kind.is_javascript() {
        let extracted = extractor
            .extract(&path, &content, &options)
            .map_err(|e| match e {
                ExtractError::Parse { message } => WalkError::ParseJs {
                    path: path.clone(),
                    message,
                },
                ExtractError::WrongUsage { message } => WalkError::WrongUsageRequire {
                    path: path.clone(),
                    message,
                },
            })?;
        Some(extracted)
    } else {
        None
    };

    Ok(ParsedFile {
        id,
        kind,
        content,
        extraction,
    })
}
