//! Content pipeline.
//!
//! Registered compilers let non-JavaScript sources participate in the
//! graph: each rule pairs a filename pattern with a transform, and matching
//! rules run in registration order over the raw content. The pipeline seeds
//! the classification from the file extension (`.json` -> json, `.node` ->
//! binary, everything else javascript) and a transform may override it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use thiserror::Error;
use wend_graph::ContentKind;

/// Failure reported by a compiler. Always fatal to the walk.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CompileError {
    pub message: String,
}

impl CompileError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Context handed to each transform invocation.
#[derive(Debug, Clone)]
pub struct CompileContext {
    /// The file being compiled.
    pub filename: PathBuf,
    /// Per-rule options as given at registration.
    pub options: serde_json::Value,
}

/// Output of one transform step.
#[derive(Debug, Clone)]
pub struct Compiled {
    pub content: String,
    /// Override for the content classification; `None` keeps the current one.
    pub kind: Option<ContentKind>,
}

impl Compiled {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind: None,
        }
    }
}

/// A content transform. Implementations receive the output of the previous
/// matching rule (or the raw file content) and produce the next stage.
#[async_trait]
pub trait Compile: Send + Sync {
    async fn compile(&self, content: String, ctx: &CompileContext)
    -> Result<Compiled, CompileError>;
}

/// One registered rule: filename pattern, per-rule options, transform.
#[derive(Clone)]
pub struct CompilerRule {
    pub test: Regex,
    pub options: serde_json::Value,
    pub compiler: Arc<dyn Compile>,
}

impl CompilerRule {
    pub fn new(test: Regex, compiler: Arc<dyn Compile>) -> Self {
        Self {
            test,
            options: serde_json::Value::Null,
            compiler,
        }
    }

    pub fn with_options(mut self, options: serde_json::Value) -> Self {
        self.options = options;
        self
    }
}

impl std::fmt::Debug for CompilerRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompilerRule")
            .field("test", &self.test.as_str())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// The ordered set of rules applied to every parsed file.
#[derive(Debug, Default, Clone)]
pub struct Pipeline {
    rules: Vec<CompilerRule>,
}

impl Pipeline {
    pub fn new(rules: Vec<CompilerRule>) -> Self {
        Self { rules }
    }

    /// Classify and transform one file's raw bytes.
    ///
    /// Binary payloads survive as lossy text; the classification is what
    /// keeps them out of the reference scanner.
    pub async fn run(
        &self,
        path: &Path,
        raw: Vec<u8>,
    ) -> Result<(ContentKind, String), CompileError> {
        let mut kind = ContentKind::from_path(path);
        let mut content = String::from_utf8_lossy(&raw).into_owned();

        let filename = path.to_string_lossy();
        for rule in self.rules.iter().filter(|rule| rule.test.is_match(&filename)) {
            let ctx = CompileContext {
                filename: path.to_path_buf(),
                options: rule.options.clone(),
            };
            let compiled = rule.compiler.compile(content, &ctx).await?;
            content = compiled.content;
            if let Some(override_kind) = compiled.kind {
                kind = override_kind;
            }
        }

        Ok((kind, content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Uppercase;

    #[async_trait]
    impl Compile for Uppercase {
        async fn compile(
            &self,
            content: String,
            _ctx: &CompileContext,
        ) -> Result<Compiled, CompileError> {
            Ok(Compiled::content(content.to_uppercase()))
        }
    }

    #[derive(Debug)]
    struct CoffeeToJs;

    #[async_trait]
    impl Compile for CoffeeToJs {
        async fn compile(
            &self,
            content: String,
            ctx: &CompileContext,
        ) -> Result<Compiled, CompileError> {
            assert!(ctx.filename.to_string_lossy().ends_with(".coffee"));
            Ok(Compiled {
                content: format!("// compiled\n{content}"),
                kind: Some(ContentKind::JavaScript),
            })
        }
    }

    #[tokio::test]
    async fn classifies_by_extension_without_rules() {
        let pipeline = Pipeline::default();

        let (kind, content) = pipeline
            .run(Path::new("/p/a.json"), b"{}".to_vec())
            .await
            .unwrap();
        assert_eq!(kind, ContentKind::Json);
        assert_eq!(content, "{}");

        let (kind, _) = pipeline
            .run(Path::new("/p/a.node"), vec![0, 159, 146, 150])
            .await
            .unwrap();
        assert_eq!(kind, ContentKind::Binary);

        let (kind, _) = pipeline
            .run(Path::new("/p/a"), b"x".to_vec())
            .await
            .unwrap();
        assert_eq!(kind, ContentKind::JavaScript);
    }

    #[tokio::test]
    async fn matching_rules_run_in_registration_order() {
        let pipeline = Pipeline::new(vec![
            CompilerRule::new(Regex::new(r"\.coffee$").unwrap(), Arc::new(CoffeeToJs)),
            CompilerRule::new(Regex::new(r"\.coffee$").unwrap(), Arc::new(Uppercase)),
        ]);

        let (kind, content) = pipeline
            .run(Path::new("/p/a.coffee"), b"x = 1".to_vec())
            .await
            .unwrap();
        assert_eq!(kind, ContentKind::JavaScript);
        assert_eq!(content, "// COMPILED\nX = 1");
    }

    #[tokio::test]
    async fn non_matching_rules_are_skipped() {
        let pipeline = Pipeline::new(vec![CompilerRule::new(
            Regex::new(r"\.coffee$").unwrap(),
            Arc::new(Uppercase),
        )]);

        let (_, content) = pipeline
            .run(Path::new("/p/a.js"), b"abc".to_vec())
            .await
            .unwrap();
        assert_eq!(content, "abc");
    }
}
