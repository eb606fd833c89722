//! Error types for walk operations.
//!
//! Every fatal condition maps onto a symbolic diagnostic code where the
//! taxonomy defines one (`code()` returns `None` for configuration and
//! collaborator failures that have no wire-level category).

use std::path::PathBuf;

use thiserror::Error;
use wend_graph::{DiagnosticCode, NodeId, format_trace};

use crate::runtime::RuntimeError;

/// Result type alias for walk operations.
pub type Result<T> = std::result::Result<T, WalkError>;

/// Error that can terminate a walk.
#[derive(Debug, Error)]
pub enum WalkError {
    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Underlying file read failed. Always fatal.
    #[error("Error reading module '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: RuntimeError,
    },

    /// A registered compiler rejected the file.
    #[error("Error compiling '{path}': {message}")]
    Compile { path: PathBuf, message: String },

    /// The extractor could not parse the source.
    #[error("Error parsing '{path}': {message}")]
    ParseJs { path: PathBuf, message: String },

    /// Malformed reference call under strict extraction.
    #[error("Wrong usage of require in '{path}': {message}")]
    WrongUsageRequire { path: PathBuf, message: String },

    /// Specifier resolution exhausted every fallback.
    #[error("Cannot find module '{specifier}' required by '{path}'")]
    ModuleNotFound { specifier: String, path: NodeId },

    /// A back-edge closed a cycle while cycles are disallowed.
    #[error("Cyclic dependency found: \n{}", format_trace(.trace))]
    CyclicDependency { trace: Vec<NodeId>, path: NodeId },

    /// An absolute-path specifier while absolute paths are disallowed.
    #[error("Requiring an absolute path '{specifier}' is not allowed in '{path}'")]
    NotAllowAbsolutePath { specifier: String, path: NodeId },

    /// A spawned parse task died instead of reporting a result.
    #[error("Walker task failed: {0}")]
    Task(String),
}

impl WalkError {
    /// The symbolic code for this error, if the taxonomy defines one.
    pub fn code(&self) -> Option<DiagnosticCode> {
        match self {
            WalkError::ReadFile { .. } => Some(DiagnosticCode::ErrorReadFile),
            WalkError::ParseJs { .. } => Some(DiagnosticCode::ErrorParseJs),
            WalkError::WrongUsageRequire { .. } => Some(DiagnosticCode::WrongUsageRequire),
            WalkError::ModuleNotFound { .. } => Some(DiagnosticCode::ModuleNotFound),
            WalkError::CyclicDependency { .. } => Some(DiagnosticCode::CyclicDependency),
            WalkError::NotAllowAbsolutePath { .. } => Some(DiagnosticCode::NotAllowAbsolutePath),
            WalkError::InvalidConfig(_) | WalkError::Compile { .. } | WalkError::Task(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_the_taxonomy() {
        let err = WalkError::ModuleNotFound {
            specifier: "./missing".into(),
            path: NodeId::new("/srv/a.js"),
        };
        assert_eq!(err.code(), Some(DiagnosticCode::ModuleNotFound));
        assert_eq!(err.code().unwrap().as_str(), "MODULE_NOT_FOUND");

        assert_eq!(WalkError::InvalidConfig("x".into()).code(), None);
    }

    #[test]
    fn cyclic_message_renders_trace() {
        let err = WalkError::CyclicDependency {
            trace: vec![
                NodeId::new("/a.js"),
                NodeId::new("/b.js"),
                NodeId::new("/a.js"),
            ],
            path: NodeId::new("/a.js"),
        };
        let message = err.to_string();
        assert!(message.contains("Cyclic dependency found"));
        assert!(message.contains("[1] -> 2 -> [1]"));
    }
}
