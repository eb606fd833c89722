//! Warning/error records surfaced during a walk.
//!
//! Diagnostics carry a symbolic code, a rendered message, and the
//! structured payload (offending specifier, containing file, cycle trace)
//! so callers can react programmatically instead of parsing text.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::node::NodeId;

/// Symbolic diagnostic categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    ModuleNotFound,
    CyclicDependency,
    NotAllowAbsolutePath,
    WrongUsageRequire,
    ErrorReadFile,
    ErrorParseJs,
    SelfReference,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::ModuleNotFound => "MODULE_NOT_FOUND",
            DiagnosticCode::CyclicDependency => "CYCLIC_DEPENDENCY",
            DiagnosticCode::NotAllowAbsolutePath => "NOT_ALLOW_ABSOLUTE_PATH",
            DiagnosticCode::WrongUsageRequire => "WRONG_USAGE_REQUIRE",
            DiagnosticCode::ErrorReadFile => "ERROR_READ_FILE",
            DiagnosticCode::ErrorParseJs => "ERROR_PARSE_JS",
            DiagnosticCode::SelfReference => "SELF_REFERENCE",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured payload attached to a diagnostic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticData {
    /// The raw specifier that triggered the diagnostic, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependency: Option<String>,
    /// The file in which the specifier appeared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Full node-id path of a cycle, first/last node repeated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Vec<NodeId>>,
}

/// One warning or error observed during a walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub message: String,
    pub data: DiagnosticData,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, message: impl Into<String>, data: DiagnosticData) -> Self {
        Self {
            code,
            message: message.into(),
            data,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}
