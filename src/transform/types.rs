//! Core types shared by the transform stages.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::parser::ParseError;

/// One build output file: a path relative to the output root and its text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub path: String,
    pub source: String,
}

impl Artifact {
    pub fn new(path: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Reported size in bytes.
    pub fn size(&self) -> usize {
        self.source.len()
    }

    /// Replace the content (and with it the size) after mutation.
    pub fn replace_source(&mut self, source: String) {
        self.source = source;
    }
}

/// A server function captured from an artifact.
///
/// Immutable once registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRecord {
    /// `slug(artifact path) + "__" + name`
    pub id: String,
    /// The function's own identifier.
    pub name: String,
    /// Full definition on a single line, ready to inline.
    pub source_text: String,
    /// Artifact the function was taken from.
    pub artifact: String,
    /// Line of the function in the original artifact (1-indexed).
    pub line: usize,
}

/// Severity levels for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Kinds of soft diagnostics a pass can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Directive at module level, outside any function.
    #[serde(rename = "orphan_directive")]
    OrphanDirective,
    /// A second function resolved to an id that is already registered.
    #[serde(rename = "duplicate_function")]
    DuplicateFunction,
    /// Directive inside a function that is already being extracted.
    #[serde(rename = "nested_directive")]
    NestedDirective,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::OrphanDirective => "orphan_directive",
            DiagnosticKind::DuplicateFunction => "duplicate_function",
            DiagnosticKind::NestedDirective => "nested_directive",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::OrphanDirective | DiagnosticKind::DuplicateFunction => {
                Severity::Warning
            }
            DiagnosticKind::NestedDirective => Severity::Info,
        }
    }
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A logged, non-fatal finding. Processing continues after it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
    pub file: String,
    pub line: usize,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, file: &str, line: usize, message: String) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            message,
            file: file.to_string(),
            line,
        }
    }
}

/// Errors that abort a build pass.
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("{path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ParseError,
    },
    #[error("{path}:{line}: server function must be a named function, found {kind}")]
    UnnamedFunction {
        path: String,
        line: usize,
        kind: String,
    },
    #[error("{path}:{line}: server function id {id:?} is already registered")]
    DuplicateFunction { path: String, line: usize, id: String },
    #[error("invalid directive query: {0}")]
    Query(String),
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_size_follows_source() {
        let mut artifact = Artifact::new("a.js", "abc");
        assert_eq!(artifact.size(), 3);
        artifact.replace_source("abcdef".to_string());
        assert_eq!(artifact.size(), 6);
    }

    #[test]
    fn test_diagnostic_severity_from_kind() {
        let d = Diagnostic::new(DiagnosticKind::DuplicateFunction, "a.js", 3, "dup".into());
        assert_eq!(d.severity, Severity::Warning);
        let d = Diagnostic::new(DiagnosticKind::NestedDirective, "a.js", 3, "nested".into());
        assert_eq!(d.severity, Severity::Info);
    }
}
