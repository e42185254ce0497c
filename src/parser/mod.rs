//! Tree-sitter parsing of JavaScript build artifacts.
//!
//! This module provides:
//! - `ParsedSource`: a parse tree kept together with the text it was built from
//! - `Span`: byte range plus 1-indexed line/column of a node
//! - `parse`: the strict entry point used by the transform (syntax errors are fatal)

pub mod javascript;

use std::fmt;
use std::ops::Range;

use thiserror::Error;
use tree_sitter::{Node, Parser as TsParser, Tree};

/// Errors produced while turning artifact text into a tree.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("failed to load JavaScript grammar: {0}")]
    Language(String),
    #[error("parser returned no tree")]
    NoTree,
    #[error("syntax error at {line}:{column} near {snippet:?}")]
    Syntax {
        line: usize,
        column: usize,
        snippet: String,
    },
}

/// Source location span with byte offsets and line/column positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Start byte offset (0-indexed).
    pub start_byte: usize,
    /// End byte offset (0-indexed, exclusive).
    pub end_byte: usize,
    /// Start line (1-indexed).
    pub line: usize,
    /// Start column (1-indexed).
    pub column: usize,
}

impl Span {
    /// Create a span from a tree-sitter node.
    pub fn from_node(node: Node) -> Self {
        let start = node.start_position();
        Self {
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            line: start.row + 1, // tree-sitter is 0-indexed
            column: start.column + 1,
        }
    }

    /// Byte range covered by the span.
    pub fn range(&self) -> Range<usize> {
        self.start_byte..self.end_byte
    }

    /// Whether `other` lies entirely inside this span.
    pub fn contains(&self, other: &Span) -> bool {
        self.start_byte <= other.start_byte && other.end_byte <= self.end_byte
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Holds a parsed tree-sitter tree and the text it was parsed from.
///
/// The tree borrows nothing, so nodes handed out by `root()` live as long as
/// the `ParsedSource` itself.
pub struct ParsedSource {
    /// The tree-sitter parse tree.
    pub tree: Tree,
    /// The original source text (kept for node text extraction).
    pub source: String,
    /// The artifact path (for diagnostics and identifiers).
    pub path: String,
}

impl ParsedSource {
    /// Root node of the tree.
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Get text for a tree-sitter node.
    pub fn node_text(&self, node: Node) -> &str {
        &self.source[node.start_byte()..node.end_byte()]
    }

    /// Leading whitespace of the line a node starts on.
    pub fn line_indent(&self, node: Node) -> &str {
        let line_start = self.source[..node.start_byte()]
            .rfind('\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        let line = &self.source[line_start..node.start_byte()];
        let indent_len = line.len() - line.trim_start().len();
        &line[..indent_len]
    }
}

/// Parse JavaScript source, rejecting trees that contain syntax errors.
///
/// Tree-sitter recovers from errors by inserting ERROR and MISSING nodes.
/// Rewriting such a tree would splice stubs into text we do not
/// understand, so the first broken node is reported instead.
pub fn parse(path: &str, source: String) -> Result<ParsedSource, ParseError> {
    let mut parser = TsParser::new();
    parser
        .set_language(&javascript::language())
        .map_err(|e| ParseError::Language(e.to_string()))?;

    let tree = parser.parse(&source, None).ok_or(ParseError::NoTree)?;

    if tree.root_node().has_error() {
        let broken = first_error(tree.root_node()).unwrap_or(tree.root_node());
        let position = broken.start_position();
        let snippet: String = source[broken.start_byte()..]
            .chars()
            .take(40)
            .collect();
        return Err(ParseError::Syntax {
            line: position.row + 1,
            column: position.column + 1,
            snippet,
        });
    }

    Ok(ParsedSource {
        tree,
        source,
        path: path.to_string(),
    })
}

/// Find the first ERROR or MISSING node in document order.
fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}
