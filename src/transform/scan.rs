//! Directive scanning.
//!
//! Finds string-literal statements equal to the directive marker that sit in
//! a directive prologue (the leading run of string statements of a function
//! body or of the module) and resolves the function they belong to.

use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Query, QueryCursor};

use crate::parser::javascript::{
    is_function, is_string_statement, is_trivia, language, string_contents, DIRECTIVE_QUERY,
};
use crate::parser::{ParsedSource, Span};

use super::{Diagnostic, DiagnosticKind, TransformError};

/// A located directive plus the function it marks.
#[derive(Debug, Clone, Copy)]
pub struct DirectiveMatch<'t> {
    /// Position of the directive literal.
    pub span: Span,
    /// Nearest enclosing function.
    pub function: Node<'t>,
}

/// Scan a parsed artifact for directives, in document order.
///
/// Module-level directives have no enclosing function; each one is reported
/// as an `OrphanDirective` diagnostic and skipped.
pub fn scan<'t>(
    parsed: &'t ParsedSource,
    directive: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Vec<DirectiveMatch<'t>>, TransformError> {
    let language = language();
    let query =
        Query::new(&language, DIRECTIVE_QUERY).map_err(|e| TransformError::Query(e.to_string()))?;
    let literal_idx = query.capture_index_for_name("literal");
    let statement_idx = query.capture_index_for_name("statement");

    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(&query, parsed.root(), parsed.source.as_bytes());

    let mut found = Vec::new();

    while let Some(m) = matches.next() {
        let mut literal = None;
        let mut statement = None;
        for capture in m.captures {
            if Some(capture.index) == literal_idx {
                literal = Some(capture.node);
            } else if Some(capture.index) == statement_idx {
                statement = Some(capture.node);
            }
        }
        let (Some(literal), Some(statement)) = (literal, statement) else {
            continue;
        };

        if string_contents(parsed.node_text(literal)) != directive {
            continue;
        }

        let Some(container) = statement.parent() else {
            continue;
        };
        if !in_prologue(container, statement) {
            continue;
        }

        let span = Span::from_node(literal);
        match enclosing_function(container) {
            Some(function) => found.push(DirectiveMatch { span, function }),
            None if container.kind() == "program" => {
                tracing::warn!(
                    file = %parsed.path,
                    line = span.line,
                    "'{}' directive outside of a function",
                    directive
                );
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::OrphanDirective,
                    &parsed.path,
                    span.line,
                    format!(
                        "'{}' directive should only be used inside a named function",
                        directive
                    ),
                ));
            }
            // A string statement in a plain block or static block is no directive.
            None => {}
        }
    }

    found.sort_by_key(|m| m.span.start_byte);
    Ok(found)
}

/// Whether `statement` belongs to the leading run of string statements of `container`.
fn in_prologue(container: Node, statement: Node) -> bool {
    let mut cursor = container.walk();
    for child in container.named_children(&mut cursor) {
        if is_trivia(child) {
            continue;
        }
        if child.id() == statement.id() {
            return true;
        }
        if !is_string_statement(child) {
            return false;
        }
    }
    false
}

/// The function whose body is `container`, if any.
fn enclosing_function(container: Node) -> Option<Node> {
    if container.kind() != "statement_block" {
        return None;
    }
    let parent = container.parent()?;
    if !is_function(parent) {
        return None;
    }
    let body = parent.child_by_field_name("body")?;
    (body.id() == container.id()).then_some(parent)
}
