//! JavaScript grammar configuration: node kinds and queries the transform relies on.

use tree_sitter::{Language, Node};

/// Tree-sitter query for candidate directive statements.
///
/// Captures:
/// - `literal`: the string literal that may hold the directive
/// - `statement`: the expression statement wrapping it
///
/// Only the shape is matched here; prologue position is checked by the scanner.
pub const DIRECTIVE_QUERY: &str = r#"
(expression_statement (string) @literal) @statement
"#;

/// Node kinds that introduce a function scope.
pub const FUNCTION_KINDS: &[&str] = &[
    "function_declaration",
    "function_expression",
    "function",
    "generator_function_declaration",
    "generator_function",
    "arrow_function",
    "method_definition",
];

/// Statement kinds terminated by `;` or by automatic semicolon insertion.
pub const SEMICOLON_STATEMENTS: &[&str] = &[
    "expression_statement",
    "lexical_declaration",
    "variable_declaration",
    "return_statement",
    "throw_statement",
    "break_statement",
    "continue_statement",
    "debugger_statement",
    "do_statement",
    "field_definition",
];

/// The tree-sitter JavaScript language.
pub fn language() -> Language {
    tree_sitter_javascript::LANGUAGE.into()
}

/// Whether the node is a function of any flavor.
pub fn is_function(node: Node) -> bool {
    FUNCTION_KINDS.contains(&node.kind())
}

/// Whether the node is a comment or the `#!` line, which never break a prologue.
pub fn is_trivia(node: Node) -> bool {
    matches!(node.kind(), "comment" | "hash_bang_line")
}

/// The identifier naming a function, if it has one.
///
/// Method definitions are keyed by a property name rather than bound to an
/// identifier, so they count as unnamed like arrows and anonymous expressions.
pub fn function_name(node: Node) -> Option<Node> {
    if node.kind() == "method_definition" || node.kind() == "arrow_function" {
        return None;
    }
    node.child_by_field_name("name")
        .filter(|name| name.kind() == "identifier")
}

/// Whether an expression statement consists of a bare string literal.
pub fn is_string_statement(node: Node) -> bool {
    if node.kind() != "expression_statement" {
        return false;
    }
    let mut cursor = node.walk();
    let first = node
        .named_children(&mut cursor)
        .find(|child| !is_trivia(*child));
    matches!(first, Some(child) if child.kind() == "string")
}

/// Raw contents of a string literal node, quotes stripped, escapes untouched.
pub fn string_contents(text: &str) -> &str {
    if text.len() >= 2 {
        &text[1..text.len() - 1]
    } else {
        ""
    }
}
