//! Function extraction: naming, identifiers, and single-line serialization.

use std::borrow::Cow;

use tree_sitter::Node;

use crate::parser::javascript::{function_name, SEMICOLON_STATEMENTS};
use crate::parser::{ParsedSource, Span};

use super::{DirectiveMatch, TransformError};

/// Characters dropped from artifact paths when building a slug.
const RESERVED_CHARS: &[char] = &[
    '*', '+', '~', '.', '(', ')', '/', '\\', '\'', '"', '!', ':', '@',
];

/// Separator between slug words, and between slug and function name (doubled).
const SEPARATOR: char = '_';

/// A marked function pulled out of an artifact, not yet registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFunction {
    pub id: String,
    pub name: String,
    pub source_text: String,
    /// Span of the whole function definition.
    pub span: Span,
    /// Single-line functions (minified output) get single-line stubs.
    pub single_line: bool,
    /// Indentation of the line the function starts on.
    pub indent: String,
}

/// Extract the function a directive belongs to.
///
/// The function must be bound to an identifier; anything else is fatal.
pub fn extract(
    parsed: &ParsedSource,
    directive: &DirectiveMatch,
) -> Result<ExtractedFunction, TransformError> {
    let function = directive.function;
    let span = Span::from_node(function);

    let name_node = function_name(function).ok_or_else(|| TransformError::UnnamedFunction {
        path: parsed.path.clone(),
        line: span.line,
        kind: function.kind().to_string(),
    })?;
    let name = parsed.node_text(name_node).to_string();

    Ok(ExtractedFunction {
        id: function_id(&parsed.path, &name),
        source_text: flatten(parsed, function),
        single_line: !parsed.node_text(function).contains('\n'),
        indent: parsed.line_indent(function).to_string(),
        name,
        span,
    })
}

/// Identifier-safe form of an artifact path.
///
/// Symbols and accented Latin letters are transliterated, reserved
/// characters are removed, and runs of whitespace or `_` collapse into one
/// `_`. Characters without a transliteration are kept as they are.
///
/// ```
/// assert_eq!(serverfn::transform::slug("static/js/index.js"), "staticjsindexjs");
/// assert_eq!(serverfn::transform::slug("a b__c.js"), "a_b_cjs");
/// assert_eq!(serverfn::transform::slug("café/€.js"), "cafeeurojs");
/// ```
pub fn slug(path: &str) -> String {
    let mut spelled = String::with_capacity(path.len());
    for ch in path.chars() {
        match ch {
            SEPARATOR => spelled.push(' '),
            c if RESERVED_CHARS.contains(&c) => {}
            c => match transliterate(c) {
                Some(ascii) => spelled.push_str(ascii),
                None => spelled.push(c),
            },
        }
    }

    let separator = SEPARATOR.to_string();
    spelled
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(separator.as_str())
}

/// ASCII spelling of a symbol or accented letter, if it has one.
fn transliterate(ch: char) -> Option<&'static str> {
    let ascii = match ch {
        '$' => "dollar",
        '%' => "percent",
        '&' => "and",
        '<' => "less",
        '>' => "greater",
        '|' => "or",
        '€' => "euro",
        '£' => "pound",
        '¥' => "yen",
        '¢' => "cent",
        '₹' => "indian rupee",
        '₿' => "bitcoin",
        '©' => "c",
        '®' => "r",
        '™' => "tm",
        '∞' => "infinity",
        '♥' => "love",
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' | 'Ā' | 'Ă' | 'Ą' => "A",
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'Æ' => "AE",
        'æ' => "ae",
        'Ç' | 'Ć' | 'Č' | 'Ĉ' | 'Ċ' => "C",
        'ç' | 'ć' | 'č' | 'ĉ' | 'ċ' => "c",
        'Ð' | 'Ď' | 'Đ' => "D",
        'ð' | 'ď' | 'đ' => "d",
        'È' | 'É' | 'Ê' | 'Ë' | 'Ē' | 'Ė' | 'Ę' | 'Ě' => "E",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'Ğ' | 'Ģ' | 'Ĝ' | 'Ġ' => "G",
        'ğ' | 'ģ' | 'ĝ' | 'ġ' => "g",
        'Ì' | 'Í' | 'Î' | 'Ï' | 'Ī' | 'Į' | 'İ' => "I",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' | 'ı' => "i",
        'Ķ' => "K",
        'ķ' => "k",
        'Ł' | 'Ľ' | 'Ļ' | 'Ĺ' => "L",
        'ł' | 'ľ' | 'ļ' | 'ĺ' => "l",
        'Ñ' | 'Ń' | 'Ň' | 'Ņ' => "N",
        'ñ' | 'ń' | 'ň' | 'ņ' => "n",
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' | 'Ō' | 'Ő' => "O",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'Œ' => "OE",
        'œ' => "oe",
        'Ř' | 'Ŕ' => "R",
        'ř' | 'ŕ' => "r",
        'Ś' | 'Š' | 'Ş' | 'Ș' => "S",
        'ś' | 'š' | 'ş' | 'ș' => "s",
        'ß' => "ss",
        'Ť' | 'Ţ' | 'Ț' => "T",
        'ť' | 'ţ' | 'ț' => "t",
        'Þ' => "TH",
        'þ' => "th",
        'Ù' | 'Ú' | 'Û' | 'Ü' | 'Ū' | 'Ů' | 'Ű' | 'Ų' => "U",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' | 'ų' => "u",
        'Ý' | 'Ÿ' => "Y",
        'ý' | 'ÿ' => "y",
        'Ź' | 'Ž' | 'Ż' => "Z",
        'ź' | 'ž' | 'ż' => "z",
        _ => return None,
    };
    Some(ascii)
}

/// Unique key of a server function: `slug(path)__name`.
pub fn function_id(artifact_path: &str, function_name: &str) -> String {
    format!("{}{SEPARATOR}{SEPARATOR}{}", slug(artifact_path), function_name)
}

/// Serialize a node back to source text on a single line.
///
/// Tokens are copied verbatim. Whitespace and comments between them become a
/// single space, and statements ended by automatic semicolon insertion get an
/// explicit `;` so joining lines cannot merge them. Inside literals, line
/// continuations are dropped and raw template line breaks become escapes.
pub fn flatten(parsed: &ParsedSource, node: Node) -> String {
    let mut flattener = Flattener {
        source: &parsed.source,
        out: String::with_capacity(node.end_byte() - node.start_byte()),
        last_end: None,
        pending_space: false,
    };
    flattener.visit(node);
    flattener.out
}

struct Flattener<'s> {
    source: &'s str,
    out: String,
    last_end: Option<usize>,
    pending_space: bool,
}

impl Flattener<'_> {
    fn visit(&mut self, node: Node) {
        if node.kind() == "comment" {
            self.pending_space = true;
            return;
        }

        if node.child_count() == 0 || matches!(node.kind(), "string" | "regex") {
            let source = self.source;
            let text = &source[node.start_byte()..node.end_byte()];
            let text = match (node.kind(), node.parent().map(|p| p.kind())) {
                ("string", _) => strip_line_continuations(text),
                ("escape_sequence", Some("template_string")) => strip_line_continuations(text),
                ("string_fragment", Some("template_string")) => escape_line_breaks(text),
                _ => collapse_line_breaks(text),
            };
            self.token(node.start_byte(), node.end_byte(), &text);
            return;
        }

        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        for child in children {
            self.visit(child);
        }

        if needs_semicolon(node) {
            self.out.push(';');
        }
    }

    fn token(&mut self, start: usize, end: usize, text: &str) {
        if let Some(last_end) = self.last_end {
            if self.pending_space || start > last_end {
                self.out.push(' ');
            }
        }
        self.out.push_str(text);
        self.last_end = Some(end);
        self.pending_space = false;
    }
}

/// Whether a statement relied on automatic semicolon insertion.
fn needs_semicolon(node: Node) -> bool {
    if !SEMICOLON_STATEMENTS.contains(&node.kind()) {
        return false;
    }
    let mut cursor = node.walk();
    let last = node
        .children(&mut cursor)
        .filter(|c| c.kind() != "comment")
        .last();
    if matches!(last, Some(c) if c.kind() == ";") {
        return false;
    }
    // Class fields keep their `;` as a sibling in the class body.
    !matches!(node.next_sibling(), Some(s) if s.kind() == ";")
}

fn strip_line_continuations(text: &str) -> Cow<'_, str> {
    if !text.contains(['\n', '\r']) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.replace("\\\r\n", "")
            .replace("\\\n", "")
            .replace("\\\r", ""),
    )
}

fn escape_line_breaks(text: &str) -> Cow<'_, str> {
    if !text.contains(['\n', '\r']) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.replace("\r\n", "\\n")
            .replace('\r', "\\n")
            .replace('\n', "\\n"),
    )
}

fn collapse_line_breaks(text: &str) -> Cow<'_, str> {
    if !text.contains(['\n', '\r']) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.replace("\r\n", " ").replace(['\r', '\n'], " "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::transform::scan;

    fn extract_first(path: &str, source: &str) -> Result<ExtractedFunction, TransformError> {
        let parsed = parse(path, source.to_string()).unwrap();
        let mut diagnostics = Vec::new();
        let matches = scan(&parsed, "use server", &mut diagnostics).unwrap();
        extract(&parsed, &matches[0])
    }

    #[test]
    fn test_slug_strips_path_characters() {
        assert_eq!(slug("static/js/index.js"), "staticjsindexjs");
        assert_eq!(slug("static/js/async/123.chunk.js"), "staticjsasync123chunkjs");
        assert_eq!(slug("C:\\build\\main.js"), "Cbuildmainjs");
    }

    #[test]
    fn test_slug_collapses_separators_and_spells_symbols() {
        assert_eq!(slug("_a__b_"), "a_b");
        assert_eq!(slug("my file.js"), "my_filejs");
        assert_eq!(slug("a&b$.js"), "aandbdollarjs");
        assert_eq!(slug("lib-react.js"), "lib-reactjs");
    }

    #[test]
    fn test_slug_transliterates_non_ascii() {
        assert_eq!(slug("static/js/página.js"), "staticjspaginajs");
        assert_eq!(slug("Ærø/straße.js"), "AErostrassejs");
        assert_eq!(slug("prices/€ and £.js"), "priceseuro_and_poundjs");
        assert_eq!(
            function_id("static/js/café.js", "getData"),
            "staticjscafejs__getData"
        );
        // No transliteration known: kept verbatim.
        assert_eq!(slug("static/js/日本.js"), "staticjs日本js");
    }

    #[test]
    fn test_function_id_is_deterministic() {
        let a = function_id("static/js/index.js", "getData");
        let b = function_id("static/js/index.js", "getData");
        assert_eq!(a, "staticjsindexjs__getData");
        assert_eq!(a, b);
    }

    #[test]
    fn test_extract_named_function() {
        let func = extract_first(
            "static/js/index.js",
            r#"
export async function getData(limit) {
  "use server";
  // fetch rows
  const rows = await db.query("select 1")
  return rows.slice(0, limit)
}
"#,
        )
        .unwrap();

        assert_eq!(func.name, "getData");
        assert_eq!(func.id, "staticjsindexjs__getData");
        assert_eq!(func.span.line, 2);
        assert!(!func.single_line);
        assert!(!func.source_text.contains('\n'));
        assert!(!func.source_text.contains("fetch rows"));
        assert!(func.source_text.starts_with("async function getData(limit) {"));
        assert!(func
            .source_text
            .contains(r#"const rows = await db.query("select 1");"#));
        assert!(func.source_text.contains("return rows.slice(0, limit);"));
    }

    #[test]
    fn test_flatten_keeps_template_line_breaks_as_escapes() {
        let func = extract_first(
            "a.js",
            "function sql() {\n  \"use server\";\n  return `select *\nfrom t`;\n}\n",
        )
        .unwrap();
        assert!(func.source_text.contains("`select *\\nfrom t`"));
        assert!(!func.source_text.contains('\n'));
    }

    #[test]
    fn test_flatten_single_line_function() {
        let func = extract_first("a.js", "function f(a,b){\"use server\";return a+b}").unwrap();
        assert!(func.single_line);
        assert_eq!(func.source_text, "function f(a,b){\"use server\";return a+b;}");
    }

    #[test]
    fn test_arrow_function_is_unnamed() {
        let err = extract_first("a.js", "const f = () => {\n  \"use server\";\n};\n").unwrap_err();
        match err {
            TransformError::UnnamedFunction { line, kind, .. } => {
                assert_eq!(line, 1);
                assert_eq!(kind, "arrow_function");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_method_is_unnamed() {
        let err = extract_first("a.js", "class A { load() { \"use server\"; } }\n").unwrap_err();
        assert!(matches!(err, TransformError::UnnamedFunction { .. }));
    }

    #[test]
    fn test_named_function_expression() {
        let func = extract_first(
            "a.js",
            "const load = function loadRows() { \"use server\"; return 1; };\n",
        )
        .unwrap();
        assert_eq!(func.name, "loadRows");
        assert_eq!(func.id, "ajs__loadRows");
    }
}
