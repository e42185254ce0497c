//! Client-side rewriting: stub rendering and span splicing.

use std::ops::Range;

use super::ExtractedFunction;

/// Replacement of one byte range of an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub range: Range<usize>,
    pub replacement: String,
}

/// Render the remote-call stub that replaces a server function.
///
/// `endpoint` and `id` are emitted as JSON string literals, so neither can
/// break out of the generated code.
pub fn render_stub(name: &str, id: &str, endpoint: &str) -> Vec<String> {
    let endpoint = json_string(endpoint);
    let id = json_string(id);
    vec![
        format!("async function {name}() {{"),
        format!("  return fetch({endpoint}, {{"),
        "    method: \"POST\",".to_string(),
        "    headers: { \"Content-Type\": \"application/json\" },".to_string(),
        format!("    body: JSON.stringify({{ id: {id}, args: [...arguments] }}),"),
        "  }).then((r) => r.json());".to_string(),
        "}".to_string(),
    ]
}

/// Build the edit replacing an extracted function with its stub.
///
/// Minified (single-line) functions get a single-line stub; otherwise the
/// stub keeps the indentation of the line the function started on.
pub fn stub_edit(function: &ExtractedFunction, endpoint: &str) -> Edit {
    let lines = render_stub(&function.name, &function.id, endpoint);
    let replacement = if function.single_line {
        lines
            .iter()
            .map(|line| line.trim())
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                if i == 0 {
                    line.clone()
                } else {
                    format!("{}{}", function.indent, line)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    Edit {
        range: function.span.range(),
        replacement,
    }
}

/// Apply non-overlapping edits to `source`.
///
/// Edits are spliced back to front so earlier offsets stay valid.
pub fn apply_edits(source: &str, mut edits: Vec<Edit>) -> String {
    if edits.is_empty() {
        return source.to_string();
    }
    edits.sort_by(|a, b| b.range.start.cmp(&a.range.start));

    let mut out = source.to_string();
    let mut floor = usize::MAX;
    for edit in edits {
        debug_assert!(edit.range.end <= floor, "overlapping edits");
        out.replace_range(edit.range.clone(), &edit.replacement);
        floor = edit.range.start;
    }
    out
}

/// A JavaScript string literal for `value`.
pub(crate) fn json_string(value: &str) -> String {
    // Serializing a &str to JSON cannot fail.
    serde_json::to_string(value).unwrap_or_else(|_| format!("{:?}", value))
}
