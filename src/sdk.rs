//! Server SDK generation.
//!
//! Renders the functions collected during a pass into one JavaScript module
//! whose factory returns `invokeApi(identifier, args = [])`. Implementations
//! live in a `Map`, so only registered ids resolve; anything else throws.

use crate::config::{Config, ModuleFormat};
use crate::transform::{json_string, IdentifierRegistry};

/// Banner at the top of every generated module.
pub const GENERATED_BANNER: &str = "// Generated by serverfn. Do not edit.";

/// Renders an `IdentifierRegistry` as a dispatch module.
#[derive(Debug, Clone)]
pub struct SdkAssembler {
    factory: String,
    format: ModuleFormat,
}

impl Default for SdkAssembler {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl SdkAssembler {
    pub fn new(factory: impl Into<String>, format: ModuleFormat) -> Self {
        Self {
            factory: factory.into(),
            format,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.sdk_factory.clone(), config.module_format)
    }

    /// Render the module. Output depends only on the registry contents.
    pub fn render(&self, registry: &IdentifierRegistry) -> String {
        let entries: String = registry
            .records()
            .map(|record| format!("    [{}, {}],\n", json_string(&record.id), record.source_text))
            .collect();

        let export = match self.format {
            ModuleFormat::Esm => "export ",
            ModuleFormat::CommonJs => "",
        };

        let mut out = format!("{GENERATED_BANNER}\n{export}function {}() {{\n", self.factory);
        out.push_str("  const availableMethods = new Map([\n");
        out.push_str(&entries);
        out.push_str("  ]);\n\n");
        out.push_str("  async function invokeApi(identifier, args = []) {\n");
        out.push_str("    const method = availableMethods.get(identifier);\n");
        out.push_str("    if (typeof method !== \"function\") {\n");
        out.push_str("      throw new Error(`Unknown server function: ${identifier}`);\n");
        out.push_str("    }\n");
        out.push_str("    return method(...args);\n");
        out.push_str("  }\n\n");
        out.push_str("  return invokeApi;\n");
        out.push_str("}\n");

        if self.format == ModuleFormat::CommonJs {
            out.push_str(&format!("\nmodule.exports = {{ {} }};\n", self.factory));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::transform::FunctionRecord;

    fn record(id: &str, source_text: &str) -> FunctionRecord {
        FunctionRecord {
            id: id.to_string(),
            name: id.rsplit("__").next().unwrap_or(id).to_string(),
            source_text: source_text.to_string(),
            artifact: "static/js/index.js".to_string(),
            line: 1,
        }
    }

    fn registry() -> IdentifierRegistry {
        let mut registry = IdentifierRegistry::new();
        registry.register(record(
            "staticjsindexjs__getData",
            "async function getData() { \"use server\"; return [1, 2]; }",
        ));
        registry.register(record(
            "staticjsindexjs__save",
            "function save(row) { \"use server\"; return db.insert(row); }",
        ));
        registry
    }

    #[test]
    fn test_render_esm_module() {
        let sdk = SdkAssembler::default().render(&registry());

        assert!(sdk.starts_with(GENERATED_BANNER));
        assert!(sdk.contains("export function createServerSdk() {"));
        assert!(sdk.contains(
            "[\"staticjsindexjs__getData\", async function getData() { \"use server\"; return [1, 2]; }],"
        ));
        assert!(sdk.contains("return method(...args);"));
        assert!(sdk.contains("throw new Error(`Unknown server function: ${identifier}`);"));
        assert!(sdk.contains("async function invokeApi(identifier, args = [])"));
        assert!(parse("server-sdk.js", sdk).is_ok());
    }

    #[test]
    fn test_render_commonjs_module() {
        let sdk = SdkAssembler::new("makeSdk", ModuleFormat::CommonJs).render(&registry());
        assert!(sdk.contains("\nfunction makeSdk() {"));
        assert!(!sdk.contains("export "));
        assert!(sdk.trim_end().ends_with("module.exports = { makeSdk };"));
        assert!(parse("server-sdk.js", sdk).is_ok());
    }

    #[test]
    fn test_render_is_deterministic() {
        let mut reversed = IdentifierRegistry::new();
        let forward = registry();
        let mut records: Vec<_> = forward.records().cloned().collect();
        records.reverse();
        for r in records {
            reversed.register(r);
        }
        let assembler = SdkAssembler::default();
        assert_eq!(assembler.render(&forward), assembler.render(&reversed));
    }

    #[test]
    fn test_render_empty_registry() {
        let sdk = SdkAssembler::default().render(&IdentifierRegistry::new());
        assert!(sdk.contains("new Map([\n  ]);"));
        assert!(parse("server-sdk.js", sdk).is_ok());
    }

    #[test]
    fn test_keys_with_dashes_are_quoted() {
        let mut registry = IdentifierRegistry::new();
        registry.register(record("lib-reactjs__load", "function load() { return 1; }"));
        let sdk = SdkAssembler::default().render(&registry);
        assert!(sdk.contains("[\"lib-reactjs__load\", function load() { return 1; }],"));
        assert!(parse("server-sdk.js", sdk).is_ok());
    }
}
