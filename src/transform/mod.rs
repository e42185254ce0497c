//! The transform engine.
//!
//! One `Pass` takes a build's artifacts, rewrites every function marked
//! with the directive into a remote-call stub, and collects the original
//! implementations into an `IdentifierRegistry` rendered as the server SDK.
//!
//! ```text
//! Artifact ──parse──▶ ParsedSource ──scan──▶ DirectiveMatch
//!                                               │ extract
//!                                               ▼
//!  SDK ◀──render── IdentifierRegistry ◀──── ExtractedFunction ──▶ Edit ──splice──▶ Artifact
//! ```

mod extract;
mod registry;
mod rewrite;
mod scan;
mod types;

pub use extract::{extract, flatten, function_id, slug, ExtractedFunction};
pub use registry::{IdentifierRegistry, Registration};
pub use rewrite::{apply_edits, render_stub, stub_edit, Edit};
pub(crate) use rewrite::json_string;
pub use scan::{scan, DirectiveMatch};
pub use types::{
    Artifact, Diagnostic, DiagnosticKind, FunctionRecord, Severity, TransformError,
};

use std::cmp::Reverse;

use crate::config::Config;
use crate::parser::{self, Span};
use crate::sdk::SdkAssembler;

/// Everything one pass produces.
#[derive(Debug, Clone)]
pub struct PassOutput {
    /// All input artifacts, rewritten where they contained server functions.
    pub artifacts: Vec<Artifact>,
    /// Paths of the artifacts whose text changed.
    pub rewritten: Vec<String>,
    /// The rendered dispatch module, at the configured destination path.
    pub sdk: Artifact,
    /// The functions captured during the pass.
    pub registry: IdentifierRegistry,
    /// Soft diagnostics, in the order they were raised.
    pub diagnostics: Vec<Diagnostic>,
    /// Number of artifacts that were parsed and scanned.
    pub scanned: usize,
}

impl PassOutput {
    pub fn has_warnings(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity != Severity::Info)
    }
}

/// One build pass. Owns its registry; nothing survives into the next pass.
pub struct Pass<'c> {
    config: &'c Config,
    registry: IdentifierRegistry,
    diagnostics: Vec<Diagnostic>,
}

impl<'c> Pass<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self {
            config,
            registry: IdentifierRegistry::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Whether an artifact is subject to the transform.
    pub fn accepts(&self, path: &str) -> bool {
        path.ends_with(&self.config.asset_suffix) && !self.config.is_path_excluded(path)
    }

    /// Run the pass over a full set of artifacts.
    ///
    /// Artifacts are processed one at a time in the order given. The first
    /// fatal error aborts the pass and nothing is returned.
    pub fn run(mut self, mut artifacts: Vec<Artifact>) -> Result<PassOutput, TransformError> {
        let mut rewritten = Vec::new();
        let mut scanned = 0;

        for artifact in artifacts.iter_mut() {
            if !self.accepts(&artifact.path) {
                tracing::trace!(file = %artifact.path, "skipping artifact");
                continue;
            }
            scanned += 1;
            if self.process(artifact)? {
                rewritten.push(artifact.path.clone());
            }
        }

        let sdk_text = SdkAssembler::from_config(self.config).render(&self.registry);
        let sdk = Artifact::new(
            self.config.sdk_path.to_string_lossy().into_owned(),
            sdk_text,
        );

        tracing::info!(
            scanned,
            rewritten = rewritten.len(),
            functions = self.registry.len(),
            "server function pass complete"
        );

        Ok(PassOutput {
            artifacts,
            rewritten,
            sdk,
            registry: self.registry,
            diagnostics: self.diagnostics,
            scanned,
        })
    }

    /// Transform a single artifact in place. Returns whether it changed.
    pub fn process(&mut self, artifact: &mut Artifact) -> Result<bool, TransformError> {
        tracing::debug!(file = %artifact.path, size = artifact.size(), "scanning artifact");

        let parsed = parser::parse(&artifact.path, artifact.source.clone()).map_err(|source| {
            TransformError::Parse {
                path: artifact.path.clone(),
                source,
            }
        })?;

        let mut matches = scan(&parsed, &self.config.directive, &mut self.diagnostics)?;
        // Outer functions first: a directive in a parameter default precedes
        // the directive of the function that owns the parameter list.
        matches.sort_by_key(|m| (m.function.start_byte(), Reverse(m.function.end_byte())));

        let mut edits = Vec::new();
        let mut claimed: Vec<Span> = Vec::new();

        for directive in &matches {
            let outer = Span::from_node(directive.function);
            if let Some(owner) = claimed.iter().find(|span| span.contains(&outer)) {
                self.nested(&parsed.path, directive, owner);
                continue;
            }

            let function = extract(&parsed, directive)?;
            self.register(&parsed.path, &function)?;
            edits.push(stub_edit(&function, &self.config.endpoint));
            claimed.push(function.span);
        }

        if edits.is_empty() {
            return Ok(false);
        }

        let output = apply_edits(&parsed.source, edits);
        tracing::debug!(
            file = %artifact.path,
            before = artifact.size(),
            after = output.len(),
            "rewrote artifact"
        );
        artifact.replace_source(output);
        Ok(true)
    }

    fn register(&mut self, path: &str, function: &ExtractedFunction) -> Result<(), TransformError> {
        let record = FunctionRecord {
            id: function.id.clone(),
            name: function.name.clone(),
            source_text: function.source_text.clone(),
            artifact: path.to_string(),
            line: function.span.line,
        };

        match self.registry.register(record) {
            Registration::Inserted => {
                tracing::debug!(id = %function.id, file = %path, "registered server function");
                Ok(())
            }
            Registration::Duplicate { .. } if self.config.strict_duplicates => {
                Err(TransformError::DuplicateFunction {
                    path: path.to_string(),
                    line: function.span.line,
                    id: function.id.clone(),
                })
            }
            Registration::Duplicate {
                kept_artifact,
                kept_line,
            } => {
                tracing::warn!(id = %function.id, file = %path, "duplicate server function dropped");
                self.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::DuplicateFunction,
                    path,
                    function.span.line,
                    format!(
                        "server function {:?} already registered from {}:{}; this definition was dropped",
                        function.id, kept_artifact, kept_line
                    ),
                ));
                Ok(())
            }
        }
    }

    fn nested(&mut self, path: &str, directive: &DirectiveMatch, owner: &Span) {
        tracing::debug!(file = %path, line = directive.span.line, "nested directive kept in outer function");
        self.diagnostics.push(Diagnostic::new(
            DiagnosticKind::NestedDirective,
            path,
            directive.span.line,
            format!(
                "directive is inside the server function at line {}; it stays part of that function",
                owner.line
            ),
        ));
    }
}

/// Run one pass with a fresh registry.
pub fn run_pass(config: &Config, artifacts: Vec<Artifact>) -> Result<PassOutput, TransformError> {
    Pass::new(config).run(artifacts)
}
