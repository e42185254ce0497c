//! Output formatting for pass results.
//!
//! Supports two output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption

use colored::*;
use serde::{Deserialize, Serialize};

use crate::transform::{Diagnostic, PassOutput, Severity};

/// JSON report structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub root: String,
    pub sdk_path: String,
    pub dry_run: bool,
    pub artifacts_scanned: usize,
    pub artifacts_rewritten: Vec<String>,
    pub functions: Vec<JsonFunction>,
    pub diagnostics: Vec<JsonDiagnostic>,
}

/// A captured server function.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonFunction {
    pub id: String,
    pub name: String,
    pub file: String,
    pub line: usize,
}

/// A soft diagnostic.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonDiagnostic {
    pub kind: String,
    pub severity: String,
    pub file: String,
    pub line: usize,
    pub message: String,
}

/// Build the JSON report for a pass.
pub fn build_json(root: &str, sdk_path: &str, output: &PassOutput, dry_run: bool) -> JsonReport {
    JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        root: root.to_string(),
        sdk_path: sdk_path.to_string(),
        dry_run,
        artifacts_scanned: output.scanned,
        artifacts_rewritten: output.rewritten.clone(),
        functions: output
            .registry
            .records()
            .map(|r| JsonFunction {
                id: r.id.clone(),
                name: r.name.clone(),
                file: r.artifact.clone(),
                line: r.line,
            })
            .collect(),
        diagnostics: output.diagnostics.iter().map(diagnostic_to_json).collect(),
    }
}

/// Write results in JSON format.
pub fn write_json(root: &str, sdk_path: &str, output: &PassOutput, dry_run: bool) -> anyhow::Result<()> {
    let report = build_json(root, sdk_path, output, dry_run);
    let json = serde_json::to_string_pretty(&report)?;
    println!("{}", json);
    Ok(())
}

fn diagnostic_to_json(d: &Diagnostic) -> JsonDiagnostic {
    JsonDiagnostic {
        kind: d.kind.as_str().to_string(),
        severity: d.severity.to_string(),
        file: d.file.clone(),
        line: d.line,
        message: d.message.clone(),
    }
}

/// Write results in pretty (human-readable) format.
pub fn write_pretty(root: &str, sdk_path: &str, output: &PassOutput, dry_run: bool) {
    println!("{} {}", "serverfn".bold(), root);
    println!();

    if output.registry.is_empty() {
        println!("  {}", "no server functions found".dimmed());
    } else {
        println!("  {}", "Server functions".bold());
        for record in output.registry.records() {
            println!(
                "    {} {}  {}",
                "→".cyan(),
                record.id,
                format!("{}:{}", record.artifact, record.line).dimmed()
            );
        }
    }

    if !output.diagnostics.is_empty() {
        println!();
        println!("  {}", "Diagnostics".bold());
        for d in &output.diagnostics {
            let label = match d.severity {
                Severity::Error => "error".red().bold(),
                Severity::Warning => "warning".yellow().bold(),
                Severity::Info => "info".blue(),
            };
            println!(
                "    {} {}:{} {} {}",
                label,
                d.file,
                d.line,
                d.message,
                format!("[{}]", d.kind).dimmed()
            );
        }
    }

    println!();
    println!(
        "  {} artifacts scanned, {} rewritten, {} functions",
        output.scanned,
        output.rewritten.len(),
        output.registry.len()
    );
    if dry_run {
        println!("  {} nothing written", "dry run:".yellow());
    } else {
        println!("  sdk written to {}", sdk_path.green());
    }
}
