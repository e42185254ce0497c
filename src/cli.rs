//! Command-line interface for serverfn.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::{self, Config};
use crate::emit;
use crate::report;
use crate::transform::{self, Artifact};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Default config file names to search for.
const DEFAULT_CONFIG_NAMES: &[&str] = &["serverfn.yaml", ".serverfn.yaml"];

/// Split "use server" functions out of client build output.
///
/// Every function whose body starts with the "use server" directive is
/// replaced by a stub that forwards the call over HTTP, and the original
/// implementations are collected into a generated server dispatch module.
#[derive(Parser)]
#[command(name = "serverfn")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rewrite a build output directory and generate the server SDK
    #[command(visible_alias = "build")]
    Transform(TransformArgs),
    /// Create a serverfn config file from a template
    Init(InitArgs),
}

/// Arguments for the transform command.
#[derive(Parser)]
pub struct TransformArgs {
    /// Build output directory
    pub path: PathBuf,

    /// Path to config YAML file (default: auto-discover, else built-in defaults)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Write the SDK here instead of the configured sdk_path
    #[arg(long)]
    pub sdk_out: Option<PathBuf>,

    /// Run the pass and report, but write nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Exit non-zero when the pass produced warnings
    #[arg(long)]
    pub deny_warnings: bool,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "serverfn.yaml")]
    pub output: PathBuf,

    /// Template to use
    #[arg(short, long, default_value = "esm")]
    pub template: String,

    /// List available templates
    #[arg(short, long)]
    pub list: bool,
}

/// A config file `init` can write.
struct Template {
    name: &'static str,
    description: &'static str,
    content: &'static str,
}

static TEMPLATES: &[Template] = &[
    Template {
        name: "esm",
        description: "ES module SDK at src/__generated__/server-sdk.js",
        content: include_str!("templates/esm.yaml"),
    },
    Template {
        name: "commonjs",
        description: "CommonJS SDK for require()-based servers, vendor chunks excluded",
        content: include_str!("templates/commonjs.yaml"),
    },
];

impl Template {
    fn find(name: &str) -> anyhow::Result<&'static Template> {
        TEMPLATES.iter().find(|t| t.name == name).ok_or_else(|| {
            let known: Vec<&str> = TEMPLATES.iter().map(|t| t.name).collect();
            anyhow::anyhow!("unknown template {:?} (available: {})", name, known.join(", "))
        })
    }

    /// Write the template to `dest`. An existing file is never replaced.
    fn write(&self, dest: &Path) -> anyhow::Result<()> {
        if dest.exists() {
            anyhow::bail!("{} already exists; pass --output to pick another path", dest.display());
        }
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        std::fs::write(dest, self.content)
            .with_context(|| format!("cannot write {}", dest.display()))
    }
}

/// Install the tracing subscriber. `RUST_LOG` wins over `--verbose`.
pub fn init_logging(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let default_filter = if verbose { "serverfn=debug" } else { "serverfn=warn" };
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Discover a config file in the current directory.
fn discover_config() -> Option<PathBuf> {
    DEFAULT_CONFIG_NAMES
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

/// Load the config named on the command line, a discovered one, or the defaults.
fn load_config(explicit: Option<&Path>) -> anyhow::Result<(Config, Option<PathBuf>)> {
    let path = match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => discover_config(),
    };
    let config = match &path {
        Some(p) => Config::parse_file(p)
            .map_err(|e| anyhow::anyhow!("error parsing config {}: {}", p.display(), e))?,
        None => Config::default(),
    };
    config::validate(&config).map_err(|e| anyhow::anyhow!("invalid config: {}", e))?;
    Ok((config, path))
}

/// Artifact path relative to the build root, always with `/` separators.
fn artifact_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Load every artifact under `root` that the pass would transform.
pub fn collect_artifacts(root: &Path, config: &Config) -> anyhow::Result<Vec<Artifact>> {
    let mut artifacts = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = artifact_path(root, entry.path());
        if !path.ends_with(&config.asset_suffix) {
            continue;
        }
        let source = std::fs::read_to_string(entry.path())
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", entry.path().display(), e))?;
        artifacts.push(Artifact::new(path, source));
    }

    Ok(artifacts)
}

/// Run the transform command.
pub fn run_transform(args: &TransformArgs) -> anyhow::Result<i32> {
    // Validate format
    if args.format != "pretty" && args.format != "json" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty' or 'json'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    let (config, config_path) = match load_config(args.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };
    match &config_path {
        Some(p) => tracing::debug!(config = %p.display(), "loaded config"),
        None => tracing::debug!("no config file found, using defaults"),
    }

    // Resolve path
    let root = match args.path.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", args.path, e);
            return Ok(EXIT_ERROR);
        }
    };
    if !root.is_dir() {
        eprintln!("Error: {} is not a directory", root.display());
        return Ok(EXIT_ERROR);
    }

    let artifacts = collect_artifacts(&root, &config)?;
    if artifacts.is_empty() {
        eprintln!(
            "Warning: no {} artifacts under {}",
            config.asset_suffix,
            root.display()
        );
    }

    let output = match transform::run_pass(&config, artifacts) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let sdk_dest = args.sdk_out.clone().unwrap_or_else(|| config.sdk_path.clone());
    if !args.dry_run {
        emit::emit(&output, &root, &sdk_dest)?;
    }

    let root_str = args.path.to_string_lossy().to_string();
    let sdk_str = sdk_dest.to_string_lossy().to_string();
    match args.format.as_str() {
        "json" => report::write_json(&root_str, &sdk_str, &output, args.dry_run)?,
        _ => report::write_pretty(&root_str, &sdk_str, &output, args.dry_run),
    }

    if args.deny_warnings && output.has_warnings() {
        Ok(EXIT_FAILED)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    if args.list {
        println!("Available templates:");
        for template in TEMPLATES {
            println!("  {:<12} {}", template.name, template.description);
        }
        return Ok(EXIT_SUCCESS);
    }

    let template = Template::find(&args.template)?;
    template.write(&args.output)?;
    tracing::debug!(template = template.name, path = %args.output.display(), "wrote config");

    println!("Created {} ({} template)", args.output.display(), template.name);
    println!("Run: serverfn transform <build dir> --config {}", args.output.display());
    Ok(EXIT_SUCCESS)
}
