//! Configuration schema for serverfn.
//!
//! A config file tunes the directive, the wire endpoint and where the
//! generated SDK lands. Every field has a default, so an empty file (or no
//! file at all) reproduces the stock behavior.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;

lazy_static::lazy_static! {
    /// Matches a plain JavaScript identifier usable as the SDK factory name.
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap();
}

/// How the generated SDK exposes its factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModuleFormat {
    /// `export function createServerSdk()`
    #[default]
    Esm,
    /// `module.exports = { createServerSdk }`
    CommonJs,
}

impl std::fmt::Display for ModuleFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModuleFormat::Esm => write!(f, "esm"),
            ModuleFormat::CommonJs => write!(f, "commonjs"),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Directive literal marking server functions.
    #[serde(default = "default_directive")]
    pub directive: String,
    /// Path the generated stubs POST to.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Only artifacts whose path ends with this suffix are transformed.
    #[serde(default = "default_asset_suffix")]
    pub asset_suffix: String,
    /// Destination of the generated dispatch module.
    #[serde(default = "default_sdk_path")]
    pub sdk_path: PathBuf,
    /// Name of the exported dispatcher factory.
    #[serde(default = "default_sdk_factory")]
    pub sdk_factory: String,
    #[serde(default)]
    pub module_format: ModuleFormat,
    /// Glob patterns for artifact paths to leave alone (e.g., "**/vendor/**")
    #[serde(default)]
    pub excluded_paths: Vec<String>,
    /// Fail the pass on duplicate function ids instead of dropping the later one.
    #[serde(default)]
    pub strict_duplicates: bool,
}

fn default_directive() -> String {
    "use server".to_string()
}

fn default_endpoint() -> String {
    "/api/internal/bff".to_string()
}

fn default_asset_suffix() -> String {
    ".js".to_string()
}

fn default_sdk_path() -> PathBuf {
    PathBuf::from("src/__generated__/server-sdk.js")
}

fn default_sdk_factory() -> String {
    "createServerSdk".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            directive: default_directive(),
            endpoint: default_endpoint(),
            asset_suffix: default_asset_suffix(),
            sdk_path: default_sdk_path(),
            sdk_factory: default_sdk_factory(),
            module_format: ModuleFormat::default(),
            excluded_paths: Vec::new(),
            strict_duplicates: false,
        }
    }
}

impl Config {
    /// Parse a config from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse_str(&content)
    }

    /// Parse a config from YAML text. Empty text yields the defaults.
    pub fn parse_str(content: &str) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Check if an artifact path should be excluded based on excluded_paths patterns.
    /// Uses globset for matching, which supports `**` for recursive directory matching.
    pub fn is_path_excluded(&self, path: &str) -> bool {
        if self.excluded_paths.is_empty() {
            return false;
        }

        for pattern in &self.excluded_paths {
            if let Ok(glob) = globset::Glob::new(pattern) {
                let matcher = glob.compile_matcher();
                if matcher.is_match(path) {
                    return true;
                }
            }
        }
        false
    }
}

/// Validate a config for correctness.
pub fn validate(config: &Config) -> anyhow::Result<()> {
    if config.directive.trim().is_empty() {
        anyhow::bail!("directive must not be empty");
    }
    if config.directive.contains(['"', '\'', '\n', '\\']) {
        anyhow::bail!(
            "directive {:?} must not contain quotes, backslashes or line breaks",
            config.directive
        );
    }

    if !config.endpoint.starts_with('/') {
        anyhow::bail!("endpoint {:?} must be an absolute path", config.endpoint);
    }

    if config.asset_suffix.is_empty() {
        anyhow::bail!("asset_suffix must not be empty");
    }

    if !IDENTIFIER.is_match(&config.sdk_factory) {
        anyhow::bail!(
            "sdk_factory {:?} is not a valid JavaScript identifier",
            config.sdk_factory
        );
    }

    if config.sdk_path.as_os_str().is_empty() {
        anyhow::bail!("sdk_path must not be empty");
    }

    // Validate excluded_paths glob patterns compile
    for pattern in &config.excluded_paths {
        globset::Glob::new(pattern)
            .map_err(|e| anyhow::anyhow!("invalid excluded_paths pattern {:?}: {}", pattern, e))?;
    }

    Ok(())
}
