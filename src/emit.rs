//! Writing pass results back to disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::transform::{Artifact, PassOutput, TransformError};

/// Where emitted files went.
#[derive(Debug, Clone, Default)]
pub struct EmitSummary {
    pub artifacts_written: Vec<PathBuf>,
    pub sdk_path: Option<PathBuf>,
}

/// Write the rewritten artifacts under `root` and the SDK to `sdk_dest`.
///
/// Only artifacts the pass actually changed are written. The SDK is always
/// written, replacing whatever an earlier pass left there.
pub fn emit(
    output: &PassOutput,
    root: &Path,
    sdk_dest: &Path,
) -> Result<EmitSummary, TransformError> {
    let mut summary = EmitSummary::default();

    for artifact in output
        .artifacts
        .iter()
        .filter(|a| output.rewritten.contains(&a.path))
    {
        let dest = root.join(&artifact.path);
        write_file(&dest, &artifact.source)?;
        tracing::debug!(path = %dest.display(), size = artifact.size(), "wrote artifact");
        summary.artifacts_written.push(dest);
    }

    write_sdk(&output.sdk, sdk_dest)?;
    summary.sdk_path = Some(sdk_dest.to_path_buf());

    Ok(summary)
}

/// Write the rendered SDK, creating every missing parent directory.
pub fn write_sdk(sdk: &Artifact, dest: &Path) -> Result<(), TransformError> {
    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|source| TransformError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }
    }
    write_file(dest, &sdk.source)?;
    tracing::info!(path = %dest.display(), size = sdk.size(), "wrote server sdk");
    Ok(())
}

fn write_file(dest: &Path, contents: &str) -> Result<(), TransformError> {
    fs::write(dest, contents).map_err(|source| TransformError::Io {
        path: dest.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::transform::run_pass;
    use tempfile::TempDir;

    #[test]
    fn test_write_sdk_creates_nested_directories() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("src").join("__generated__").join("server-sdk.js");
        let sdk = Artifact::new("server-sdk.js", "export function createServerSdk() {}\n");

        write_sdk(&sdk, &dest).unwrap();
        assert_eq!(
            fs::read_to_string(&dest).unwrap(),
            "export function createServerSdk() {}\n"
        );
    }

    #[test]
    fn test_write_sdk_overwrites_previous_pass() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("server-sdk.js");
        fs::write(&dest, "old contents").unwrap();

        write_sdk(&Artifact::new("server-sdk.js", "new contents"), &dest).unwrap();
        assert_eq!(fs::read_to_string(&dest).unwrap(), "new contents");
    }

    #[test]
    fn test_emit_writes_only_rewritten_artifacts() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("dist");
        fs::create_dir_all(root.join("static/js")).unwrap();

        let config = Config::default();
        let output = run_pass(
            &config,
            vec![
                Artifact::new("static/js/index.js", "function f() { 'use server'; return 1; }\n"),
                Artifact::new("static/js/plain.js", "console.log(1);\n"),
            ],
        )
        .unwrap();

        let sdk_dest = temp.path().join("gen/server-sdk.js");
        let summary = emit(&output, &root, &sdk_dest).unwrap();

        assert_eq!(summary.artifacts_written, vec![root.join("static/js/index.js")]);
        assert!(!root.join("static/js/plain.js").exists());
        let written = fs::read_to_string(root.join("static/js/index.js")).unwrap();
        assert!(written.contains("staticjsindexjs__f"));
        assert!(fs::read_to_string(&sdk_dest).unwrap().contains("function f()"));
    }
}
