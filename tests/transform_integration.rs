//! Integration tests for the full transform pipeline.
//!
//! The fixture build under testdata/build is copied into a temp directory,
//! transformed through the CLI entry point, and the files left on disk are
//! checked.

use std::fs;
use std::path::{Path, PathBuf};

use serverfn::cli::{self, TransformArgs, EXIT_ERROR, EXIT_FAILED, EXIT_SUCCESS};
use serverfn::config::Config;
use serverfn::transform::{run_pass, DiagnosticKind};
use serverfn::{parser, Dispatcher};
use tempfile::TempDir;
use walkdir::WalkDir;

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

/// Copy the fixture build into a fresh temp directory.
fn fixture_build() -> (TempDir, PathBuf) {
    let temp = TempDir::new().expect("should create temp dir");
    let source = testdata_path().join("build");
    let dest = temp.path().join("build");

    for entry in WalkDir::new(&source) {
        let entry = entry.expect("should walk fixture");
        let rel = entry.path().strip_prefix(&source).unwrap();
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).unwrap();
        } else {
            fs::copy(entry.path(), &target).unwrap();
        }
    }

    (temp, dest)
}

fn transform_args(root: &Path, sdk_out: &Path) -> TransformArgs {
    TransformArgs {
        path: root.to_path_buf(),
        config: Some(root.join("serverfn.yaml")),
        format: "json".to_string(),
        sdk_out: Some(sdk_out.to_path_buf()),
        dry_run: false,
        deny_warnings: false,
    }
}

fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path.as_ref())
        .unwrap_or_else(|e| panic!("should read {}: {}", path.as_ref().display(), e))
}

#[test]
fn test_transform_rewrites_fixture_build() {
    let (temp, root) = fixture_build();
    let sdk = temp.path().join("server/src/__generated__/server-sdk.js");

    let code = cli::run_transform(&transform_args(&root, &sdk)).unwrap();
    assert_eq!(code, EXIT_SUCCESS);

    let index = read(root.join("static/js/index.js"));
    assert!(index.contains("id: \"staticjsindexjs__getData\""));
    assert!(index.contains("id: \"staticjsindexjs__saveItem\""));
    assert!(index.contains("export async function getData() {"));
    assert!(index.contains("export async function saveItem() {"));
    assert!(!index.contains("db.query"), "server code must not stay in the client bundle");
    assert!(!index.contains("db.insert"));
    assert!(index.contains("return getData(10).then(render);"));
    assert!(index.contains("mount(App);"));
    assert!(
        parser::parse("static/js/index.js", index.clone()).is_ok(),
        "rewritten artifact should still parse"
    );

    let rendered = read(&sdk);
    assert!(rendered.starts_with("// Generated by serverfn."));
    assert!(rendered.contains("export function createServerSdk() {"));
    assert!(rendered.contains("[\"staticjsindexjs__getData\", async function getData(limit) {"));
    assert!(rendered.contains("[\"staticjsindexjs__saveItem\", function saveItem(item) {"));
    assert!(rendered.contains("`select *\\nfrom items`"));
    assert!(!rendered.contains("validated on the server"));
    assert!(rendered.contains("async function invokeApi(identifier, args = [])"));
}

#[test]
fn test_transform_leaves_other_artifacts_byte_identical() {
    let (temp, root) = fixture_build();
    let sdk = temp.path().join("server-sdk.js");

    cli::run_transform(&transform_args(&root, &sdk)).unwrap();

    let fixtures = testdata_path().join("build");
    for rel in [
        "static/js/plain.js",
        "static/js/vendor.chunk.js",
        "static/css/main.css",
    ] {
        assert_eq!(
            fs::read(root.join(rel)).unwrap(),
            fs::read(fixtures.join(rel)).unwrap(),
            "{} should be untouched",
            rel
        );
    }
    assert!(!read(&sdk).contains("vendorHelper"));
}

#[test]
fn test_transform_twice_changes_nothing_further() {
    let (temp, root) = fixture_build();
    let sdk = temp.path().join("server-sdk.js");
    let args = transform_args(&root, &sdk);

    cli::run_transform(&args).unwrap();
    let first = read(root.join("static/js/index.js"));

    cli::run_transform(&args).unwrap();
    assert_eq!(read(root.join("static/js/index.js")), first);
}

#[test]
fn test_dry_run_writes_nothing() {
    let (temp, root) = fixture_build();
    let sdk = temp.path().join("server-sdk.js");
    let args = TransformArgs {
        dry_run: true,
        ..transform_args(&root, &sdk)
    };

    assert_eq!(cli::run_transform(&args).unwrap(), EXIT_SUCCESS);
    assert!(!sdk.exists());
    assert_eq!(
        read(root.join("static/js/index.js")),
        read(testdata_path().join("build/static/js/index.js"))
    );
}

#[test]
fn test_deny_warnings_fails_on_duplicates() {
    let (temp, root) = fixture_build();
    fs::write(
        root.join("static/js/dup.js"),
        "function dup() { 'use server'; return 1; }\nfunction dup() { 'use server'; return 2; }\n",
    )
    .unwrap();
    let args = TransformArgs {
        deny_warnings: true,
        ..transform_args(&root, &temp.path().join("server-sdk.js"))
    };

    assert_eq!(cli::run_transform(&args).unwrap(), EXIT_FAILED);
}

#[test]
fn test_syntax_error_aborts_with_error_code() {
    let (temp, root) = fixture_build();
    fs::write(root.join("static/js/broken.js"), "function (( {").unwrap();
    let sdk = temp.path().join("server-sdk.js");

    assert_eq!(
        cli::run_transform(&transform_args(&root, &sdk)).unwrap(),
        EXIT_ERROR
    );
    assert!(!sdk.exists(), "a failed pass must not emit an sdk");
}

#[test]
fn test_invalid_format_is_rejected() {
    let (temp, root) = fixture_build();
    let args = TransformArgs {
        format: "sarif".to_string(),
        ..transform_args(&root, &temp.path().join("server-sdk.js"))
    };
    assert_eq!(cli::run_transform(&args).unwrap(), EXIT_ERROR);
}

#[test]
fn test_registered_ids_line_up_with_dispatcher() {
    let (_temp, root) = fixture_build();
    let config = Config::parse_file(root.join("serverfn.yaml")).unwrap();
    let artifacts = cli::collect_artifacts(&root, &config).unwrap();
    let output = run_pass(&config, artifacts).unwrap();

    assert!(output
        .diagnostics
        .iter()
        .all(|d| d.kind != DiagnosticKind::DuplicateFunction));

    let mut dispatcher = Dispatcher::new();
    dispatcher.register("staticjsindexjs__getData", |_| Ok(serde_json::json!([])));
    assert_eq!(
        dispatcher.missing(&output.registry),
        vec!["staticjsindexjs__saveItem"]
    );
}
