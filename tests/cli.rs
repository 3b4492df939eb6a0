//! CLI Integration Tests
//!
//! Drives the modlink binary against the bundled notify plugin and checks
//! the end-to-end contract: two output lines, param first, then the
//! injected host global.
//!
//! The plugin cdylib is only present when the workspace has been built
//! (`cargo build --workspace`); tests that need the artifact skip
//! themselves when it is missing.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn modlink_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_modlink"))
}

/// Locate the built notify plugin next to the binary, if any.
fn notify_artifact() -> Option<PathBuf> {
    let dir = modlink_binary().parent()?.to_path_buf();
    ["libmodlink_notify.so", "libmodlink_notify.dylib", "modlink_notify.dll"]
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Stage a plugin directory containing the artifact and a manifest.
fn stage_plugin(test_name: &str, manifest_json: &str) -> Option<(PathBuf, PathBuf)> {
    let artifact = notify_artifact()?;
    let dir = std::env::temp_dir().join(format!("modlink_{}_{}", test_name, std::process::id()));
    fs::create_dir_all(&dir).ok()?;

    let staged = dir.join(artifact.file_name()?);
    fs::copy(&artifact, &staged).ok()?;

    let manifest = dir.join("notify.modlink.json");
    fs::write(&manifest, manifest_json).ok()?;

    Some((staged, manifest))
}

fn run_modlink(cwd: &Path, args: &[&str]) -> std::process::Output {
    Command::new(modlink_binary())
        .args(args)
        .current_dir(cwd)
        .output()
        .expect("failed to run modlink")
}

const NOTIFY_MANIFEST: &str = r#"{
  "name": "notify",
  "version": "0.1.0",
  "abi_version": 1,
  "exports": [
    { "symbol": "modlink_abi_version", "signature": "u32 modlink_abi_version()" },
    { "symbol": "notify", "signature": "void notify(i64, ctx)" }
  ]
}"#;

#[test]
fn run_prints_param_then_global() {
    let Some((artifact, manifest)) = stage_plugin("run", NOTIFY_MANIFEST) else {
        eprintln!("notify plugin not built; skipping");
        return;
    };

    let cwd = artifact.parent().unwrap().to_path_buf();
    let args = [
        "run",
        artifact.to_str().unwrap(),
        "--value",
        "42",
        "--global",
        "100",
        "--manifest",
        manifest.to_str().unwrap(),
    ];

    let output = run_modlink(&cwd, &args);
    assert!(
        output.status.success(),
        "run failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "param: 42\nglobal: 100\n"
    );

    // Same argument, unchanged global: output must be identical
    let again = run_modlink(&cwd, &args);
    assert_eq!(output.stdout, again.stdout);

    fs::remove_dir_all(&cwd).ok();
}

#[test]
fn run_rejects_mismatched_signature() {
    let bad_manifest = r#"{
  "name": "notify",
  "version": "0.1.0",
  "abi_version": 1,
  "exports": [
    { "symbol": "notify", "signature": "i64 notify(i64)" }
  ]
}"#;
    let Some((artifact, manifest)) = stage_plugin("badsig", bad_manifest) else {
        eprintln!("notify plugin not built; skipping");
        return;
    };

    let cwd = artifact.parent().unwrap().to_path_buf();
    let output = run_modlink(
        &cwd,
        &[
            "run",
            artifact.to_str().unwrap(),
            "--manifest",
            manifest.to_str().unwrap(),
        ],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("host expects"),
        "unexpected stderr: {}",
        stderr
    );

    fs::remove_dir_all(&cwd).ok();
}

#[test]
fn run_rejects_undeclared_symbol() {
    let bad_manifest = r#"{
  "name": "notify",
  "version": "0.1.0",
  "abi_version": 1,
  "exports": [
    { "symbol": "notify", "signature": "void notify(i64, ctx)" },
    { "symbol": "libfun", "signature": "void libfun(i64)" }
  ]
}"#;
    let Some((artifact, manifest)) = stage_plugin("missym", bad_manifest) else {
        eprintln!("notify plugin not built; skipping");
        return;
    };

    let cwd = artifact.parent().unwrap().to_path_buf();
    let output = run_modlink(
        &cwd,
        &[
            "run",
            artifact.to_str().unwrap(),
            "--manifest",
            manifest.to_str().unwrap(),
        ],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("not found"),
        "unexpected stderr: {}",
        stderr
    );

    fs::remove_dir_all(&cwd).ok();
}

#[test]
fn run_fails_on_missing_plugin() {
    let cwd = std::env::temp_dir();
    let output = run_modlink(&cwd, &["run", "modlink_no_such_plugin"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("not found"),
        "unexpected stderr: {}",
        stderr
    );
}

#[test]
fn inspect_reports_verified_exports() {
    let Some(artifact) = notify_artifact() else {
        eprintln!("notify plugin not built; skipping");
        return;
    };
    let dir = std::env::temp_dir().join(format!("modlink_inspect_{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let staged = dir.join(artifact.file_name().unwrap());
    fs::copy(&artifact, &staged).unwrap();
    // Discovered as a sibling manifest, so no --manifest flag is needed
    fs::write(dir.join("modlink.json"), NOTIFY_MANIFEST).unwrap();

    let output = run_modlink(&dir, &["inspect", staged.to_str().unwrap()]);
    assert!(
        output.status.success(),
        "inspect failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("abi version: 1"), "unexpected stdout: {}", stdout);
    assert!(
        stdout.contains("[verified] void notify(i64, ctx)"),
        "unexpected stdout: {}",
        stdout
    );

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn list_reports_staged_manifest() {
    let dir = std::env::temp_dir().join(format!("modlink_list_{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("notify.modlink.json"), NOTIFY_MANIFEST).unwrap();

    let output = run_modlink(&dir, &["list", "--search-path", dir.to_str().unwrap()]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("notify 0.1.0"), "unexpected stdout: {}", stdout);

    fs::remove_dir_all(&dir).ok();
}
