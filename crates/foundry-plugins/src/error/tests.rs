//! Unit tests for plugin error types.

use std::error::Error as _;
use std::path::PathBuf;
use std::sync::Arc;

use rstest::rstest;

use super::*;

fn non_zero_exit() -> ToolError {
    ToolError::NonZeroExit {
        program: "npm".into(),
        args: "run build --if-present".into(),
        status: 2,
        stderr: "tsc: cannot find module".into(),
    }
}

#[test]
fn non_zero_exit_message_includes_command_and_stderr() {
    let message = non_zero_exit().to_string();
    assert!(message.contains("npm run build"), "command missing: {message}");
    assert!(message.contains("status 2"), "status missing: {message}");
    assert!(
        message.contains("cannot find module"),
        "stderr missing: {message}"
    );
}

#[test]
fn spawn_error_exposes_io_source() {
    let error = ToolError::Spawn {
        program: "docker".into(),
        source: Arc::new(std::io::Error::from(std::io::ErrorKind::NotFound)),
    };
    assert!(error.to_string().contains("docker"));
    assert!(error.source().is_some());
}

#[rstest]
#[case::build(
    PluginError::Build { dir: PathBuf::from("stroop/web"), source: non_zero_exit() },
    "build failed"
)]
#[case::package(
    PluginError::Package { dir: PathBuf::from("stroop/web"), source: non_zero_exit() },
    "packaging failed"
)]
#[case::image(
    PluginError::Image {
        dir: PathBuf::from("stroop/worker"),
        tag: "foundry-wkr-1".into(),
        source: non_zero_exit(),
    },
    "foundry-wkr-1"
)]
fn tool_failures_name_the_stage(#[case] error: PluginError, #[case] expected: &str) {
    let message = error.to_string();
    assert!(message.contains(expected), "expected '{expected}' in: {message}");
    assert!(
        error.source().is_some(),
        "tool failure should chain its source"
    );
}

#[rstest]
#[case::setup(PluginError::Setup {
    path: PathBuf::from("stroop/api/package.json"),
    source: Arc::new(std::io::Error::from(std::io::ErrorKind::PermissionDenied)),
})]
#[case::restore(PluginError::Restore {
    path: PathBuf::from("stroop/api/package.json"),
    source: Arc::new(std::io::Error::from(std::io::ErrorKind::NotFound)),
})]
#[case::manifest(PluginError::Manifest {
    path: PathBuf::from("stroop/api/package.json"),
    message: "expected a JSON object".into(),
})]
fn manifest_failures_include_the_path(#[case] error: PluginError) {
    let message = error.to_string();
    assert!(
        message.contains("stroop/api/package.json"),
        "path missing: {message}"
    );
}

#[test]
fn relocation_names_artifact_and_staging_dir() {
    let error = PluginError::Relocation {
        artifact: PathBuf::from("stroop/api/foundry-ctl-1-1.0.0.tgz"),
        staging: PathBuf::from("core/api/experiment-packages"),
        source: Arc::new(std::io::Error::from(std::io::ErrorKind::StorageFull)),
    };
    let message = error.to_string();
    assert!(message.contains("foundry-ctl-1-1.0.0.tgz"));
    assert!(message.contains("experiment-packages"));
}
