//! Command-line layering for the assembler configuration.

use std::ffi::OsString;
use std::path::Path;

use foundry_config::{Config, LogFormat};
use ortho_config::OrthoConfig;

fn args(extra: &[&str]) -> Vec<OsString> {
    std::iter::once("foundry")
        .chain(extra.iter().copied())
        .map(OsString::from)
        .collect()
}

#[test]
fn flags_override_defaults() {
    let config = Config::load_from_iter(args(&[
        "--plugins-dir",
        "/srv/experiments",
        "--core-dir",
        "/srv/core",
        "--package-tool",
        "pnpm",
        "--log-format",
        "compact",
    ]))
    .expect("configuration loads");

    assert_eq!(config.plugins_dir(), Path::new("/srv/experiments"));
    assert_eq!(config.core_dir(), Path::new("/srv/core"));
    assert_eq!(config.package_tool(), "pnpm");
    assert_eq!(config.log_format(), LogFormat::Compact);
    assert_eq!(config.image_tool(), "docker");
}

#[test]
fn unknown_log_format_is_rejected() {
    let result = Config::load_from_iter(args(&["--log-format", "yaml"]));
    assert!(result.is_err(), "expected rejection of unknown log format");
}
