//! Shared configuration for the foundry experiment assembler.
//!
//! Configuration is layered by [`ortho_config`]: built-in defaults, an
//! optional configuration file, `FOUNDRY_*` environment variables, and
//! command-line flags, in increasing order of precedence. Every field is
//! optional on the wire; accessors on [`Config`] fall back to the values in
//! [`defaults`](crate::defaults) so callers never see an unset field.
//!
//! [`CoreLayout`] derives the locations of the shared registries and staging
//! directories from the core application directory.

mod defaults;
mod layout;
mod logging;

use std::path::Path;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_CORE_DIR, DEFAULT_DESCRIPTOR_FILE, DEFAULT_IMAGE_TOOL, DEFAULT_LOG_FILTER,
    DEFAULT_PACKAGE_TOOL, DEFAULT_PLUGINS_DIR, default_log_filter, default_log_format,
};
pub use layout::CoreLayout;
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved configuration for one assembler invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "FOUNDRY")]
pub struct Config {
    /// Directory whose immediate subdirectories are experiment plugins.
    pub plugins_dir: Option<Utf8PathBuf>,
    /// Root directory of the core application receiving the plugins.
    pub core_dir: Option<Utf8PathBuf>,
    /// Tracing filter expression, e.g. `info` or `foundry=debug`.
    pub log_filter: Option<String>,
    /// Log output format.
    pub log_format: Option<LogFormat>,
    /// File name of the descriptor inside each plugin directory.
    pub descriptor_file: Option<String>,
    /// Executable used to build, pack, install and uninstall packages.
    pub package_tool: Option<String>,
    /// Executable used to build worker container images.
    pub image_tool: Option<String>,
}

impl Config {
    /// Directory scanned for plugins.
    #[must_use]
    pub fn plugins_dir(&self) -> &Path {
        self.plugins_dir
            .as_deref()
            .map_or_else(|| Path::new(DEFAULT_PLUGINS_DIR), |dir| dir.as_std_path())
    }

    /// Root of the core application.
    #[must_use]
    pub fn core_dir(&self) -> &Path {
        self.core_dir
            .as_deref()
            .map_or_else(|| Path::new(DEFAULT_CORE_DIR), |dir| dir.as_std_path())
    }

    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format.unwrap_or_else(default_log_format)
    }

    /// Descriptor file name inside each plugin directory.
    #[must_use]
    pub fn descriptor_file(&self) -> &str {
        self.descriptor_file
            .as_deref()
            .unwrap_or(DEFAULT_DESCRIPTOR_FILE)
    }

    /// Package build tool executable.
    #[must_use]
    pub fn package_tool(&self) -> &str {
        self.package_tool.as_deref().unwrap_or(DEFAULT_PACKAGE_TOOL)
    }

    /// Container image build tool executable.
    #[must_use]
    pub fn image_tool(&self) -> &str {
        self.image_tool.as_deref().unwrap_or(DEFAULT_IMAGE_TOOL)
    }

    /// Layout of the configured core directory.
    #[must_use]
    pub fn layout(&self) -> CoreLayout {
        CoreLayout::new(self.core_dir())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn empty_config_falls_back_to_defaults() {
        let config = Config::default();
        assert_eq!(config.plugins_dir(), Path::new("experiments"));
        assert_eq!(config.core_dir(), Path::new("."));
        assert_eq!(config.log_filter(), "info");
        assert_eq!(config.log_format(), LogFormat::Json);
        assert_eq!(config.descriptor_file(), "experiment.json");
        assert_eq!(config.package_tool(), "npm");
        assert_eq!(config.image_tool(), "docker");
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = Config {
            plugins_dir: Some(Utf8PathBuf::from("/srv/plugins")),
            core_dir: Some(Utf8PathBuf::from("/srv/core")),
            package_tool: Some(String::from("pnpm")),
            ..Config::default()
        };
        assert_eq!(config.plugins_dir(), Path::new("/srv/plugins"));
        assert_eq!(config.package_tool(), "pnpm");
        assert_eq!(
            config.layout().service_registry(),
            Path::new("/srv/core/docker-compose.json")
        );
    }

    #[rstest]
    #[case::json("json", LogFormat::Json)]
    #[case::compact("compact", LogFormat::Compact)]
    #[case::mixed_case("Compact", LogFormat::Compact)]
    fn log_format_parses_case_insensitively(#[case] text: &str, #[case] expected: LogFormat) {
        let parsed: LogFormat = text.parse().expect("parse log format");
        assert_eq!(parsed, expected);
    }

    #[test]
    fn log_format_rejects_unknown_values() {
        let result = "yaml".parse::<LogFormat>();
        assert!(result.is_err());
    }
}
