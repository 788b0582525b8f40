//! Default values applied when a configuration layer leaves a field unset.

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default directory scanned for experiment plugins.
pub const DEFAULT_PLUGINS_DIR: &str = "experiments";

/// Default root of the core application.
pub const DEFAULT_CORE_DIR: &str = ".";

/// Default descriptor file name expected inside every plugin directory.
pub const DEFAULT_DESCRIPTOR_FILE: &str = "experiment.json";

/// Default package build tool executable.
pub const DEFAULT_PACKAGE_TOOL: &str = "npm";

/// Default container image build tool executable.
pub const DEFAULT_IMAGE_TOOL: &str = "docker";

/// Default log filter expression used by the binary.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default logging format for the binary.
#[must_use]
pub const fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}
