//! Domain errors raised while loading plugins and packaging components.
//!
//! All errors use `thiserror`-derived enums with structured context so callers
//! can inspect the failure programmatically. I/O errors are wrapped in `Arc`
//! to satisfy the `result_large_err` Clippy lint.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Errors reported by an external build tool invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The tool process could not be started.
    #[error("failed to start '{program}': {source}")]
    Spawn {
        /// Executable that was invoked.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The tool exited with a non-zero status.
    #[error("'{program} {args}' exited with status {status}: {stderr}")]
    NonZeroExit {
        /// Executable that was invoked.
        program: String,
        /// Space-separated arguments, for diagnostics.
        args: String,
        /// Process exit status, or `-1` when terminated by a signal.
        status: i32,
        /// Trimmed standard error output.
        stderr: String,
    },

    /// The tool succeeded but its output could not be interpreted.
    #[error("'{program}' produced unexpected output: {message}")]
    InvalidOutput {
        /// Executable that was invoked.
        program: String,
        /// Description of what was expected.
        message: String,
    },

    /// Preparing the tool invocation failed on the filesystem.
    #[error("I/O error preparing tool invocation at '{path}': {source}")]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },
}

/// Errors arising from plugin loading and component packaging.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The plugin descriptor could not be read or parsed.
    #[error("failed to load plugin descriptor '{path}': {message}")]
    DescriptorLoad {
        /// Descriptor file path.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// The component manifest could not be backed up; nothing was mutated.
    #[error("failed to back up component manifest '{path}': {source}")]
    Setup {
        /// Manifest path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The component manifest could not be renamed. The original may be left
    /// partially rewritten; its backup remains beside it.
    #[error("failed to rewrite component manifest '{path}': {message}")]
    Manifest {
        /// Manifest path.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// The external build step failed.
    #[error("build failed for component '{dir}': {source}")]
    Build {
        /// Component source directory.
        dir: PathBuf,
        /// Underlying tool failure.
        #[source]
        source: ToolError,
    },

    /// The external packaging step failed.
    #[error("packaging failed for component '{dir}': {source}")]
    Package {
        /// Component source directory.
        dir: PathBuf,
        /// Underlying tool failure.
        #[source]
        source: ToolError,
    },

    /// The produced artefact could not be moved into the staging directory.
    #[error("failed to stage artefact '{artifact}' into '{staging}': {source}")]
    Relocation {
        /// Artefact produced by the packaging step.
        artifact: PathBuf,
        /// Destination staging directory.
        staging: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The original manifest could not be put back in place. The component
    /// directory is left altered.
    #[error("failed to restore component manifest '{path}': {source}")]
    Restore {
        /// Manifest path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The worker container image could not be built.
    #[error("image build failed for worker '{dir}' (tag '{tag}'): {source}")]
    Image {
        /// Worker source directory.
        dir: PathBuf,
        /// Image tag that was requested.
        tag: String,
        /// Underlying tool failure.
        #[source]
        source: ToolError,
    },
}

#[cfg(test)]
mod tests;
