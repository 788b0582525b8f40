//! Seams to the external package and container build tools.
//!
//! Packaging and cleanup only ever talk to the outside world through these
//! traits. The production implementations are
//! [`NpmTool`](crate::process::NpmTool) and
//! [`DockerBuilder`](crate::process::DockerBuilder); test code can implement
//! the traits to record invocations and inject failures without spawning
//! processes.
//!
//! The returned futures are `Send` so that callers may drive each invocation
//! on its own spawned task.

use std::future::Future;
use std::path::{Path, PathBuf};

use crate::error::ToolError;

/// External package build tool.
pub trait PackageTool: Send + Sync {
    /// Runs the component's build step inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns a [`ToolError`] if the tool cannot be started or fails.
    fn build(&self, dir: &Path) -> impl Future<Output = Result<(), ToolError>> + Send;

    /// Packs the component in `dir` into an installable artefact and returns
    /// the artefact's path.
    ///
    /// # Errors
    ///
    /// Returns a [`ToolError`] if the tool fails or its output does not name
    /// an artefact.
    fn pack(&self, dir: &Path) -> impl Future<Output = Result<PathBuf, ToolError>> + Send;

    /// Installs every artefact staged in `staging_dir` into the project at
    /// `project_dir`.
    ///
    /// # Errors
    ///
    /// Returns a [`ToolError`] if the staging directory cannot be listed or
    /// the install fails.
    fn install(
        &self,
        project_dir: &Path,
        staging_dir: &Path,
    ) -> impl Future<Output = Result<(), ToolError>> + Send;

    /// Removes the package called `name` from the project at `project_dir`.
    ///
    /// # Errors
    ///
    /// Returns a [`ToolError`] if the uninstall fails.
    fn uninstall(
        &self,
        project_dir: &Path,
        name: &str,
    ) -> impl Future<Output = Result<(), ToolError>> + Send;
}

/// External container image build tool.
pub trait ImageBuilder: Send + Sync {
    /// Builds the image described in `dir` and tags it as `tag`.
    ///
    /// # Errors
    ///
    /// Returns a [`ToolError`] if the tool cannot be started or exits with a
    /// non-zero status.
    fn build(&self, dir: &Path, tag: &str) -> impl Future<Output = Result<(), ToolError>> + Send;
}
