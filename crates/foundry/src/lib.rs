//! Assembly of experiment plugins into a core application.
//!
//! A run takes a directory of experiment plugins and links each one into a
//! core application made of an API server, a frontend, and a compose-style
//! service registry. Every plugin contributes controllers, a web page, and a
//! worker image; each is packaged under a fresh unique name, staged, and
//! recorded in the shared registries.
//!
//! The [`Orchestrator`] drives a run:
//!
//! 1. [`CleanupResetter`] strips everything linked by the previous run.
//! 2. The plugin directories are discovered and their descriptors loaded.
//! 3. One [`ExperimentPreparer`] per plugin packages its components
//!    concurrently. Both the per-plugin and the run-wide fan-in go through a
//!    [`FanInBarrier`], which fires exactly once with either success or the
//!    first failure.
//! 4. [`SharedArtifactWriter`] commits the aggregated [`RunResult`].
//! 5. The API server and the frontend install the staged packages.
//!
//! [`prepare`] wires the production tools (`npm` and `docker` by default)
//! and is what the `foundry` binary calls.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use foundry_config::Config;
//!
//! # async fn demo() -> Result<(), foundry::AssemblyError> {
//! let config = Config::default();
//! let summary = foundry::prepare(Path::new("experiments"), Path::new("core"), &config).await?;
//! println!("linked {} experiments", summary.plugins);
//! # Ok(())
//! # }
//! ```

pub mod barrier;
pub mod cleanup;
mod cli;
pub mod error;
pub mod orchestrator;
pub mod preparer;
pub mod registry;
pub mod result;
pub mod telemetry;
pub mod writer;

#[cfg(test)]
mod tests;

use std::path::Path;
use std::sync::Arc;

use foundry_config::{Config, CoreLayout};
use foundry_plugins::process::{DockerBuilder, NpmTool};

pub use self::barrier::{BarrierSignal, FanInBarrier, Outcome};
pub use self::cleanup::{CleanupReport, CleanupResetter};
pub use self::cli::run;
pub use self::error::{AssemblyError, RebuildTarget};
pub use self::orchestrator::{Orchestrator, RunSummary};
pub use self::preparer::ExperimentPreparer;
pub use self::registry::RegistryError;
pub use self::result::{PreparedExperiment, RunResult};
pub use self::telemetry::{TelemetryError, TelemetryHandle};
pub use self::writer::{CommitSummary, SharedArtifactWriter};

/// Links every plugin under `plugins_root` into the core application at
/// `core_dir`, using the package and image tools named by `config`.
///
/// # Errors
///
/// Returns the [`AssemblyError`] that aborted the run.
pub async fn prepare(
    plugins_root: &Path,
    core_dir: &Path,
    config: &Config,
) -> Result<RunSummary, AssemblyError> {
    let tool = Arc::new(NpmTool::new(config.package_tool()));
    let images = Arc::new(DockerBuilder::new(config.image_tool()));
    Orchestrator::new(tool, images, CoreLayout::new(core_dir))
        .with_descriptor_file(config.descriptor_file())
        .run(plugins_root)
        .await
}
