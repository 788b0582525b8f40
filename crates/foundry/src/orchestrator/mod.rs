//! Top-level driver of one assembly run.
//!
//! A run walks through five phases:
//!
//! 1. reset the core application with the [`CleanupResetter`],
//! 2. discover the plugin directories and load every descriptor,
//! 3. prepare all plugins concurrently under a run-wide [`FanInBarrier`],
//! 4. commit the aggregated [`RunResult`] with the [`SharedArtifactWriter`],
//! 5. rebuild the API server and the frontend concurrently under a final
//!    barrier of two.
//!
//! Any failure aborts the run at the phase where it happened. Tasks already
//! launched in that phase are still awaited before the run returns, so each
//! component ends with its manifest restored. There is no rollback; the next
//! run's cleanup restores the baseline.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use foundry_config::{CoreLayout, DEFAULT_DESCRIPTOR_FILE};
use foundry_plugins::{ComponentPackager, ImageBuilder, PackageTool, PluginDescriptor, UniqueNamer};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::barrier::{FanInBarrier, Outcome};
use crate::cleanup::{CleanupReport, CleanupResetter};
use crate::error::{AssemblyError, RebuildTarget};
use crate::preparer::ExperimentPreparer;
use crate::result::{PreparedExperiment, RunResult};
use crate::writer::{CommitSummary, SharedArtifactWriter};

const ORCHESTRATOR_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::orchestrator");

/// Outcome of a successful run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Plugins discovered and prepared.
    pub plugins: usize,
    /// Work done by the initial reset.
    pub cleanup: CleanupReport,
    /// Entries written to the shared registries.
    pub committed: CommitSummary,
}

/// Drives cleanup, preparation, commit, and rebuild of one run.
pub struct Orchestrator<T, I> {
    tool: Arc<T>,
    images: Arc<I>,
    namer: UniqueNamer,
    layout: CoreLayout,
    descriptor_file: String,
}

impl<T, I> Orchestrator<T, I>
where
    T: PackageTool + 'static,
    I: ImageBuilder + 'static,
{
    /// Creates an orchestrator for the core application at `layout`.
    #[must_use]
    pub fn new(tool: Arc<T>, images: Arc<I>, layout: CoreLayout) -> Self {
        Self {
            tool,
            images,
            namer: UniqueNamer,
            layout,
            descriptor_file: String::from(DEFAULT_DESCRIPTOR_FILE),
        }
    }

    /// Overrides the descriptor file name looked up in each plugin directory.
    #[must_use]
    pub fn with_descriptor_file(mut self, file_name: impl Into<String>) -> Self {
        self.descriptor_file = file_name.into();
        self
    }

    /// Runs the assembly for every plugin under `plugins_root`.
    ///
    /// # Errors
    ///
    /// - [`AssemblyError::Cleanup`] if the reset cannot read or write a
    ///   registry; nothing else runs.
    /// - [`AssemblyError::Discovery`] or [`AssemblyError::Descriptor`] if the
    ///   plugin set cannot be established; no plugin is prepared.
    /// - [`AssemblyError::Experiment`] for the first failing plugin; no
    ///   registry is written.
    /// - [`AssemblyError::Commit`] if a registry write fails; nothing is
    ///   rebuilt.
    /// - [`AssemblyError::Rebuild`] for the first failing rebuild.
    /// - [`AssemblyError::Abandoned`] if a barrier lost every participant.
    pub async fn run(&self, plugins_root: &Path) -> Result<RunSummary, AssemblyError> {
        let cleanup = CleanupResetter::new(Arc::clone(&self.tool), self.layout.clone())
            .reset()
            .await
            .map_err(AssemblyError::Cleanup)?;

        let plugins = self.discover(plugins_root).await?;
        let count = plugins.len();
        info!(
            target: ORCHESTRATOR_TARGET,
            plugins = count,
            root = %plugins_root.display(),
            "plugins discovered"
        );

        let result = self.prepare_all(plugins).await?;
        let committed = SharedArtifactWriter::new(self.layout.clone())
            .commit(&result)
            .map_err(AssemblyError::Commit)?;
        self.rebuild().await?;

        info!(target: ORCHESTRATOR_TARGET, plugins = count, "assembly complete");
        Ok(RunSummary {
            plugins: count,
            cleanup,
            committed,
        })
    }

    /// Lists the plugin directories in name order and loads their
    /// descriptors. Hidden directories are skipped.
    async fn discover(
        &self,
        plugins_root: &Path,
    ) -> Result<Vec<(PathBuf, PluginDescriptor)>, AssemblyError> {
        let discovery_error = |err: std::io::Error| AssemblyError::Discovery {
            path: plugins_root.to_path_buf(),
            source: Arc::new(err),
        };

        let mut dirs = Vec::new();
        let mut entries = tokio::fs::read_dir(plugins_root)
            .await
            .map_err(discovery_error)?;
        while let Some(entry) = entries.next_entry().await.map_err(discovery_error)? {
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            if entry.file_type().await.map_err(discovery_error)?.is_dir() {
                dirs.push(entry.path());
            }
        }
        dirs.sort();

        let mut plugins = Vec::with_capacity(dirs.len());
        for dir in dirs {
            let descriptor = PluginDescriptor::load(&dir.join(&self.descriptor_file))
                .await
                .map_err(AssemblyError::Descriptor)?;
            debug!(
                target: ORCHESTRATOR_TARGET,
                plugin = descriptor.short_name(),
                dir = %dir.display(),
                "descriptor loaded"
            );
            plugins.push((dir, descriptor));
        }
        Ok(plugins)
    }

    async fn prepare_all(
        &self,
        plugins: Vec<(PathBuf, PluginDescriptor)>,
    ) -> Result<RunResult, AssemblyError> {
        let preparer = ExperimentPreparer::new(
            ComponentPackager::new(Arc::clone(&self.tool), self.namer),
            Arc::clone(&self.images),
            self.namer,
            self.layout.clone(),
        );
        let prepared = Arc::new(Mutex::new(Vec::with_capacity(plugins.len())));
        let (barrier, signal) = FanInBarrier::<AssemblyError>::with_signal(plugins.len());
        let mut tasks = JoinSet::new();

        for (index, (dir, descriptor)) in plugins.into_iter().enumerate() {
            let plugin_preparer = preparer.clone();
            let handle = barrier.clone();
            let results = Arc::clone(&prepared);
            tasks.spawn(async move {
                match plugin_preparer.prepare(&dir, descriptor).await {
                    Ok(experiment) => {
                        results
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .push((index, experiment));
                        handle.decrement();
                    }
                    Err(err) => handle.fail(err),
                }
            });
        }
        drop(barrier);

        let outcome = signal.wait().await;
        if let Outcome::Failed(err) = &outcome {
            warn!(
                target: ORCHESTRATOR_TARGET,
                plugin = err.plugin().unwrap_or_default(),
                error = %err,
                "plugin failed; waiting for the remaining plugins"
            );
        }
        drain("preparation", &mut tasks).await;

        match outcome {
            Outcome::Converged => {
                let mut prepared: Vec<(usize, PreparedExperiment)> = std::mem::take(
                    &mut *prepared.lock().unwrap_or_else(PoisonError::into_inner),
                );
                prepared.sort_by_key(|(index, _)| *index);
                Ok(prepared
                    .into_iter()
                    .map(|(_, experiment)| experiment)
                    .collect())
            }
            Outcome::Failed(err) => Err(err),
            Outcome::Abandoned => Err(AssemblyError::Abandoned {
                scope: String::from("run"),
            }),
        }
    }

    /// Installs the staged packages into the API server and the frontend.
    async fn rebuild(&self) -> Result<(), AssemblyError> {
        let (barrier, signal) = FanInBarrier::<AssemblyError>::with_signal(2);
        let mut tasks = JoinSet::new();
        let targets = [
            (
                RebuildTarget::Api,
                self.layout.api_dir(),
                self.layout.controller_staging(),
            ),
            (
                RebuildTarget::Frontend,
                self.layout.web_dir(),
                self.layout.web_staging(),
            ),
        ];
        for (target, project, staging) in targets {
            let tool = Arc::clone(&self.tool);
            let handle = barrier.clone();
            let project_dir = project.to_path_buf();
            let staging_dir = staging.to_path_buf();
            tasks.spawn(async move {
                match tool.install(&project_dir, &staging_dir).await {
                    Ok(()) => {
                        debug!(
                            target: ORCHESTRATOR_TARGET,
                            project = %target,
                            "rebuild finished"
                        );
                        handle.decrement();
                    }
                    Err(source) => handle.fail(AssemblyError::Rebuild { target, source }),
                }
            });
        }
        drop(barrier);

        let outcome = signal.wait().await;
        drain("rebuild", &mut tasks).await;

        match outcome {
            Outcome::Converged => Ok(()),
            Outcome::Failed(err) => Err(err),
            Outcome::Abandoned => Err(AssemblyError::Abandoned {
                scope: String::from("rebuild"),
            }),
        }
    }
}

/// Waits for every task launched in `phase` to finish.
async fn drain(phase: &str, tasks: &mut JoinSet<()>) {
    while let Some(joined) = tasks.join_next().await {
        if let Err(err) = joined {
            warn!(
                target: ORCHESTRATOR_TARGET,
                phase,
                error = %err,
                "task ended abnormally"
            );
        }
    }
}
