//! Preparation of one experiment plugin.
//!
//! A plugin contributes one package per controller, one web page package,
//! and one worker image. [`ExperimentPreparer::prepare`] launches all of
//! them as independent tasks under a [`FanInBarrier`] scoped to the plugin
//! and returns once the barrier has fired and every task has finished: with
//! every entry once all components succeeded, or with the first component
//! failure. A failure never cancels its siblings; their results are
//! discarded.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use foundry_config::CoreLayout;
use foundry_plugins::{
    ComponentPackager, ComponentRole, ComponentSpec, ImageBuilder, PackageTool, PluginDescriptor,
    PluginError, UniqueNamer,
};
use serde_json::{Map, Value};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::barrier::{FanInBarrier, Outcome};
use crate::error::AssemblyError;
use crate::registry::{ControllerEntry, ServiceRegistryEntry, WebModuleEntry};
use crate::result::PreparedExperiment;

const PREPARER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::preparer");

/// Entries recorded by the component tasks of one plugin.
#[derive(Debug, Default)]
struct Accumulator {
    controllers: Vec<(usize, ControllerEntry)>,
    web_module: Option<WebModuleEntry>,
    service: Option<ServiceRegistryEntry>,
}

type SharedAccumulator = Arc<Mutex<Accumulator>>;

fn record(accumulator: &SharedAccumulator, update: impl FnOnce(&mut Accumulator)) {
    update(&mut accumulator.lock().unwrap_or_else(PoisonError::into_inner));
}

/// Packages every component of one plugin concurrently.
pub struct ExperimentPreparer<T, I> {
    packager: ComponentPackager<T>,
    images: Arc<I>,
    namer: UniqueNamer,
    layout: CoreLayout,
}

impl<T, I> Clone for ExperimentPreparer<T, I> {
    fn clone(&self) -> Self {
        Self {
            packager: self.packager.clone(),
            images: Arc::clone(&self.images),
            namer: self.namer,
            layout: self.layout.clone(),
        }
    }
}

impl<T, I> ExperimentPreparer<T, I>
where
    T: PackageTool + 'static,
    I: ImageBuilder + 'static,
{
    /// Creates a preparer staging packages into the directories of `layout`.
    #[must_use]
    pub const fn new(
        packager: ComponentPackager<T>,
        images: Arc<I>,
        namer: UniqueNamer,
        layout: CoreLayout,
    ) -> Self {
        Self {
            packager,
            images,
            namer,
            layout,
        }
    }

    /// Prepares the plugin rooted at `plugin_dir`.
    ///
    /// The first component failure is logged as soon as it is reported, but
    /// the call only returns once every component task has finished, so no
    /// component is left with a half-rewritten manifest.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::Experiment`] carrying the first component
    /// failure, tagged with the plugin's short name, or
    /// [`AssemblyError::Abandoned`] if every component task ended without
    /// reporting.
    pub async fn prepare(
        &self,
        plugin_dir: &Path,
        descriptor: PluginDescriptor,
    ) -> Result<PreparedExperiment, AssemblyError> {
        let plugin = descriptor.short_name().to_owned();
        let specs = descriptor.component_specs(plugin_dir);
        debug!(
            target: PREPARER_TARGET,
            plugin = %plugin,
            components = specs.len(),
            "preparing experiment"
        );

        let accumulator = SharedAccumulator::default();
        let (barrier, signal) = FanInBarrier::<PluginError>::with_signal(specs.len());
        let mut tasks = JoinSet::new();
        let mut mount_paths = descriptor
            .controllers()
            .iter()
            .map(|controller| controller.mount_path().to_owned());

        for (index, spec) in specs.into_iter().enumerate() {
            let context = TaskContext {
                barrier: barrier.clone(),
                accumulator: Arc::clone(&accumulator),
            };
            match spec.role() {
                ComponentRole::Controller => {
                    let mount_path = mount_paths.next().unwrap_or_default();
                    self.spawn_package(
                        &mut tasks,
                        spec,
                        self.layout.controller_staging(),
                        context,
                        move |acc, name| {
                            acc.controllers
                                .push((index, ControllerEntry::new(name, mount_path)));
                        },
                    );
                }
                ComponentRole::WebPage => {
                    let page_descriptor = descriptor.clone();
                    self.spawn_package(
                        &mut tasks,
                        spec,
                        self.layout.web_staging(),
                        context,
                        move |acc, name| {
                            acc.web_module = Some(WebModuleEntry::new(name, &page_descriptor));
                        },
                    );
                }
                ComponentRole::Worker => {
                    self.spawn_worker(&mut tasks, spec, descriptor.worker().service(), context);
                }
            }
        }
        drop(barrier);

        let outcome = signal.wait().await;
        if let Outcome::Failed(err) = &outcome {
            warn!(
                target: PREPARER_TARGET,
                plugin = %plugin,
                error = %err,
                "component failed; waiting for the remaining components"
            );
        }
        drain(&plugin, &mut tasks).await;

        match outcome {
            Outcome::Converged => {
                let prepared = assemble(&plugin, &accumulator)?;
                info!(
                    target: PREPARER_TARGET,
                    plugin = %plugin,
                    controllers = prepared.controllers().len(),
                    "experiment prepared"
                );
                Ok(prepared)
            }
            Outcome::Failed(source) => Err(AssemblyError::Experiment { plugin, source }),
            Outcome::Abandoned => Err(AssemblyError::Abandoned {
                scope: format!("experiment '{plugin}'"),
            }),
        }
    }

    fn spawn_package(
        &self,
        tasks: &mut JoinSet<()>,
        spec: ComponentSpec,
        staging: &Path,
        context: TaskContext,
        on_packaged: impl FnOnce(&mut Accumulator, String) + Send + 'static,
    ) {
        let staging_dir = staging.to_path_buf();
        let packager = self.packager.clone();
        tasks.spawn(async move {
            match packager.package(&spec, &staging_dir).await {
                Ok(packaged) => {
                    record(&context.accumulator, |acc| {
                        on_packaged(acc, packaged.into_name());
                    });
                    context.barrier.decrement();
                }
                Err(err) => context.barrier.fail(err),
            }
        });
    }

    fn spawn_worker(
        &self,
        tasks: &mut JoinSet<()>,
        spec: ComponentSpec,
        service: &Map<String, Value>,
        context: TaskContext,
    ) {
        let tag = self.namer.generate(spec.role());
        let base = service.clone();
        let images = Arc::clone(&self.images);
        tasks.spawn(async move {
            let dir = spec.source_dir();
            match images.build(dir, &tag).await {
                Ok(()) => {
                    let service = ServiceRegistryEntry::managed(tag.as_str(), &base, &tag);
                    record(&context.accumulator, |acc| acc.service = Some(service));
                    context.barrier.decrement();
                }
                Err(source) => context.barrier.fail(PluginError::Image {
                    dir: dir.to_path_buf(),
                    tag,
                    source,
                }),
            }
        });
    }
}

/// Handles every component task needs to report its result.
struct TaskContext {
    barrier: FanInBarrier<PluginError>,
    accumulator: SharedAccumulator,
}

/// Waits for every component task of `plugin` to finish.
async fn drain(plugin: &str, tasks: &mut JoinSet<()>) {
    while let Some(joined) = tasks.join_next().await {
        if let Err(err) = joined {
            warn!(
                target: PREPARER_TARGET,
                plugin = %plugin,
                error = %err,
                "component task ended abnormally"
            );
        }
    }
}

/// Combines the recorded entries once every component has reported.
fn assemble(
    plugin: &str,
    accumulator: &SharedAccumulator,
) -> Result<PreparedExperiment, AssemblyError> {
    let mut recorded = std::mem::take(
        &mut *accumulator
            .lock()
            .unwrap_or_else(PoisonError::into_inner),
    );
    recorded.controllers.sort_by_key(|(index, _)| *index);
    let (Some(web_module), Some(service)) = (recorded.web_module, recorded.service) else {
        return Err(AssemblyError::Abandoned {
            scope: format!("experiment '{plugin}'"),
        });
    };
    let controllers = recorded
        .controllers
        .into_iter()
        .map(|(_, entry)| entry)
        .collect();
    Ok(PreparedExperiment::new(plugin, controllers, web_module, service))
}

#[cfg(test)]
mod tests;
