//! Commit of the aggregated run result into the shared registries.

use foundry_config::CoreLayout;
use tracing::info;

use crate::registry::{ControllerManifest, ModuleList, RegistryError, ServiceRegistry};
use crate::result::RunResult;

const WRITER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::writer");

/// Counts of the entries written by one commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitSummary {
    /// Entries in the rewritten controller manifest.
    pub controllers: usize,
    /// Modules appended to the frontend module list.
    pub web_modules: usize,
    /// Managed services merged into the service registry.
    pub services: usize,
}

/// Writes a [`RunResult`] into the three shared registry documents.
#[derive(Debug, Clone)]
pub struct SharedArtifactWriter {
    layout: CoreLayout,
}

impl SharedArtifactWriter {
    /// Creates a writer for the core application described by `layout`.
    #[must_use]
    pub const fn new(layout: CoreLayout) -> Self {
        Self { layout }
    }

    /// Rewrites the controller manifest, appends the web modules to the
    /// module list, and merges the worker services into the service
    /// registry, in that order.
    ///
    /// # Errors
    ///
    /// Returns the first [`RegistryError`]; documents later in the order are
    /// left untouched and earlier writes are not rolled back.
    pub fn commit(&self, result: &RunResult) -> Result<CommitSummary, RegistryError> {
        ControllerManifest::new(result.controllers().to_vec())
            .save(self.layout.controller_manifest())?;

        let mut modules = ModuleList::load(self.layout.module_list())?;
        for module in result.web_modules() {
            modules.push(module.clone());
        }
        modules.save(self.layout.module_list())?;

        let mut registry = ServiceRegistry::load(self.layout.service_registry())?;
        for service in result.services() {
            registry.insert(service.clone());
        }
        registry.save(self.layout.service_registry())?;

        let summary = CommitSummary {
            controllers: result.controllers().len(),
            web_modules: result.web_modules().len(),
            services: result.services().len(),
        };
        info!(
            target: WRITER_TARGET,
            controllers = summary.controllers,
            web_modules = summary.web_modules,
            services = summary.services,
            "registries committed"
        );
        Ok(summary)
    }
}
