//! In-memory results of one assembly run.

use crate::registry::{ControllerEntry, ServiceRegistryEntry, WebModuleEntry};

/// Registry entries contributed by one successfully prepared plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedExperiment {
    plugin: String,
    controllers: Vec<ControllerEntry>,
    web_module: WebModuleEntry,
    service: ServiceRegistryEntry,
}

impl PreparedExperiment {
    /// Bundles the entries produced for `plugin`.
    #[must_use]
    pub fn new(
        plugin: impl Into<String>,
        controllers: Vec<ControllerEntry>,
        web_module: WebModuleEntry,
        service: ServiceRegistryEntry,
    ) -> Self {
        Self {
            plugin: plugin.into(),
            controllers,
            web_module,
            service,
        }
    }

    /// Short name of the plugin.
    #[must_use]
    pub const fn plugin(&self) -> &str {
        self.plugin.as_str()
    }

    /// Controller entries in descriptor order.
    #[must_use]
    pub fn controllers(&self) -> &[ControllerEntry] {
        &self.controllers
    }

    /// Frontend module entry of the web page.
    #[must_use]
    pub const fn web_module(&self) -> &WebModuleEntry {
        &self.web_module
    }

    /// Managed service entry of the worker.
    #[must_use]
    pub const fn service(&self) -> &ServiceRegistryEntry {
        &self.service
    }
}

/// Run-wide aggregate of every prepared plugin, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunResult {
    controllers: Vec<ControllerEntry>,
    web_modules: Vec<WebModuleEntry>,
    services: Vec<ServiceRegistryEntry>,
}

impl RunResult {
    /// Creates an empty aggregate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the entries of one prepared plugin.
    pub fn absorb(&mut self, experiment: PreparedExperiment) {
        let PreparedExperiment {
            controllers,
            web_module,
            service,
            ..
        } = experiment;
        self.controllers.extend(controllers);
        self.web_modules.push(web_module);
        self.services.push(service);
    }

    /// Controller manifest entries.
    #[must_use]
    pub fn controllers(&self) -> &[ControllerEntry] {
        &self.controllers
    }

    /// Frontend module entries.
    #[must_use]
    pub fn web_modules(&self) -> &[WebModuleEntry] {
        &self.web_modules
    }

    /// Managed service entries.
    #[must_use]
    pub fn services(&self) -> &[ServiceRegistryEntry] {
        &self.services
    }
}

impl FromIterator<PreparedExperiment> for RunResult {
    fn from_iter<I: IntoIterator<Item = PreparedExperiment>>(iter: I) -> Self {
        let mut result = Self::new();
        for experiment in iter {
            result.absorb(experiment);
        }
        result
    }
}
