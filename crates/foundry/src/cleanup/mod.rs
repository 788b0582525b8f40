//! Reset of the core application to its baseline before a run.
//!
//! Cleanup strips every previously linked plugin: it uninstalls the packages
//! recorded in the controller manifest and the frontend module list, empties
//! both documents, deletes stale staged artefacts, and drops every managed
//! service from the service registry. Uninstalls and file deletions are
//! best-effort and only logged on failure, but a registry that cannot be
//! read or written aborts the reset because later steps need a known
//! baseline.
//!
//! Running the reset twice in a row is harmless: the second pass finds empty
//! documents and empty staging directories.

use std::path::Path;
use std::sync::Arc;

use foundry_config::CoreLayout;
use foundry_plugins::PackageTool;
use tracing::{debug, info, warn};

use crate::registry::{ControllerManifest, ModuleList, RegistryError, ServiceRegistry};

const CLEANUP_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::cleanup");

/// Tally of the work done by one reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Packages successfully uninstalled.
    pub uninstalled: usize,
    /// Uninstalls that failed and were skipped.
    pub uninstall_failures: usize,
    /// Staged artefacts deleted.
    pub deleted_files: usize,
    /// Managed services removed from the service registry.
    pub removed_services: usize,
}

/// Idempotent reset of the shared registries and staging directories.
#[derive(Debug)]
pub struct CleanupResetter<T> {
    tool: Arc<T>,
    layout: CoreLayout,
}

impl<T: PackageTool> CleanupResetter<T> {
    /// Creates a resetter uninstalling packages through `tool`.
    #[must_use]
    pub const fn new(tool: Arc<T>, layout: CoreLayout) -> Self {
        Self { tool, layout }
    }

    /// Returns the core application layout being reset.
    #[must_use]
    pub const fn layout(&self) -> &CoreLayout {
        &self.layout
    }

    /// Resets the core application to its baseline.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistryError`] if any registry document cannot be read,
    /// parsed, or rewritten.
    pub async fn reset(&self) -> Result<CleanupReport, RegistryError> {
        let mut report = CleanupReport::default();

        let manifest = ControllerManifest::load(self.layout.controller_manifest())?;
        for entry in manifest.entries() {
            self.uninstall(self.layout.api_dir(), entry.name(), &mut report)
                .await;
        }
        ControllerManifest::default().save(self.layout.controller_manifest())?;

        let mut modules = ModuleList::load(self.layout.module_list())?;
        for module in modules.modules() {
            self.uninstall(self.layout.web_dir(), module.name(), &mut report)
                .await;
        }
        modules.clear();
        modules.save(self.layout.module_list())?;

        for staging_dir in self.layout.staging_dirs() {
            report.deleted_files += clear_staging(staging_dir);
        }

        let mut registry = ServiceRegistry::load(self.layout.service_registry())?;
        report.removed_services = registry.remove_managed();
        registry.save(self.layout.service_registry())?;

        info!(
            target: CLEANUP_TARGET,
            uninstalled = report.uninstalled,
            uninstall_failures = report.uninstall_failures,
            deleted_files = report.deleted_files,
            removed_services = report.removed_services,
            "core application reset"
        );
        Ok(report)
    }

    async fn uninstall(&self, project_dir: &Path, name: &str, report: &mut CleanupReport) {
        match self.tool.uninstall(project_dir, name).await {
            Ok(()) => {
                debug!(target: CLEANUP_TARGET, package = name, "package uninstalled");
                report.uninstalled += 1;
            }
            Err(err) => {
                warn!(
                    target: CLEANUP_TARGET,
                    package = name,
                    project = %project_dir.display(),
                    error = %err,
                    "uninstall failed; continuing"
                );
                report.uninstall_failures += 1;
            }
        }
    }
}

/// Ensures `dir` exists and deletes every file inside it, returning how many
/// were deleted.
fn clear_staging(dir: &Path) -> usize {
    if let Err(err) = std::fs::create_dir_all(dir) {
        warn!(
            target: CLEANUP_TARGET,
            dir = %dir.display(),
            error = %err,
            "could not create staging directory"
        );
        return 0;
    }
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(
                target: CLEANUP_TARGET,
                dir = %dir.display(),
                error = %err,
                "could not list staging directory"
            );
            return 0;
        }
    };

    let mut deleted = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        if entry.file_type().is_ok_and(|kind| kind.is_dir()) {
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => deleted += 1,
            Err(err) => warn!(
                target: CLEANUP_TARGET,
                path = %path.display(),
                error = %err,
                "could not delete staged artefact"
            ),
        }
    }
    deleted
}
