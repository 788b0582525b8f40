//! On-disk layout of the core application.
//!
//! The assembler mutates exactly three shared registry documents and two
//! staging directories inside the core application. Both the cleanup and the
//! commit phase must agree on these locations, so they are derived in one
//! place.

use std::path::{Path, PathBuf};

/// Canonical paths of the shared artefacts inside the core directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreLayout {
    root: PathBuf,
    api_dir: PathBuf,
    web_dir: PathBuf,
    controller_manifest: PathBuf,
    controller_staging: PathBuf,
    module_list: PathBuf,
    web_staging: PathBuf,
    service_registry: PathBuf,
}

impl CoreLayout {
    /// Derives the layout rooted at `core_dir`.
    #[must_use]
    pub fn new(core_dir: impl AsRef<Path>) -> Self {
        let root = core_dir.as_ref().to_path_buf();
        let api_dir = root.join("api");
        let web_dir = root.join("web");
        Self {
            controller_manifest: api_dir.join("experiments.json"),
            controller_staging: api_dir.join("experiment-packages"),
            module_list: web_dir.join("src").join("experiments.json"),
            web_staging: web_dir.join("experiment-packages"),
            service_registry: root.join("docker-compose.json"),
            api_dir,
            web_dir,
            root,
        }
    }

    /// Root of the core application.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    /// Project directory of the API server.
    #[must_use]
    pub fn api_dir(&self) -> &Path {
        self.api_dir.as_path()
    }

    /// Project directory of the frontend.
    #[must_use]
    pub fn web_dir(&self) -> &Path {
        self.web_dir.as_path()
    }

    /// Document listing the installed controllers and their mount paths.
    #[must_use]
    pub fn controller_manifest(&self) -> &Path {
        self.controller_manifest.as_path()
    }

    /// Staging directory for packaged controllers.
    #[must_use]
    pub fn controller_staging(&self) -> &Path {
        self.controller_staging.as_path()
    }

    /// Document listing the frontend modules.
    #[must_use]
    pub fn module_list(&self) -> &Path {
        self.module_list.as_path()
    }

    /// Staging directory for packaged web pages.
    #[must_use]
    pub fn web_staging(&self) -> &Path {
        self.web_staging.as_path()
    }

    /// Compose-style document registering the worker services.
    #[must_use]
    pub fn service_registry(&self) -> &Path {
        self.service_registry.as_path()
    }

    /// Both staging directories, controllers first.
    #[must_use]
    pub fn staging_dirs(&self) -> [&Path; 2] {
        [self.controller_staging(), self.web_staging()]
    }
}
