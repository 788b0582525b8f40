use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{RegistryError, read_document, write_document};

/// One installed controller and the route prefix it is mounted under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerEntry {
    name: String,
    mount_path: String,
}

impl ControllerEntry {
    /// Creates a manifest entry.
    #[must_use]
    pub fn new(name: impl Into<String>, mount_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mount_path: mount_path.into(),
        }
    }

    /// Installed package name.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Route prefix.
    #[must_use]
    pub const fn mount_path(&self) -> &str {
        self.mount_path.as_str()
    }
}

/// Controller manifest: a JSON array of [`ControllerEntry`] records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ControllerManifest {
    entries: Vec<ControllerEntry>,
}

impl ControllerManifest {
    /// Creates a manifest holding `entries`.
    #[must_use]
    pub const fn new(entries: Vec<ControllerEntry>) -> Self {
        Self { entries }
    }

    /// Loads the manifest at `path`; a missing file is an empty manifest.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Read`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        read_document(path)
    }

    /// Atomically replaces the manifest at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Write`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), RegistryError> {
        write_document(path, self)
    }

    /// Entries in manifest order.
    #[must_use]
    pub fn entries(&self) -> &[ControllerEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the manifest lists no controllers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
