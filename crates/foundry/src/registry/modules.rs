use std::path::Path;

use foundry_plugins::PluginDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{KeyedDocument, RegistryError, encode_error, read_error};

const MODULES_KEY: &str = "modules";

/// Frontend module descriptor: the installed package plus the presentation
/// metadata the frontend renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebModuleEntry {
    name: String,
    short_name: String,
    display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tagline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duration: Option<String>,
}

impl WebModuleEntry {
    /// Builds the entry for the web page packaged as `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, descriptor: &PluginDescriptor) -> Self {
        Self {
            name: name.into(),
            short_name: descriptor.short_name().to_owned(),
            display_name: descriptor.display_name().to_owned(),
            logo: descriptor.logo().map(str::to_owned),
            tagline: descriptor.tagline().map(str::to_owned),
            duration: descriptor.duration().map(str::to_owned),
        }
    }

    /// Installed package name; the frontend imports the module by it.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Plugin short name.
    #[must_use]
    pub const fn short_name(&self) -> &str {
        self.short_name.as_str()
    }

    /// Plugin display name.
    #[must_use]
    pub const fn display_name(&self) -> &str {
        self.display_name.as_str()
    }
}

/// Frontend module list. The `modules` array is managed; every other key of
/// the document is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleList {
    modules: Vec<WebModuleEntry>,
    document: KeyedDocument,
}

impl ModuleList {
    /// Loads the module list at `path`; a missing file is an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Read`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let (document, found) = KeyedDocument::load(path, MODULES_KEY)?;
        let modules = match found {
            Some(value) => serde_json::from_value(value)
                .map_err(|err| read_error(path, format!("invalid `{MODULES_KEY}`: {err}")))?,
            None => Vec::new(),
        };
        Ok(Self { modules, document })
    }

    /// Atomically replaces the module list at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Write`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), RegistryError> {
        let modules =
            serde_json::to_value(&self.modules).map_err(|err| encode_error(path, err))?;
        self.document.save(path, MODULES_KEY, modules)
    }

    /// Modules in list order.
    #[must_use]
    pub fn modules(&self) -> &[WebModuleEntry] {
        &self.modules
    }

    /// Appends a module.
    pub fn push(&mut self, entry: WebModuleEntry) {
        self.modules.push(entry);
    }

    /// Removes every module, keeping unrelated content.
    pub fn clear(&mut self) {
        self.modules.clear();
    }

    /// Unmanaged top-level content.
    #[must_use]
    pub const fn other(&self) -> &Map<String, Value> {
        self.document.rest()
    }
}
