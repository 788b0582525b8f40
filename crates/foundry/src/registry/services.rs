use std::path::Path;

use serde_json::{Map, Value};

use super::{KeyedDocument, RegistryError, read_error};

const SERVICES_KEY: &str = "services";

/// Attribute marking a service as created by the assembler.
pub const MANAGED_MARKER: &str = "x-foundry-managed";

/// Attribute carrying a service's container image reference.
const IMAGE_ATTRIBUTE: &str = "image";

/// A named service definition destined for the service registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRegistryEntry {
    name: String,
    definition: Map<String, Value>,
}

impl ServiceRegistryEntry {
    /// Builds a managed entry from a worker's base service definition: the
    /// image reference is injected and the managed marker set.
    #[must_use]
    pub fn managed(name: impl Into<String>, base: &Map<String, Value>, image: &str) -> Self {
        let mut definition = base.clone();
        definition.insert(String::from(IMAGE_ATTRIBUTE), Value::from(image));
        definition.insert(String::from(MANAGED_MARKER), Value::Bool(true));
        Self {
            name: name.into(),
            definition,
        }
    }

    /// Service name, unique within the registry.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Full service definition.
    #[must_use]
    pub const fn definition(&self) -> &Map<String, Value> {
        &self.definition
    }

    /// Image reference.
    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.definition.get(IMAGE_ATTRIBUTE).and_then(Value::as_str)
    }
}

/// Compose-style service registry. Only the `services` map is interpreted;
/// every other key of the document is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceRegistry {
    services: Map<String, Value>,
    document: KeyedDocument,
}

impl ServiceRegistry {
    /// Loads the registry at `path`; a missing file is an empty registry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Read`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let (document, found) = KeyedDocument::load(path, SERVICES_KEY)?;
        let services = match found {
            Some(Value::Object(entries)) => entries,
            Some(_) => {
                return Err(read_error(path, format!("`{SERVICES_KEY}` is not an object")));
            }
            None => Map::new(),
        };
        Ok(Self { services, document })
    }

    /// Atomically replaces the registry at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Write`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), RegistryError> {
        self.document
            .save(path, SERVICES_KEY, Value::Object(self.services.clone()))
    }

    /// All service definitions keyed by name.
    #[must_use]
    pub const fn services(&self) -> &Map<String, Value> {
        &self.services
    }

    /// Inserts `entry`, replacing any service with the same name.
    pub fn insert(&mut self, entry: ServiceRegistryEntry) {
        self.services
            .insert(entry.name, Value::Object(entry.definition));
    }

    /// Removes every service bearing the managed marker and returns how many
    /// were removed.
    pub fn remove_managed(&mut self) -> usize {
        let before = self.services.len();
        self.services.retain(|_, definition| !is_managed(definition));
        before - self.services.len()
    }

    /// Names of the managed services.
    #[must_use]
    pub fn managed_names(&self) -> Vec<&str> {
        self.services
            .iter()
            .filter(|(_, definition)| is_managed(definition))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Unmanaged top-level content.
    #[must_use]
    pub const fn other(&self) -> &Map<String, Value> {
        self.document.rest()
    }
}

fn is_managed(definition: &Value) -> bool {
    definition
        .get(MANAGED_MARKER)
        .and_then(Value::as_bool)
        .unwrap_or(false)
}
