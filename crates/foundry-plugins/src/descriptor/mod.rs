//! Plugin descriptors and the component specs derived from them.
//!
//! Every plugin directory carries a descriptor (by default
//! `experiment.json`) naming the plugin, its presentation metadata, and the
//! locations of its controllers, web page, and worker relative to the plugin
//! directory. A [`PluginDescriptor`] is immutable once loaded.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::PluginError;

/// Kind of packageable unit contributed by a plugin.
///
/// # Example
///
/// ```
/// use foundry_plugins::ComponentRole;
///
/// assert_eq!(ComponentRole::WebPage.as_str(), "webpage");
/// assert_eq!(ComponentRole::Worker.name_prefix(), "foundry-wkr-");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentRole {
    /// Backend controller mounted into the API server.
    Controller,
    /// Frontend module loaded by the web application.
    #[serde(rename = "webpage")]
    WebPage,
    /// Background worker shipped as a container image.
    Worker,
}

impl ComponentRole {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Controller => "controller",
            Self::WebPage => "webpage",
            Self::Worker => "worker",
        }
    }

    /// Prefix of generated artefact names, distinct per role.
    #[must_use]
    pub const fn name_prefix(self) -> &'static str {
        match self {
            Self::Controller => "foundry-ctl-",
            Self::WebPage => "foundry-web-",
            Self::Worker => "foundry-wkr-",
        }
    }
}

impl std::fmt::Display for ComponentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One packageable unit: a source directory tagged with its role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentSpec {
    role: ComponentRole,
    source_dir: PathBuf,
}

impl ComponentSpec {
    /// Creates a spec for the component rooted at `source_dir`.
    #[must_use]
    pub fn new(role: ComponentRole, source_dir: impl Into<PathBuf>) -> Self {
        Self {
            role,
            source_dir: source_dir.into(),
        }
    }

    /// Returns the component role.
    #[must_use]
    pub const fn role(&self) -> ComponentRole {
        self.role
    }

    /// Returns the component source directory.
    #[must_use]
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }
}

/// Backend controller declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerSpec {
    location: PathBuf,
    mount_path: String,
}

impl ControllerSpec {
    /// Creates a controller declaration.
    #[must_use]
    pub fn new(location: impl Into<PathBuf>, mount_path: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            mount_path: mount_path.into(),
        }
    }

    /// Source location relative to the plugin directory.
    #[must_use]
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Route prefix the controller is mounted under.
    #[must_use]
    pub const fn mount_path(&self) -> &str {
        self.mount_path.as_str()
    }
}

/// Web page declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebPageSpec {
    location: PathBuf,
}

impl WebPageSpec {
    /// Source location relative to the plugin directory.
    #[must_use]
    pub fn location(&self) -> &Path {
        &self.location
    }
}

/// Worker declaration: image sources plus the base service definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerSpec {
    location: PathBuf,
    #[serde(default)]
    service: Map<String, Value>,
}

impl WorkerSpec {
    /// Source location relative to the plugin directory.
    #[must_use]
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Base service definition merged into the service registry.
    #[must_use]
    pub const fn service(&self) -> &Map<String, Value> {
        &self.service
    }
}

/// Parsed configuration of one plugin directory.
///
/// # Example
///
/// ```
/// use foundry_plugins::PluginDescriptor;
///
/// let descriptor = PluginDescriptor::from_json_str(r#"{
///     "shortName": "stroop",
///     "experimentName": "Stroop Task",
///     "apiControllers": [{ "location": "api", "mountPath": "/stroop" }],
///     "webPage": { "location": "web" },
///     "worker": { "location": "worker", "service": { "restart": "always" } }
/// }"#).expect("valid descriptor");
///
/// assert_eq!(descriptor.short_name(), "stroop");
/// assert_eq!(descriptor.controllers().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginDescriptor {
    short_name: String,
    #[serde(alias = "displayName")]
    experiment_name: String,
    #[serde(default)]
    logo: Option<String>,
    #[serde(default)]
    tagline: Option<String>,
    #[serde(default)]
    duration: Option<String>,
    #[serde(default)]
    api_controllers: Vec<ControllerSpec>,
    web_page: WebPageSpec,
    worker: WorkerSpec,
}

impl PluginDescriptor {
    /// Parses a descriptor from JSON text.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] when the text is not a
    /// well-formed descriptor.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Reads and parses the descriptor at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::DescriptorLoad`] if the file cannot be read or
    /// does not parse.
    pub async fn load(path: &Path) -> Result<Self, PluginError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|err| PluginError::DescriptorLoad {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;
        Self::from_json_str(&text).map_err(|err| PluginError::DescriptorLoad {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    /// Short identifier of the plugin.
    #[must_use]
    pub const fn short_name(&self) -> &str {
        self.short_name.as_str()
    }

    /// Human-readable plugin name.
    #[must_use]
    pub const fn display_name(&self) -> &str {
        self.experiment_name.as_str()
    }

    /// Logo reference shown by the frontend.
    #[must_use]
    pub fn logo(&self) -> Option<&str> {
        self.logo.as_deref()
    }

    /// One-line description shown by the frontend.
    #[must_use]
    pub fn tagline(&self) -> Option<&str> {
        self.tagline.as_deref()
    }

    /// Expected duration shown by the frontend.
    #[must_use]
    pub fn duration(&self) -> Option<&str> {
        self.duration.as_deref()
    }

    /// Controller declarations, in descriptor order.
    #[must_use]
    pub fn controllers(&self) -> &[ControllerSpec] {
        &self.api_controllers
    }

    /// Web page declaration.
    #[must_use]
    pub const fn web_page(&self) -> &WebPageSpec {
        &self.web_page
    }

    /// Worker declaration.
    #[must_use]
    pub const fn worker(&self) -> &WorkerSpec {
        &self.worker
    }

    /// Component specs resolved against `plugin_dir`: controllers first, then
    /// the web page, then the worker.
    #[must_use]
    pub fn component_specs(&self, plugin_dir: &Path) -> Vec<ComponentSpec> {
        self.api_controllers
            .iter()
            .map(|controller| {
                ComponentSpec::new(
                    ComponentRole::Controller,
                    plugin_dir.join(controller.location()),
                )
            })
            .chain([
                ComponentSpec::new(
                    ComponentRole::WebPage,
                    plugin_dir.join(self.web_page.location()),
                ),
                ComponentSpec::new(
                    ComponentRole::Worker,
                    plugin_dir.join(self.worker.location()),
                ),
            ])
            .collect()
    }
}
