//! Run-level error taxonomy.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use foundry_plugins::{PluginError, ToolError};
use thiserror::Error;

use crate::registry::RegistryError;

/// Downstream project rebuilt after a successful commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RebuildTarget {
    /// The API server, which installs the staged controllers.
    Api,
    /// The frontend, which installs the staged web pages.
    Frontend,
}

impl RebuildTarget {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Frontend => "frontend",
        }
    }
}

impl fmt::Display for RebuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that abort an assembly run.
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// A registry document could not be read or reset during cleanup.
    #[error("cleanup failed: {0}")]
    Cleanup(#[source] RegistryError),

    /// The plugins root could not be enumerated.
    #[error("failed to enumerate plugins in '{path}': {source}")]
    Discovery {
        /// Plugins root directory.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// A plugin descriptor is missing or malformed.
    #[error(transparent)]
    Descriptor(PluginError),

    /// Preparing one plugin failed.
    #[error("experiment '{plugin}' failed: {source}")]
    Experiment {
        /// Short name of the failing plugin.
        plugin: String,
        /// First component failure reported for the plugin.
        #[source]
        source: PluginError,
    },

    /// A barrier was dropped by every participant before it fired.
    #[error("{scope} barrier was abandoned before every operation reported")]
    Abandoned {
        /// Human-readable scope of the barrier.
        scope: String,
    },

    /// Writing the shared registries failed.
    #[error("commit failed: {0}")]
    Commit(#[source] RegistryError),

    /// A downstream rebuild failed.
    #[error("{target} rebuild failed: {source}")]
    Rebuild {
        /// Project being rebuilt.
        target: RebuildTarget,
        /// Underlying tool failure.
        #[source]
        source: ToolError,
    },
}

impl AssemblyError {
    /// Short name of the plugin implicated in the failure, if any.
    #[must_use]
    pub fn plugin(&self) -> Option<&str> {
        match self {
            Self::Experiment { plugin, .. } => Some(plugin.as_str()),
            _ => None,
        }
    }
}
