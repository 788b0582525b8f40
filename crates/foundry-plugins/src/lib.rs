//! Per-component building blocks of the experiment assembler.
//!
//! An experiment plugin is a directory holding a descriptor plus the sources
//! of three kinds of components: API controllers, a web page, and a
//! background worker. This crate knows how to read the descriptor
//! ([`PluginDescriptor`]), how to mint collision-free artefact names
//! ([`UniqueNamer`]), and how to turn one component directory into a
//! uniquely-named package staged for installation ([`ComponentPackager`]).
//!
//! The external package and container tools sit behind the [`PackageTool`]
//! and [`ImageBuilder`] traits. The production implementations in
//! [`process`] shell out to `npm` and `docker`; tests substitute the
//! recording doubles from `test_support`.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use foundry_plugins::process::NpmTool;
//! use foundry_plugins::{ComponentPackager, ComponentRole, ComponentSpec, UniqueNamer};
//!
//! # async fn demo() -> Result<(), foundry_plugins::PluginError> {
//! let packager = ComponentPackager::new(Arc::new(NpmTool::new("npm")), UniqueNamer);
//! let spec = ComponentSpec::new(ComponentRole::Controller, "experiments/stroop/api");
//! let packaged = packager
//!     .package(&spec, Path::new("core/api/experiment-packages"))
//!     .await?;
//! println!("staged {} at {}", packaged.name(), packaged.artifact().display());
//! # Ok(())
//! # }
//! ```

pub mod descriptor;
pub mod error;
pub mod namer;
pub mod packager;
pub mod process;
pub mod tool;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

#[cfg(test)]
mod tests;

pub use self::descriptor::{
    ComponentRole, ComponentSpec, ControllerSpec, PluginDescriptor, WebPageSpec, WorkerSpec,
};
pub use self::error::{PluginError, ToolError};
pub use self::namer::UniqueNamer;
pub use self::packager::{ComponentPackager, PackagedComponent};
pub use self::tool::{ImageBuilder, PackageTool};
