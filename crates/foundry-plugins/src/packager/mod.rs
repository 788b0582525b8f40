//! Packaging of a single component directory into a staged artefact.
//!
//! The package tool derives an artefact's installable name from the
//! component manifest (`package.json`), so giving every artefact a unique
//! name means temporarily rewriting that manifest. [`ComponentPackager`]
//! brackets the mutation with a backup: the manifest is copied aside,
//! renamed, built, packed, and finally restored byte-for-byte from the copy.
//!
//! The steps run strictly in sequence. Concurrency only exists across
//! packager invocations for different components.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::descriptor::ComponentSpec;
use crate::error::PluginError;
use crate::namer::UniqueNamer;
use crate::tool::PackageTool;

/// Tracing target for packaging operations.
const PACKAGER_TARGET: &str = "foundry_plugins::packager";

/// Manifest file declaring a component's installable name.
pub const MANIFEST_FILE: &str = "package.json";

/// Backup copy of the manifest kept for the duration of packaging.
pub const MANIFEST_BACKUP_FILE: &str = "package.json.foundry-backup";

/// A packaged component: its generated name and staged artefact path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagedComponent {
    name: String,
    artifact: PathBuf,
}

impl PackagedComponent {
    /// Creates a packaged component record.
    #[must_use]
    pub fn new(name: impl Into<String>, artifact: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            artifact: artifact.into(),
        }
    }

    /// Generated unique name.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Location of the artefact inside the staging directory.
    #[must_use]
    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    /// Consumes the record, returning the generated name.
    #[must_use]
    pub fn into_name(self) -> String {
        self.name
    }
}

/// Turns component directories into uniquely-named, staged packages.
#[derive(Debug)]
pub struct ComponentPackager<T> {
    tool: Arc<T>,
    namer: UniqueNamer,
}

impl<T> Clone for ComponentPackager<T> {
    fn clone(&self) -> Self {
        Self {
            tool: Arc::clone(&self.tool),
            namer: self.namer,
        }
    }
}

impl<T> ComponentPackager<T> {
    /// Creates a packager driving `tool`.
    #[must_use]
    pub const fn new(tool: Arc<T>, namer: UniqueNamer) -> Self {
        Self { tool, namer }
    }

    /// Returns the package tool.
    #[must_use]
    pub const fn tool(&self) -> &Arc<T> {
        &self.tool
    }
}

impl<T: PackageTool> ComponentPackager<T> {
    /// Packages the component described by `spec` and stages the artefact
    /// into `staging_dir`.
    ///
    /// On success the component's manifest is byte-identical to its state
    /// before the call.
    ///
    /// # Errors
    ///
    /// - [`PluginError::Setup`] if the manifest cannot be backed up; the
    ///   component directory is untouched.
    /// - [`PluginError::Manifest`] if the manifest cannot be parsed or
    ///   rewritten; the backup is left beside it.
    /// - [`PluginError::Build`], [`PluginError::Package`], or
    ///   [`PluginError::Relocation`] if the corresponding step fails; the
    ///   original manifest is restored on a best-effort basis.
    /// - [`PluginError::Restore`] if the original manifest cannot be put back.
    pub async fn package(
        &self,
        spec: &ComponentSpec,
        staging_dir: &Path,
    ) -> Result<PackagedComponent, PluginError> {
        let dir = spec.source_dir();
        let manifest = dir.join(MANIFEST_FILE);
        let backup = dir.join(MANIFEST_BACKUP_FILE);

        tokio::fs::copy(&manifest, &backup)
            .await
            .map_err(|err| PluginError::Setup {
                path: manifest.clone(),
                source: Arc::new(err),
            })?;

        let name = self.namer.generate(spec.role());
        debug!(
            target: PACKAGER_TARGET,
            role = %spec.role(),
            dir = %dir.display(),
            name = %name,
            "packaging component"
        );
        rename_manifest(&manifest, &name).await?;

        let artifact = match self.build_and_stage(dir, staging_dir).await {
            Ok(artifact) => artifact,
            Err(err) => {
                if let Err(restore_err) = restore_manifest(&manifest, &backup).await {
                    warn!(
                        target: PACKAGER_TARGET,
                        dir = %dir.display(),
                        error = %restore_err,
                        "could not restore manifest after failed packaging"
                    );
                }
                return Err(err);
            }
        };

        restore_manifest(&manifest, &backup).await?;
        debug!(
            target: PACKAGER_TARGET,
            name = %name,
            artifact = %artifact.display(),
            "component staged"
        );
        Ok(PackagedComponent::new(name, artifact))
    }

    async fn build_and_stage(&self, dir: &Path, staging_dir: &Path) -> Result<PathBuf, PluginError> {
        self.tool
            .build(dir)
            .await
            .map_err(|source| PluginError::Build {
                dir: dir.to_path_buf(),
                source,
            })?;
        let artifact = self
            .tool
            .pack(dir)
            .await
            .map_err(|source| PluginError::Package {
                dir: dir.to_path_buf(),
                source,
            })?;
        relocate(&artifact, staging_dir).await
    }
}

/// Overwrites the `name` field of the manifest at `path`.
async fn rename_manifest(path: &Path, name: &str) -> Result<(), PluginError> {
    let manifest_error = |message: String| PluginError::Manifest {
        path: path.to_path_buf(),
        message,
    };

    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|err| manifest_error(err.to_string()))?;
    let mut document: Value =
        serde_json::from_str(&text).map_err(|err| manifest_error(err.to_string()))?;
    let Some(fields) = document.as_object_mut() else {
        return Err(manifest_error(String::from("expected a JSON object")));
    };
    fields.insert(String::from("name"), Value::from(name));

    let mut rendered =
        serde_json::to_string_pretty(&document).map_err(|err| manifest_error(err.to_string()))?;
    rendered.push('\n');
    tokio::fs::write(path, rendered)
        .await
        .map_err(|err| manifest_error(err.to_string()))
}

/// Moves the backup over the mutated manifest.
async fn restore_manifest(manifest: &Path, backup: &Path) -> Result<(), PluginError> {
    tokio::fs::rename(backup, manifest)
        .await
        .map_err(|err| PluginError::Restore {
            path: manifest.to_path_buf(),
            source: Arc::new(err),
        })
}

/// Moves `artifact` into `staging_dir`, copying when a rename is impossible
/// (e.g. across filesystems).
async fn relocate(artifact: &Path, staging_dir: &Path) -> Result<PathBuf, PluginError> {
    let relocation_error = |err: std::io::Error| PluginError::Relocation {
        artifact: artifact.to_path_buf(),
        staging: staging_dir.to_path_buf(),
        source: Arc::new(err),
    };

    let file_name = artifact.file_name().ok_or_else(|| {
        relocation_error(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "artefact path has no file name",
        ))
    })?;
    let target = staging_dir.join(file_name);

    tokio::fs::create_dir_all(staging_dir)
        .await
        .map_err(relocation_error)?;
    if tokio::fs::rename(artifact, &target).await.is_err() {
        tokio::fs::copy(artifact, &target)
            .await
            .map_err(relocation_error)?;
        tokio::fs::remove_file(artifact)
            .await
            .map_err(relocation_error)?;
    }
    Ok(target)
}
