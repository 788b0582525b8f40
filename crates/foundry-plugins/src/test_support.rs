//! Recording tool doubles for tests.
//!
//! [`FakePackageTool`] and [`FakeImageBuilder`] never spawn processes. They
//! record every invocation, yield once to the scheduler to mimic a real
//! suspension point, and fail on request for any directory whose path
//! contains a configured fragment.
//!
//! The fake `pack` mirrors the real tool's naming: it reads the component's
//! `package.json` and writes `<name>-<version>.tgz` beside it.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde_json::Value;

use crate::error::ToolError;
use crate::tool::{ImageBuilder, PackageTool};

const FAKE_PROGRAM: &str = "fake-tool";

/// One recorded package tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    /// `build` in the given directory.
    Build {
        /// Component directory.
        dir: PathBuf,
    },
    /// `pack` in the given directory, with the manifest name seen at the time.
    Pack {
        /// Component directory.
        dir: PathBuf,
        /// `name` field of the manifest when packing.
        name: String,
    },
    /// `install` of a staging directory into a project.
    Install {
        /// Project receiving the packages.
        project_dir: PathBuf,
        /// File names found in the staging directory, sorted.
        artifacts: Vec<String>,
    },
    /// `uninstall` of a named package from a project.
    Uninstall {
        /// Project losing the package.
        project_dir: PathBuf,
        /// Package name.
        name: String,
    },
}

/// In-memory [`PackageTool`] double.
#[derive(Debug, Default)]
pub struct FakePackageTool {
    calls: Mutex<Vec<ToolCall>>,
    failing_builds: Vec<String>,
    failing_packs: Vec<String>,
    failing_installs: Vec<String>,
    failing_uninstalls: Vec<String>,
    slow_builds: Vec<(String, usize)>,
}

impl FakePackageTool {
    /// Creates a tool that succeeds at everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails `build` for directories whose path contains `fragment`.
    #[must_use]
    pub fn failing_build(mut self, fragment: impl Into<String>) -> Self {
        self.failing_builds.push(fragment.into());
        self
    }

    /// Fails `pack` for directories whose path contains `fragment`.
    #[must_use]
    pub fn failing_pack(mut self, fragment: impl Into<String>) -> Self {
        self.failing_packs.push(fragment.into());
        self
    }

    /// Fails `install` for projects whose path contains `fragment`.
    #[must_use]
    pub fn failing_install(mut self, fragment: impl Into<String>) -> Self {
        self.failing_installs.push(fragment.into());
        self
    }

    /// Makes `build` yield to the scheduler `yields` extra times for
    /// directories whose path contains `fragment`.
    #[must_use]
    pub fn slow_build(mut self, fragment: impl Into<String>, yields: usize) -> Self {
        self.slow_builds.push((fragment.into(), yields));
        self
    }

    /// Fails `uninstall` of the package called `name`.
    #[must_use]
    pub fn failing_uninstall(mut self, name: impl Into<String>) -> Self {
        self.failing_uninstalls.push(name.into());
        self
    }

    /// Returns a snapshot of the recorded invocations.
    #[must_use]
    pub fn calls(&self) -> Vec<ToolCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the recorded `install` invocations.
    #[must_use]
    pub fn installs(&self) -> Vec<ToolCall> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, ToolCall::Install { .. }))
            .collect()
    }

    /// Returns the package names passed to `uninstall`, in call order.
    #[must_use]
    pub fn uninstalled(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ToolCall::Uninstall { name, .. } => Some(name),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: ToolCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

impl PackageTool for FakePackageTool {
    async fn build(&self, dir: &Path) -> Result<(), ToolError> {
        tokio::task::yield_now().await;
        let rendered = dir.to_string_lossy();
        let extra_yields: usize = self
            .slow_builds
            .iter()
            .filter(|(fragment, _)| rendered.contains(fragment.as_str()))
            .map(|(_, yields)| *yields)
            .sum();
        for _ in 0..extra_yields {
            tokio::task::yield_now().await;
        }
        self.record(ToolCall::Build {
            dir: dir.to_path_buf(),
        });
        check(&self.failing_builds, dir, "run build")
    }

    async fn pack(&self, dir: &Path) -> Result<PathBuf, ToolError> {
        tokio::task::yield_now().await;
        let (name, version) = read_manifest_identity(dir)?;
        self.record(ToolCall::Pack {
            dir: dir.to_path_buf(),
            name: name.clone(),
        });
        check(&self.failing_packs, dir, "pack")?;

        let artifact = dir.join(format!("{name}-{version}.tgz"));
        std::fs::write(&artifact, name.as_bytes()).map_err(|err| io_error(&artifact, err))?;
        Ok(artifact)
    }

    async fn install(&self, project_dir: &Path, staging_dir: &Path) -> Result<(), ToolError> {
        tokio::task::yield_now().await;
        self.record(ToolCall::Install {
            project_dir: project_dir.to_path_buf(),
            artifacts: list_files(staging_dir)?,
        });
        check(&self.failing_installs, project_dir, "install")
    }

    async fn uninstall(&self, project_dir: &Path, name: &str) -> Result<(), ToolError> {
        tokio::task::yield_now().await;
        self.record(ToolCall::Uninstall {
            project_dir: project_dir.to_path_buf(),
            name: name.to_owned(),
        });
        if self.failing_uninstalls.iter().any(|failing| failing == name) {
            return Err(injected_failure("uninstall"));
        }
        Ok(())
    }
}

/// In-memory [`ImageBuilder`] double.
#[derive(Debug, Default)]
pub struct FakeImageBuilder {
    builds: Mutex<Vec<(PathBuf, String)>>,
    failing: Vec<String>,
}

impl FakeImageBuilder {
    /// Creates a builder that succeeds at everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails builds for directories whose path contains `fragment`.
    #[must_use]
    pub fn failing(mut self, fragment: impl Into<String>) -> Self {
        self.failing.push(fragment.into());
        self
    }

    /// Returns the recorded `(directory, tag)` pairs.
    #[must_use]
    pub fn builds(&self) -> Vec<(PathBuf, String)> {
        self.builds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ImageBuilder for FakeImageBuilder {
    async fn build(&self, dir: &Path, tag: &str) -> Result<(), ToolError> {
        tokio::task::yield_now().await;
        self.builds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((dir.to_path_buf(), tag.to_owned()));
        check(&self.failing, dir, "build")
    }
}

fn check(fragments: &[String], path: &Path, operation: &str) -> Result<(), ToolError> {
    let rendered = path.to_string_lossy();
    if fragments
        .iter()
        .any(|fragment| rendered.contains(fragment.as_str()))
    {
        return Err(injected_failure(operation));
    }
    Ok(())
}

fn injected_failure(operation: &str) -> ToolError {
    ToolError::NonZeroExit {
        program: String::from(FAKE_PROGRAM),
        args: operation.to_owned(),
        status: 1,
        stderr: String::from("injected failure"),
    }
}

fn io_error(path: &Path, err: std::io::Error) -> ToolError {
    ToolError::Io {
        path: path.to_path_buf(),
        source: std::sync::Arc::new(err),
    }
}

fn read_manifest_identity(dir: &Path) -> Result<(String, String), ToolError> {
    let path = dir.join(crate::packager::MANIFEST_FILE);
    let text = std::fs::read_to_string(&path).map_err(|err| io_error(&path, err))?;
    let manifest: Value = serde_json::from_str(&text).map_err(|err| ToolError::InvalidOutput {
        program: String::from(FAKE_PROGRAM),
        message: err.to_string(),
    })?;
    let field = |key: &str, fallback: &str| {
        manifest
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or(fallback)
            .to_owned()
    };
    Ok((field("name", "unnamed"), field("version", "0.0.0")))
}

fn list_files(dir: &Path) -> Result<Vec<String>, ToolError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(io_error(dir, err)),
    };
    let mut names = Vec::new();
    for entry in entries {
        let file_name = entry.map_err(|err| io_error(dir, err))?.file_name();
        names.push(file_name.to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}
