//! Subprocess-backed implementations of the tool seams.
//!
//! [`NpmTool`] implements [`PackageTool`] and [`DockerBuilder`] implements
//! [`ImageBuilder`] by spawning the configured executables with standard
//! input closed and standard output and error captured. A non-zero exit
//! status becomes [`ToolError::NonZeroExit`] carrying the trimmed stderr so
//! the failing command can be diagnosed from a single error value.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Instant;

use tokio::process::Command;
use tracing::debug;

use crate::error::ToolError;
use crate::tool::{ImageBuilder, PackageTool};

/// Tracing target for tool process operations.
const PROCESS_TARGET: &str = "foundry_plugins::process";

/// Extension of the artefacts produced by `npm pack`.
const PACKAGE_EXTENSION: &str = "tgz";

/// Package tool driving an npm-compatible executable.
///
/// # Example
///
/// ```rust,no_run
/// use foundry_plugins::process::NpmTool;
///
/// let tool = NpmTool::new("npm");
/// assert_eq!(tool.program(), "npm");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NpmTool {
    program: String,
}

impl NpmTool {
    /// Creates a tool invoking `program`.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Returns the executable name.
    #[must_use]
    pub const fn program(&self) -> &str {
        self.program.as_str()
    }
}

impl PackageTool for NpmTool {
    async fn build(&self, dir: &Path) -> Result<(), ToolError> {
        run_tool(&self.program, &args(["run", "build", "--if-present"]), dir).await?;
        Ok(())
    }

    async fn pack(&self, dir: &Path) -> Result<PathBuf, ToolError> {
        let stdout = run_tool(&self.program, &args(["pack"]), dir).await?;
        let file_name = artifact_name(&stdout).ok_or_else(|| ToolError::InvalidOutput {
            program: self.program.clone(),
            message: String::from("pack did not report an artefact file name"),
        })?;
        Ok(dir.join(file_name))
    }

    async fn install(&self, project_dir: &Path, staging_dir: &Path) -> Result<(), ToolError> {
        let mut install_args = args(["install"]);
        install_args.extend(staged_artifacts(staging_dir).await?.into_iter().map(OsString::from));
        run_tool(&self.program, &install_args, project_dir).await?;
        Ok(())
    }

    async fn uninstall(&self, project_dir: &Path, name: &str) -> Result<(), ToolError> {
        run_tool(&self.program, &args(["uninstall", name]), project_dir).await?;
        Ok(())
    }
}

/// Image builder driving a docker-compatible executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerBuilder {
    program: String,
}

impl DockerBuilder {
    /// Creates a builder invoking `program`.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Returns the executable name.
    #[must_use]
    pub const fn program(&self) -> &str {
        self.program.as_str()
    }
}

impl ImageBuilder for DockerBuilder {
    async fn build(&self, dir: &Path, tag: &str) -> Result<(), ToolError> {
        let mut build_args = args(["build", "-t", tag]);
        build_args.push(dir.as_os_str().to_owned());
        run_tool(&self.program, &build_args, dir).await?;
        Ok(())
    }
}

fn args<'a>(items: impl IntoIterator<Item = &'a str>) -> Vec<OsString> {
    items.into_iter().map(OsString::from).collect()
}

/// Picks the artefact file name from `pack` output: the last non-empty line.
fn artifact_name(stdout: &str) -> Option<&str> {
    stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
}

/// Lists the packaged artefacts in `staging_dir`, sorted by path. A missing
/// directory holds no artefacts.
async fn staged_artifacts(staging_dir: &Path) -> Result<Vec<PathBuf>, ToolError> {
    let io_error = |source: std::io::Error| ToolError::Io {
        path: staging_dir.to_path_buf(),
        source: Arc::new(source),
    };

    let mut entries = match tokio::fs::read_dir(staging_dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(io_error(err)),
    };

    let mut artifacts = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
        let path = entry.path();
        if path.extension() == Some(OsStr::new(PACKAGE_EXTENSION)) {
            artifacts.push(path);
        }
    }
    artifacts.sort();
    Ok(artifacts)
}

/// Runs `program` with `args` inside `cwd` and returns its standard output.
pub(crate) async fn run_tool(
    program: &str,
    args: &[OsString],
    cwd: &Path,
) -> Result<String, ToolError> {
    let rendered_args = render_args(args);
    debug!(
        target: PROCESS_TARGET,
        program,
        args = %rendered_args,
        cwd = %cwd.display(),
        "spawning tool process"
    );

    let start = Instant::now();
    let output = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|err| ToolError::Spawn {
            program: program.to_owned(),
            source: Arc::new(err),
        })?;

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
    debug!(
        target: PROCESS_TARGET,
        program,
        status = ?output.status,
        elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        stderr = %stderr,
        "tool process exited"
    );

    if !output.status.success() {
        return Err(ToolError::NonZeroExit {
            program: program.to_owned(),
            args: rendered_args,
            status: output.status.code().unwrap_or(-1),
            stderr,
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn render_args(args: &[OsString]) -> String {
    args.iter()
        .map(|arg| arg.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}
