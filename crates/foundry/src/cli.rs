//! Command-line driver behind the `foundry` binary.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use foundry_config::Config;
use ortho_config::OrthoConfig;
use thiserror::Error;
use tracing::error;

use crate::error::AssemblyError;
use crate::orchestrator::RunSummary;
use crate::telemetry::{self, TelemetryError};

const CLI_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::cli");

#[derive(Debug, Error)]
enum CliError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("failed to start the async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
}

/// Loads configuration from `args` and the environment, initialises
/// telemetry, and runs one assembly on a single-threaded runtime.
///
/// Failures are written to `stderr` as one line and mapped to
/// [`ExitCode::FAILURE`].
pub fn run<I, E>(args: I, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    E: Write,
{
    match execute(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            if matches!(err, CliError::Assembly(_)) {
                error!(target: CLI_TARGET, error = %err, "assembly failed");
            }
            let _ = writeln!(stderr, "{err}");
            ExitCode::FAILURE
        }
    }
}

fn execute<I>(args: I) -> Result<RunSummary, CliError>
where
    I: IntoIterator<Item = OsString>,
{
    let config = Config::load_from_iter(args).map_err(CliError::LoadConfiguration)?;
    telemetry::initialise(&config)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    let summary = runtime.block_on(crate::prepare(
        config.plugins_dir(),
        config.core_dir(),
        &config,
    ))?;
    Ok(summary)
}
