//! Binary entrypoint of the experiment assembler.
//!
//! Configuration comes from `FOUNDRY_*` environment variables, an optional
//! configuration file, and flags such as `--plugins-dir` and `--core-dir`.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stderr = io::stderr().lock();
    foundry::run(std::env::args_os(), &mut stderr)
}
