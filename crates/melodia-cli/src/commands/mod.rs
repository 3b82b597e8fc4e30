//! CLI command implementations

pub mod generate;
pub mod json_output;
pub mod validate;
pub mod verify;

use anyhow::Result;
use serde::Serialize;
use std::process::ExitCode;

/// Prints a JSON payload and maps `success` to the exit code.
pub(crate) fn emit_json<T: Serialize>(output: &T, success: bool) -> Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(output)?);
    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}
