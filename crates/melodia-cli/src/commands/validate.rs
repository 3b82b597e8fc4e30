//! Validate command implementation
//!
//! Checks a config without generating and shows what it resolves to.

use anyhow::Result;
use colored::Colorize;
use melodia_core::note::pitch_to_note_name;
use std::process::ExitCode;

use super::emit_json;
use super::json_output::{JsonError, ValidateOutput, ValidateResult};
use crate::input::{resolve_config, Overrides};

/// Run the validate command
///
/// # Arguments
/// * `config_path` - Path to the config file (defaults when `None`)
/// * `overrides` - Command-line overrides
/// * `json_output` - Whether to output machine-readable JSON diagnostics
///
/// # Returns
/// Exit code: 0 if valid, 1 if invalid
pub fn run(config_path: Option<&str>, overrides: &Overrides, json_output: bool) -> Result<ExitCode> {
    if json_output {
        run_json(config_path, overrides)
    } else {
        run_human(config_path, overrides)
    }
}

/// Run validate with human-readable (colored) output
fn run_human(config_path: Option<&str>, overrides: &Overrides) -> Result<ExitCode> {
    println!(
        "{} {}",
        "Validating:".cyan().bold(),
        config_path.unwrap_or("(defaults)")
    );

    let loaded = resolve_config(config_path, overrides)?;
    if let Some(hash) = &loaded.source_hash {
        println!("{} {}", "Source hash:".dimmed(), hash);
    }

    let resolved = match loaded.config.validate() {
        Ok(resolved) => resolved,
        Err(e) => {
            println!(
                "\n{} [{}] {}",
                "INVALID".red().bold(),
                e.code().dimmed(),
                e
            );
            return Ok(ExitCode::from(1));
        }
    };

    let summary = ValidateResult::from_resolved(&resolved, loaded.source_hash.clone());
    println!();
    println!(
        "{} {} (tonic pitch class {})",
        "Mode:".dimmed(),
        summary.mode,
        summary.tonic_pitch_class
    );
    println!(
        "{} {}-{} ({}-{})",
        "Register:".dimmed(),
        pitch_to_note_name(summary.register_min),
        pitch_to_note_name(summary.register_max),
        summary.register_min,
        summary.register_max
    );
    if (summary.register_min, summary.register_max)
        != (loaded.config.register_min, loaded.config.register_max)
    {
        println!(
            "  {} widened from {}-{}",
            "!".yellow(),
            loaded.config.register_min,
            loaded.config.register_max
        );
    }
    println!("{} {}", "Length:".dimmed(), summary.length);
    println!("{} {}", "Max step:".dimmed(), summary.max_steps);
    println!("{} {}", "Contour:".dimmed(), summary.contour);
    println!("{} {}", "Start degrees:".dimmed(), resolved.start_degrees);
    println!("{} {}", "End degrees:".dimmed(), resolved.end_degrees);
    println!("{} {}", "Pool:".dimmed(), resolved.pool);

    println!("\n{} config is valid", "SUCCESS".green().bold());
    Ok(ExitCode::SUCCESS)
}

/// Run validate with machine-readable JSON output
fn run_json(config_path: Option<&str>, overrides: &Overrides) -> Result<ExitCode> {
    let output = match resolve_config(config_path, overrides) {
        Err(e) => ValidateOutput::failure(vec![JsonError::from(&e)]),
        Ok(loaded) => match loaded.config.validate() {
            Ok(resolved) => ValidateOutput::success(ValidateResult::from_resolved(
                &resolved,
                loaded.source_hash,
            )),
            Err(e) => ValidateOutput::failure(vec![JsonError::from(&e)]),
        },
    };
    let success = output.success;
    emit_json(&output, success)
}
