//! Generate command implementation
//!
//! Runs the search for one config and prints the line, optionally writing it
//! as a Standard MIDI File.

use anyhow::{anyhow, Result};
use colored::Colorize;
use melodia_core::note::pitch_to_note_name;
use melodia_core::{generate_traced, to_midi_bytes, GenerationResult, NoteEvent, TraceEvent};
use std::fs;
use std::process::ExitCode;

use super::emit_json;
use super::json_output::{error_codes, GenerateOutput, GenerateResult, JsonError, JsonNote};
use crate::input::{resolve_config, Overrides};

/// Default MIDI tempo in beats per minute.
pub const DEFAULT_TEMPO_BPM: f64 = 120.0;

/// Options for the generate command.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Config file (defaults when `None`)
    pub config_path: Option<String>,
    pub overrides: Overrides,
    /// Where to write the MIDI file, if anywhere
    pub midi_path: Option<String>,
    pub tempo_bpm: f64,
    /// Report every search event
    pub trace: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            config_path: None,
            overrides: Overrides::default(),
            midi_path: None,
            tempo_bpm: DEFAULT_TEMPO_BPM,
            trace: false,
        }
    }
}

/// Run the generate command.
///
/// # Returns
/// Exit code: 0 if a complete line was generated, 1 on errors or when the
/// safety counter cut the line short
pub fn run(options: &GenerateOptions, json_output: bool) -> Result<ExitCode> {
    if json_output {
        run_json(options)
    } else {
        run_human(options)
    }
}

/// Run generate with human-readable (colored) output.
fn run_human(options: &GenerateOptions) -> Result<ExitCode> {
    let loaded = resolve_config(options.config_path.as_deref(), &options.overrides)?;
    let source = match &loaded.source {
        Some(path) => path.display().to_string(),
        None => "(defaults)".to_string(),
    };
    println!("{} {}", "Generating:".cyan().bold(), source);
    println!("{} {}", "Seed:".dimmed(), loaded.config.seed);

    let trace = options.trace;
    let result = generate_traced(&loaded.config, &mut |event| {
        if trace {
            eprintln!("  {} {}", "trace".dimmed(), event);
        }
    })
    .map_err(|e| anyhow!("[{}] {}", e.code(), e))?;

    print_line(&result);
    print_summary(&result);

    if let Some(path) = &options.midi_path {
        write_midi(&result.notes, path, options.tempo_bpm)
            .map_err(|e| anyhow!("[{}] {}", e.code, e.message))?;
        println!("{} {}", "Wrote:".green().bold(), path);
    }

    if result.completed {
        println!("\n{} {} notes", "SUCCESS".green().bold(), result.notes.len());
        Ok(ExitCode::SUCCESS)
    } else {
        println!(
            "\n{} safety counter hit after {} attempts; line is partial",
            "INCOMPLETE".yellow().bold(),
            result.attempts
        );
        Ok(ExitCode::from(1))
    }
}

/// Run generate with machine-readable JSON output.
fn run_json(options: &GenerateOptions) -> Result<ExitCode> {
    let loaded = match resolve_config(options.config_path.as_deref(), &options.overrides) {
        Ok(loaded) => loaded,
        Err(e) => {
            let output = GenerateOutput::failure(vec![JsonError::from(&e)]);
            return emit_json(&output, false);
        }
    };

    let record = options.trace;
    let mut events: Vec<TraceEvent> = Vec::new();
    let generated = generate_traced(&loaded.config, &mut |event| {
        if record {
            events.push(event.clone());
        }
    });
    let result = match generated {
        Ok(result) => result,
        Err(e) => {
            let output = GenerateOutput::failure(vec![JsonError::from(&e)]);
            return emit_json(&output, false);
        }
    };

    if let Some(path) = &options.midi_path {
        if let Err(e) = write_midi(&result.notes, path, options.tempo_bpm) {
            return emit_json(&GenerateOutput::failure(vec![e]), false);
        }
    }

    let output = GenerateOutput::success(to_json_result(
        loaded.config.seed,
        &result,
        options.midi_path.clone(),
        record.then_some(events),
    ));
    let success = output.success;
    emit_json(&output, success)
}

/// Builds the JSON form of a finished run.
pub fn to_json_result(
    seed: u32,
    result: &GenerationResult,
    midi: Option<String>,
    trace: Option<Vec<TraceEvent>>,
) -> GenerateResult {
    GenerateResult {
        seed,
        fingerprint: result.fingerprint(),
        completed: result.completed,
        attempts: result.attempts,
        backtracks: result.backtracks,
        relaxations: result.relaxations,
        relaxed_from: result.relaxed_from,
        appended: result.appended,
        cadence_snapped: result.cadence_snapped,
        final_seed: result.final_seed,
        notes: result.notes.iter().map(JsonNote::from).collect(),
        midi,
        trace,
    }
}

/// Encodes the line as MIDI and writes it to `path`.
pub fn write_midi(notes: &[NoteEvent], path: &str, tempo_bpm: f64) -> Result<(), JsonError> {
    let bytes = to_midi_bytes(notes, tempo_bpm)
        .map_err(|e| JsonError::new(error_codes::MIDI_EXPORT, e.to_string()))?;
    fs::write(path, bytes).map_err(|e| {
        JsonError::new(
            error_codes::FILE_WRITE,
            format!("failed to write '{}': {}", path, e),
        )
    })?;
    log::debug!("wrote {} notes to {}", notes.len(), path);
    Ok(())
}

fn print_line(result: &GenerationResult) {
    println!("\n{}", "Line:".cyan().bold());
    let body = result.notes.len().saturating_sub(result.appended);
    for (index, note) in result.notes.iter().enumerate() {
        let marker = if index >= body {
            "+".yellow().to_string()
        } else {
            " ".to_string()
        };
        println!(
            "  {}{:>3}  {:<4} {:>3}  {:.3}s",
            marker,
            index + 1,
            pitch_to_note_name(note.pitch),
            note.pitch,
            note.duration_seconds
        );
    }
}

fn print_summary(result: &GenerationResult) {
    println!();
    println!(
        "{} {} attempts, {} backtracks",
        "Search:".dimmed(),
        result.attempts,
        result.backtracks
    );
    if result.appended > 0 {
        println!(
            "{} {} note(s) appended to resolve a tendency",
            "Appendix:".dimmed(),
            result.appended
        );
    }
    if result.relaxations > 0 {
        println!(
            "  {} constraints relaxed {} time(s) from note {} (final seed {})",
            "!".yellow(),
            result.relaxations,
            result.relaxed_from.map_or(0, |p| p + 1),
            result.final_seed
        );
    }
    if result.cadence_snapped {
        println!("  {} last note moved onto an allowed ending", "!".yellow());
    }
    println!("{} {}", "Fingerprint:".dimmed(), result.fingerprint());
}

#[cfg(test)]
mod tests {
    use super::*;
    use melodia_core::{generate, GenerationConfig};

    #[test]
    fn test_json_result_mirrors_run() {
        let config = GenerationConfig::builder().seed(12345).build();
        let result = generate(&config).unwrap();
        let json = to_json_result(12345, &result, None, None);
        assert_eq!(json.notes.len(), result.notes.len());
        assert_eq!(json.fingerprint, result.fingerprint());
        assert_eq!(json.notes[0].pitch, result.notes[0].pitch);

        let value = serde_json::to_value(&json).unwrap();
        assert!(value.get("trace").is_none());
        assert!(value.get("midi").is_none());
    }

    #[test]
    fn test_json_result_reports_relaxation_position() {
        let config = GenerationConfig::builder()
            .seed(3)
            .length(6)
            .allowed_degrees(&[1, 5])
            .build();
        let result = generate(&config).unwrap();
        let json = to_json_result(3, &result, None, None);
        let position = json.relaxed_from.unwrap();
        assert!(position < 6);

        let value = serde_json::to_value(&json).unwrap();
        assert_eq!(value["relaxed_from"], position);
    }

    #[test]
    fn test_write_midi_rejects_bad_tempo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("line.mid");
        let notes = [NoteEvent {
            pitch: 60,
            duration_seconds: 0.5,
        }];
        let err = write_midi(&notes, path.to_str().unwrap(), 0.0).unwrap_err();
        assert_eq!(err.code, error_codes::MIDI_EXPORT);
        assert!(!path.exists());
    }
}
