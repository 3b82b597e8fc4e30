//! JSON output types for machine-readable CLI output.
//!
//! Every command accepts `--json`; the payload is one of the `*Output` types
//! below, always carrying `success` and `errors` so callers can branch
//! without parsing human text.

use melodia_core::note::pitch_to_note_name;
use melodia_core::{ConfigError, NoteEvent, ResolvedConfig, TraceEvent};
use serde::Serialize;

use crate::input::InputError;

/// Error codes for CLI-level failures.
///
/// Config validation failures pass through their own `MEL_XXX` codes.
pub mod error_codes {
    /// MIDI export failed
    pub const MIDI_EXPORT: &str = "CLI_005";
    /// Writing an output file failed
    pub const FILE_WRITE: &str = "CLI_006";
}

/// A structured error in JSON output.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct JsonError {
    /// Stable error code (e.g., "CLI_001", "MEL_008")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Error category (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl JsonError {
    /// Creates a new error with code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            category: None,
        }
    }
}

impl From<&InputError> for JsonError {
    fn from(err: &InputError) -> Self {
        let mut json = JsonError::new(err.code(), err.to_string());
        json.category = Some("input".to_string());
        json
    }
}

impl From<&ConfigError> for JsonError {
    fn from(err: &ConfigError) -> Self {
        let mut json = JsonError::new(err.code(), err.to_string());
        json.category = Some(err.category().to_string());
        json
    }
}

/// One note of a generated line.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct JsonNote {
    pub pitch: i32,
    pub name: String,
    pub duration_seconds: f64,
}

impl From<&NoteEvent> for JsonNote {
    fn from(note: &NoteEvent) -> Self {
        Self {
            pitch: note.pitch,
            name: pitch_to_note_name(note.pitch),
            duration_seconds: note.duration_seconds,
        }
    }
}

/// `generate --json` payload.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateOutput {
    pub success: bool,
    pub errors: Vec<JsonError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<GenerateResult>,
}

impl GenerateOutput {
    /// Creates a generate output for a finished run.
    pub fn success(result: GenerateResult) -> Self {
        Self {
            success: result.completed,
            errors: Vec::new(),
            result: Some(result),
        }
    }

    /// Creates a failed generate output.
    pub fn failure(errors: Vec<JsonError>) -> Self {
        Self {
            success: false,
            errors,
            result: None,
        }
    }
}

/// A generated line and its search statistics.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateResult {
    pub seed: u32,
    pub fingerprint: String,
    pub completed: bool,
    pub attempts: u32,
    pub backtracks: u32,
    pub relaxations: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relaxed_from: Option<usize>,
    pub appended: usize,
    pub cadence_snapped: bool,
    pub final_seed: u32,
    pub notes: Vec<JsonNote>,
    /// Path of the written MIDI file (if requested)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub midi: Option<String>,
    /// Search events (with `--trace`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Vec<TraceEvent>>,
}

/// `validate --json` payload.
#[derive(Debug, Clone, Serialize)]
pub struct ValidateOutput {
    pub success: bool,
    pub errors: Vec<JsonError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ValidateResult>,
}

impl ValidateOutput {
    /// Creates a successful validate output.
    pub fn success(result: ValidateResult) -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            result: Some(result),
        }
    }

    /// Creates a failed validate output.
    pub fn failure(errors: Vec<JsonError>) -> Self {
        Self {
            success: false,
            errors,
            result: None,
        }
    }
}

/// The resolved form of a valid config.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ValidateResult {
    pub mode: String,
    pub tonic_pitch_class: u8,
    pub register_min: i32,
    pub register_max: i32,
    pub length: usize,
    pub max_steps: i32,
    pub contour: String,
    pub start_degrees: Vec<u8>,
    pub end_degrees: Vec<u8>,
    pub pool: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_hash: Option<String>,
}

impl ValidateResult {
    /// Builds the summary from a resolved config.
    pub fn from_resolved(resolved: &ResolvedConfig, source_hash: Option<String>) -> Self {
        Self {
            mode: resolved.scale.mode().to_string(),
            tonic_pitch_class: resolved.scale.tonic(),
            register_min: resolved.register_min,
            register_max: resolved.register_max,
            length: resolved.length,
            max_steps: resolved.max_steps,
            contour: format!("{:?}", resolved.contour),
            start_degrees: resolved.start_degrees.degrees(),
            end_degrees: resolved.end_degrees.degrees(),
            pool: resolved.pool.degrees(),
            source_hash,
        }
    }
}

/// `verify --json` payload.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyOutput {
    pub success: bool,
    pub errors: Vec<JsonError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<VerifyResult>,
}

impl VerifyOutput {
    /// Creates a verify output; succeeds only when no seed failed.
    pub fn from_result(result: VerifyResult) -> Self {
        Self {
            success: result.passed(),
            errors: Vec::new(),
            result: Some(result),
        }
    }

    /// Creates a failed verify output (errors before any seed ran).
    pub fn failure(errors: Vec<JsonError>) -> Self {
        Self {
            success: false,
            errors,
            result: None,
        }
    }
}

/// Aggregate of a multi-seed verification run.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct VerifyResult {
    pub first_seed: u32,
    pub seeds_checked: u32,
    pub incomplete: u32,
    pub relaxed: u32,
    pub appended: u32,
    pub failures: Vec<SeedFailure>,
}

impl VerifyResult {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A seed whose line broke an invariant or did not complete.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SeedFailure {
    pub seed: u32,
    pub completed: bool,
    pub violations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use melodia_core::GenerationConfig;

    #[test]
    fn test_error_from_config_error() {
        let err = GenerationConfig::builder()
            .length(0)
            .build()
            .validate()
            .unwrap_err();
        let json = JsonError::from(&err);
        assert_eq!(json.code, "MEL_001");
        assert_eq!(json.category.as_deref(), Some("config"));
    }

    #[test]
    fn test_note_carries_name() {
        let note = JsonNote::from(&NoteEvent {
            pitch: 67,
            duration_seconds: 0.5,
        });
        assert_eq!(note.name, "G4");
        let value = serde_json::to_value(&note).unwrap();
        assert_eq!(value["pitch"], 67);
    }

    #[test]
    fn test_validate_result_summary() {
        let resolved = GenerationConfig::builder()
            .allowed_end_degrees(&[1, 5])
            .build()
            .validate()
            .unwrap();
        let summary = ValidateResult::from_resolved(&resolved, None);
        assert_eq!(summary.mode, "ionian");
        assert_eq!(summary.start_degrees, vec![1, 3, 5]);
        assert_eq!(summary.end_degrees, vec![1, 5]);
        assert_eq!(summary.pool, vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(summary.max_steps, 2);

        let value = serde_json::to_value(&summary).unwrap();
        assert!(value.get("source_hash").is_none());
    }
}
