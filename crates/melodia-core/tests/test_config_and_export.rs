//! Configuration loading, validation failures and MIDI export.

use melodia_core::{
    generate, to_midi_bytes, ConfigError, Contour, GenerationConfig, Mode, MovementPolicy,
};
use pretty_assertions::assert_eq;
use serde_json::json;

// ============================================================================
// JSON configuration
// ============================================================================

#[test]
fn test_partial_json_uses_defaults() {
    let config = GenerationConfig::from_json(r#"{"seed": 9, "mode": "dorian"}"#).unwrap();
    assert_eq!(config.seed, 9);
    assert_eq!(config.mode, Mode::Dorian);
    assert_eq!(config.length, 8);
    assert_eq!(config.register_min, 55);
    assert_eq!(config.register_max, 72);
    assert_eq!(config.max_attempts, 10_000);
    assert!(config.tendency_engine_enabled);
}

#[test]
fn test_json_enums_and_masks() {
    let value = json!({
        "contour": "inverted_arch",
        "movement": { "up_to_max_leap": { "max_steps": 3 } },
        "difficulty": "advanced",
        "allowed_end_degrees": [true, false, false, false, true, false, false]
    });
    let config: GenerationConfig = serde_json::from_value(value).unwrap();
    assert_eq!(config.contour, Contour::InvertedArch);
    assert_eq!(config.movement, MovementPolicy::UpToMaxLeap { max_steps: 3 });

    let resolved = config.validate().unwrap();
    assert_eq!(resolved.end_degrees.degrees(), vec![1, 5]);
    assert_eq!(resolved.max_steps, 3);
}

#[test]
fn test_stepwise_movement_from_json() {
    let config = GenerationConfig::from_json(r#"{"movement": "stepwise_only"}"#).unwrap();
    assert_eq!(config.movement, MovementPolicy::StepwiseOnly);
}

#[test]
fn test_unknown_field_rejected() {
    let err = GenerationConfig::from_json(r#"{"seed": 1, "tempo": 120}"#).unwrap_err();
    assert!(err.to_string().contains("unknown field"));
}

// ============================================================================
// Validation
// ============================================================================

fn code_of(config: GenerationConfig) -> &'static str {
    match generate(&config) {
        Err(err) => err.code(),
        Ok(_) => "ok",
    }
}

#[test]
fn test_validation_codes() {
    let base = GenerationConfig::default;
    assert_eq!(code_of(GenerationConfig { length: 0, ..base() }), "MEL_001");
    assert_eq!(
        code_of(GenerationConfig {
            register_min: 80,
            register_max: 60,
            ..base()
        }),
        "MEL_002"
    );
    assert_eq!(
        code_of(GenerationConfig {
            mode: Mode::Locrian,
            ..base()
        }),
        "MEL_003"
    );
    assert_eq!(
        code_of(GenerationConfig {
            tonic_pitch_class: 12,
            ..base()
        }),
        "MEL_004"
    );
    assert_eq!(
        code_of(GenerationConfig {
            tendency_resolve_probability: 1.5,
            ..base()
        }),
        "MEL_005"
    );
    assert_eq!(
        code_of(GenerationConfig {
            note_duration_seconds: 0.0,
            ..base()
        }),
        "MEL_006"
    );
    assert_eq!(
        code_of(GenerationConfig {
            movement: MovementPolicy::UpToMaxLeap { max_steps: 9 },
            ..base()
        }),
        "MEL_007"
    );
    assert_eq!(
        code_of(GenerationConfig {
            max_attempts: 0,
            ..base()
        }),
        "MEL_009"
    );
    assert_eq!(
        code_of(GenerationConfig {
            backtrack_budget: 0,
            ..base()
        }),
        "MEL_010"
    );
    assert_eq!(code_of(base()), "ok");
}

#[test]
fn test_start_mask_outside_pool_is_unreachable() {
    let config = GenerationConfig::builder()
        .allowed_degrees(&[2, 4, 6])
        .allowed_start_degrees(&[1])
        .build();
    let err = config.validate().unwrap_err();
    assert!(matches!(
        err,
        ConfigError::UnreachableDegrees { mask: "start", .. }
    ));
    assert_eq!(err.code(), "MEL_008");
    assert_eq!(err.category(), "register");
}

#[test]
fn test_single_note_needs_shared_start_and_end() {
    let config = GenerationConfig::builder()
        .length(1)
        .allowed_start_degrees(&[3])
        .allowed_end_degrees(&[1])
        .build();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::UnreachableDegrees {
            mask: "start/end",
            ..
        })
    ));
}

// ============================================================================
// MIDI export
// ============================================================================

#[test]
fn test_generated_line_exports_to_midi() {
    let config = GenerationConfig::builder().seed(77).length(8).build();
    let result = generate(&config).unwrap();
    let bytes = to_midi_bytes(&result.notes, 120.0).unwrap();

    let smf = midly::Smf::parse(&bytes).unwrap();
    assert_eq!(smf.header.format, midly::Format::SingleTrack);
    let note_ons: Vec<u8> = smf.tracks[0]
        .iter()
        .filter_map(|e| match e.kind {
            midly::TrackEventKind::Midi {
                message: midly::MidiMessage::NoteOn { key, .. },
                ..
            } => Some(key.as_int()),
            _ => None,
        })
        .collect();
    let expected: Vec<u8> = result.notes.iter().map(|n| n.pitch as u8).collect();
    assert_eq!(note_ons, expected);
}
