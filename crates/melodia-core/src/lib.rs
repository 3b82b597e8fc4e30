//! Melodia Core - Deterministic Constraint-Driven Melodic Line Generation
//!
//! This crate generates single-voice melodic lines: a sequence of pitched,
//! timed notes that stays inside a configured scale, register and pitch-class
//! pool, starts and ends on allowed scale degrees, resolves leaps by step,
//! and resolves tendency tones onto their targets.
//!
//! # Determinism
//!
//! Generation is fully deterministic. The same configuration (seed included)
//! always produces the same line. This is achieved through:
//!
//! - PCG32 random number generator (seeded via BLAKE3 hash derivation)
//! - A fixed candidate order and fixed-order weight arithmetic
//! - Derived sub-seeds for relaxation and contour selection
//!
//! # Example
//!
//! ```
//! use melodia_core::{generate, DifficultyTier, GenerationConfig, Mode};
//!
//! let config = GenerationConfig::builder()
//!     .seed(12345)
//!     .length(6)
//!     .mode(Mode::Ionian)
//!     .difficulty(DifficultyTier::Beginner)
//!     .register(55, 72)
//!     .build();
//!
//! let result = generate(&config).unwrap();
//! assert!(result.completed);
//! println!("{:?} ({})", result.pitches(), result.fingerprint());
//! ```
//!
//! # Module Structure
//!
//! - [`scale`]: Modes, degree masks and pitch/degree mapping
//! - [`config`]: Generation options, validation and the resolved form
//! - [`candidates`]: Legal next-note enumeration
//! - [`weighting`]: Relative probabilities for candidates
//! - [`tendency`]: Tendency-tone obligation queue
//! - [`cadence`]: Approach bias, final filter and safety net
//! - [`search`]: Backtracking controller and entry points
//! - [`analysis`]: Post-hoc invariant checker
//! - [`midi`]: Standard MIDI file export
//! - [`note`]: Note name conversion

pub mod analysis;
pub mod cadence;
pub mod candidates;
pub mod config;
pub mod error;
pub mod midi;
pub mod note;
pub mod rng;
pub mod scale;
pub mod search;
pub mod tendency;
pub mod trace;
pub mod weighting;

pub use analysis::{check_line, LineReport, Violation};
pub use config::{
    Contour, DifficultyTier, GenerationConfig, GenerationConfigBuilder, MovementPolicy,
    ResolvedConfig,
};
pub use error::{ConfigError, ConfigResult};
pub use midi::{to_midi_bytes, ExportError};
pub use scale::{DegreeMask, Mode, ScaleContext};
pub use search::{generate, generate_traced, GenerationResult, NoteEvent};
pub use trace::TraceEvent;

/// Generator identifier recorded alongside exported lines.
pub const GENERATOR_ID: &str = concat!("melodia/", env!("CARGO_PKG_VERSION"));
