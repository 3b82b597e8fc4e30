//! Generation configuration and up-front validation.
//!
//! [`GenerationConfig`] is the immutable input of a generation run. It is a plain
//! serde value so it can be loaded from JSON; [`GenerationConfig::validate`]
//! turns it into a [`ResolvedConfig`] with defaults applied, the register
//! widened, and the scale context built.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::rng::{create_rng, derive_component_seed, unit};
use crate::scale::{DegreeMask, Mode, ScaleContext, DEGREE_COUNT};

/// Default safety counter: position-advancement attempts per run.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10_000;

/// Default number of backtracks allowed without new progress before relaxing.
pub const DEFAULT_BACKTRACK_BUDGET: u32 = 256;

/// Minimum register span in semitones after widening.
pub const MIN_REGISTER_SPAN: i32 = 6;

/// Highest representable pitch.
pub const MAX_PITCH: i32 = 127;

/// Difficulty tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyTier {
    /// Steps of one or two degrees.
    #[default]
    Beginner,
    /// Leaps up to four degrees.
    Intermediate,
    /// Leaps up to the octave.
    Advanced,
}

impl DifficultyTier {
    /// Largest diatonic step this tier ever produces.
    pub fn max_steps(self) -> i32 {
        match self {
            DifficultyTier::Beginner => 2,
            DifficultyTier::Intermediate => 4,
            DifficultyTier::Advanced => 7,
        }
    }
}

/// Desired overall melodic shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Contour {
    /// No directional preference.
    #[default]
    Any,
    Rising,
    Falling,
    /// Up through the first half, down through the second.
    Arch,
    /// Down through the first half, up through the second.
    InvertedArch,
    /// One of the four shaped contours, picked from the seed.
    RandomlyChosen,
}

impl Contour {
    const SHAPED: [Contour; 4] = [
        Contour::Rising,
        Contour::Falling,
        Contour::Arch,
        Contour::InvertedArch,
    ];

    /// Preferred direction at `position` of a `length`-note line:
    /// `1` up, `-1` down, `0` none.
    pub fn direction_at(self, position: usize, length: usize) -> i32 {
        let first_half = length <= 1 || (position as f64) < (length - 1) as f64 / 2.0;
        match self {
            Contour::Any | Contour::RandomlyChosen => 0,
            Contour::Rising => 1,
            Contour::Falling => -1,
            Contour::Arch => {
                if first_half {
                    1
                } else {
                    -1
                }
            }
            Contour::InvertedArch => {
                if first_half {
                    -1
                } else {
                    1
                }
            }
        }
    }
}

/// Which diatonic step sizes the candidate builder may consider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementPolicy {
    /// Only single diatonic steps.
    StepwiseOnly,
    /// Steps of 1 up to `max_steps`.
    UpToMaxLeap {
        /// Largest diatonic distance, 1-7.
        max_steps: u8,
    },
}

impl Default for MovementPolicy {
    fn default() -> Self {
        MovementPolicy::UpToMaxLeap { max_steps: 4 }
    }
}

impl MovementPolicy {
    pub fn max_steps(self) -> i32 {
        match self {
            MovementPolicy::StepwiseOnly => 1,
            MovementPolicy::UpToMaxLeap { max_steps } => max_steps as i32,
        }
    }
}

/// Every recognized generation option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
    /// Fixes the pseudo-random stream and all relaxation sub-seeds.
    pub seed: u32,
    /// Target note count.
    pub length: usize,
    /// Duration applied to every note.
    pub note_duration_seconds: f64,
    pub mode: Mode,
    /// Pitch class of degree 1 (0 = C).
    pub tonic_pitch_class: u8,
    /// Inclusive lower pitch bound.
    pub register_min: i32,
    /// Inclusive upper pitch bound.
    pub register_max: i32,
    pub difficulty: DifficultyTier,
    pub contour: Contour,
    pub movement: MovementPolicy,
    /// Probability that a leap is answered by its resolving step right away.
    pub immediate_leap_resolution_probability: f64,
    /// Unset means {1, 3, 5}.
    pub allowed_start_degrees: DegreeMask,
    /// Unset means {1}.
    pub allowed_end_degrees: DegreeMask,
    /// Unset means unrestricted.
    pub allowed_degrees: DegreeMask,
    pub tendency_engine_enabled: bool,
    pub tendency_resolve_probability: f64,
    pub allow_small_detours: bool,
    /// Safety counter on position-advancement attempts.
    pub max_attempts: u32,
    /// Backtracks tolerated without reaching a new deepest position.
    pub backtrack_budget: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            length: 8,
            note_duration_seconds: 0.5,
            mode: Mode::Ionian,
            tonic_pitch_class: 0,
            register_min: 55,
            register_max: 72,
            difficulty: DifficultyTier::Beginner,
            contour: Contour::Any,
            movement: MovementPolicy::default(),
            immediate_leap_resolution_probability: 0.5,
            allowed_start_degrees: DegreeMask::default(),
            allowed_end_degrees: DegreeMask::default(),
            allowed_degrees: DegreeMask::default(),
            tendency_engine_enabled: true,
            tendency_resolve_probability: 0.7,
            allow_small_detours: true,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backtrack_budget: DEFAULT_BACKTRACK_BUDGET,
        }
    }
}

/// Start degrees used when the start mask is unset.
pub fn default_start_degrees() -> DegreeMask {
    DegreeMask::from_degrees(&[1, 3, 5])
}

/// End degrees used when the end mask is unset.
pub fn default_end_degrees() -> DegreeMask {
    DegreeMask::from_degrees(&[1])
}

impl GenerationConfig {
    /// Creates a builder starting from the defaults.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder::new()
    }

    /// Parses a config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serializes the config to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Checks every option and resolves defaults.
    pub fn validate(&self) -> ConfigResult<ResolvedConfig> {
        if self.length < 1 {
            return Err(ConfigError::InvalidLength {
                length: self.length,
            });
        }
        if !self.note_duration_seconds.is_finite() || self.note_duration_seconds <= 0.0 {
            return Err(ConfigError::InvalidDuration(self.note_duration_seconds));
        }
        if !self.mode.is_supported() {
            return Err(ConfigError::UnsupportedMode(self.mode));
        }
        if self.tonic_pitch_class > 11 {
            return Err(ConfigError::InvalidTonic(self.tonic_pitch_class));
        }
        check_probability(
            "immediate_leap_resolution_probability",
            self.immediate_leap_resolution_probability,
        )?;
        check_probability(
            "tendency_resolve_probability",
            self.tendency_resolve_probability,
        )?;
        if let MovementPolicy::UpToMaxLeap { max_steps } = self.movement {
            if !(1..=DEGREE_COUNT as u8).contains(&max_steps) {
                return Err(ConfigError::InvalidMaxLeap(max_steps));
            }
        }
        if self.max_attempts < 1 {
            return Err(ConfigError::InvalidAttemptLimit);
        }
        if self.backtrack_budget < 1 {
            return Err(ConfigError::invalid_param(
                "backtrack_budget",
                "must be at least 1",
            ));
        }
        if self.register_min > self.register_max
            || self.register_min < 0
            || self.register_max > MAX_PITCH
        {
            return Err(ConfigError::InvalidRegister {
                min: self.register_min,
                max: self.register_max,
            });
        }

        let (register_min, register_max) = widen_register(self.register_min, self.register_max);
        let scale = ScaleContext::with_tonic(self.mode, self.tonic_pitch_class);

        let pool_restricted = !self.allowed_degrees.is_unset();
        let pool = self.allowed_degrees.or_default(DegreeMask::ALL);
        let start_degrees = self
            .allowed_start_degrees
            .or_default(default_start_degrees())
            .intersect(&pool);
        let end_degrees = self
            .allowed_end_degrees
            .or_default(default_end_degrees())
            .intersect(&pool);

        let reachable = |mask: &'static str, degrees: &DegreeMask| -> ConfigResult<()> {
            if scale
                .pitches_in_register(degrees, register_min, register_max)
                .is_empty()
            {
                return Err(ConfigError::UnreachableDegrees {
                    mask,
                    degrees: degrees.to_string(),
                    register_min,
                    register_max,
                });
            }
            Ok(())
        };
        reachable("allowed", &pool)?;
        reachable("start", &start_degrees)?;
        reachable("end", &end_degrees)?;
        if self.length == 1 {
            reachable("start/end", &start_degrees.intersect(&end_degrees))?;
        }

        let contour = match self.contour {
            Contour::RandomlyChosen => {
                let mut rng = create_rng(derive_component_seed(self.seed, "contour"));
                let idx = (unit(&mut rng) * Contour::SHAPED.len() as f64) as usize;
                Contour::SHAPED[idx.min(Contour::SHAPED.len() - 1)]
            }
            other => other,
        };

        Ok(ResolvedConfig {
            scale,
            length: self.length,
            register_min,
            register_max,
            start_degrees,
            end_degrees,
            pool,
            pool_restricted,
            max_steps: self.movement.max_steps().min(self.difficulty.max_steps()),
            difficulty: self.difficulty,
            contour,
        })
    }
}

fn check_probability(name: &'static str, value: f64) -> ConfigResult<()> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::InvalidProbability { name, value });
    }
    Ok(())
}

/// Widens `[min, max]` symmetrically to at least [`MIN_REGISTER_SPAN`]
/// semitones, shifting back inside 0-127 when widening crosses an edge.
pub fn widen_register(min: i32, max: i32) -> (i32, i32) {
    let span = max - min;
    if span >= MIN_REGISTER_SPAN {
        return (min, max);
    }
    let deficit = MIN_REGISTER_SPAN - span;
    let mut lo = min - deficit / 2;
    let mut hi = max + (deficit - deficit / 2);
    if lo < 0 {
        hi -= lo;
        lo = 0;
    }
    if hi > MAX_PITCH {
        lo -= hi - MAX_PITCH;
        hi = MAX_PITCH;
    }
    (lo, hi)
}

/// A validated config with every default applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub scale: ScaleContext,
    pub length: usize,
    /// Widened lower bound.
    pub register_min: i32,
    /// Widened upper bound.
    pub register_max: i32,
    /// Effective start set, already intersected with the pool.
    pub start_degrees: DegreeMask,
    /// Effective end set, already intersected with the pool.
    pub end_degrees: DegreeMask,
    /// Allowed-degree pool; every degree when unrestricted.
    pub pool: DegreeMask,
    pub pool_restricted: bool,
    /// `min(movement policy, difficulty tier)`.
    pub max_steps: i32,
    pub difficulty: DifficultyTier,
    /// Concrete contour (never `RandomlyChosen`).
    pub contour: Contour,
}

impl ResolvedConfig {
    /// Midpoint of the widened register.
    pub fn center(&self) -> f64 {
        (self.register_min + self.register_max) as f64 / 2.0
    }

    pub fn in_register(&self, pitch: i32) -> bool {
        (self.register_min..=self.register_max).contains(&pitch)
    }

    /// Direction of a single step that moves `pitch` toward the register
    /// center. At the exact center this is the reverse of `fallback`.
    pub fn toward_center(&self, pitch: i32, fallback: i32) -> i32 {
        let center = self.center();
        let p = pitch as f64;
        if p > center {
            -1
        } else if p < center {
            1
        } else if fallback > 0 {
            -1
        } else {
            1
        }
    }
}

/// Builder for [`GenerationConfig`].
#[derive(Debug, Clone, Default)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    /// Creates a builder holding the default config.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(mut self, seed: u32) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn length(mut self, length: usize) -> Self {
        self.config.length = length;
        self
    }

    pub fn note_duration_seconds(mut self, seconds: f64) -> Self {
        self.config.note_duration_seconds = seconds;
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn tonic_pitch_class(mut self, pc: u8) -> Self {
        self.config.tonic_pitch_class = pc;
        self
    }

    /// Sets both register bounds.
    pub fn register(mut self, min: i32, max: i32) -> Self {
        self.config.register_min = min;
        self.config.register_max = max;
        self
    }

    pub fn difficulty(mut self, tier: DifficultyTier) -> Self {
        self.config.difficulty = tier;
        self
    }

    pub fn contour(mut self, contour: Contour) -> Self {
        self.config.contour = contour;
        self
    }

    pub fn movement(mut self, policy: MovementPolicy) -> Self {
        self.config.movement = policy;
        self
    }

    pub fn immediate_leap_resolution_probability(mut self, p: f64) -> Self {
        self.config.immediate_leap_resolution_probability = p;
        self
    }

    pub fn allowed_start_degrees(mut self, degrees: &[u8]) -> Self {
        self.config.allowed_start_degrees = DegreeMask::from_degrees(degrees);
        self
    }

    pub fn allowed_end_degrees(mut self, degrees: &[u8]) -> Self {
        self.config.allowed_end_degrees = DegreeMask::from_degrees(degrees);
        self
    }

    pub fn allowed_degrees(mut self, degrees: &[u8]) -> Self {
        self.config.allowed_degrees = DegreeMask::from_degrees(degrees);
        self
    }

    /// Configures the tendency engine in one call.
    pub fn tendency(mut self, enabled: bool, resolve_probability: f64, small_detours: bool) -> Self {
        self.config.tendency_engine_enabled = enabled;
        self.config.tendency_resolve_probability = resolve_probability;
        self.config.allow_small_detours = small_detours;
        self
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    pub fn backtrack_budget(mut self, budget: u32) -> Self {
        self.config.backtrack_budget = budget;
        self
    }

    pub fn build(self) -> GenerationConfig {
        self.config
    }
}
