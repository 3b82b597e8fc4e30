//! Error types for configuration validation.

use thiserror::Error;

use crate::scale::Mode;

/// Result type for configuration validation.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that reject a configuration before the search starts.
///
/// Conditions the search recovers from (dead ends, exhausted stacks, the
/// safety counter) are reported on the result, not here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Requested zero notes.
    #[error("invalid length: {length} (must be at least 1)")]
    InvalidLength {
        /// The requested length.
        length: usize,
    },

    /// Register bounds inverted or outside the MIDI range.
    #[error("invalid register: [{min}, {max}] (bounds must be ordered and within 0-127)")]
    InvalidRegister {
        /// Lower bound.
        min: i32,
        /// Upper bound.
        max: i32,
    },

    /// Mode without generation support.
    #[error("unsupported mode: {0}")]
    UnsupportedMode(Mode),

    /// Tonic pitch class above 11.
    #[error("invalid tonic pitch class: {0} (must be 0-11)")]
    InvalidTonic(u8),

    /// Probability outside `[0, 1]` or not finite.
    #[error("invalid probability '{name}': {value} (must be within 0-1)")]
    InvalidProbability {
        /// Option name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    /// Note duration not a positive finite number.
    #[error("invalid note duration: {0} seconds")]
    InvalidDuration(f64),

    /// Maximum leap outside 1-7 diatonic steps.
    #[error("invalid max leap: {0} steps (must be 1-7)")]
    InvalidMaxLeap(u8),

    /// A degree mask selects no pitch inside the register.
    #[error("{mask} degrees {degrees} have no pitch within register [{register_min}, {register_max}]")]
    UnreachableDegrees {
        /// Which mask failed ("allowed", "start", "end", "start/end").
        mask: &'static str,
        /// The effective degree set, formatted.
        degrees: String,
        /// Widened register lower bound.
        register_min: i32,
        /// Widened register upper bound.
        register_max: i32,
    },

    /// Safety counter of zero.
    #[error("invalid attempt limit: max_attempts must be at least 1")]
    InvalidAttemptLimit,

    /// Any other invalid option.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Option name.
        name: String,
        /// Error message.
        message: String,
    },
}

impl ConfigError {
    /// Creates an invalid parameter error.
    pub fn invalid_param(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::InvalidLength { .. } => "MEL_001",
            ConfigError::InvalidRegister { .. } => "MEL_002",
            ConfigError::UnsupportedMode(_) => "MEL_003",
            ConfigError::InvalidTonic(_) => "MEL_004",
            ConfigError::InvalidProbability { .. } => "MEL_005",
            ConfigError::InvalidDuration(_) => "MEL_006",
            ConfigError::InvalidMaxLeap(_) => "MEL_007",
            ConfigError::UnreachableDegrees { .. } => "MEL_008",
            ConfigError::InvalidAttemptLimit => "MEL_009",
            ConfigError::InvalidParameter { .. } => "MEL_010",
        }
    }

    /// Error category for reporting.
    pub fn category(&self) -> &'static str {
        match self {
            ConfigError::UnreachableDegrees { .. } | ConfigError::InvalidRegister { .. } => {
                "register"
            }
            _ => "config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_param_helper() {
        let err = ConfigError::invalid_param("contour", "unknown shape");
        assert!(err.to_string().contains("contour"));
        assert!(err.to_string().contains("unknown shape"));
        assert_eq!(err.code(), "MEL_010");
    }

    #[test]
    fn test_unreachable_message() {
        let err = ConfigError::UnreachableDegrees {
            mask: "end",
            degrees: "{1}".to_string(),
            register_min: 61,
            register_max: 71,
        };
        assert_eq!(
            err.to_string(),
            "end degrees {1} have no pitch within register [61, 71]"
        );
        assert_eq!(err.category(), "register");
    }

    #[test]
    fn test_codes_are_unique() {
        let errors = [
            ConfigError::InvalidLength { length: 0 },
            ConfigError::InvalidRegister { min: 1, max: 0 },
            ConfigError::UnsupportedMode(Mode::Locrian),
            ConfigError::InvalidTonic(12),
            ConfigError::InvalidProbability {
                name: "x",
                value: 2.0,
            },
            ConfigError::InvalidDuration(0.0),
            ConfigError::InvalidMaxLeap(0),
            ConfigError::UnreachableDegrees {
                mask: "start",
                degrees: String::new(),
                register_min: 0,
                register_max: 0,
            },
            ConfigError::InvalidAttemptLimit,
            ConfigError::invalid_param("a", "b"),
        ];
        let mut codes: Vec<&str> = errors.iter().map(|e| e.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }
}
