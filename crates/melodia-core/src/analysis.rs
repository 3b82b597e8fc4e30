//! Post-hoc invariant checker for generated lines.
//!
//! Re-derives the line invariants from a finished [`GenerationResult`] so the
//! CLI `verify` command and the test suites can audit output without looking
//! inside the search.

use std::fmt;

use serde::Serialize;

use crate::candidates::is_leap;
use crate::config::ResolvedConfig;
use crate::search::GenerationResult;

/// A broken invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    OutOfScale { position: usize, pitch: i32 },
    OutOfRegister { position: usize, pitch: i32 },
    OutsidePool { position: usize, degree: u8 },
    BadStart { degree: Option<u8> },
    BadEnd { degree: Option<u8> },
    /// The note after a leap is not the single resolving step.
    UnresolvedLeap {
        position: usize,
        expected: i32,
        actual: Option<i32>,
    },
    StepTooLarge { position: usize, steps: i32, max: i32 },
    TooShort { expected: usize, actual: usize },
    TooLong { max: usize, actual: usize },
}

impl Violation {
    /// Violations that relaxation is allowed to cause.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            Violation::OutsidePool { .. } | Violation::UnresolvedLeap { .. }
        )
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::OutOfScale { position, pitch } => {
                write!(f, "note {} (pitch {}) is not in the scale", position, pitch)
            }
            Violation::OutOfRegister { position, pitch } => {
                write!(f, "note {} (pitch {}) is outside the register", position, pitch)
            }
            Violation::OutsidePool { position, degree } => write!(
                f,
                "note {} has degree {}, outside the allowed pool",
                position, degree
            ),
            Violation::BadStart { degree } => {
                write!(f, "first note degree {:?} is not an allowed start", degree)
            }
            Violation::BadEnd { degree } => {
                write!(f, "last note degree {:?} is not an allowed ending", degree)
            }
            Violation::UnresolvedLeap {
                position,
                expected,
                actual,
            } => write!(
                f,
                "leap into note {} should resolve by {:+} but moved {:?}",
                position, expected, actual
            ),
            Violation::StepTooLarge {
                position,
                steps,
                max,
            } => write!(
                f,
                "move into note {} spans {} steps (max {})",
                position, steps, max
            ),
            Violation::TooShort { expected, actual } => {
                write!(f, "line has {} notes, expected at least {}", actual, expected)
            }
            Violation::TooLong { max, actual } => {
                write!(f, "line has {} notes, expected at most {}", actual, max)
            }
        }
    }
}

/// Outcome of checking one line.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LineReport {
    pub violations: Vec<Violation>,
    /// Leaps within the requested length.
    pub leaps: usize,
    /// Largest diatonic move within the requested length.
    pub max_step: i32,
    /// Whether relaxation ran, which waives soft violations from the
    /// relaxed position on.
    pub relaxed: bool,
}

impl LineReport {
    /// True when no violation is present.
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Checks a finished line against its configuration.
///
/// Movement rules (step size and leap resolution) apply to the requested
/// length only; appended resolution and cadence notes are checked for scale,
/// register, pool and ending. Pool checks are skipped from the first relaxed
/// position on, as are leaps whose resolving note falls there. The move into
/// a note rewritten by the cadence safety net is exempt from the step limit.
pub fn check_line(resolved: &ResolvedConfig, result: &GenerationResult) -> LineReport {
    let scale = &resolved.scale;
    let pitches = result.pitches();
    let relaxed = result.relaxations > 0;
    let waived_from = match result.relaxed_from {
        Some(position) => position,
        None if relaxed => 0,
        None => usize::MAX,
    };
    let mut report = LineReport {
        relaxed,
        ..LineReport::default()
    };

    if result.completed && pitches.len() < resolved.length {
        report.violations.push(Violation::TooShort {
            expected: resolved.length,
            actual: pitches.len(),
        });
    }
    if pitches.len() > resolved.length + 2 {
        report.violations.push(Violation::TooLong {
            max: resolved.length + 2,
            actual: pitches.len(),
        });
    }

    for (position, &pitch) in pitches.iter().enumerate() {
        if !resolved.in_register(pitch) {
            report
                .violations
                .push(Violation::OutOfRegister { position, pitch });
        }
        match scale.degree_of(pitch) {
            None => report.violations.push(Violation::OutOfScale { position, pitch }),
            Some(degree) if position < waived_from && !resolved.pool.contains(degree) => {
                report
                    .violations
                    .push(Violation::OutsidePool { position, degree })
            }
            Some(_) => {}
        }
    }

    if let Some(&first) = pitches.first() {
        let degree = scale.degree_of(first);
        if !degree.is_some_and(|d| resolved.start_degrees.contains(d)) {
            report.violations.push(Violation::BadStart { degree });
        }
    }
    if let Some(&last) = pitches.last() {
        let degree = scale.degree_of(last);
        if !degree.is_some_and(|d| resolved.end_degrees.contains(d)) {
            report.violations.push(Violation::BadEnd { degree });
        }
    }

    let max_steps = resolved.max_steps;
    let body = &pitches[..pitches.len().min(resolved.length)];
    let moves: Vec<Option<i32>> = body
        .windows(2)
        .map(|w| scale.diatonic_distance(w[0], w[1]))
        .collect();

    for (i, steps) in moves.iter().enumerate() {
        let Some(steps) = *steps else { continue };
        let position = i + 1;
        report.max_step = report.max_step.max(steps.abs());
        let snapped_into = result.cadence_snapped && position + 1 == pitches.len();
        if steps.abs() > max_steps && !snapped_into {
            report.violations.push(Violation::StepTooLarge {
                position,
                steps,
                max: max_steps,
            });
        }
        if !is_leap(steps) {
            continue;
        }
        report.leaps += 1;
        if position + 1 >= waived_from || position + 1 >= resolved.length {
            continue;
        }
        let expected = resolved.toward_center(body[position], steps);
        let actual = moves.get(position).copied().flatten();
        if actual != Some(expected) {
            report.violations.push(Violation::UnresolvedLeap {
                position,
                expected,
                actual,
            });
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GenerationConfig, MovementPolicy};
    use crate::NoteEvent;

    fn result_of(pitches: &[i32], relaxations: u32) -> GenerationResult {
        GenerationResult {
            notes: pitches
                .iter()
                .map(|&pitch| NoteEvent {
                    pitch,
                    duration_seconds: 0.5,
                })
                .collect(),
            completed: true,
            attempts: pitches.len() as u32,
            backtracks: 0,
            relaxations,
            relaxed_from: None,
            appended: 0,
            cadence_snapped: false,
            final_seed: 0,
        }
    }

    fn relaxed_at(pitches: &[i32], position: usize) -> GenerationResult {
        GenerationResult {
            relaxed_from: Some(position),
            ..result_of(pitches, 1)
        }
    }

    fn advanced(length: usize) -> ResolvedConfig {
        GenerationConfig::builder()
            .length(length)
            .register(48, 79)
            .difficulty(crate::config::DifficultyTier::Advanced)
            .movement(MovementPolicy::UpToMaxLeap { max_steps: 7 })
            .build()
            .validate()
            .unwrap()
    }

    #[test]
    fn test_clean_line() {
        let resolved = advanced(5);
        // The leap up to G4 resolves down toward the center.
        let report = check_line(&resolved, &result_of(&[60, 67, 65, 64, 60], 0));
        assert!(report.is_clean(), "{:?}", report.violations);
        assert_eq!(report.leaps, 1);
        assert_eq!(report.max_step, 4);
    }

    #[test]
    fn test_flags_unresolved_leap() {
        let resolved = advanced(5);
        let report = check_line(&resolved, &result_of(&[60, 67, 69, 64, 60], 0));
        assert!(report.violations.contains(&Violation::UnresolvedLeap {
            position: 1,
            expected: -1,
            actual: Some(1),
        }));
        assert!(report.violations.iter().all(Violation::is_soft));

        let relaxed = check_line(&resolved, &result_of(&[60, 67, 69, 64, 60], 1));
        assert!(relaxed.is_clean());
    }

    #[test]
    fn test_relaxation_waives_only_later_notes() {
        let resolved = advanced(5);
        let line = [60, 67, 69, 64, 60];
        // Resolution of the leap falls on the relaxed position.
        assert!(check_line(&resolved, &relaxed_at(&line, 2)).is_clean());
        // Relaxing after the leap resolved leaves the leap checked.
        let report = check_line(&resolved, &relaxed_at(&line, 3));
        assert!(report.relaxed);
        assert!(report.violations.contains(&Violation::UnresolvedLeap {
            position: 1,
            expected: -1,
            actual: Some(1),
        }));
    }

    #[test]
    fn test_pool_checked_before_relaxation() {
        let resolved = GenerationConfig::builder()
            .length(5)
            .allowed_degrees(&[1, 2, 3, 5])
            .build()
            .validate()
            .unwrap();
        // F4 is degree 4, outside the pool.
        let line = [60, 62, 65, 64, 60];
        let outside = Violation::OutsidePool {
            position: 2,
            degree: 4,
        };
        assert!(check_line(&resolved, &result_of(&line, 0))
            .violations
            .contains(&outside));
        assert!(!check_line(&resolved, &relaxed_at(&line, 2))
            .violations
            .contains(&outside));
        assert!(check_line(&resolved, &relaxed_at(&line, 3))
            .violations
            .contains(&outside));
    }

    #[test]
    fn test_flags_membership_and_ending() {
        let resolved = advanced(4);
        let report = check_line(&resolved, &result_of(&[62, 61, 90, 62], 0));
        assert!(report.violations.contains(&Violation::BadStart { degree: Some(2) }));
        assert!(report.violations.contains(&Violation::OutOfScale {
            position: 1,
            pitch: 61
        }));
        assert!(report.violations.contains(&Violation::OutOfRegister {
            position: 2,
            pitch: 90
        }));
        assert!(report.violations.contains(&Violation::BadEnd { degree: Some(2) }));
    }

    #[test]
    fn test_stepwise_policy() {
        let config = GenerationConfig::builder()
            .length(3)
            .movement(MovementPolicy::StepwiseOnly)
            .build();
        let resolved = config.validate().unwrap();
        let report = check_line(&resolved, &result_of(&[64, 60, 60], 0));
        assert!(report.violations.contains(&Violation::StepTooLarge {
            position: 1,
            steps: -2,
            max: 1
        }));
    }

    #[test]
    fn test_length_bounds() {
        let resolved = advanced(3);
        let short = check_line(&resolved, &result_of(&[60, 62], 0));
        assert!(short.violations.contains(&Violation::TooShort {
            expected: 3,
            actual: 2
        }));
        let long = check_line(&resolved, &result_of(&[60, 62, 64, 65, 64, 62], 0));
        assert!(long.violations.contains(&Violation::TooLong { max: 5, actual: 6 }));
    }

    #[test]
    fn test_violation_display() {
        let v = Violation::StepTooLarge {
            position: 2,
            steps: 3,
            max: 2,
        };
        assert_eq!(v.to_string(), "move into note 2 spans 3 steps (max 2)");
    }
}
