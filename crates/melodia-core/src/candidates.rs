//! Candidate builder: legal next pitches from the previous one.

use crate::config::ResolvedConfig;

/// A possible next pitch and its relative probability weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub pitch: i32,
    /// Signed diatonic distance from the previous pitch (0 for the first note).
    pub steps: i32,
    /// Relative weight, assigned by the weighting engine.
    pub weight: f64,
}

impl Candidate {
    /// Whether this move counts as a leap.
    pub fn is_leap(&self) -> bool {
        is_leap(self.steps)
    }
}

/// Smallest diatonic distance classified as a leap.
pub const LEAP_STEPS: i32 = 3;

/// Whether a signed diatonic distance counts as a leap.
pub fn is_leap(steps: i32) -> bool {
    steps.abs() >= LEAP_STEPS
}

/// Options that loosen or tighten a single build pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Direction (`1`/`-1`) of a pending forced single-step resolution.
    pub must_resolve: Option<i32>,
    /// Ignore the allowed-degree pool (set by escalated relaxation).
    pub ignore_pool: bool,
}

/// Enumerates every legal move from `previous_pitch`.
///
/// Distances run from 1 up to the resolved maximum, upward before downward at
/// each distance. An empty result means the caller has to backtrack.
pub fn build_candidates(
    resolved: &ResolvedConfig,
    previous_pitch: i32,
    options: BuildOptions,
) -> Vec<Candidate> {
    let scale = &resolved.scale;
    let mut candidates = Vec::new();

    for distance in 1..=resolved.max_steps {
        for direction in [1, -1] {
            let steps = direction * distance;
            let pitch = scale.step_by(previous_pitch, steps);
            if !resolved.in_register(pitch) {
                continue;
            }
            let Some(degree) = scale.degree_of(pitch) else {
                continue;
            };
            if !options.ignore_pool && !resolved.pool.contains(degree) {
                continue;
            }
            candidates.push(Candidate {
                pitch,
                steps,
                weight: 0.0,
            });
        }
    }

    if let Some(direction) = options.must_resolve {
        candidates.retain(|c| c.steps == direction);
    }

    candidates
}

/// Every in-register pitch of an allowed start degree.
pub fn build_start_candidates(resolved: &ResolvedConfig) -> Vec<Candidate> {
    resolved
        .scale
        .pitches_in_register(
            &resolved.start_degrees,
            resolved.register_min,
            resolved.register_max,
        )
        .into_iter()
        .map(|pitch| Candidate {
            pitch,
            steps: 0,
            weight: 0.0,
        })
        .collect()
}
