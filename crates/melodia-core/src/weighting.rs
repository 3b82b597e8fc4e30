//! Weighting engine: relative probabilities for candidate moves.
//!
//! Weight = base(step distance, tier) x contour x range elasticity
//!        x post-leap resolution bonus x featured-leap soft cap
//!        x cadence approach bonus.

use crate::cadence;
use crate::candidates::Candidate;
use crate::config::{Contour, DifficultyTier, ResolvedConfig};

/// Multiplier for moves toward the register center from an off-center pitch.
pub const ELASTIC_TOWARD: f64 = 1.2;
/// Multiplier for moves away from the center from an off-center pitch.
pub const ELASTIC_AWAY: f64 = 0.9;
/// Multiplier for a single step back after a leap.
pub const POST_LEAP_BONUS: f64 = 1.2;
/// Multiplier for leaps once the tier's featured leaps are used up.
pub const FEATURED_LEAP_PENALTY: f64 = 0.35;
/// Multiplier for favored first notes.
pub const START_PREFERENCE: f64 = 1.2;

/// Line state the weights depend on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightContext {
    pub previous_pitch: i32,
    pub position: usize,
    /// Signed diatonic size of the move into `previous_pitch`.
    pub last_step: i32,
    pub featured_leaps_used: u32,
}

/// Base weight for a diatonic distance. Monotonically decreasing; zero beyond
/// what the tier permits.
pub fn base_weight(tier: DifficultyTier, distance: i32) -> f64 {
    const BEGINNER: [f64; 2] = [1.0, 0.35];
    const INTERMEDIATE: [f64; 4] = [1.0, 0.5, 0.25, 0.12];

    if distance < 1 {
        return 0.0;
    }
    let idx = (distance - 1) as usize;
    match tier {
        DifficultyTier::Beginner => BEGINNER.get(idx).copied().unwrap_or(0.0),
        DifficultyTier::Intermediate => INTERMEDIATE.get(idx).copied().unwrap_or(0.0),
        DifficultyTier::Advanced if distance <= 7 => 0.55f64.powi(distance - 1),
        DifficultyTier::Advanced => 0.0,
    }
}

/// How strongly the contour steers direction.
pub fn contour_strength(tier: DifficultyTier) -> f64 {
    match tier {
        DifficultyTier::Beginner => 0.15,
        DifficultyTier::Intermediate => 0.3,
        DifficultyTier::Advanced => 0.45,
    }
}

/// Leaps allowed before the soft cap applies.
pub fn free_featured_leaps(tier: DifficultyTier) -> u32 {
    match tier {
        DifficultyTier::Beginner => 0,
        DifficultyTier::Intermediate => 1,
        DifficultyTier::Advanced => 2,
    }
}

fn contour_factor(resolved: &ResolvedConfig, position: usize, steps: i32) -> f64 {
    let wanted = resolved.contour.direction_at(position, resolved.length);
    if wanted == 0 || steps == 0 {
        return 1.0;
    }
    let strength = contour_strength(resolved.difficulty);
    if steps.signum() == wanted {
        1.0 + strength
    } else {
        1.0 - strength
    }
}

fn elasticity_factor(resolved: &ResolvedConfig, previous_pitch: i32, steps: i32) -> f64 {
    let offset = previous_pitch as f64 - resolved.center();
    if offset == 0.0 || steps == 0 {
        return 1.0;
    }
    let toward = (offset > 0.0 && steps < 0) || (offset < 0.0 && steps > 0);
    if toward {
        ELASTIC_TOWARD
    } else {
        ELASTIC_AWAY
    }
}

/// Assigns weights to every candidate in place.
///
/// Falls back to uniform weights when every candidate ends at zero.
pub fn weigh(resolved: &ResolvedConfig, candidates: &mut [Candidate], ctx: &WeightContext) {
    for candidate in candidates.iter_mut() {
        let distance = candidate.steps.abs();
        let mut weight = base_weight(resolved.difficulty, distance);
        weight *= contour_factor(resolved, ctx.position, candidate.steps);
        weight *= elasticity_factor(resolved, ctx.previous_pitch, candidate.steps);

        if crate::candidates::is_leap(ctx.last_step) && candidate.steps == -ctx.last_step.signum() {
            weight *= POST_LEAP_BONUS;
        }
        if candidate.is_leap() && ctx.featured_leaps_used >= free_featured_leaps(resolved.difficulty)
        {
            weight *= FEATURED_LEAP_PENALTY;
        }
        if let Some(degree) = resolved.scale.degree_of(candidate.pitch) {
            weight *= cadence::approach_factor(resolved, ctx.position, degree);
        }

        candidate.weight = weight.max(0.0);
    }
    uniform_fallback(candidates);
}

/// Weights for the first note: favor the middle of the register and the half
/// the contour sets out from.
pub fn weigh_start(resolved: &ResolvedConfig, candidates: &mut [Candidate]) {
    let center = resolved.center();
    let quarter_span = (resolved.register_max - resolved.register_min) as f64 / 4.0;
    let start_low = match resolved.contour {
        Contour::Rising | Contour::Arch => Some(true),
        Contour::Falling | Contour::InvertedArch => Some(false),
        Contour::Any | Contour::RandomlyChosen => None,
    };

    for candidate in candidates.iter_mut() {
        let offset = candidate.pitch as f64 - center;
        let mut weight = 1.0;
        if offset.abs() <= quarter_span {
            weight *= START_PREFERENCE;
        }
        match start_low {
            Some(true) if offset < 0.0 => weight *= START_PREFERENCE,
            Some(false) if offset > 0.0 => weight *= START_PREFERENCE,
            _ => {}
        }
        candidate.weight = weight;
    }
    uniform_fallback(candidates);
}

/// Resets every weight to 1 when the set carries no positive weight.
pub fn uniform_fallback(candidates: &mut [Candidate]) {
    let total: f64 = candidates.iter().map(|c| c.weight).sum();
    if total <= 0.0 || !total.is_finite() {
        for candidate in candidates.iter_mut() {
            candidate.weight = 1.0;
        }
    }
}
