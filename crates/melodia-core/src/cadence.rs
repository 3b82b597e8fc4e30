//! Cadence enforcer: approach bias, final-position filter, and safety net.

use crate::candidates::Candidate;
use crate::config::ResolvedConfig;
use crate::NoteEvent;

/// Weight multiplier for degree 2 or 7 on the penultimate note when the line
/// may end on degree 1.
pub const APPROACH_BONUS: f64 = 1.5;

/// Whether `position` is the last requested note.
pub fn is_final(resolved: &ResolvedConfig, position: usize) -> bool {
    position + 1 == resolved.length
}

/// Whether `position` is the second-to-last requested note.
pub fn is_penultimate(resolved: &ResolvedConfig, position: usize) -> bool {
    resolved.length >= 2 && position + 2 == resolved.length
}

/// Approach-tone multiplier for a candidate of `degree` at `position`.
pub fn approach_factor(resolved: &ResolvedConfig, position: usize, degree: u8) -> f64 {
    if is_penultimate(resolved, position)
        && resolved.end_degrees.contains(1)
        && (degree == 2 || degree == 7)
    {
        APPROACH_BONUS
    } else {
        1.0
    }
}

/// Keeps only candidates that land on an allowed end degree.
pub fn filter_final(resolved: &ResolvedConfig, candidates: &mut Vec<Candidate>) {
    candidates.retain(|c| {
        resolved
            .scale
            .degree_of(c.pitch)
            .is_some_and(|d| resolved.end_degrees.contains(d))
    });
}

/// Whether `pitch` is an acceptable last note.
pub fn is_allowed_ending(resolved: &ResolvedConfig, pitch: i32) -> bool {
    resolved
        .scale
        .degree_of(pitch)
        .is_some_and(|d| resolved.end_degrees.contains(d))
}

/// Nearest in-register pitch of an allowed end degree.
pub fn nearest_ending(resolved: &ResolvedConfig, reference: i32) -> Option<i32> {
    resolved.scale.nearest_pitch(
        &resolved.end_degrees,
        reference,
        resolved.register_min,
        resolved.register_max,
    )
}

/// Rewrites the last note onto the nearest allowed ending if it is not one.
///
/// Returns `(from, to)` when a rewrite happened.
pub fn enforce_final(resolved: &ResolvedConfig, notes: &mut [NoteEvent]) -> Option<(i32, i32)> {
    let last = notes.last_mut()?;
    if is_allowed_ending(resolved, last.pitch) {
        return None;
    }
    let target = nearest_ending(resolved, last.pitch)?;
    let from = last.pitch;
    last.pitch = target;
    Some((from, target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationConfig;

    fn resolved(length: usize, end: &[u8]) -> ResolvedConfig {
        GenerationConfig::builder()
            .length(length)
            .allowed_end_degrees(end)
            .build()
            .validate()
            .unwrap()
    }

    fn note(pitch: i32) -> NoteEvent {
        NoteEvent {
            pitch,
            duration_seconds: 0.5,
        }
    }

    #[test]
    fn test_positions() {
        let r = resolved(6, &[]);
        assert!(is_penultimate(&r, 4));
        assert!(is_final(&r, 5));
        assert!(!is_final(&r, 4));

        let single = resolved(1, &[1]);
        assert!(is_final(&single, 0));
        assert!(!is_penultimate(&single, 0));
    }

    #[test]
    fn test_approach_bonus_needs_tonic_ending() {
        let r = resolved(6, &[]);
        assert_eq!(approach_factor(&r, 4, 7), APPROACH_BONUS);
        assert_eq!(approach_factor(&r, 4, 2), APPROACH_BONUS);
        assert_eq!(approach_factor(&r, 4, 5), 1.0);
        assert_eq!(approach_factor(&r, 3, 7), 1.0);

        let fifth = resolved(6, &[5]);
        assert_eq!(approach_factor(&fifth, 4, 7), 1.0);
    }

    #[test]
    fn test_filter_final() {
        let r = resolved(6, &[1, 5]);
        let mut c: Vec<Candidate> = [60, 62, 67, 71]
            .iter()
            .map(|&pitch| Candidate {
                pitch,
                steps: 1,
                weight: 1.0,
            })
            .collect();
        filter_final(&r, &mut c);
        assert_eq!(c.iter().map(|c| c.pitch).collect::<Vec<_>>(), vec![60, 67]);
    }

    #[test]
    fn test_safety_net_snaps_last_note() {
        let r = resolved(3, &[]);
        let mut notes = vec![note(64), note(65), note(69)];
        assert_eq!(enforce_final(&r, &mut notes), Some((69, 72)));
        assert_eq!(notes[2].pitch, 72);
        assert_eq!(notes[1].pitch, 65);

        assert_eq!(enforce_final(&r, &mut notes), None);
        assert_eq!(enforce_final(&r, &mut []), None);
    }
}
