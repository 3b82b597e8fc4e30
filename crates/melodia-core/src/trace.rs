//! Trace events emitted during generation.
//!
//! Callers observe the search through a synchronous callback passed to
//! [`crate::generate_traced`]. Every event is also forwarded to the `log`
//! facade, so a host with a logger installed sees the same stream without a
//! callback.

use serde::Serialize;

/// Something the generator did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    /// First note picked.
    StartChosen { pitch: i32, options: usize },
    /// A note was appended at `position`.
    NotePlaced {
        position: usize,
        pitch: i32,
        steps: i32,
        options: usize,
    },
    /// A leap was answered by its resolving step in the same advance.
    LeapResolvedImmediately { position: usize, pitch: i32 },
    /// A leap armed the forced single-step resolution for the next note.
    ForcedResolutionArmed { position: usize, direction: i32 },
    /// No legal candidate at `position`.
    DeadEnd { position: usize },
    /// A choice frame at `position` was re-sampled.
    Backtracked { position: usize, remaining: usize },
    /// Escape hatch taken.
    Relaxed {
        position: usize,
        level: u32,
        seed: u32,
    },
    ObligationQueued { position: usize, target: u8 },
    ObligationResolved { position: usize, target: u8 },
    ObligationDetoured { position: usize, target: u8 },
    /// An obligation was discarded without resolving.
    ObligationDropped { position: usize, target: u8 },
    /// Post-pass resolution note.
    ResolutionAppended { pitch: i32 },
    /// Post-pass cadence note following a resolution.
    CadenceAppended { pitch: i32 },
    /// The safety net rewrote the last note.
    CadenceSnapped { from: i32, to: i32 },
    /// Safety counter hit; the line is a partial prefix.
    SafetyCounterExhausted { attempts: u32, placed: usize },
}

impl TraceEvent {
    /// Forwards the event to the `log` facade at a level matching its weight.
    pub fn log(&self) {
        match self {
            TraceEvent::SafetyCounterExhausted { .. } => log::warn!("{:?}", self),
            TraceEvent::Relaxed { .. }
            | TraceEvent::CadenceSnapped { .. }
            | TraceEvent::DeadEnd { .. } => log::debug!("{:?}", self),
            _ => log::trace!("{:?}", self),
        }
    }
}

impl std::fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TraceEvent::StartChosen { pitch, options } => {
                write!(f, "start {} (of {})", pitch, options)
            }
            TraceEvent::NotePlaced {
                position,
                pitch,
                steps,
                options,
            } => write!(
                f,
                "#{} place {} ({:+} steps, {} options)",
                position, pitch, steps, options
            ),
            TraceEvent::LeapResolvedImmediately { position, pitch } => {
                write!(f, "#{} leap resolved immediately to {}", position, pitch)
            }
            TraceEvent::ForcedResolutionArmed {
                position,
                direction,
            } => write!(f, "#{} forced resolution armed ({:+})", position, direction),
            TraceEvent::DeadEnd { position } => write!(f, "#{} dead end", position),
            TraceEvent::Backtracked {
                position,
                remaining,
            } => write!(f, "#{} backtrack ({} options left)", position, remaining),
            TraceEvent::Relaxed {
                position,
                level,
                seed,
            } => write!(f, "#{} relax level {} (seed {})", position, level, seed),
            TraceEvent::ObligationQueued { position, target } => {
                write!(f, "#{} obligation queued -> degree {}", position, target)
            }
            TraceEvent::ObligationResolved { position, target } => {
                write!(f, "#{} obligation resolved -> degree {}", position, target)
            }
            TraceEvent::ObligationDetoured { position, target } => {
                write!(f, "#{} obligation detour -> degree {}", position, target)
            }
            TraceEvent::ObligationDropped { position, target } => {
                write!(f, "#{} obligation dropped -> degree {}", position, target)
            }
            TraceEvent::ResolutionAppended { pitch } => write!(f, "appended resolution {}", pitch),
            TraceEvent::CadenceAppended { pitch } => write!(f, "appended cadence {}", pitch),
            TraceEvent::CadenceSnapped { from, to } => {
                write!(f, "final note snapped {} -> {}", from, to)
            }
            TraceEvent::SafetyCounterExhausted { attempts, placed } => write!(
                f,
                "safety counter exhausted after {} attempts ({} notes placed)",
                attempts, placed
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let event = TraceEvent::NotePlaced {
            position: 3,
            pitch: 64,
            steps: -2,
            options: 4,
        };
        assert_eq!(event.to_string(), "#3 place 64 (-2 steps, 4 options)");
    }

    #[test]
    fn test_serialize_tagged() {
        let event = TraceEvent::CadenceSnapped { from: 69, to: 72 };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"event":"cadence_snapped","from":69,"to":72}"#);
    }
}
