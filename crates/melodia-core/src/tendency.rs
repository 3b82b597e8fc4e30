//! Tendency resolution engine.
//!
//! Landing on a tendency tone (the lower note of a semitone-adjacent degree
//! pair) queues an obligation to reach the degree above it. Only the oldest
//! obligation is active. Its life cycle:
//!
//! - `Pending` (2 steps left): on the next filtering pass it resolves now with
//!   the configured probability (candidates restricted to the target degree,
//!   obligation dequeued). Otherwise it takes a detour: leaps of four or more
//!   degrees are pruned and it becomes `Mandatory`.
//! - `Mandatory` (1 step left): the next pass restricts candidates to the
//!   target degree and dequeues the obligation whatever the outcome.
//!
//! When detours are disabled a `Pending` obligation behaves as `Mandatory`.

use std::collections::VecDeque;

use rand_pcg::Pcg32;

use crate::cadence;
use crate::candidates::Candidate;
use crate::config::ResolvedConfig;
use crate::rng::chance;
use crate::scale::{DegreeMask, ScaleContext};
use crate::NoteEvent;

/// Steps granted to a fresh obligation.
pub const PENDING_STEPS: u8 = 2;

/// Largest diatonic move kept during a detour.
pub const SMALL_DETOUR_MAX_STEPS: i32 = 3;

/// Tendency-engine options taken from the config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TendencySettings {
    pub enabled: bool,
    pub resolve_probability: f64,
    pub allow_small_detours: bool,
}

/// A queued requirement to reach `target_degree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TendencyObligation {
    pub target_degree: u8,
    /// 2 = pending, 1 = mandatory.
    pub remaining_steps: u8,
}

impl TendencyObligation {
    pub fn is_mandatory(&self) -> bool {
        self.remaining_steps <= 1
    }
}

/// What a filtering pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    /// No active obligation.
    Idle,
    /// The probabilistic branch fired; candidates restricted to the target.
    Resolved { target: u8 },
    /// Detour taken; the obligation is now mandatory.
    Detoured { target: u8 },
    /// Mandatory restriction applied and the obligation dequeued.
    Forced { target: u8 },
}

/// What placing a note did to the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Placement {
    /// Target of an obligation the note satisfied.
    pub satisfied: Option<u8>,
    /// Target of an obligation the note created.
    pub queued: Option<u8>,
}

/// Notes added after the main loop for an unresolved obligation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Appendix {
    pub resolution: Option<i32>,
    pub cadence: Option<i32>,
    /// Target of an obligation dropped because its degree is outside the pool.
    pub dropped: Option<u8>,
}

/// FIFO of tendency obligations.
#[derive(Debug, Clone, PartialEq)]
pub struct TendencyQueue {
    settings: TendencySettings,
    obligations: VecDeque<TendencyObligation>,
}

impl TendencyQueue {
    pub fn new(settings: TendencySettings) -> Self {
        Self {
            settings,
            obligations: VecDeque::new(),
        }
    }

    /// The oldest obligation, the only one that is ever active.
    pub fn active(&self) -> Option<&TendencyObligation> {
        self.obligations.front()
    }

    pub fn is_empty(&self) -> bool {
        self.obligations.is_empty()
    }

    /// Queues an obligation directly.
    pub fn push(&mut self, obligation: TendencyObligation) {
        self.obligations.push_back(obligation);
    }

    /// Removes the active obligation.
    pub fn drop_active(&mut self) -> Option<TendencyObligation> {
        self.obligations.pop_front()
    }

    /// Removes every queued obligation, oldest first.
    pub fn drain(&mut self) -> Vec<TendencyObligation> {
        self.obligations.drain(..).collect()
    }

    /// Applies the active obligation to a candidate set.
    pub fn filter(
        &mut self,
        scale: &ScaleContext,
        candidates: &mut Vec<Candidate>,
        rng: &mut Pcg32,
    ) -> FilterOutcome {
        let Some(active) = self.obligations.front().copied() else {
            return FilterOutcome::Idle;
        };
        let target = active.target_degree;
        let on_target = |c: &Candidate| scale.degree_of(c.pitch) == Some(target);

        if !active.is_mandatory() && self.settings.allow_small_detours {
            if chance(rng, self.settings.resolve_probability) && candidates.iter().any(on_target) {
                candidates.retain(on_target);
                self.obligations.pop_front();
                return FilterOutcome::Resolved { target };
            }
            candidates.retain(|c| c.steps.abs() <= SMALL_DETOUR_MAX_STEPS);
            if let Some(front) = self.obligations.front_mut() {
                front.remaining_steps = 1;
            }
            return FilterOutcome::Detoured { target };
        }

        candidates.retain(on_target);
        self.obligations.pop_front();
        FilterOutcome::Forced { target }
    }

    /// Updates the queue after a note of `pitch` was placed.
    pub fn on_placed(&mut self, scale: &ScaleContext, pitch: i32) -> Placement {
        let mut placement = Placement::default();
        let Some(degree) = scale.degree_of(pitch) else {
            return placement;
        };

        if self
            .obligations
            .front()
            .is_some_and(|o| o.target_degree == degree)
        {
            self.obligations.pop_front();
            placement.satisfied = Some(degree);
        }

        if self.settings.enabled {
            if let Some(target) = scale.tendency_target(degree) {
                self.obligations.push_back(TendencyObligation {
                    target_degree: target,
                    remaining_steps: PENDING_STEPS,
                });
                placement.queued = Some(target);
            }
        }
        placement
    }

    /// Post-pass after the main loop.
    ///
    /// A mandatory obligation still at the front gets one resolution note
    /// (nearest in-register pitch of its target) and, when that note is not an
    /// allowed ending, one further cadence note. Whatever remains queued is
    /// discarded.
    pub fn finish(
        &mut self,
        resolved: &ResolvedConfig,
        notes: &mut Vec<NoteEvent>,
        duration_seconds: f64,
    ) -> Appendix {
        let mut appendix = Appendix::default();
        let front = self.obligations.front().copied();
        self.obligations.clear();

        let (Some(obligation), Some(last)) = (front, notes.last()) else {
            return appendix;
        };
        if !obligation.is_mandatory() {
            return appendix;
        }
        let target = obligation.target_degree;
        if resolved.pool_restricted && !resolved.pool.contains(target) {
            appendix.dropped = Some(target);
            return appendix;
        }

        let Some(resolution) = resolved.scale.nearest_pitch(
            &DegreeMask::from_degrees(&[target]),
            last.pitch,
            resolved.register_min,
            resolved.register_max,
        ) else {
            appendix.dropped = Some(target);
            return appendix;
        };
        notes.push(NoteEvent {
            pitch: resolution,
            duration_seconds,
        });
        appendix.resolution = Some(resolution);

        if !cadence::is_allowed_ending(resolved, resolution) {
            if let Some(ending) = cadence::nearest_ending(resolved, resolution) {
                notes.push(NoteEvent {
                    pitch: ending,
                    duration_seconds,
                });
                appendix.cadence = Some(ending);
            }
        }
        appendix
    }
}
