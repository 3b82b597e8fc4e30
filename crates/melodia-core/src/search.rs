//! Backtracking search controller and the generation entry points.
//!
//! The controller builds the line note by note. Each advance builds the legal
//! moves, lets the tendency engine and the cadence enforcer narrow them,
//! weights what is left, samples one, and pushes a choice frame holding the
//! whole pool. A position with no legal move pops frames and re-samples from
//! the reduced pools. When the stack runs dry (or the backtrack budget is
//! spent without new progress) the relaxation strategy reseeds and resumes
//! from the deepest dead end with softer constraints.
//!
//! Phases: `Advancing` -> `Backtracking` -> `Relaxing` -> `Advancing`, ending in
//! `Done` or, once the safety counter is exhausted, `Failed`.

use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::cadence;
use crate::candidates::{build_candidates, build_start_candidates, BuildOptions, Candidate};
use crate::config::{GenerationConfig, ResolvedConfig};
use crate::error::ConfigResult;
use crate::rng::{self, create_rng, derive_relaxation_seed};
use crate::tendency::{FilterOutcome, TendencyQueue, TendencySettings};
use crate::trace::TraceEvent;
use crate::weighting::{self, WeightContext};

/// Relaxation level at which the allowed-degree pool is ignored and every
/// queued obligation is dropped.
const RELAX_IGNORE_POOL: u32 = 2;

/// Relaxation level at which the final-position cadence filter is skipped.
const RELAX_IGNORE_CADENCE: u32 = 3;

/// One pitched, timed note of the output line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// Absolute chromatic pitch (MIDI numbering).
    pub pitch: i32,
    pub duration_seconds: f64,
}

/// Output of a generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub notes: Vec<NoteEvent>,
    /// False when the safety counter stopped the search early.
    pub completed: bool,
    /// Position-advancement attempts used.
    pub attempts: u32,
    /// Choice frames popped.
    pub backtracks: u32,
    /// Relaxation events.
    pub relaxations: u32,
    /// Earliest position any relaxation resumed from. Notes before it were
    /// placed under every constraint.
    pub relaxed_from: Option<usize>,
    /// Notes appended after the requested length by the tendency post-pass.
    pub appended: usize,
    /// Whether the cadence safety net rewrote the last note.
    pub cadence_snapped: bool,
    /// Seed in effect when generation ended.
    pub final_seed: u32,
}

impl GenerationResult {
    /// Pitches of the line, in order.
    pub fn pitches(&self) -> Vec<i32> {
        self.notes.iter().map(|n| n.pitch).collect()
    }

    /// Total duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.notes.iter().map(|n| n.duration_seconds).sum()
    }

    /// Hex BLAKE3 digest of every pitch and duration.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for note in &self.notes {
            hasher.update(&note.pitch.to_le_bytes());
            hasher.update(&note.duration_seconds.to_bits().to_le_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }
}

/// Generates a melodic line.
///
/// # Arguments
/// * `config` - Generation options; validated before the search starts
///
/// # Returns
/// The line and search statistics, or the validation failure.
///
/// # Example
/// ```
/// use melodia_core::{generate, GenerationConfig};
///
/// let config = GenerationConfig::builder().seed(7).length(6).build();
/// let result = generate(&config).unwrap();
/// assert!(result.completed);
/// assert!(result.notes.len() >= 6);
/// ```
pub fn generate(config: &GenerationConfig) -> ConfigResult<GenerationResult> {
    generate_traced(config, &mut |_| {})
}

/// Generates a melodic line, reporting every search event to `sink`.
pub fn generate_traced(
    config: &GenerationConfig,
    sink: &mut dyn FnMut(&TraceEvent),
) -> ConfigResult<GenerationResult> {
    let resolved = config.validate()?;
    Ok(Search::new(config, &resolved, sink).run())
}

/// Leap bookkeeping and the obligation queue, snapshotted into every frame.
#[derive(Debug, Clone, PartialEq)]
struct LineState {
    /// Direction of a pending forced single-step resolution.
    must_resolve: Option<i32>,
    /// Signed diatonic size of the last move.
    last_step: i32,
    featured_leaps_used: u32,
    tendency: TendencyQueue,
}

/// An undo point: the pool sampled at `position` and the pick made from it.
#[derive(Debug, Clone)]
struct ChoiceFrame {
    position: usize,
    options: Vec<Candidate>,
    chosen: usize,
    /// Line state after filtering at `position`, before placement.
    state: LineState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Advancing,
    Backtracking,
    Relaxing,
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Relaxation {
    position: usize,
    level: u32,
}

struct Search<'a> {
    config: &'a GenerationConfig,
    resolved: &'a ResolvedConfig,
    sink: &'a mut dyn FnMut(&TraceEvent),
    seed: u32,
    rng: Pcg32,
    notes: Vec<NoteEvent>,
    state: LineState,
    frames: Vec<ChoiceFrame>,
    /// Notes and state at the deepest dead end since the last relaxation.
    frontier: Option<(Vec<NoteEvent>, LineState)>,
    deepest: usize,
    backtracks_since_progress: u32,
    relaxation: Option<Relaxation>,
    relaxed_from: Option<usize>,
    attempts: u32,
    backtracks: u32,
    relaxations: u32,
}

impl<'a> Search<'a> {
    fn new(
        config: &'a GenerationConfig,
        resolved: &'a ResolvedConfig,
        sink: &'a mut dyn FnMut(&TraceEvent),
    ) -> Self {
        let settings = TendencySettings {
            enabled: config.tendency_engine_enabled,
            resolve_probability: config.tendency_resolve_probability,
            allow_small_detours: config.allow_small_detours,
        };
        Self {
            config,
            resolved,
            sink,
            seed: config.seed,
            rng: create_rng(config.seed),
            notes: Vec::with_capacity(resolved.length + 2),
            state: LineState {
                must_resolve: None,
                last_step: 0,
                featured_leaps_used: 0,
                tendency: TendencyQueue::new(settings),
            },
            frames: Vec::with_capacity(resolved.length),
            frontier: None,
            deepest: 0,
            backtracks_since_progress: 0,
            relaxation: None,
            relaxed_from: None,
            attempts: 0,
            backtracks: 0,
            relaxations: 0,
        }
    }

    fn emit(&mut self, event: TraceEvent) {
        event.log();
        (self.sink)(&event);
    }

    fn run(mut self) -> GenerationResult {
        let mut phase = Phase::Advancing;
        loop {
            phase = match phase {
                Phase::Advancing => self.advance(),
                Phase::Backtracking => self.backtrack(),
                Phase::Relaxing => {
                    self.relax();
                    Phase::Advancing
                }
                Phase::Done | Phase::Failed => break,
            };
        }
        let completed = phase == Phase::Done;
        let requested = self.resolved.length.min(self.notes.len());

        let duration = self.config.note_duration_seconds;
        let appendix = self
            .state
            .tendency
            .finish(self.resolved, &mut self.notes, duration);
        if let Some(target) = appendix.dropped {
            let position = self.notes.len();
            self.emit(TraceEvent::ObligationDropped { position, target });
        }
        if let Some(pitch) = appendix.resolution {
            self.emit(TraceEvent::ResolutionAppended { pitch });
        }
        if let Some(pitch) = appendix.cadence {
            self.emit(TraceEvent::CadenceAppended { pitch });
        }

        let snapped = cadence::enforce_final(self.resolved, &mut self.notes);
        if let Some((from, to)) = snapped {
            self.emit(TraceEvent::CadenceSnapped { from, to });
        }

        GenerationResult {
            appended: self.notes.len() - requested,
            notes: self.notes,
            completed,
            attempts: self.attempts,
            backtracks: self.backtracks,
            relaxations: self.relaxations,
            relaxed_from: self.relaxed_from,
            cadence_snapped: snapped.is_some(),
            final_seed: self.seed,
        }
    }

    fn relax_level(&self, position: usize) -> u32 {
        match self.relaxation {
            Some(r) if r.position == position => r.level,
            _ => 0,
        }
    }

    /// One forward step: build, filter, weight, sample, record.
    fn advance(&mut self) -> Phase {
        let position = self.notes.len();
        if position >= self.resolved.length {
            return Phase::Done;
        }
        if self.attempts >= self.config.max_attempts {
            let (attempts, placed) = (self.attempts, position);
            self.emit(TraceEvent::SafetyCounterExhausted { attempts, placed });
            return Phase::Failed;
        }
        self.attempts += 1;

        let mut work = self.state.clone();
        let candidates = self.prepare(position, &mut work);
        let Some(chosen) = rng::sample(&mut self.rng, &candidates) else {
            self.emit(TraceEvent::DeadEnd { position });
            self.record_frontier();
            return Phase::Backtracking;
        };

        let frame = ChoiceFrame {
            position,
            options: candidates,
            chosen,
            state: work,
        };
        self.commit(frame);
        Phase::Advancing
    }

    /// Candidate pool for `position`, with filters and weights applied.
    fn prepare(&mut self, position: usize, work: &mut LineState) -> Vec<Candidate> {
        let resolved = self.resolved;
        let level = self.relax_level(position);
        let final_filter = cadence::is_final(resolved, position) && level < RELAX_IGNORE_CADENCE;

        let Some(previous) = self.notes.last().map(|n| n.pitch) else {
            let mut candidates = build_start_candidates(resolved);
            if final_filter {
                cadence::filter_final(resolved, &mut candidates);
            }
            weighting::weigh_start(resolved, &mut candidates);
            return candidates;
        };

        let options = BuildOptions {
            must_resolve: work.must_resolve,
            ignore_pool: level >= RELAX_IGNORE_POOL,
        };
        let mut candidates = build_candidates(resolved, previous, options);

        match work
            .tendency
            .filter(&resolved.scale, &mut candidates, &mut self.rng)
        {
            FilterOutcome::Idle => {}
            FilterOutcome::Resolved { target } | FilterOutcome::Forced { target } => {
                self.emit(TraceEvent::ObligationResolved { position, target })
            }
            FilterOutcome::Detoured { target } => {
                self.emit(TraceEvent::ObligationDetoured { position, target })
            }
        }

        if final_filter {
            cadence::filter_final(resolved, &mut candidates);
        }

        let ctx = WeightContext {
            previous_pitch: previous,
            position,
            last_step: work.last_step,
            featured_leaps_used: work.featured_leaps_used,
        };
        weighting::weigh(resolved, &mut candidates, &ctx);
        candidates
    }

    /// Appends the frame's chosen note, updates bookkeeping, and pushes the
    /// frame. A leap then either places its resolving step right away or arms
    /// the forced resolution for the next position.
    fn commit(&mut self, frame: ChoiceFrame) {
        let candidate = frame.options[frame.chosen];
        let position = frame.position;
        let options = frame.options.len();
        let mut state = frame.state.clone();

        self.notes.truncate(position);
        self.notes.push(NoteEvent {
            pitch: candidate.pitch,
            duration_seconds: self.config.note_duration_seconds,
        });

        state.must_resolve = None;
        state.last_step = candidate.steps;
        if candidate.is_leap() {
            state.featured_leaps_used += 1;
        }
        let placement = state.tendency.on_placed(&self.resolved.scale, candidate.pitch);

        self.frames.push(frame);
        self.state = state;
        if self.notes.len() > self.deepest {
            self.deepest = self.notes.len();
            self.backtracks_since_progress = 0;
        }

        if position == 0 {
            self.emit(TraceEvent::StartChosen {
                pitch: candidate.pitch,
                options,
            });
        } else {
            self.emit(TraceEvent::NotePlaced {
                position,
                pitch: candidate.pitch,
                steps: candidate.steps,
                options,
            });
        }
        if let Some(target) = placement.satisfied {
            self.emit(TraceEvent::ObligationResolved { position, target });
        }
        if let Some(target) = placement.queued {
            self.emit(TraceEvent::ObligationQueued { position, target });
        }

        if candidate.is_leap() && position + 1 < self.resolved.length {
            let direction = self.resolved.toward_center(candidate.pitch, candidate.steps);
            let immediate = rng::chance(
                &mut self.rng,
                self.config.immediate_leap_resolution_probability,
            );
            if !(immediate && self.resolve_immediately(position + 1, candidate.pitch, direction)) {
                self.state.must_resolve = Some(direction);
                self.emit(TraceEvent::ForcedResolutionArmed {
                    position,
                    direction,
                });
            }
        }
    }

    /// Places the single resolving step after a leap as its own one-option
    /// frame. Returns false when that step is not legal here.
    fn resolve_immediately(&mut self, position: usize, from: i32, direction: i32) -> bool {
        let resolved = self.resolved;
        if !self.state.tendency.is_empty() {
            return false;
        }
        let pitch = resolved.scale.step_by(from, direction);
        if !resolved.in_register(pitch) {
            return false;
        }
        let Some(degree) = resolved.scale.degree_of(pitch) else {
            return false;
        };
        let level = self.relax_level(position);
        if level < RELAX_IGNORE_POOL && !resolved.pool.contains(degree) {
            return false;
        }
        if cadence::is_final(resolved, position)
            && level < RELAX_IGNORE_CADENCE
            && !cadence::is_allowed_ending(resolved, pitch)
        {
            return false;
        }

        let frame = ChoiceFrame {
            position,
            options: vec![Candidate {
                pitch,
                steps: direction,
                weight: 1.0,
            }],
            chosen: 0,
            state: self.state.clone(),
        };
        self.commit(frame);
        self.emit(TraceEvent::LeapResolvedImmediately { position, pitch });
        true
    }

    fn record_frontier(&mut self) {
        let deeper = self
            .frontier
            .as_ref()
            .map_or(true, |(notes, _)| self.notes.len() >= notes.len());
        if deeper {
            self.frontier = Some((self.notes.clone(), self.state.clone()));
        }
    }

    /// Pops frames until one still has an untried option, then re-samples it.
    fn backtrack(&mut self) -> Phase {
        while let Some(mut frame) = self.frames.pop() {
            if self.backtracks_since_progress >= self.config.backtrack_budget {
                return Phase::Relaxing;
            }
            self.backtracks += 1;
            self.backtracks_since_progress += 1;

            frame.options.remove(frame.chosen);
            if frame.options.is_empty() {
                continue;
            }
            weighting::uniform_fallback(&mut frame.options);
            let Some(chosen) = rng::sample(&mut self.rng, &frame.options) else {
                continue;
            };
            frame.chosen = chosen;

            let (position, remaining) = (frame.position, frame.options.len());
            self.emit(TraceEvent::Backtracked {
                position,
                remaining,
            });
            self.commit(frame);
            return Phase::Advancing;
        }
        Phase::Relaxing
    }

    /// Escape hatch: resume from the deepest dead end with a fresh seed and
    /// softer constraints. Relaxing again at the same position escalates.
    fn relax(&mut self) {
        let (notes, mut state) = self
            .frontier
            .take()
            .unwrap_or_else(|| (self.notes.clone(), self.state.clone()));
        let position = notes.len();

        let level = match self.relaxation {
            Some(r) if r.position == position => r.level + 1,
            _ => 1,
        };
        self.relaxation = Some(Relaxation { position, level });
        self.relaxations += 1;
        self.relaxed_from = Some(self.relaxed_from.map_or(position, |p| p.min(position)));

        self.seed = derive_relaxation_seed(self.seed, position as u32);
        self.rng = create_rng(self.seed);

        state.must_resolve = None;
        let dropped = if level >= RELAX_IGNORE_POOL {
            state.tendency.drain()
        } else {
            state.tendency.drop_active().into_iter().collect()
        };

        self.notes = notes;
        self.state = state;
        self.frames.clear();
        self.deepest = position;
        self.backtracks_since_progress = 0;

        let seed = self.seed;
        self.emit(TraceEvent::Relaxed {
            position,
            level,
            seed,
        });
        for obligation in dropped {
            self.emit(TraceEvent::ObligationDropped {
                position,
                target: obligation.target_degree,
            });
        }
    }
}
