//! Scale model: modes, degree tables, and diatonic stepping.
//!
//! A [`ScaleContext`] is resolved once per generation run from a [`Mode`] and a
//! tonic pitch class. Every other component consults it to answer "is this pitch
//! in the scale", "which degree is it", and "what is one diatonic step away".
//!
//! Degrees are 1-based (1..=7) throughout the crate.

use serde::{Deserialize, Serialize};

/// Number of degrees in a diatonic scale.
pub const DEGREE_COUNT: usize = 7;

/// The seven diatonic rotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Major scale.
    #[default]
    Ionian,
    /// Minor with raised sixth.
    Dorian,
    /// Minor with lowered second.
    Phrygian,
    /// Major with raised fourth.
    Lydian,
    /// Major with lowered seventh.
    Mixolydian,
    /// Natural minor.
    Aeolian,
    /// Diminished fifth above the tonic. Has a degree table but is rejected by
    /// config validation.
    Locrian,
}

/// Semitone offsets from the tonic, indexed by `Mode as usize`.
const MODE_INTERVALS: [[u8; DEGREE_COUNT]; 7] = [
    [0, 2, 4, 5, 7, 9, 11], // Ionian
    [0, 2, 3, 5, 7, 9, 10], // Dorian
    [0, 1, 3, 5, 7, 8, 10], // Phrygian
    [0, 2, 4, 6, 7, 9, 11], // Lydian
    [0, 2, 4, 5, 7, 9, 10], // Mixolydian
    [0, 2, 3, 5, 7, 8, 10], // Aeolian
    [0, 1, 3, 5, 6, 8, 10], // Locrian
];

impl Mode {
    /// All modes, in rotation order starting from Ionian.
    pub const ALL: [Mode; 7] = [
        Mode::Ionian,
        Mode::Dorian,
        Mode::Phrygian,
        Mode::Lydian,
        Mode::Mixolydian,
        Mode::Aeolian,
        Mode::Locrian,
    ];

    /// Semitone intervals from the tonic to degrees 1-7.
    pub fn intervals(self) -> [u8; DEGREE_COUNT] {
        MODE_INTERVALS[self as usize]
    }

    /// Whether melodic generation accepts this mode.
    pub fn is_supported(self) -> bool {
        self != Mode::Locrian
    }

    /// Lowercase name as used in configs.
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Ionian => "ionian",
            Mode::Dorian => "dorian",
            Mode::Phrygian => "phrygian",
            Mode::Lydian => "lydian",
            Mode::Mixolydian => "mixolydian",
            Mode::Aeolian => "aeolian",
            Mode::Locrian => "locrian",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A set of scale degrees, stored as `[bool; 7]` (index 0 = degree 1).
///
/// An all-false mask means "unset"; callers decide what unset defaults to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DegreeMask(pub [bool; DEGREE_COUNT]);

impl DegreeMask {
    /// Mask with every degree set.
    pub const ALL: DegreeMask = DegreeMask([true; DEGREE_COUNT]);

    /// Builds a mask from 1-based degrees. Out-of-range degrees are ignored.
    pub fn from_degrees(degrees: &[u8]) -> Self {
        let mut mask = [false; DEGREE_COUNT];
        for &degree in degrees {
            if (1..=DEGREE_COUNT as u8).contains(&degree) {
                mask[(degree - 1) as usize] = true;
            }
        }
        DegreeMask(mask)
    }

    /// Whether no degree is set.
    pub fn is_unset(&self) -> bool {
        self.0.iter().all(|&b| !b)
    }

    /// Whether the 1-based `degree` is in the mask.
    pub fn contains(&self, degree: u8) -> bool {
        (1..=DEGREE_COUNT as u8).contains(&degree) && self.0[(degree - 1) as usize]
    }

    /// Returns `self`, or `fallback` when `self` is unset.
    pub fn or_default(self, fallback: DegreeMask) -> DegreeMask {
        if self.is_unset() {
            fallback
        } else {
            self
        }
    }

    /// Set intersection.
    pub fn intersect(&self, other: &DegreeMask) -> DegreeMask {
        let mut mask = [false; DEGREE_COUNT];
        for (i, slot) in mask.iter_mut().enumerate() {
            *slot = self.0[i] && other.0[i];
        }
        DegreeMask(mask)
    }

    /// The set degrees in ascending order.
    pub fn degrees(&self) -> Vec<u8> {
        (1..=DEGREE_COUNT as u8).filter(|&d| self.contains(d)).collect()
    }
}

impl std::fmt::Display for DegreeMask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let degrees: Vec<String> = self.degrees().iter().map(|d| d.to_string()).collect();
        write!(f, "{{{}}}", degrees.join(","))
    }
}

/// A tendency tone and the degree it resolves onto, one semitone above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TendencyPair {
    /// Degree that carries the tendency.
    pub tendency: u8,
    /// Degree it resolves to.
    pub resolution: u8,
}

/// Scale data derived once per generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleContext {
    mode: Mode,
    tonic: u8,
    degree_to_pitch_class: [u8; DEGREE_COUNT],
    pitch_class_mask: [bool; 12],
    tendency_pairs: Vec<TendencyPair>,
}

impl ScaleContext {
    /// Resolves a mode on the fixed tonic C.
    pub fn resolve(mode: Mode) -> Self {
        Self::with_tonic(mode, 0)
    }

    /// Resolves a mode on an arbitrary tonic pitch class.
    pub fn with_tonic(mode: Mode, tonic: u8) -> Self {
        let tonic = tonic % 12;
        let intervals = mode.intervals();

        let mut degree_to_pitch_class = [0u8; DEGREE_COUNT];
        let mut pitch_class_mask = [false; 12];
        for (i, &iv) in intervals.iter().enumerate() {
            let pc = (tonic + iv) % 12;
            degree_to_pitch_class[i] = pc;
            pitch_class_mask[pc as usize] = true;
        }

        // Consecutive degrees, including the wrap from 7 up to 1.
        let mut tendency_pairs = Vec::new();
        for i in 0..DEGREE_COUNT {
            let next = (i + 1) % DEGREE_COUNT;
            let gap = (degree_to_pitch_class[next] as i32 - degree_to_pitch_class[i] as i32)
                .rem_euclid(12);
            if gap == 1 {
                tendency_pairs.push(TendencyPair {
                    tendency: i as u8 + 1,
                    resolution: next as u8 + 1,
                });
            }
        }

        Self {
            mode,
            tonic,
            degree_to_pitch_class,
            pitch_class_mask,
            tendency_pairs,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn tonic(&self) -> u8 {
        self.tonic
    }

    /// Pitch classes of degrees 1-7.
    pub fn degree_to_pitch_class(&self) -> &[u8; DEGREE_COUNT] {
        &self.degree_to_pitch_class
    }

    /// 12-entry membership mask indexed by pitch class.
    pub fn pitch_class_mask(&self) -> &[bool; 12] {
        &self.pitch_class_mask
    }

    /// Semitone-adjacent degree pairs.
    pub fn tendency_pairs(&self) -> &[TendencyPair] {
        &self.tendency_pairs
    }

    /// The degree a tendency tone resolves onto, if `degree` is one.
    pub fn tendency_target(&self, degree: u8) -> Option<u8> {
        self.tendency_pairs
            .iter()
            .find(|p| p.tendency == degree)
            .map(|p| p.resolution)
    }

    /// Whether `pitch` belongs to the scale.
    pub fn contains(&self, pitch: i32) -> bool {
        self.pitch_class_mask[pitch.rem_euclid(12) as usize]
    }

    /// 1-based degree of `pitch`, or `None` when it is not a scale member.
    pub fn degree_of(&self, pitch: i32) -> Option<u8> {
        let pc = pitch.rem_euclid(12) as u8;
        self.degree_to_pitch_class
            .iter()
            .position(|&p| p == pc)
            .map(|i| i as u8 + 1)
    }

    /// Next scale member strictly above `pitch`.
    pub fn step_up(&self, pitch: i32) -> i32 {
        let mut p = pitch + 1;
        while !self.contains(p) {
            p += 1;
        }
        p
    }

    /// Next scale member strictly below `pitch`.
    pub fn step_down(&self, pitch: i32) -> i32 {
        let mut p = pitch - 1;
        while !self.contains(p) {
            p -= 1;
        }
        p
    }

    /// Moves `steps` diatonic steps (negative = down).
    pub fn step_by(&self, pitch: i32, steps: i32) -> i32 {
        let mut p = pitch;
        for _ in 0..steps.unsigned_abs() {
            p = if steps > 0 {
                self.step_up(p)
            } else {
                self.step_down(p)
            };
        }
        p
    }

    /// Index of a scale pitch on the infinite diatonic ladder rooted at the tonic.
    fn ordinal(&self, pitch: i32) -> Option<i32> {
        let rel = pitch - self.tonic as i32;
        let octave = rel.div_euclid(12);
        let degree = self.degree_of(pitch)? as i32;
        Some(octave * DEGREE_COUNT as i32 + degree - 1)
    }

    /// Signed number of diatonic steps from `from` to `to`.
    ///
    /// Both pitches must be scale members.
    pub fn diatonic_distance(&self, from: i32, to: i32) -> Option<i32> {
        Some(self.ordinal(to)? - self.ordinal(from)?)
    }

    /// Every scale pitch in `[min, max]` whose degree is in `degrees`.
    pub fn pitches_in_register(&self, degrees: &DegreeMask, min: i32, max: i32) -> Vec<i32> {
        (min..=max)
            .filter(|&p| self.degree_of(p).is_some_and(|d| degrees.contains(d)))
            .collect()
    }

    /// Nearest pitch in `[min, max]` whose degree is in `degrees`.
    ///
    /// Ties resolve downward.
    pub fn nearest_pitch(&self, degrees: &DegreeMask, reference: i32, min: i32, max: i32) -> Option<i32> {
        let span = (reference - min).abs().max((max - reference).abs());
        for offset in 0..=span {
            for candidate in [reference - offset, reference + offset] {
                if candidate < min || candidate > max {
                    continue;
                }
                if self.degree_of(candidate).is_some_and(|d| degrees.contains(d)) {
                    return Some(candidate);
                }
            }
        }
        None
    }
}
