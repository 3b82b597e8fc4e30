//! Standard MIDI file export.
//!
//! Writes a generated line as a single-track SMF (format 0) at 480 ticks per
//! quarter note. Note durations are converted from seconds at the given tempo.

use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind};
use thiserror::Error;

use crate::NoteEvent;

/// Ticks per quarter note in MIDI output.
pub const TICKS_PER_QUARTER: u16 = 480;

/// Velocity for every note.
const VELOCITY: u8 = 80;

/// Largest delta time a track event can carry.
const MAX_DELTA: u32 = (1 << 28) - 1;

/// Errors from MIDI export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("pitch {0} is outside the MIDI range 0..=127")]
    PitchOutOfRange(i32),

    #[error("tempo {0} BPM is not representable")]
    InvalidTempo(f64),

    #[error("note duration {0}s is not representable")]
    InvalidDuration(f64),

    #[error("failed to write MIDI data: {0}")]
    Write(#[from] std::io::Error),
}

/// Microseconds per quarter note for a tempo in BPM.
fn tempo_micros(tempo_bpm: f64) -> Result<u32, ExportError> {
    if !tempo_bpm.is_finite() || tempo_bpm <= 0.0 {
        return Err(ExportError::InvalidTempo(tempo_bpm));
    }
    let micros = (60_000_000.0 / tempo_bpm).round();
    if micros < 1.0 || micros > 0xFF_FFFF as f64 {
        return Err(ExportError::InvalidTempo(tempo_bpm));
    }
    Ok(micros as u32)
}

/// Ticks for a duration in seconds, at least one.
fn duration_ticks(seconds: f64, tempo_bpm: f64) -> Result<u32, ExportError> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(ExportError::InvalidDuration(seconds));
    }
    let ticks = (seconds * tempo_bpm / 60.0 * TICKS_PER_QUARTER as f64).round();
    if ticks > MAX_DELTA as f64 {
        return Err(ExportError::InvalidDuration(seconds));
    }
    Ok((ticks as u32).max(1))
}

fn midi_event(delta: u32, message: MidiMessage) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(delta),
        kind: TrackEventKind::Midi {
            channel: u4::new(0),
            message,
        },
    }
}

/// Builds the in-memory SMF for a line.
fn line_to_smf(notes: &[NoteEvent], tempo_bpm: f64) -> Result<Smf<'static>, ExportError> {
    let mut smf = Smf::new(Header::new(
        Format::SingleTrack,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));

    let mut track: Track<'static> = Vec::with_capacity(notes.len() * 2 + 3);
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::TrackName(crate::GENERATOR_ID.as_bytes())),
    });
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(tempo_micros(tempo_bpm)?))),
    });

    for note in notes {
        let key = u8::try_from(note.pitch)
            .ok()
            .filter(|k| *k <= 127)
            .ok_or(ExportError::PitchOutOfRange(note.pitch))?;
        let ticks = duration_ticks(note.duration_seconds, tempo_bpm)?;
        track.push(midi_event(
            0,
            MidiMessage::NoteOn {
                key: u7::new(key),
                vel: u7::new(VELOCITY),
            },
        ));
        track.push(midi_event(
            ticks,
            MidiMessage::NoteOff {
                key: u7::new(key),
                vel: u7::new(0),
            },
        ));
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    smf.tracks.push(track);
    Ok(smf)
}

/// Encodes a line as a standard MIDI file.
///
/// # Arguments
/// * `notes` - The line to export
/// * `tempo_bpm` - Quarter notes per minute used to convert seconds to ticks
///
/// # Returns
/// The SMF bytes, ready to write to a `.mid` file.
pub fn to_midi_bytes(notes: &[NoteEvent], tempo_bpm: f64) -> Result<Vec<u8>, ExportError> {
    let smf = line_to_smf(notes, tempo_bpm)?;
    let mut buf = Vec::new();
    smf.write_std(&mut buf)?;
    Ok(buf)
}
