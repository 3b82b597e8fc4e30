//! Note name conversion.
//!
//! Names use scientific pitch notation with middle C as `C4` (pitch 60).
//! Sharps are written `#`, flats `b`.

/// Pitch-class names, sharps only.
const PITCH_CLASS_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Semitone offsets for note letters.
const LETTER_SEMITONES: [(char, i32); 7] = [
    ('C', 0),
    ('D', 2),
    ('E', 4),
    ('F', 5),
    ('G', 7),
    ('A', 9),
    ('B', 11),
];

/// Convert a pitch number to a note name.
///
/// # Examples
/// ```
/// use melodia_core::note::pitch_to_note_name;
///
/// assert_eq!(pitch_to_note_name(60), "C4");
/// assert_eq!(pitch_to_note_name(70), "A#4");
/// assert_eq!(pitch_to_note_name(0), "C-1");
/// ```
pub fn pitch_to_note_name(pitch: i32) -> String {
    let name = PITCH_CLASS_NAMES[pitch.rem_euclid(12) as usize];
    let octave = pitch.div_euclid(12) - 1;
    format!("{}{}", name, octave)
}

/// Parse a note name (e.g. "C4", "F#3", "Bb2", "C-1") into a pitch number.
///
/// Returns `None` for malformed names and for pitches outside 0..=127.
///
/// # Examples
/// ```
/// use melodia_core::note::parse_note_name;
///
/// assert_eq!(parse_note_name("C4"), Some(60));
/// assert_eq!(parse_note_name("Bb3"), Some(58));
/// assert_eq!(parse_note_name("H2"), None);
/// ```
pub fn parse_note_name(name: &str) -> Option<i32> {
    let mut chars = name.trim().chars().peekable();
    let letter = chars.next()?.to_ascii_uppercase();
    let mut semitone = LETTER_SEMITONES
        .iter()
        .find(|(c, _)| *c == letter)
        .map(|(_, s)| *s)?;

    match chars.peek() {
        Some('#') => {
            semitone += 1;
            chars.next();
        }
        Some('b') => {
            semitone -= 1;
            chars.next();
        }
        _ => {}
    }

    let octave: i32 = chars.collect::<String>().parse().ok()?;
    let pitch = (octave + 1) * 12 + semitone;
    (0..=127).contains(&pitch).then_some(pitch)
}

/// Parse either a plain pitch number ("55") or a note name ("G3").
pub fn parse_pitch(text: &str) -> Option<i32> {
    let text = text.trim();
    match text.parse::<i32>() {
        Ok(pitch) => (0..=127).contains(&pitch).then_some(pitch),
        Err(_) => parse_note_name(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_across_octaves() {
        assert_eq!(pitch_to_note_name(55), "G3");
        assert_eq!(pitch_to_note_name(72), "C5");
        assert_eq!(pitch_to_note_name(127), "G9");
        assert_eq!(pitch_to_note_name(61), "C#4");
    }

    #[test]
    fn test_parse_accidentals() {
        assert_eq!(parse_note_name("A4"), Some(69));
        assert_eq!(parse_note_name("a4"), Some(69));
        assert_eq!(parse_note_name("F#3"), Some(54));
        assert_eq!(parse_note_name("Cb4"), Some(59));
        assert_eq!(parse_note_name("C-1"), Some(0));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_note_name(""), None);
        assert_eq!(parse_note_name("C"), None);
        assert_eq!(parse_note_name("X4"), None);
        assert_eq!(parse_note_name("C#x"), None);
        assert_eq!(parse_note_name("G#9"), None);
    }

    #[test]
    fn test_name_roundtrip() {
        for pitch in [0, 21, 55, 60, 64, 71, 72, 108, 127] {
            assert_eq!(parse_note_name(&pitch_to_note_name(pitch)), Some(pitch));
        }
    }

    #[test]
    fn test_parse_pitch_accepts_numbers() {
        assert_eq!(parse_pitch("55"), Some(55));
        assert_eq!(parse_pitch(" G3 "), Some(55));
        assert_eq!(parse_pitch("128"), None);
        assert_eq!(parse_pitch("-3"), None);
    }
}
