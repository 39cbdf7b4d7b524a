//! # Music Types
//!
//! Read-only lookup tables and the intermediate types shared by both dialect
//! parsers.
//!
//! ## Pitch Model
//! - Pitch class is the chromatic offset from C (`C=0 ... B=11`) after accidentals
//! - Octave follows scientific pitch notation, clamped to `0..=8` (A0..C8 range)
//! - Middle C is `C4`, so `A4` (pitch class 9, octave 4) is MIDI 69 / 440 Hz
//!
//! ## Key Signatures
//! A key is stored as its position on the circle of fifths (`-7..=7`, flats
//! negative). The accidental for any natural letter follows from that count
//! and the standard order of sharps (F C G D A E B) or flats (B E A D G C F).
//!
//! ## Related Modules
//! - `accidentals` - Applies the key table and bar-local accidentals
//! - `parser` - Produces `RawNote`s and `ScoreMetadata`
//! - `playback` - Turns `RawNote`s into the public `Note` type

use serde::Serialize;

/// Tempo used when the source never declares one.
pub const DEFAULT_BPM: u16 = 120;

/// Voice identifier for notes written outside any declared voice or track.
pub const DEFAULT_VOICE: &str = "default";

/// Lowest and highest octave numbers a note may carry.
pub const MIN_OCTAVE: i32 = 0;
pub const MAX_OCTAVE: i32 = 8;

const SHARP_ORDER: [char; 7] = ['F', 'C', 'G', 'D', 'A', 'E', 'B'];
const FLAT_ORDER: [char; 7] = ['B', 'E', 'A', 'D', 'G', 'C', 'F'];

/// Natural pitch class for a note letter (either case).
///
/// ```
/// use tunescore::music::natural_pitch_class;
///
/// assert_eq!(natural_pitch_class('C'), Some(0));
/// assert_eq!(natural_pitch_class('f'), Some(5));
/// assert_eq!(natural_pitch_class('H'), None);
/// ```
pub fn natural_pitch_class(letter: char) -> Option<u8> {
    match letter.to_ascii_uppercase() {
        'C' => Some(0),
        'D' => Some(2),
        'E' => Some(4),
        'F' => Some(5),
        'G' => Some(7),
        'A' => Some(9),
        'B' => Some(11),
        _ => None,
    }
}

/// Apply a semitone offset to a natural pitch class, wrapping into `0..12`.
pub fn altered_pitch_class(natural: u8, offset: i8) -> u8 {
    (natural as i16 + offset as i16).rem_euclid(12) as u8
}

/// Clamp a computed octave into the supported keyboard range.
pub fn clamp_octave(octave: i32) -> u8 {
    octave.clamp(MIN_OCTAVE, MAX_OCTAVE) as u8
}

/// Mode of a key signature, expressed by how far it shifts the tonic's
/// major-key position on the circle of fifths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Major,
    Minor,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Locrian,
}

impl Mode {
    /// Parse a mode word such as `m`, `min`, `Dor`, `mixolydian`.
    pub fn parse(word: &str) -> Option<Self> {
        let lower = word.to_ascii_lowercase();
        if lower.is_empty() {
            return Some(Mode::Major);
        }
        if lower == "m" {
            return Some(Mode::Minor);
        }
        let prefix: String = lower.chars().take(3).collect();
        match prefix.as_str() {
            "maj" | "ion" => Some(Mode::Major),
            "min" | "aeo" => Some(Mode::Minor),
            "dor" => Some(Mode::Dorian),
            "phr" => Some(Mode::Phrygian),
            "lyd" => Some(Mode::Lydian),
            "mix" => Some(Mode::Mixolydian),
            "loc" => Some(Mode::Locrian),
            _ => None,
        }
    }

    fn fifths_offset(self) -> i8 {
        match self {
            Mode::Lydian => 1,
            Mode::Major => 0,
            Mode::Mixolydian => -1,
            Mode::Dorian => -2,
            Mode::Minor => -3,
            Mode::Phrygian => -4,
            Mode::Locrian => -5,
        }
    }
}

/// Key signature (number of sharps/flats)
/// Positive = sharps, Negative = flats, Zero = C major / A minor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeySignature {
    pub fifths: i8,
    pub mode: Mode,
}

impl KeySignature {
    /// Parse a key string like `G`, `Bb`, `F#m`, `D dor`, `Emin clef=bass` or `none`.
    ///
    /// Returns `None` for strings that name no key, or keys beyond seven
    /// sharps or flats (e.g. `G#`).
    ///
    /// ```
    /// use tunescore::music::{KeySignature, Mode};
    ///
    /// assert_eq!(KeySignature::parse("G").map(|k| k.fifths), Some(1));
    /// assert_eq!(KeySignature::parse("Bb").map(|k| k.fifths), Some(-2));
    /// assert_eq!(KeySignature::parse("F#m").map(|k| k.mode), Some(Mode::Minor));
    /// assert_eq!(KeySignature::parse("D dor").map(|k| k.fifths), Some(0));
    /// assert!(KeySignature::parse("Q").is_none());
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        let mut words = s.split_whitespace();
        let first = words.next()?;

        if first.eq_ignore_ascii_case("none") || first.eq_ignore_ascii_case("hp") {
            return Some(Self::default());
        }

        let mut chars = first.chars();
        let tonic: i8 = match chars.next()?.to_ascii_uppercase() {
            'F' => -1,
            'C' => 0,
            'G' => 1,
            'D' => 2,
            'A' => 3,
            'E' => 4,
            'B' => 5,
            _ => return None,
        };

        // A sharp moves a tonic seven fifths clockwise, a flat seven counter-clockwise
        let rest = chars.as_str();
        let (shift, rest) = if let Some(stripped) = rest.strip_prefix('#') {
            (7, stripped)
        } else if let Some(stripped) = rest.strip_prefix('b') {
            (-7, stripped)
        } else {
            (0, rest)
        };

        let mode = if rest.is_empty() {
            words.next().and_then(Mode::parse).unwrap_or_default()
        } else {
            Mode::parse(rest)?
        };

        let fifths = tonic + shift + mode.fifths_offset();
        if !(-7..=7).contains(&fifths) {
            return None;
        }
        Some(Self { fifths, mode })
    }

    /// Semitone offset the key applies to an unmarked note letter.
    /// Order of sharps: F C G D A E B
    /// Order of flats: B E A D G C F
    pub fn accidental_for(&self, letter: char) -> i8 {
        let letter = letter.to_ascii_uppercase();
        let count = (self.fifths.unsigned_abs() as usize).min(7);
        if self.fifths > 0 && SHARP_ORDER[..count].contains(&letter) {
            1
        } else if self.fifths < 0 && FLAT_ORDER[..count].contains(&letter) {
            -1
        } else {
            0
        }
    }
}

/// Slur marker carried through to the schedule without interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Slur {
    Start,
    End,
}

/// A note as produced by a dialect parser, before tie resolution.
///
/// `tie` marks a trailing tie onto the next note of the same pitch, octave
/// and voice. It never reaches the public `Note` type.
#[derive(Debug, Clone, PartialEq)]
pub struct RawNote {
    pub pitch_class: u8,
    pub octave: u8,
    pub start_time: f64,
    pub duration: f64,
    pub voice: Option<String>,
    pub slur: Option<Slur>,
    pub tie: bool,
}

impl RawNote {
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }
}

/// Score-level information gathered from header fields or legacy directives.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composer: Option<String>,
    pub bpm: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_note_length: Option<String>,
    pub voices: Vec<String>,
}

impl Default for ScoreMetadata {
    fn default() -> Self {
        Self {
            title: None,
            composer: None,
            bpm: DEFAULT_BPM,
            time_signature: None,
            key: None,
            default_note_length: None,
            voices: Vec::new(),
        }
    }
}

impl ScoreMetadata {
    /// Record a voice identifier, keeping first-appearance order.
    pub fn add_voice(&mut self, id: &str) {
        if !self.voices.iter().any(|v| v == id) {
            self.voices.push(id.to_string());
        }
    }
}
