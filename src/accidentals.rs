//! Three-tier accidental lookup: explicit mark, then bar-local memory, then
//! key signature.

use crate::music::{altered_pitch_class, natural_pitch_class, KeySignature};
use std::collections::HashMap;

/// Tracks the key signature and the accidentals written so far in the
/// current bar. Bar memory is keyed by natural letter and octave, so `^F`
/// alters later `F`s in the same octave but not `f`.
#[derive(Debug, Clone, Default)]
pub struct AccidentalTracker {
    key: KeySignature,
    bar: HashMap<(char, u8), i8>,
}

impl AccidentalTracker {
    pub fn new(key: KeySignature) -> Self {
        Self {
            key,
            bar: HashMap::new(),
        }
    }

    pub fn set_key(&mut self, key: KeySignature) {
        self.key = key;
    }

    /// Forget bar-local accidentals (bar lines, voice switches).
    pub fn clear_bar(&mut self) {
        self.bar.clear();
    }

    /// Semitone offset for a note. An explicit mark is recorded for the rest
    /// of the bar.
    pub fn resolve(&mut self, letter: char, octave: u8, explicit: Option<i8>) -> i8 {
        let letter = letter.to_ascii_uppercase();
        if let Some(offset) = explicit {
            self.bar.insert((letter, octave), offset);
            return offset;
        }
        if let Some(&offset) = self.bar.get(&(letter, octave)) {
            return offset;
        }
        self.key.accidental_for(letter)
    }

    /// Resolved pitch class for a note letter, or `None` if it is not `A`-`G`.
    pub fn pitch_class(&mut self, letter: char, octave: u8, explicit: Option<i8>) -> Option<u8> {
        let natural = natural_pitch_class(letter)?;
        let offset = self.resolve(letter, octave, explicit);
        Some(altered_pitch_class(natural, offset))
    }
}
