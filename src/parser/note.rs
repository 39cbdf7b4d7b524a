//! Primitive note and chord parsing for ABC bodies.
//!
//! A note is `[accidental] letter [octave marks] [duration] [-]`:
//! - Accidentals: `^` sharp, `^^` double sharp, `_` flat, `__` double flat, `=` natural
//! - Letter: `C`-`B` is octave 4, `c`-`b` octave 5
//! - Octave marks: each `'` raises and each `,` lowers one octave
//! - Duration: digits, `/`, `.`, accents `>`/`<` (see `duration::resolve_duration`)
//! - Tie: trailing `-`
//!
//! A chord is `[` notes `]` with an optional duration and tie after the bracket.

use crate::accidentals::AccidentalTracker;
use crate::duration::resolve_duration;
use crate::lexer::find_closing;
use crate::music::{clamp_octave, natural_pitch_class, RawNote};

/// Timing and voice a note inherits from its surroundings.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteContext {
    pub base_duration: f64,
    pub onset: f64,
    pub voice: Option<String>,
}

/// Read an accidental prefix at `i`. Returns the semitone offset (if any)
/// and the index after the prefix.
pub fn read_accidental(chars: &[char], i: usize) -> (Option<i8>, usize) {
    match (chars.get(i), chars.get(i + 1)) {
        (Some('^'), Some('^')) => (Some(2), i + 2),
        (Some('^'), _) => (Some(1), i + 1),
        (Some('_'), Some('_')) => (Some(-2), i + 2),
        (Some('_'), _) => (Some(-1), i + 1),
        (Some('='), _) => (Some(0), i + 1),
        _ => (None, i),
    }
}

/// Read the duration suffix starting at `i`.
pub fn read_duration_suffix(chars: &[char], i: usize) -> (String, usize) {
    let start = i.min(chars.len());
    let mut j = start;
    while j < chars.len() && is_duration_char(chars[j]) {
        j += 1;
    }
    (chars[start..j].iter().collect(), j)
}

fn is_duration_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '/' | '.' | '>' | '<')
}

fn is_note_letter(c: Option<&char>) -> bool {
    c.is_some_and(|&c| natural_pitch_class(c).is_some())
}

/// Parse one note whose letter sits at `i`; the accidental prefix has
/// already been consumed by the caller.
///
/// Returns the note and the index after it. If `i` is not a note letter,
/// returns no note and advances by one.
pub fn parse_note(
    chars: &[char],
    i: usize,
    ctx: &NoteContext,
    accidental: Option<i8>,
    tracker: &mut AccidentalTracker,
) -> (Option<RawNote>, usize) {
    let letter = match chars.get(i) {
        Some(&c) if natural_pitch_class(c).is_some() => c,
        _ => return (None, i + 1),
    };

    let mut octave: i32 = if letter.is_ascii_uppercase() { 4 } else { 5 };
    let mut j = i + 1;
    while let Some(&mark) = chars.get(j) {
        match mark {
            '\'' => octave += 1,
            ',' => octave -= 1,
            _ => break,
        }
        j += 1;
    }
    let octave = clamp_octave(octave);

    let Some(pitch_class) = tracker.pitch_class(letter, octave, accidental) else {
        return (None, i + 1);
    };

    let (token, mut j) = read_duration_suffix(chars, j);
    let duration = resolve_duration(&token, ctx.base_duration);

    let tie = chars.get(j) == Some(&'-');
    if tie {
        j += 1;
    }

    let note = RawNote {
        pitch_class,
        octave,
        start_time: ctx.onset,
        duration,
        voice: ctx.voice.clone(),
        slur: None,
        tie,
    };
    (Some(note), j)
}

/// Notes of one chord, all sharing the same onset.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedChord {
    pub notes: Vec<RawNote>,
    pub next: usize,
}

impl ParsedChord {
    /// Time the chord occupies: the longest member.
    pub fn duration(&self) -> f64 {
        self.notes.iter().map(|n| n.duration).fold(0.0, f64::max)
    }
}

/// Parse a chord whose `[` sits at `open`.
///
/// A duration after `]` overrides every member; a `-` after it ties every
/// member. Unterminated chords run to the end of the line.
pub fn parse_chord(
    chars: &[char],
    open: usize,
    ctx: &NoteContext,
    tracker: &mut AccidentalTracker,
) -> ParsedChord {
    let close = find_closing(chars, open, ']').unwrap_or(chars.len());
    let mut notes = Vec::new();

    let mut j = open + 1;
    while j < close {
        let (accidental, at) = read_accidental(chars, j);
        if at < close && is_note_letter(chars.get(at)) {
            let (note, next) = parse_note(chars, at, ctx, accidental, tracker);
            notes.extend(note);
            j = next;
        } else {
            j = if at > j { at } else { j + 1 };
        }
    }

    let after = (close + 1).min(chars.len());
    let (token, mut next) = read_duration_suffix(chars, after);
    if !token.is_empty() {
        let duration = resolve_duration(&token, ctx.base_duration);
        for note in &mut notes {
            note.duration = duration;
        }
    }

    if chars.get(next) == Some(&'-') {
        for note in &mut notes {
            note.tie = true;
        }
        next += 1;
    }

    ParsedChord { notes, next }
}
