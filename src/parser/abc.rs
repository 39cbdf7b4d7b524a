//! # ABC Parser
//!
//! Parses ABC-style notation: a header of `Letter:value` fields followed by
//! a body of notes.
//!
//! ## States
//! - **Header** (initial): fields set metadata. `K:` (key) ends the header.
//! - **Body**: each line is scanned lexeme by lexeme (see `lexer::Lexeme`).
//!   Field lines and inline `[X:...]` fields still apply.
//!
//! ## Header Fields
//! - `T:` title, `C:` composer
//! - `M:` meter (`6/8`, `C`, `C|`), sets the measure length for `Z` rests
//! - `L:` default note length (`1/8`), sets the base duration
//! - `Q:` tempo (`1/4=120` or `120`)
//! - `V:` voice declaration (first word is the voice id)
//! - `K:` key signature
//!
//! ## Voices
//! Every voice keeps its own time cursor. Switching voice with `V:` or
//! `[V:...]` stores the current cursor and resumes the target voice where it
//! left off, so voices interleave by identity rather than by line order.
//!
//! ## Recovery
//! Nothing here fails. Unknown characters are skipped one at a time, and
//! field values that cannot be read leave the previous value in place. Each
//! recovery is logged at `debug` level.

use super::note::{parse_chord, parse_note, read_accidental, read_duration_suffix, NoteContext};
use super::tuplet::{parse_tuplet, scale_duration, Tuplet};
use super::RawScore;
use crate::accidentals::AccidentalTracker;
use crate::duration::{
    base_duration_from_length, measure_from_meter, resolve_duration, DEFAULT_BASE_DURATION,
    DEFAULT_MEASURE_STEPS, GRACE_DURATION,
};
use crate::error::ScoreError;
use crate::lexer::{classify, find_closing, Lexeme};
use crate::music::{natural_pitch_class, KeySignature, RawNote, ScoreMetadata, Slur, DEFAULT_VOICE};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Mutable state threaded through one parse.
struct ParserState {
    in_body: bool,
    cursor: f64,
    voice: Option<String>,
    voice_cursors: HashMap<String, f64>,
    accidentals: AccidentalTracker,
    base_duration: f64,
    measure_steps: f64,
    tuplet: Option<Tuplet>,
    pending_slur: bool,
    notes: Vec<RawNote>,
    metadata: ScoreMetadata,
}

impl ParserState {
    fn new() -> Self {
        Self {
            in_body: false,
            cursor: 0.0,
            voice: None,
            voice_cursors: HashMap::new(),
            accidentals: AccidentalTracker::default(),
            base_duration: DEFAULT_BASE_DURATION,
            measure_steps: DEFAULT_MEASURE_STEPS,
            tuplet: None,
            pending_slur: false,
            notes: Vec::new(),
            metadata: ScoreMetadata::default(),
        }
    }

    fn note_context(&self) -> NoteContext {
        NoteContext {
            base_duration: self.base_duration,
            onset: self.cursor,
            voice: self.voice.clone(),
        }
    }

    /// Claim a slot in the open tuplet, if any, returning its scale factor.
    fn tuplet_member(&mut self) -> Option<f64> {
        let tuplet = self.tuplet.as_mut()?;
        let factor = tuplet.next_member();
        if tuplet.is_finished() {
            self.tuplet = None;
        }
        Some(factor)
    }

    fn push_note(&mut self, mut note: RawNote) {
        if self.pending_slur {
            note.slur = Some(Slur::Start);
            self.pending_slur = false;
        }
        self.notes.push(note);
    }

    fn switch_voice(&mut self, id: &str) {
        if self.voice.as_deref() == Some(id) {
            return;
        }
        let previous = self.voice.clone().unwrap_or_else(|| DEFAULT_VOICE.to_string());
        self.voice_cursors.insert(previous, self.cursor);
        self.cursor = self.voice_cursors.get(id).copied().unwrap_or(0.0);
        self.voice = Some(id.to_string());
        self.accidentals.clear_bar();
        self.tuplet = None;
        self.pending_slur = false;
        self.metadata.add_voice(id);
        trace!(voice = id, cursor = self.cursor, "switched voice");
    }

    /// Apply a `Letter:value` field from a header line, body line or inline field.
    fn apply_field(&mut self, field: char, value: &str) {
        let value = value.trim();
        let in_header = !self.in_body;
        match field {
            'T' if self.metadata.title.is_none() => self.metadata.title = Some(value.to_string()),
            'C' if self.metadata.composer.is_none() => {
                self.metadata.composer = Some(value.to_string())
            }
            'M' => match measure_from_meter(value) {
                Ok((meter, steps)) => {
                    self.measure_steps = steps;
                    if in_header || self.metadata.time_signature.is_none() {
                        self.metadata.time_signature = Some(meter);
                    }
                }
                Err(e) => debug!(%e, "keeping previous meter"),
            },
            'L' => match base_duration_from_length(value) {
                Ok(base) => {
                    self.base_duration = base;
                    if in_header || self.metadata.default_note_length.is_none() {
                        self.metadata.default_note_length = Some(value.to_string());
                    }
                }
                Err(e) => debug!(%e, "keeping previous default length"),
            },
            'Q' => match parse_tempo(value) {
                Ok(bpm) if in_header => self.metadata.bpm = bpm,
                Ok(_) => trace!(value, "ignoring tempo change inside the body"),
                Err(e) => debug!(%e, "keeping previous tempo"),
            },
            'V' => match value.split_whitespace().next() {
                Some(id) if in_header => self.metadata.add_voice(id),
                Some(id) => self.switch_voice(id),
                None => debug!("ignoring voice field without an id"),
            },
            'K' => {
                match KeySignature::parse(value) {
                    Some(key) => {
                        self.accidentals.set_key(key);
                        if in_header || self.metadata.key.is_none() {
                            self.metadata.key = Some(value.to_string());
                        }
                    }
                    None => {
                        let e = ScoreError::MetadataError(format!("Invalid key signature: {}", value));
                        debug!(%e, "keeping previous key");
                    }
                }
                self.in_body = true;
            }
            _ => trace!(%field, value, "ignoring field"),
        }
    }

    fn scan_line(&mut self, line: &str, line_no: usize) {
        let chars: Vec<char> = line.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            i = match classify(&chars, i) {
                Lexeme::Space => i + 1,
                Lexeme::BarLine { end } => {
                    self.accidentals.clear_bar();
                    end
                }
                Lexeme::Decoration { end } => end,
                Lexeme::InlineField { end } => {
                    self.inline_field(&chars[i + 1..end]);
                    end
                }
                Lexeme::ChordOpen => self.chord(&chars, i),
                Lexeme::TupletOpen => {
                    let (tuplet, next) = parse_tuplet(&chars, i);
                    self.tuplet = tuplet;
                    next
                }
                Lexeme::GraceOpen => self.grace(&chars, i),
                Lexeme::SlurOpen => {
                    self.pending_slur = true;
                    i + 1
                }
                Lexeme::SlurClose => {
                    let voice = &self.voice;
                    match self.notes.iter_mut().rev().find(|n| &n.voice == voice) {
                        Some(last) => last.slur = Some(Slur::End),
                        None => trace!(line = line_no, "slur end without a note"),
                    }
                    i + 1
                }
                Lexeme::Rest { whole_measure } => self.rest(&chars, i, whole_measure),
                Lexeme::Note => self.note(&chars, i),
                Lexeme::Unknown => {
                    let e = ScoreError::ParseError {
                        line: line_no,
                        column: i + 1,
                        message: format!("Unexpected character '{}'", chars[i]),
                    };
                    debug!(%e, "skipping character");
                    i + 1
                }
            };
        }
    }

    fn inline_field(&mut self, inner: &[char]) {
        let text: String = inner.iter().collect();
        let text = text.trim_end_matches(']');
        if let Some((field, value)) = split_field(text) {
            self.apply_field(field, value);
        }
    }

    fn note(&mut self, chars: &[char], i: usize) -> usize {
        let (accidental, at) = read_accidental(chars, i);
        let ctx = self.note_context();
        let (note, next) = parse_note(chars, at, &ctx, accidental, &mut self.accidentals);
        if let Some(mut note) = note {
            if let Some(factor) = self.tuplet_member() {
                note.duration = scale_duration(note.duration, factor);
            }
            self.cursor += note.duration;
            self.push_note(note);
        }
        next
    }

    fn chord(&mut self, chars: &[char], open: usize) -> usize {
        let ctx = self.note_context();
        let chord = parse_chord(chars, open, &ctx, &mut self.accidentals);
        if chord.notes.is_empty() {
            return chord.next;
        }

        let factor = self.tuplet_member();
        let mut span: f64 = 0.0;
        for mut note in chord.notes {
            if let Some(factor) = factor {
                note.duration = scale_duration(note.duration, factor);
            }
            span = span.max(note.duration);
            self.push_note(note);
        }
        self.cursor += span;
        chord.next
    }

    fn rest(&mut self, chars: &[char], i: usize, whole_measure: bool) -> usize {
        let (token, next) = read_duration_suffix(chars, i + 1);
        let duration = if whole_measure {
            let measures = token.parse::<u32>().ok().filter(|n| *n > 0).unwrap_or(1);
            self.measure_steps * measures as f64
        } else {
            let duration = resolve_duration(&token, self.base_duration);
            match self.tuplet_member() {
                Some(factor) => scale_duration(duration, factor),
                None => duration,
            }
        };
        self.cursor += duration;
        next
    }

    /// Grace notes get a fixed half-step each and push the cursor forward by it.
    fn grace(&mut self, chars: &[char], open: usize) -> usize {
        let close = find_closing(chars, open, '}').unwrap_or(chars.len());
        let mut j = open + 1;
        while j < close {
            let (accidental, at) = read_accidental(chars, j);
            if at < close && chars.get(at).is_some_and(|&c| natural_pitch_class(c).is_some()) {
                let ctx = self.note_context();
                let (note, next) = parse_note(chars, at, &ctx, accidental, &mut self.accidentals);
                if let Some(mut note) = note {
                    note.duration = GRACE_DURATION;
                    note.tie = false;
                    self.cursor += GRACE_DURATION;
                    self.push_note(note);
                }
                j = next;
            } else {
                j = if at > j { at } else { j + 1 };
            }
        }
        (close + 1).min(chars.len())
    }
}

/// Field letters that may stand on their own line inside the body. Any other
/// `Letter:` line there is music, e.g. `E:|CD|`.
const BODY_FIELDS: &[char] = &[
    'I', 'K', 'L', 'M', 'm', 'N', 'P', 'Q', 'R', 'r', 's', 'T', 'U', 'V', 'W', 'w',
];

/// Split a `Letter:value` field line.
fn split_field(line: &str) -> Option<(char, &str)> {
    let mut chars = line.chars();
    match (chars.next(), chars.next()) {
        (Some(letter), Some(':')) if letter.is_ascii_alphabetic() => Some((letter, &line[2..])),
        _ => None,
    }
}

/// Parse a tempo field: `1/4=120`, `"Allegro" 3/8=80` or a bare `120`.
pub fn parse_tempo(value: &str) -> Result<u16, ScoreError> {
    let bpm = match value.rsplit_once('=') {
        Some((_, bpm)) => {
            let digits: String = bpm.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse::<u16>().ok()
        }
        None => value.trim().parse::<u16>().ok(),
    };
    bpm.filter(|bpm| *bpm > 0)
        .ok_or_else(|| ScoreError::MetadataError(format!("Invalid tempo: {}", value)))
}

/// Join `\` continuations and drop `%` comments. Each logical line keeps the
/// 1-based number of its first physical line.
fn logical_lines(content: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (idx, raw) in content.lines().enumerate() {
        if raw.trim_start().starts_with('%') {
            continue;
        }
        let text = match raw.find('%') {
            Some(pos) => &raw[..pos],
            None => raw,
        };
        let text = text.trim_end();
        let (body, continues) = match text.strip_suffix('\\') {
            Some(body) => (body, true),
            None => (text, false),
        };

        let mut current = pending.take().unwrap_or_else(|| (idx + 1, String::new()));
        current.1.push_str(body);
        if continues {
            pending = Some(current);
        } else {
            lines.push(current);
        }
    }

    lines.extend(pending);
    lines
}

/// Parse ABC notation into unresolved notes and metadata.
pub fn parse(content: &str) -> RawScore {
    let mut state = ParserState::new();

    for (line_no, line) in logical_lines(content) {
        match split_field(&line) {
            Some((field, value)) if !state.in_body || BODY_FIELDS.contains(&field) => {
                state.apply_field(field, value);
                continue;
            }
            _ => {}
        }
        if state.in_body {
            state.scan_line(&line, line_no);
        } else if !line.trim().is_empty() {
            trace!(line = line_no, "ignoring free text in header");
        }
    }

    RawScore {
        metadata: state.metadata,
        notes: state.notes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(music: &str) -> RawScore {
        parse(&format!("X:1\nK:C\n{}\n", music))
    }

    fn starts(score: &RawScore) -> Vec<f64> {
        score.notes.iter().map(|n| n.start_time).collect()
    }

    fn durations(score: &RawScore) -> Vec<f64> {
        score.notes.iter().map(|n| n.duration).collect()
    }

    #[test]
    fn test_header_fields() {
        let score = parse(
            "X:1\nT:Speed the Plough\nT:Alternate Title\nC:Trad.\nM:6/8\nL:1/16\nQ:3/8=90\nV:1\nV:2 clef=bass\nK:Dmaj\n",
        );
        let m = score.metadata;
        assert_eq!(m.title.as_deref(), Some("Speed the Plough"));
        assert_eq!(m.composer.as_deref(), Some("Trad."));
        assert_eq!(m.time_signature.as_deref(), Some("6/8"));
        assert_eq!(m.default_note_length.as_deref(), Some("1/16"));
        assert_eq!(m.bpm, 90);
        assert_eq!(m.key.as_deref(), Some("Dmaj"));
        assert_eq!(m.voices, vec!["1", "2"]);
    }

    #[test]
    fn test_notes_before_key_are_ignored() {
        let score = parse("X:1\nCDEF\nK:C\nGA\n");
        assert_eq!(score.notes.len(), 2);
        assert_eq!(score.notes[0].pitch_class, 7);
    }

    #[test]
    fn test_default_length_sets_base() {
        let score = parse("X:1\nL:1/4\nK:C\nC D2 E/\n");
        assert_eq!(durations(&score), vec![4.0, 8.0, 2.0]);
        assert_eq!(starts(&score), vec![0.0, 4.0, 12.0]);
    }

    #[test]
    fn test_key_signature_and_bar_accidentals() {
        let score = parse("X:1\nK:G\nF =F F | F\n");
        let pitches: Vec<u8> = score.notes.iter().map(|n| n.pitch_class).collect();
        assert_eq!(pitches, vec![6, 5, 5, 6]);
    }

    #[test]
    fn test_rests_advance_cursor() {
        let score = body("C z2 D x E");
        assert_eq!(score.notes.len(), 3);
        assert_eq!(starts(&score), vec![0.0, 6.0, 10.0]);
    }

    #[test]
    fn test_whole_measure_rest_uses_meter() {
        let score = parse("X:1\nM:3/4\nK:C\nZ2 | C\n");
        assert_eq!(starts(&score), vec![24.0]);
    }

    #[test]
    fn test_chord_advances_by_longest_member() {
        let score = body("[CE4] G");
        assert_eq!(starts(&score), vec![0.0, 0.0, 8.0]);
    }

    #[test]
    fn test_triplet() {
        let score = parse("X:1\nL:1/4\nK:C\n(3CDE F\n");
        assert_eq!(durations(&score), vec![3.0, 3.0, 3.0, 4.0]);
        assert_eq!(starts(&score), vec![0.0, 3.0, 6.0, 9.0]);
    }

    #[test]
    fn test_tuplet_counts_chords_and_rests() {
        let score = parse("X:1\nL:1/4\nK:C\n(3[CE]zG A\n");
        assert_eq!(starts(&score), vec![0.0, 0.0, 6.0, 9.0]);
    }

    #[test]
    fn test_grace_notes() {
        let score = body("{ag}B c");
        assert_eq!(durations(&score), vec![0.5, 0.5, 2.0, 2.0]);
        assert_eq!(starts(&score), vec![0.0, 0.5, 1.0, 3.0]);
        assert_eq!(score.notes[0].octave, 5);
    }

    #[test]
    fn test_decorations_and_annotations_skipped() {
        let score = body("\"Am\"~A !trill!B .c +fermata+d");
        assert_eq!(score.notes.len(), 4);
        assert_eq!(starts(&score), vec![0.0, 2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_garbage_is_skipped() {
        let score = body("& * 9 ?");
        assert!(score.notes.is_empty());
    }

    #[test]
    fn test_voices_keep_independent_cursors() {
        let score = parse("X:1\nV:1\nV:2\nK:C\nV:1\nCD\nV:2\nEF\nV:1\nG\n");
        let v1: Vec<f64> = score
            .notes
            .iter()
            .filter(|n| n.voice.as_deref() == Some("1"))
            .map(|n| n.start_time)
            .collect();
        let v2: Vec<f64> = score
            .notes
            .iter()
            .filter(|n| n.voice.as_deref() == Some("2"))
            .map(|n| n.start_time)
            .collect();
        assert_eq!(v1, vec![0.0, 2.0, 4.0]);
        assert_eq!(v2, vec![0.0, 2.0]);
    }

    #[test]
    fn test_inline_fields() {
        let score = body("F [K:D] F [V:alto] C [L:1/4] D");
        let m = &score.metadata;
        assert_eq!(score.notes[0].pitch_class, 5);
        assert_eq!(score.notes[1].pitch_class, 6);
        assert_eq!(score.notes[2].voice.as_deref(), Some("alto"));
        assert_eq!(score.notes[2].start_time, 0.0);
        assert_eq!(score.notes[3].duration, 4.0);
        assert_eq!(m.voices, vec!["alto"]);
        assert_eq!(m.key.as_deref(), Some("C"));
    }

    #[test]
    fn test_slurs_marked() {
        let score = body("(AB) c");
        assert_eq!(score.notes[0].slur, Some(Slur::Start));
        assert_eq!(score.notes[1].slur, Some(Slur::End));
        assert_eq!(score.notes[2].slur, None);
    }

    #[test]
    fn test_ties_flagged() {
        let score = body("C4-C4 D");
        assert!(score.notes[0].tie);
        assert!(!score.notes[1].tie);
    }

    #[test]
    fn test_comments_and_continuations() {
        let score = parse("% leading comment\nX:1\nK:C\nCD \\\n% between\nEF % trailing\n");
        assert_eq!(starts(&score), vec![0.0, 2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_invalid_fields_keep_previous() {
        let score = parse("X:1\nQ:fast\nL:long\nM:odd\nK:G\nK:Q\nF\n");
        assert_eq!(score.metadata.bpm, 120);
        assert_eq!(score.metadata.default_note_length, None);
        assert_eq!(score.metadata.time_signature, None);
        assert_eq!(score.notes[0].duration, 2.0);
        // Unknown key leaves G major in force
        assert_eq!(score.notes[0].pitch_class, 6);
    }

    #[test]
    fn test_note_letter_before_repeat_is_music() {
        let score = body("E:|CD|");
        let pitches: Vec<u8> = score.notes.iter().map(|n| n.pitch_class).collect();
        assert_eq!(pitches, vec![4, 0, 2]);

        // Lyrics lines stay fields and produce no notes
        let score = body("w: la la\nC");
        assert_eq!(score.notes.len(), 1);
    }

    #[test]
    fn test_huge_tuplet_count_is_tolerated() {
        let score = body("(3000000000CDE F");
        assert_eq!(score.notes.len(), 4);
        assert_eq!(durations(&score), vec![1.0, 1.0, 1.0, 1.0]);
        assert_eq!(starts(&score), vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_slur_end_stays_in_its_voice() {
        let score = body("[V:1] (AB [V:2] C [V:1] )");
        let slurs: Vec<Option<Slur>> = score.notes.iter().map(|n| n.slur).collect();
        assert_eq!(slurs, vec![Some(Slur::Start), Some(Slur::End), None]);
    }

    #[test]
    fn test_parse_tempo_forms() {
        assert_eq!(parse_tempo("1/4=120").unwrap(), 120);
        assert_eq!(parse_tempo("\"Allegro\" 1/4=144").unwrap(), 144);
        assert_eq!(parse_tempo(" 96 ").unwrap(), 96);
        assert!(parse_tempo("1/4").is_err());
        assert!(parse_tempo("=0").is_err());
    }
}
