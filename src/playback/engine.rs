//! Schedule builder
//!
//! Converts tie-resolved notes into frequency-tagged playback data with
//! lookup indices. No parsing decisions are made here.

use super::types::{Note, ParsedScore, ScheduledNote, StepKey};
use crate::music::{ScoreMetadata, DEFAULT_VOICE};
use std::collections::BTreeMap;

/// Frequency in Hz for a pitch class and octave, twelve-tone equal
/// temperament with A4 (MIDI 69) at 440 Hz.
///
/// ```
/// use tunescore::frequency_of;
///
/// assert_eq!(frequency_of(9, 4), 440.0);
/// assert_eq!(frequency_of(9, 5), 880.0);
/// assert!((frequency_of(0, 4) - 261.6256).abs() < 1e-3);
/// ```
pub fn frequency_of(pitch_class: u8, octave: u8) -> f64 {
    let midi = 12 * (octave as i32 + 1) + pitch_class as i32;
    440.0 * 2f64.powf((midi - 69) as f64 / 12.0)
}

/// Build the schedule and indices for a list of resolved notes.
pub fn build_schedule(notes: Vec<Note>, metadata: ScoreMetadata) -> ParsedScore {
    let mut playback_schedule: Vec<ScheduledNote> = notes
        .iter()
        .map(|note| ScheduledNote {
            note: note.clone(),
            frequency: frequency_of(note.pitch_class, note.octave),
            midi_note: note.midi_note(),
        })
        .collect();
    // sort_by is stable: simultaneous notes keep parse order
    playback_schedule.sort_by(|a, b| a.note.start_time.total_cmp(&b.note.start_time));

    let mut notes_by_step: BTreeMap<StepKey, Vec<ScheduledNote>> = BTreeMap::new();
    for scheduled in &playback_schedule {
        notes_by_step
            .entry(StepKey(scheduled.note.start_time))
            .or_default()
            .push(scheduled.clone());
    }

    let mut notes_by_voice: BTreeMap<String, Vec<Note>> = BTreeMap::new();
    for note in &notes {
        let voice = note.voice.as_deref().unwrap_or(DEFAULT_VOICE);
        notes_by_voice
            .entry(voice.to_string())
            .or_default()
            .push(note.clone());
    }

    let total_steps = notes.iter().map(Note::end_time).fold(0.0, f64::max);

    ParsedScore {
        notes,
        metadata,
        playback_schedule,
        notes_by_step,
        notes_by_voice,
        total_steps,
    }
}
