//! Playback data type definitions
//!
//! This module defines the resolved notes and the schedule handed to an
//! audio player.

use crate::music::{ScoreMetadata, Slur};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A resolved note.
///
/// # Fields
/// - `pitch_class`: 0-11, chromatic offset from C after accidentals
/// - `octave`: 0-8, scientific pitch notation (middle C is C4)
/// - `start_time`: onset in sixteenth-note steps (grace notes land on half steps)
/// - `duration`: length in steps, always positive
/// - `voice`: voice or track id, `None` for the implicit voice
/// - `slur`: slur marker, carried through uninterpreted
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub pitch_class: u8,
    pub octave: u8,
    pub start_time: f64,
    pub duration: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slur: Option<Slur>,
}

impl Note {
    /// MIDI note number (C4 = 60, A4 = 69).
    pub fn midi_note(&self) -> u8 {
        12 * (self.octave + 1) + self.pitch_class
    }

    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }
}

/// A note with the frequency a synthesizer should play.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledNote {
    #[serde(flatten)]
    pub note: Note,
    pub frequency: f64,
    pub midi_note: u8,
}

/// Onset used as a map key. Ordered by `f64::total_cmp`; serialized as a
/// string so both JSON and YAML accept it as a map key.
#[derive(Debug, Clone, Copy)]
pub struct StepKey(pub f64);

impl PartialEq for StepKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for StepKey {}

impl PartialOrd for StepKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StepKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Serialize for StepKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

/// Everything a player needs for one score.
///
/// # Fields
/// - `notes`: tie-resolved notes in parse order
/// - `metadata`: title, tempo, meter, key, voices
/// - `playback_schedule`: notes with frequencies, sorted by onset (stable)
/// - `notes_by_step`: scheduled notes grouped by exact onset
/// - `notes_by_voice`: notes grouped by voice; unvoiced notes under `"default"`
/// - `total_steps`: latest note end, or 0 for an empty score
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedScore {
    pub notes: Vec<Note>,
    pub metadata: ScoreMetadata,
    pub playback_schedule: Vec<ScheduledNote>,
    pub notes_by_step: BTreeMap<StepKey, Vec<ScheduledNote>>,
    pub notes_by_voice: BTreeMap<String, Vec<Note>>,
    pub total_steps: f64,
}

impl ParsedScore {
    /// Notes starting exactly at `step`.
    pub fn notes_at(&self, step: f64) -> &[ScheduledNote] {
        self.notes_by_step
            .get(&StepKey(step))
            .map_or(&[], Vec::as_slice)
    }

    /// Notes of one voice.
    pub fn voice(&self, id: &str) -> &[Note] {
        self.notes_by_voice.get(id).map_or(&[], Vec::as_slice)
    }

    /// Wall-clock length of one step at the score's tempo (a quarter note
    /// is four steps).
    pub fn seconds_per_step(&self) -> f64 {
        60.0 / self.metadata.bpm as f64 / 4.0
    }
}
