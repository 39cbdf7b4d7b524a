//! # Playback Module
//!
//! Turns parser output into the schedule a downstream audio player consumes.
//!
//! ## Purpose
//! 1. **Tie resolution** - chains of tied notes become single sustained notes
//! 2. **Frequencies** - each note gets its equal-tempered frequency and MIDI number
//! 3. **Indices** - notes grouped by onset step and by voice, plus the total length
//!
//! ## Sub-modules
//! - `types` - Note, ScheduledNote, ParsedScore type definitions
//! - `ties` - Tie resolution pass
//! - `engine` - Schedule builder and `frequency_of`
//!
//! ## Key Types
//! - [`Note`] - Resolved note (pitch class, octave, onset, duration, voice)
//! - [`ScheduledNote`] - Note plus frequency and MIDI number
//! - [`ParsedScore`] - Notes, metadata, sorted schedule and lookup indices
//!
//! ## Example
//! ```rust
//! use tunescore::parse_score;
//!
//! let score = parse_score("X:1\nL:1/4\nK:C\nC2- C2 E\n");
//!
//! assert_eq!(score.notes.len(), 2);
//! assert_eq!(score.notes[0].duration, 16.0);
//! assert_eq!(score.playback_schedule[1].midi_note, 64); // E4
//! assert_eq!(score.total_steps, 20.0);
//! ```
//!
//! ## Timing
//! All times are in steps (sixteenth notes). A quarter note is four steps;
//! `ParsedScore::seconds_per_step` converts to wall-clock time at the
//! score's tempo. Grace notes are the only notes on half steps.

mod engine;
mod ties;
mod types;

#[cfg(test)]
mod tests;

pub use engine::{build_schedule, frequency_of};
pub use ties::resolve_ties;
pub use types::{Note, ParsedScore, ScheduledNote, StepKey};
