pub mod accidentals;
pub mod duration;
pub mod error;
pub mod lexer;
pub mod music;
pub mod parser;
pub mod playback;

pub use error::*;
pub use music::{ScoreMetadata, Slur};
pub use parser::is_abc;
pub use playback::{frequency_of, Note, ParsedScore, ScheduledNote};

/// Parse notation text into a playback schedule.
/// This is the main entry point for the library.
///
/// The dialect (ABC or legacy tracks) is detected automatically. Parsing
/// never fails: unreadable input yields whatever could be recovered, and
/// empty input yields an empty score.
pub fn parse_score(content: &str) -> ParsedScore {
    let raw = parser::parse_raw(content);
    let notes = playback::resolve_ties(raw.notes);
    playback::build_schedule(notes, raw.metadata)
}
