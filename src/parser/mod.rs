//! # Parser Module
//!
//! Turns notation text into a flat list of unresolved notes plus metadata.
//!
//! ## Dialects
//! - **ABC** (`abc`) - header fields (`X:`, `T:`, `M:`, `L:`, `Q:`, `V:`, `K:`)
//!   followed by a note body with chords, tuplets, grace notes and voices
//! - **Legacy tracks** (`legacy`) - `#@key: value` directives, `[track]`
//!   blocks and `NOTE OCTAVE DURATION` lines
//!
//! The dialect is chosen by `is_abc`: if the first line that is neither
//! blank nor a `%` comment looks like a header field (`X:`), the text is ABC.
//! Everything else is read as legacy tracks.
//!
//! ## Sub-modules
//! - `note` - single notes and chords
//! - `tuplet` - tuplet ratios and duration scaling
//! - `abc` - ABC header/body state machine
//! - `legacy` - legacy track lines
//!
//! ## Example
//! ```rust
//! use tunescore::parser::{is_abc, parse_raw};
//!
//! let source = "X:1\nK:C\nCDE\n";
//! assert!(is_abc(source));
//!
//! let raw = parse_raw(source);
//! assert_eq!(raw.notes.len(), 3);
//! assert_eq!(raw.notes[2].start_time, 4.0);
//! ```

pub mod abc;
pub mod legacy;
pub mod note;
pub mod tuplet;

use crate::music::{RawNote, ScoreMetadata};
use tracing::trace;

/// Parser output before tie resolution.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawScore {
    pub metadata: ScoreMetadata,
    pub notes: Vec<RawNote>,
}

/// Whether the text is ABC notation rather than legacy tracks.
///
/// ```
/// use tunescore::is_abc;
///
/// assert!(is_abc("%abc-2.1\nX:1\nK:G\nGAB\n"));
/// assert!(!is_abc("#@title: Tune\nC 4 4\n"));
/// assert!(!is_abc(""));
/// ```
pub fn is_abc(content: &str) -> bool {
    content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('%'))
        .is_some_and(is_header_field)
}

fn is_header_field(line: &str) -> bool {
    let mut chars = line.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some(letter), Some(':')) if letter.is_ascii_uppercase()
    )
}

/// Detect the dialect and parse with the matching parser.
pub fn parse_raw(content: &str) -> RawScore {
    if is_abc(content) {
        trace!("parsing as ABC notation");
        abc::parse(content)
    } else {
        trace!("parsing as legacy tracks");
        legacy::parse(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_abc_after_comments() {
        assert!(is_abc("\n% generated\n\nT:Air\nK:C\n"));
    }

    #[test]
    fn test_lowercase_field_is_not_a_header() {
        assert!(!is_abc("w:lyrics\nK:C\n"));
    }

    #[test]
    fn test_body_first_is_legacy() {
        assert!(!is_abc("[piano]\nX:1\n"));
        assert!(!is_abc("C 4 4\n"));
    }

    #[test]
    fn test_dispatch() {
        let abc = parse_raw("X:1\nK:C\nC\n");
        assert_eq!(abc.notes[0].octave, 4);
        assert_eq!(abc.notes[0].duration, 2.0);

        let legacy = parse_raw("C 3 5\n");
        assert_eq!(legacy.notes[0].octave, 3);
        assert_eq!(legacy.notes[0].duration, 5.0);
    }

    #[test]
    fn test_empty_input() {
        let raw = parse_raw("");
        assert!(raw.notes.is_empty());
        assert_eq!(raw.metadata, ScoreMetadata::default());
    }
}
