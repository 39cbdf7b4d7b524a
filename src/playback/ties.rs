//! Tie resolution: merge chains of tied notes into single sustained notes.

use super::types::Note;
use crate::music::RawNote;
use tracing::debug;

impl From<RawNote> for Note {
    fn from(raw: RawNote) -> Self {
        Note {
            pitch_class: raw.pitch_class,
            octave: raw.octave,
            start_time: raw.start_time,
            duration: raw.duration,
            voice: raw.voice,
            slur: raw.slur,
        }
    }
}

fn continues(from: &RawNote, candidate: &RawNote, end: f64) -> bool {
    candidate.pitch_class == from.pitch_class
        && candidate.octave == from.octave
        && candidate.voice == from.voice
        && candidate.start_time == end
}

/// Merge tied notes.
///
/// For each tied note, the next unconsumed note later in the list with the
/// same pitch class, octave and voice that starts exactly where the chain
/// currently ends is folded in. The chain continues while the folded note
/// is itself tied. A tie with no continuation leaves the note unmerged.
///
/// ```
/// use tunescore::music::RawNote;
/// use tunescore::playback::resolve_ties;
///
/// let c = |start: f64, tie: bool| RawNote {
///     pitch_class: 0,
///     octave: 4,
///     start_time: start,
///     duration: 4.0,
///     voice: None,
///     slur: None,
///     tie,
/// };
/// let notes = resolve_ties(vec![c(0.0, true), c(4.0, false)]);
/// assert_eq!(notes.len(), 1);
/// assert_eq!(notes[0].duration, 8.0);
/// ```
pub fn resolve_ties(raw: Vec<RawNote>) -> Vec<Note> {
    let mut consumed = vec![false; raw.len()];
    let mut notes = Vec::with_capacity(raw.len());

    for i in 0..raw.len() {
        if consumed[i] {
            continue;
        }
        let head = &raw[i];
        let mut duration = head.duration;

        if head.tie {
            let mut end = head.end_time();
            let mut link = i;
            loop {
                let next = (link + 1..raw.len())
                    .find(|&k| !consumed[k] && continues(head, &raw[k], end));
                let Some(k) = next else {
                    if link == i {
                        debug!(
                            pitch_class = head.pitch_class,
                            octave = head.octave,
                            start = head.start_time,
                            "tie without continuation"
                        );
                    }
                    break;
                };
                consumed[k] = true;
                duration += raw[k].duration;
                end += raw[k].duration;
                link = k;
                if !raw[k].tie {
                    break;
                }
            }
        }

        let mut note = Note::from(head.clone());
        note.duration = duration;
        notes.push(note);
    }

    notes
}
