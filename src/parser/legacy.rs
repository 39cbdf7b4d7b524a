//! # Legacy Track Parser
//!
//! A line-oriented notation with named tracks and explicit timing:
//!
//! ```text
//! #@title: Little Tune       metadata directive (title, tempo/bpm, time, key, composer)
//! # comment
//! [melody]                   switch to a track
//! [bass:16]                  switch and seek the track to step 16
//! @32                        seek the current track to step 32
//! C 4 4                      NOTE OCTAVE DURATION
//! C 4 4 + E 4 + G 4          chord; last duration given wins, default 4
//! ```
//!
//! Each track keeps its own cursor, which advances only for lines that
//! parse. Malformed lines are skipped and logged at `debug` level.

use super::RawScore;
use crate::error::ScoreError;
use crate::music::{
    altered_pitch_class, clamp_octave, natural_pitch_class, RawNote, ScoreMetadata, DEFAULT_VOICE,
};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Chord duration when no member gives one.
pub const DEFAULT_LEGACY_DURATION: f64 = 4.0;

#[derive(Debug, Default)]
struct TrackState {
    track: Option<String>,
    cursor: f64,
    cursors: HashMap<String, f64>,
}

impl TrackState {
    fn switch(&mut self, name: &str, seek: Option<f64>) {
        let previous = self.track.clone().unwrap_or_else(|| DEFAULT_VOICE.to_string());
        self.cursors.insert(previous, self.cursor);
        self.cursor = seek
            .or_else(|| self.cursors.get(name).copied())
            .unwrap_or(0.0);
        self.track = Some(name.to_string());
    }
}

/// Pitch class for a legacy note name: a letter with optional `#` or `b`.
fn pitch_class(name: &str) -> Option<u8> {
    let mut chars = name.chars();
    let natural = natural_pitch_class(chars.next()?)?;
    let offset = match chars.as_str() {
        "" => 0,
        "#" => 1,
        "b" => -1,
        _ => return None,
    };
    Some(altered_pitch_class(natural, offset))
}

fn parse_steps(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0)
}

fn parse_duration(s: &str) -> Option<f64> {
    parse_steps(s).filter(|v| *v > 0.0)
}

/// One `NOTE OCTAVE [DURATION]` group.
fn parse_member(tokens: &[&str]) -> Result<(u8, u8, Option<f64>), String> {
    let (name, octave, duration) = match tokens {
        [name, octave] => (name, octave, None),
        [name, octave, duration] => (name, octave, Some(duration)),
        _ => return Err(format!("expected 2 or 3 tokens, found {}", tokens.len())),
    };
    let pitch_class = pitch_class(name).ok_or_else(|| format!("unknown note '{}'", name))?;
    let octave: i32 = octave
        .parse()
        .map_err(|_| format!("invalid octave '{}'", octave))?;
    let duration = match duration {
        Some(d) => Some(parse_duration(d).ok_or_else(|| format!("invalid duration '{}'", d))?),
        None => None,
    };
    Ok((pitch_class, clamp_octave(octave), duration))
}

/// Parse a note or chord line at `cursor`. Returns the notes and how far the
/// track advances.
fn parse_music_line(
    line: &str,
    cursor: f64,
    voice: &Option<String>,
) -> Result<(Vec<RawNote>, f64), String> {
    let is_chord = line.contains('+');
    let mut members = Vec::new();
    let mut duration = DEFAULT_LEGACY_DURATION;

    for group in line.split('+') {
        let tokens: Vec<&str> = group.split_whitespace().collect();
        if !is_chord && tokens.len() != 3 {
            return Err(format!("expected NOTE OCTAVE DURATION, found {} tokens", tokens.len()));
        }
        let (pitch_class, octave, member_duration) = parse_member(&tokens)?;
        if let Some(d) = member_duration {
            duration = d;
        }
        members.push((pitch_class, octave));
    }

    let notes = members
        .into_iter()
        .map(|(pitch_class, octave)| RawNote {
            pitch_class,
            octave,
            start_time: cursor,
            duration,
            voice: voice.clone(),
            slur: None,
            tie: false,
        })
        .collect();
    Ok((notes, duration))
}

fn apply_directive(metadata: &mut ScoreMetadata, directive: &str) -> Result<(), ScoreError> {
    let (key, value) = directive
        .split_once(':')
        .ok_or_else(|| ScoreError::MetadataError(format!("Directive without value: {}", directive)))?;
    let value = value.trim();
    match key.trim().to_ascii_lowercase().as_str() {
        "title" => metadata.title = Some(value.to_string()),
        "composer" => metadata.composer = Some(value.to_string()),
        "tempo" | "bpm" => {
            metadata.bpm = value
                .parse::<u16>()
                .ok()
                .filter(|bpm| *bpm > 0)
                .ok_or_else(|| ScoreError::MetadataError(format!("Invalid tempo: {}", value)))?
        }
        "time" | "meter" | "time_signature" | "timesignature" => {
            metadata.time_signature = Some(value.to_string())
        }
        "key" => metadata.key = Some(value.to_string()),
        other => trace!(directive = other, "ignoring directive"),
    }
    Ok(())
}

/// Parse legacy track notation into unresolved notes and metadata.
pub fn parse(content: &str) -> RawScore {
    let mut metadata = ScoreMetadata::default();
    let mut notes = Vec::new();
    let mut tracks = TrackState::default();

    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        let line_no = idx + 1;
        let malformed = |message: String| ScoreError::ParseError {
            line: line_no,
            column: 1,
            message,
        };

        if line.is_empty() {
            continue;
        }

        if let Some(directive) = line.strip_prefix("#@") {
            if let Err(e) = apply_directive(&mut metadata, directive) {
                debug!(%e, "keeping previous metadata");
            }
            continue;
        }

        if line.starts_with('#') {
            continue;
        }

        if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let (name, seek) = match header.split_once(':') {
                Some((name, offset)) => (name.trim(), parse_steps(offset)),
                None => (header.trim(), None),
            };
            if name.is_empty() {
                debug!(e = %malformed("track header without a name".to_string()), "skipping line");
                continue;
            }
            tracks.switch(name, seek);
            metadata.add_voice(name);
            continue;
        }

        if let Some(offset) = line.strip_prefix('@') {
            match parse_steps(offset) {
                Some(step) => tracks.cursor = step,
                None => debug!(e = %malformed(format!("invalid offset '{}'", offset)), "skipping line"),
            }
            continue;
        }

        match parse_music_line(line, tracks.cursor, &tracks.track) {
            Ok((parsed, advance)) => {
                notes.extend(parsed);
                tracks.cursor += advance;
            }
            Err(message) => debug!(e = %malformed(message), "skipping line"),
        }
    }

    RawScore { metadata, notes }
}
