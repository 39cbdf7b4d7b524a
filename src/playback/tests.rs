use super::*;
use crate::parse_score;

#[test]
fn test_playback_basic_timing() {
    let source = r#"X:1
L:1/4
Q:1/4=100
K:C
C D E F
"#;
    let data = parse_score(source);

    assert_eq!(data.metadata.bpm, 100);
    assert_eq!(data.notes.len(), 4);

    // Each quarter note should be 4 steps
    assert_eq!(data.notes[0].start_time, 0.0);
    assert_eq!(data.notes[0].duration, 4.0);
    assert_eq!(data.notes[1].start_time, 4.0);
    assert_eq!(data.notes[2].start_time, 8.0);
    assert_eq!(data.notes[3].start_time, 12.0);
    assert_eq!(data.total_steps, 16.0);
}

#[test]
fn test_playback_midi_notes() {
    let source = "X:1\nK:C\nC D E F G A B c\n";
    let data = parse_score(source);

    let midi: Vec<u8> = data.playback_schedule.iter().map(|n| n.midi_note).collect();
    assert_eq!(midi, vec![60, 62, 64, 65, 67, 69, 71, 72]);
    assert_eq!(data.playback_schedule[5].frequency, 440.0);
}

#[test]
fn test_playback_with_ties() {
    let source = "X:1\nL:1/4\nK:C\nC- C z2\n";
    let data = parse_score(source);

    // One C held for two quarters, the rest produces nothing
    assert_eq!(data.notes.len(), 1);
    assert_eq!(data.notes[0].start_time, 0.0);
    assert_eq!(data.notes[0].duration, 8.0);
    assert_eq!(data.total_steps, 8.0);
}

#[test]
fn test_tie_across_bar_line() {
    let source = "X:1\nL:1/4\nK:C\nG4- | G4 |\n";
    let data = parse_score(source);
    assert_eq!(data.notes.len(), 1);
    assert_eq!(data.notes[0].duration, 32.0);
}

#[test]
fn test_chord_tie_merges_each_member() {
    let source = "X:1\nK:C\n[CE]2- [CE]2\n";
    let data = parse_score(source);
    assert_eq!(data.notes.len(), 2);
    assert!(data.notes.iter().all(|n| n.duration == 8.0 && n.start_time == 0.0));
}

#[test]
fn test_schedule_sorted_by_onset_across_voices() {
    let source = "X:1\nV:1\nV:2\nK:C\nV:1\nC4 D4\nV:2\nE2 F2 G4\n";
    let data = parse_score(source);

    let starts: Vec<f64> = data.playback_schedule.iter().map(|n| n.note.start_time).collect();
    assert_eq!(starts, vec![0.0, 0.0, 4.0, 8.0, 8.0]);
    // Stable: voice 1 was parsed first
    assert_eq!(data.playback_schedule[0].note.voice.as_deref(), Some("1"));
    assert_eq!(data.playback_schedule[1].note.voice.as_deref(), Some("2"));
}

#[test]
fn test_notes_by_step_index() {
    let source = "X:1\nK:C\n[CEG] {d}c\n";
    let data = parse_score(source);

    assert_eq!(data.notes_at(0.0).len(), 3);
    assert_eq!(data.notes_at(2.0).len(), 1);
    assert_eq!(data.notes_at(2.5).len(), 1);
    assert!(data.notes_at(1.0).is_empty());
    assert_eq!(data.notes_by_step.len(), 3);
}

#[test]
fn test_notes_by_voice_default_key() {
    let source = "X:1\nK:C\nC [V:2] D\n";
    let data = parse_score(source);

    assert_eq!(data.voice("default").len(), 1);
    assert_eq!(data.voice("2").len(), 1);
    assert!(data.voice("3").is_empty());
    let keys: Vec<&String> = data.notes_by_voice.keys().collect();
    assert_eq!(keys, vec!["2", "default"]);
}

#[test]
fn test_legacy_tracks_schedule() {
    let source = "#@tempo: 90\n[lead]\nC 4 4 + E 4\nG 4 4\n[bass:0]\nC 2 8\n";
    let data = parse_score(source);

    assert_eq!(data.metadata.bpm, 90);
    assert_eq!(data.notes_at(0.0).len(), 3);
    assert_eq!(data.voice("lead").len(), 3);
    assert_eq!(data.voice("bass").len(), 1);
    assert_eq!(data.total_steps, 8.0);
}

#[test]
fn test_frequency_table() {
    assert_eq!(frequency_of(9, 4), 440.0);
    assert_eq!(frequency_of(9, 3), 220.0);
    assert!((frequency_of(9, 0) - 27.5).abs() < 1e-9);
    assert!((frequency_of(0, 8) - 4186.009).abs() < 1e-3);
}

#[test]
fn test_seconds_per_step() {
    let data = parse_score("#@tempo: 120\nC 4 4\n");
    // Quarter note = 0.5 s at 120 BPM
    assert_eq!(data.seconds_per_step() * 4.0, 0.5);
}

#[test]
fn test_empty_score() {
    let data = parse_score("");
    assert!(data.notes.is_empty());
    assert!(data.playback_schedule.is_empty());
    assert!(data.notes_by_step.is_empty());
    assert!(data.notes_by_voice.is_empty());
    assert_eq!(data.total_steps, 0.0);
    assert_eq!(data.metadata.bpm, 120);
}
