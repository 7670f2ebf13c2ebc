// Score events and the MIDI file adapter.
//
// The roll consumes an ordered sequence of `NoteEvent`s: relative deltas
// in seconds, a note number, and an on/off flag. Parsing MIDI files is
// midly's job — this module only flattens a parsed `Smf` into that
// sequence: tracks merged by absolute tick, deltas converted to seconds
// through the tempo map, and the note-on-with-zero-velocity idiom
// normalized to a plain note-off so downstream code can take `on` at
// face value.

use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use serde::{Deserialize, Serialize};

/// Default MIDI tempo (120 BPM) in microseconds per quarter note,
/// in effect until the first Tempo meta event.
const DEFAULT_TEMPO_US: u32 = 500_000;

/// A note boundary in the score.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// Seconds since the previous event (0 for simultaneous events).
    pub delta: f64,
    /// MIDI note number, 0–127.
    pub note: u8,
    /// True for note-on. Zero-velocity note-ons arrive as `on = false`.
    pub on: bool,
}

/// Total duration of an event sequence: the running sum of deltas.
pub fn events_duration(events: &[NoteEvent]) -> f64 {
    events.iter().map(|e| e.delta).sum()
}

/// Flatten a parsed SMF into a time-ordered `NoteEvent` sequence.
///
/// Tracks are merged by absolute tick; simultaneous events keep
/// (tick, track, in-track) order, so the roll's stream-order
/// tie-breaking matches the file's layout. Tempo meta events advance
/// time without emitting anything.
pub fn events_from_smf(smf: &Smf) -> Vec<NoteEvent> {
    enum Payload {
        Note { note: u8, on: bool },
        Tempo(u32),
    }

    let mut merged: Vec<(u64, usize, usize, Payload)> = Vec::new();
    for (track_index, track) in smf.tracks.iter().enumerate() {
        let mut tick: u64 = 0;
        for (seq, event) in track.iter().enumerate() {
            tick += u64::from(event.delta.as_int());
            match &event.kind {
                TrackEventKind::Midi {
                    message: MidiMessage::NoteOn { key, vel },
                    ..
                } => {
                    merged.push((
                        tick,
                        track_index,
                        seq,
                        Payload::Note {
                            note: key.as_int(),
                            on: vel.as_int() > 0,
                        },
                    ));
                }
                TrackEventKind::Midi {
                    message: MidiMessage::NoteOff { key, .. },
                    ..
                } => {
                    merged.push((
                        tick,
                        track_index,
                        seq,
                        Payload::Note {
                            note: key.as_int(),
                            on: false,
                        },
                    ));
                }
                TrackEventKind::Meta(MetaMessage::Tempo(us)) => {
                    merged.push((tick, track_index, seq, Payload::Tempo(us.as_int())));
                }
                _ => {}
            }
        }
    }
    merged.sort_by_key(|&(tick, track_index, seq, _)| (tick, track_index, seq));

    let mut events = Vec::new();
    let mut tempo_us = DEFAULT_TEMPO_US;
    let mut prev_tick: u64 = 0;
    // Seconds accumulated by non-note events since the last NoteEvent.
    let mut pending = 0.0;
    for (tick, _, _, payload) in merged {
        let dt = (tick - prev_tick) as f64 * seconds_per_tick(smf.header.timing, tempo_us);
        prev_tick = tick;
        match payload {
            Payload::Note { note, on } => {
                events.push(NoteEvent {
                    delta: pending + dt,
                    note,
                    on,
                });
                pending = 0.0;
            }
            Payload::Tempo(us) => {
                pending += dt;
                tempo_us = us;
            }
        }
    }
    events
}

/// Seconds per MIDI tick under the current tempo.
fn seconds_per_tick(timing: Timing, tempo_us: u32) -> f64 {
    match timing {
        Timing::Metrical(tpqn) => f64::from(tempo_us) * 1e-6 / f64::from(tpqn.as_int()),
        Timing::Timecode(fps, subframe) => 1.0 / (f64::from(fps.as_f32()) * f64::from(subframe)),
    }
}
