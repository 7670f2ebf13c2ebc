// The score roll: note activity over time, sampled from an event stream.
//
// `ScoreRoll` owns the time-ordered event sequence and is never mutated
// after construction. Sampling produces a `SampledRoll` — one 128-bit
// note set per query instant — by a two-pointer merge of the event
// stream and the query grid. The held-note set used during the merge is
// local to each call and a fresh matrix is allocated every time, so the
// same roll can be sampled repeatedly on different grids.
//
// `note_range` derives inclusive [low, high] note bounds from the rows
// that are ever active, extended by `RANGE_MARGIN` on both sides.
//
// Consumed by align.rs (activity mask + reference notes), octave.rs
// (reference notes), and range.rs (note range + dilated activity mask).

use crate::error::PitchError;
use crate::events::{NoteEvent, events_duration};
use crate::note::NoteRange;
use serde::{Deserialize, Serialize};

/// Rows added on both sides of the observed note range, so that vibrato
/// and slightly-sharp or slightly-flat singing just outside the written
/// notes survive the range filter.
pub const RANGE_MARGIN: u8 = 2;

/// A set of MIDI note numbers, one bit per note 0–127.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSet(u128);

impl NoteSet {
    pub fn insert(&mut self, note: u8) {
        self.0 |= 1u128 << note;
    }

    pub fn remove(&mut self, note: u8) {
        self.0 &= !(1u128 << note);
    }

    pub fn contains(self, note: u8) -> bool {
        self.0 >> note & 1 == 1
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of active notes.
    pub fn len(self) -> u32 {
        self.0.count_ones()
    }

    /// Lowest active note, if any.
    pub fn lowest(self) -> Option<u8> {
        if self.0 == 0 {
            None
        } else {
            Some(self.0.trailing_zeros() as u8)
        }
    }

    /// Highest active note, if any.
    pub fn highest(self) -> Option<u8> {
        if self.0 == 0 {
            None
        } else {
            Some((127 - self.0.leading_zeros()) as u8)
        }
    }

    fn union(self, other: NoteSet) -> NoteSet {
        NoteSet(self.0 | other.0)
    }
}

/// An immutable score: ordered note events plus total length in seconds.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScoreRoll {
    events: Vec<NoteEvent>,
    length: f64,
}

impl ScoreRoll {
    /// Build a roll from a time-ordered event sequence and score length.
    ///
    /// Events carry relative deltas; absolute time is the running sum.
    /// The sequence must already be time-ordered (non-negative deltas,
    /// note numbers 0–127) — the roll never reorders it, and ties among
    /// simultaneous events keep stream order.
    pub fn new(events: Vec<NoteEvent>, length: f64) -> Self {
        debug_assert!(events.iter().all(|e| e.delta >= 0.0 && e.note < 128));
        ScoreRoll { events, length }
    }

    /// Build a roll whose length is the running sum of event deltas.
    pub fn from_events(events: Vec<NoteEvent>) -> Self {
        let length = events_duration(&events);
        ScoreRoll::new(events, length)
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn events(&self) -> &[NoteEvent] {
        &self.events
    }

    /// Uniform query grid covering the score at `sr` instants per second.
    pub fn uniform_times(&self, sr: f64) -> Vec<f64> {
        let count = (self.length * sr).floor() as usize + 1;
        (0..count).map(|i| i as f64 / sr).collect()
    }

    /// Snapshot the held-note set at each query instant.
    ///
    /// Two-pointer merge over the event stream and the query grid, both
    /// of which must be time-ordered. Each snapshot reflects every event
    /// at or before its instant. O(events + times).
    pub fn sample_at(&self, times: &[f64]) -> SampledRoll {
        let mut held = NoteSet::default();
        let mut columns = Vec::with_capacity(times.len());
        let mut event_time = 0.0;
        let mut next = 0;
        for &t in times {
            while next < self.events.len() && event_time + self.events[next].delta <= t {
                let event = self.events[next];
                event_time += event.delta;
                if event.on {
                    held.insert(event.note);
                } else {
                    held.remove(event.note);
                }
                next += 1;
            }
            columns.push(held);
        }
        SampledRoll { columns }
    }
}

/// A roll sampled on a concrete time grid: one note set per instant.
/// Shape is fixed at construction; the matrix is read-only.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SampledRoll {
    columns: Vec<NoteSet>,
}

impl SampledRoll {
    /// Number of sampled instants (columns).
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// The full note set at column `i`.
    pub fn column(&self, i: usize) -> NoteSet {
        self.columns[i]
    }

    /// Whether any note is active at column `i`.
    pub fn is_active(&self, i: usize) -> bool {
        !self.columns[i].is_empty()
    }

    /// The reference note at column `i`: the lowest active row.
    pub fn reference(&self, i: usize) -> Option<u8> {
        self.columns[i].lowest()
    }

    /// Union over all columns: every note that is ever active.
    pub fn active_notes(&self) -> NoteSet {
        self.columns
            .iter()
            .fold(NoteSet::default(), |acc, &c| acc.union(c))
    }

    /// Margin-extended note range over the ever-active rows.
    ///
    /// Fails with `EmptyRoll` when no row is ever active — callers must
    /// handle that case explicitly rather than index a phantom range.
    pub fn note_range(&self) -> Result<NoteRange, PitchError> {
        let union = self.active_notes();
        let (Some(low), Some(high)) = (union.lowest(), union.highest()) else {
            return Err(PitchError::EmptyRoll);
        };
        Ok(NoteRange {
            low: low.saturating_sub(RANGE_MARGIN),
            high: high.saturating_add(RANGE_MARGIN).min(127),
        })
    }
}
