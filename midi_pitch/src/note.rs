// Note-number math shared by every component.
//
// MIDI note numbers are the common currency: the roll indexes rows by
// note number, the pitch track stores fractional note numbers, and the
// range filter compares the two. Conversions assume twelve-tone equal
// temperament with A4 = 440 Hz = note 69.

use serde::{Deserialize, Serialize};

/// Convert a (possibly fractional) note number to a frequency in Hz.
pub fn note_to_freq(note: f64) -> f64 {
    440.0 * ((note - 69.0) / 12.0).exp2()
}

/// Convert a frequency in Hz to a (fractional) note number.
///
/// Returns NaN for non-positive or NaN input rather than panicking; the
/// caller decides whether a non-finite result means "unvoiced".
pub fn freq_to_note(freq: f64) -> f64 {
    if freq.is_nan() || freq <= 0.0 {
        return f64::NAN;
    }
    (freq / 440.0).log2() * 12.0 + 69.0
}

/// Note names within an octave, sharps only (C4 = note 60).
const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Compact note name for a note number, e.g. `60` → `"C4"`.
///
/// External consumers use this for keyboard overlays and axis labels.
pub fn note_name(note: u8) -> String {
    let name = NOTE_NAMES[usize::from(note % 12)];
    let octave = i32::from(note / 12) - 1;
    format!("{name}{octave}")
}

/// Inclusive note-number bounds derived from a score roll.
///
/// Always satisfies `low <= high` with both ends in 0–127; produced by
/// `SampledRoll::note_range` and consumed by the range filter and by
/// external axis-scaling/keyboard-overlay rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRange {
    pub low: u8,
    pub high: u8,
}

impl NoteRange {
    /// Whether a (fractional) note number lies within the bounds.
    /// NaN input is never contained.
    pub fn contains(&self, note: f64) -> bool {
        note >= f64::from(self.low) && note <= f64::from(self.high)
    }
}
