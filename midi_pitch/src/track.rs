// The vocal pitch track: what the pitch estimator detected, and when.
//
// Parallel sequences: strictly increasing time instants and per-instant
// note-number values, `None` where the estimator found no pitch. The
// loudness series, when present, rides along untouched — rendering
// consumes it downstream.
//
// Construction validates every invariant up front and normalizes
// non-finite note values to unvoiced, so no NaN sentinel survives into
// the data model. The fixers (octave.rs, range.rs) mutate values in
// place through the crate-internal setters for the duration of one call
// and hand the track back read-only.
//
// JSON load/save is deliberately dumb: read, deserialize, re-validate.

use crate::error::PitchError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PitchTrack {
    times: Vec<f64>,
    notes: Vec<Option<f64>>,
    loudness: Option<Vec<f64>>,
}

impl PitchTrack {
    /// Build a track from parallel time/note sequences.
    ///
    /// Times must be finite and strictly increasing, and every parallel
    /// sequence equal-length. Non-finite note values become unvoiced.
    pub fn new(
        times: Vec<f64>,
        notes: Vec<Option<f64>>,
        loudness: Option<Vec<f64>>,
    ) -> Result<Self, PitchError> {
        if times.len() != notes.len() {
            return Err(PitchError::MalformedTrack(format!(
                "{} time instants vs {} note values",
                times.len(),
                notes.len()
            )));
        }
        if let Some(series) = &loudness {
            if series.len() != times.len() {
                return Err(PitchError::MalformedTrack(format!(
                    "{} time instants vs {} loudness values",
                    times.len(),
                    series.len()
                )));
            }
        }
        if times.iter().any(|t| !t.is_finite()) {
            return Err(PitchError::MalformedTrack(
                "non-finite time instant".into(),
            ));
        }
        if times.windows(2).any(|pair| pair[1] <= pair[0]) {
            return Err(PitchError::MalformedTrack(
                "time instants not strictly increasing".into(),
            ));
        }
        let notes = notes
            .into_iter()
            .map(|n| n.filter(|v| v.is_finite()))
            .collect();
        Ok(PitchTrack {
            times,
            notes,
            loudness,
        })
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn notes(&self) -> &[Option<f64>] {
        &self.notes
    }

    pub fn loudness(&self) -> Option<&[f64]> {
        self.loudness.as_deref()
    }

    /// The detected note at sample `i`, if voiced.
    pub fn note(&self, i: usize) -> Option<f64> {
        self.notes[i]
    }

    pub fn is_voiced(&self, i: usize) -> bool {
        self.notes[i].is_some()
    }

    pub fn voiced_count(&self) -> usize {
        self.notes.iter().filter(|n| n.is_some()).count()
    }

    /// One flag per sample: voiced or not.
    pub fn voiced_mask(&self) -> Vec<bool> {
        self.notes.iter().map(Option::is_some).collect()
    }

    /// The track's own time resolution: mean grid spacing in seconds.
    /// `None` for tracks with fewer than two samples.
    pub fn time_step(&self) -> Option<f64> {
        if self.times.len() < 2 {
            return None;
        }
        let span = self.times[self.times.len() - 1] - self.times[0];
        Some(span / (self.times.len() - 1) as f64)
    }

    pub(crate) fn set_note(&mut self, i: usize, note: f64) {
        self.notes[i] = Some(note);
    }

    pub(crate) fn clear_note(&mut self, i: usize) {
        self.notes[i] = None;
    }

    /// Load a track from JSON, re-validating every invariant.
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let data = std::fs::read_to_string(path)?;
        let raw: PitchTrack = serde_json::from_str(&data)?;
        Ok(PitchTrack::new(raw.times, raw.notes, raw.loudness)?)
    }

    /// Save the track as JSON.
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let data = serde_json::to_string(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }
}
