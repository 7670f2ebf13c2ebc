// Octave folding: snap octave-sized detection errors back to the score.
//
// Pitch estimators lose the octave far more often than the pitch class:
// harmonic and subharmonic confusion reports the sung note one or two
// octaves off. For every voiced instant where the score has at least
// one active note, the error against the roll's reference note (lowest
// active row) is folded to the nearest whole octave and the detected
// note shifted by that amount. Errors under six semitones fold to zero
// and the sample is left alone — this corrects octave slips, it does
// not snap the performance onto the score.

use crate::error::PitchError;
use crate::roll::ScoreRoll;
use crate::track::PitchTrack;

/// Fold octave-sized errors in place; returns how many samples changed.
///
/// A sample changes only when it is voiced, the roll is active at its
/// column, and the folded error is non-zero. Fails with
/// `DegenerateTrack` — before touching anything — when the track has no
/// voiced samples at all.
pub fn fold_octaves(roll: &ScoreRoll, track: &mut PitchTrack) -> Result<usize, PitchError> {
    if track.voiced_count() == 0 {
        return Err(PitchError::DegenerateTrack);
    }
    let sampled = roll.sample_at(track.times());
    let mut changed = 0;
    for i in 0..track.len() {
        let (Some(detected), Some(reference)) = (track.note(i), sampled.reference(i)) else {
            continue;
        };
        let raw_error = f64::from(reference) - detected;
        let folded_error = (raw_error / 12.0).round() * 12.0;
        if folded_error != 0.0 {
            track.set_note(i, detected + folded_error);
            changed += 1;
        }
    }
    tracing::info!("octave fold: changed {changed} samples");
    Ok(changed)
}
