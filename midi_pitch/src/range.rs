// Range filtering: silence detections the score cannot explain.
//
// Two independent predicates, both evaluated against the pristine state
// before any sample is touched:
//
//  1. the note lies strictly outside the margin-extended note range of
//     the score;
//  2. the instant falls outside the score-activity mask after temporal
//     dilation by a one-second window — short rests between phrases are
//     tolerated, long stretches of scoreless singing are not.
//
// Removal counts add up across the predicates, so a sample failing both
// is counted twice. That matches the historical reporting; the masking
// itself is unaffected. Filtering is idempotent: everything a first
// pass keeps, a second pass keeps too.

use crate::error::PitchError;
use crate::note::NoteRange;
use crate::roll::ScoreRoll;
use crate::track::PitchTrack;

/// Width of the activity-dilation window, in seconds.
pub const DILATION_SECONDS: f64 = 1.0;

/// What the range filter did: the range it enforced and how many
/// removals it performed. `removed` is additive across the two
/// predicates — a sample failing both counts twice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RangeReport {
    pub range: NoteRange,
    pub removed: usize,
}

/// Remove out-of-range and out-of-score samples in place.
///
/// Fails with `EmptyRoll` — before touching anything — when the score
/// is never active over the track's grid, since no range exists to
/// filter against. An already-silent track is not an error here: the
/// filter must be safely re-runnable on its own output.
pub fn filter_range(roll: &ScoreRoll, track: &mut PitchTrack) -> Result<RangeReport, PitchError> {
    let sampled = roll.sample_at(track.times());
    let range = sampled.note_range()?;

    let active: Vec<bool> = (0..sampled.len()).map(|i| sampled.is_active(i)).collect();
    let width = track
        .time_step()
        .map_or(1, |step| ((DILATION_SECONDS / step).round() as usize).max(1));
    let dilated = dilate(&active, width);

    // Decide on the pristine state, then apply.
    let mut out_of_range = vec![false; track.len()];
    let mut removed = 0;
    for i in 0..track.len() {
        if let Some(note) = track.note(i) {
            if !range.contains(note) {
                out_of_range[i] = true;
                removed += 1;
            }
            if !dilated[i] {
                removed += 1;
            }
        }
    }
    for i in 0..track.len() {
        if out_of_range[i] || !dilated[i] {
            track.clear_note(i);
        }
    }

    tracing::info!(
        "range filter: removed {removed} samples outside {}..={}",
        range.low,
        range.high
    );
    Ok(RangeReport { range, removed })
}

/// OR each column with its neighbors over a `width`-wide window,
/// `[i - width/2, i + (width-1)/2]` — the same bounds a same-length
/// box-kernel convolution uses. Prefix sums keep it O(n).
fn dilate(active: &[bool], width: usize) -> Vec<bool> {
    let mut prefix = vec![0usize; active.len() + 1];
    for (i, &a) in active.iter().enumerate() {
        prefix[i + 1] = prefix[i] + usize::from(a);
    }
    (0..active.len())
        .map(|i| {
            let lo = i.saturating_sub(width / 2);
            let hi = (i + (width - 1) / 2).min(active.len() - 1);
            prefix[hi + 1] > prefix[lo]
        })
        .collect()
}
