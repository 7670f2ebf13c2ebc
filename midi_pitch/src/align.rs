// Trim estimation: the constant offset aligning a recording with the score.
//
// A captured vocal rarely starts exactly on the score's timeline; the
// aligner searches a symmetric window of candidate shifts, stepped by
// the track's own time resolution, for the one that best lines the
// voiced samples up with the score-active columns.
//
// Scoring shifts the boolean voiced mask rather than re-deriving the
// pitch track per candidate — exact for mask overlap and masked note
// error, and the reason the aligner returns an offset instead of
// rewriting samples: an exact shift of a continuous-time track requires
// re-extraction on the new grid, which the caller owns.
//
// Candidates are scored in parallel via rayon; the reduction scans the
// collected scores in candidate order, so the lowest candidate wins
// ties no matter how evaluation was scheduled.

use crate::error::PitchError;
use crate::roll::ScoreRoll;
use crate::track::PitchTrack;
use rayon::prelude::*;

/// Scoring strategy for trim candidates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrimMethod {
    /// Count the instants where the shifted voiced mask and the score
    /// activity mask agree; pick the shift maximizing the count.
    Match,
    /// Mean squared error between the roll's reference note (lowest
    /// active row) and the shifted track's note, over the columns where
    /// both masks hold; pick the shift minimizing it. An empty overlap
    /// scores +infinity and is never selected.
    Error,
}

/// Estimate the trim offset, in seconds, to add to the track's timeline.
///
/// Candidate shifts span `[-window, +window]` in steps of the track's
/// time resolution. Returns the offset only — re-extracting the track
/// at the corrected offset is the caller's job.
///
/// Errors: `InvalidRange` for a non-positive window or a track too
/// short to have a resolution; `DegenerateTrack` when nothing is
/// voiced; `EmptyRoll` when no candidate shift produces any overlap
/// with score activity (including a roll that is silent across the
/// track's whole grid).
pub fn estimate_trim(
    roll: &ScoreRoll,
    track: &PitchTrack,
    window: f64,
    method: TrimMethod,
) -> Result<f64, PitchError> {
    let step = track.time_step().unwrap_or(0.0);
    if !window.is_finite() || window <= 0.0 || step <= 0.0 {
        return Err(PitchError::InvalidRange { window, step });
    }
    if track.voiced_count() == 0 {
        return Err(PitchError::DegenerateTrack);
    }

    let sampled = roll.sample_at(track.times());
    let active: Vec<bool> = (0..sampled.len()).map(|i| sampled.is_active(i)).collect();
    if !active.iter().any(|&a| a) {
        return Err(PitchError::EmptyRoll);
    }

    let reach = (window / step).round() as i64;
    let candidates: Vec<i64> = (-reach..=reach).collect();

    let best = match method {
        TrimMethod::Match => {
            let voiced = track.voiced_mask();
            let scores: Vec<usize> = candidates
                .par_iter()
                .map(|&shift| match_score(&voiced, &active, shift))
                .collect();
            if scores.iter().all(|&s| s == 0) {
                return Err(PitchError::EmptyRoll);
            }
            argmax_first(&scores)
        }
        TrimMethod::Error => {
            let reference: Vec<Option<u8>> =
                (0..sampled.len()).map(|i| sampled.reference(i)).collect();
            let scores: Vec<f64> = candidates
                .par_iter()
                .map(|&shift| error_score(track.notes(), &reference, shift))
                .collect();
            let best = argmin_first(&scores);
            if !scores[best].is_finite() {
                return Err(PitchError::EmptyRoll);
            }
            best
        }
    };

    let trim = candidates[best] as f64 * step;
    tracing::info!("trim aligner: {trim:+.3}s over {} candidates", candidates.len());
    Ok(trim)
}

/// Overlap popcount for one candidate: shifting the track by `shift`
/// samples moves the voiced flag of sample `i` to column `i + shift`.
fn match_score(voiced: &[bool], active: &[bool], shift: i64) -> usize {
    let len = active.len() as i64;
    let mut count = 0;
    for column in 0..len {
        let source = column - shift;
        if source >= 0
            && source < len
            && voiced[source as usize]
            && active[column as usize]
        {
            count += 1;
        }
    }
    count
}

/// Masked mean squared note error for one candidate. Guards the
/// division: an empty overlap scores +infinity instead of 0/0.
fn error_score(notes: &[Option<f64>], reference: &[Option<u8>], shift: i64) -> f64 {
    let len = reference.len() as i64;
    let mut sum = 0.0;
    let mut overlap = 0usize;
    for column in 0..len {
        let source = column - shift;
        if source < 0 || source >= len {
            continue;
        }
        let (Some(note), Some(target)) = (notes[source as usize], reference[column as usize])
        else {
            continue;
        };
        let diff = f64::from(target) - note;
        sum += diff * diff;
        overlap += 1;
    }
    if overlap == 0 {
        f64::INFINITY
    } else {
        sum / overlap as f64
    }
}

/// Index of the maximum, first occurrence winning ties.
fn argmax_first(scores: &[usize]) -> usize {
    let mut best = 0;
    for (i, &score) in scores.iter().enumerate().skip(1) {
        if score > scores[best] {
            best = i;
        }
    }
    best
}

/// Index of the minimum, first occurrence winning ties.
fn argmin_first(scores: &[f64]) -> usize {
    let mut best = 0;
    for (i, &score) in scores.iter().enumerate().skip(1) {
        if score < scores[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NoteEvent;

    fn on(delta: f64, note: u8) -> NoteEvent {
        NoteEvent { delta, note, on: true }
    }

    fn off(delta: f64, note: u8) -> NoteEvent {
        NoteEvent { delta, note, on: false }
    }

    /// Track on a 0.05 s grid, voiced with `note` over [start, end).
    fn track_voiced_over(
        total: f64,
        start: f64,
        end: f64,
        note: f64,
    ) -> PitchTrack {
        let count = (total / 0.05).round() as usize;
        let times: Vec<f64> = (0..count).map(|i| i as f64 * 0.05).collect();
        let notes = times
            .iter()
            .map(|&t| (t >= start && t < end).then_some(note))
            .collect();
        PitchTrack::new(times, notes, None).unwrap()
    }

    #[test]
    fn test_match_recovers_negative_offset() {
        // Score active on note 60 over [0.0, 1.0); singing lands 0.3 s
        // late, over [0.3, 1.3). The track must be shifted by -0.3.
        let roll = ScoreRoll::new(vec![on(0.0, 60), off(1.0, 60)], 1.0);
        let track = track_voiced_over(1.35, 0.3, 1.3, 60.0);
        let trim = estimate_trim(&roll, &track, 0.5, TrimMethod::Match).unwrap();
        assert!((trim + 0.3).abs() < 1e-9, "expected -0.3, got {trim}");
    }

    #[test]
    fn test_error_strategy_prefers_zero_note_error() {
        // Two equally long active regions on different notes; only the
        // correct shift lines the sung note up with reference 60.
        let roll = ScoreRoll::new(
            vec![on(0.0, 72), off(1.0, 72), on(0.0, 60), off(1.0, 60)],
            2.0,
        );
        let track = track_voiced_over(2.2, 1.1, 2.1, 60.0);
        let trim = estimate_trim(&roll, &track, 0.2, TrimMethod::Error).unwrap();
        assert!((trim + 0.1).abs() < 1e-9, "expected -0.1, got {trim}");
    }

    #[test]
    fn test_tie_breaks_toward_most_negative_candidate() {
        // Roll active at a single instant, track voiced everywhere:
        // every candidate scores 1, so the scan order decides.
        let roll = ScoreRoll::new(vec![on(0.25, 60), off(0.05, 60)], 0.55);
        let track = track_voiced_over(0.55, 0.0, 0.55, 60.0);
        let trim = estimate_trim(&roll, &track, 0.1, TrimMethod::Match).unwrap();
        assert!((trim + 0.1).abs() < 1e-9, "expected -0.1, got {trim}");
    }

    #[test]
    fn test_zero_offset_when_already_aligned() {
        // Two-note melody sung exactly on time: any shift either loses
        // overlap (match) or smears the note boundary (error).
        let roll = ScoreRoll::new(
            vec![on(0.0, 60), off(1.0, 60), on(0.0, 64), off(1.0, 64)],
            2.0,
        );
        let count = (2.2_f64 / 0.05).round() as usize;
        let times: Vec<f64> = (0..count).map(|i| i as f64 * 0.05).collect();
        let notes = times
            .iter()
            .map(|&t| {
                if t < 1.0 {
                    Some(60.0)
                } else if t < 2.0 {
                    Some(64.0)
                } else {
                    None
                }
            })
            .collect();
        let track = PitchTrack::new(times, notes, None).unwrap();
        for method in [TrimMethod::Match, TrimMethod::Error] {
            let trim = estimate_trim(&roll, &track, 0.25, method).unwrap();
            assert!(trim.abs() < 1e-9, "{method:?} drifted to {trim}");
        }
    }

    #[test]
    fn test_invalid_window_is_rejected() {
        let roll = ScoreRoll::new(vec![on(0.0, 60)], 1.0);
        let track = track_voiced_over(1.0, 0.0, 1.0, 60.0);
        for window in [0.0, -1.0, f64::NAN] {
            let err = estimate_trim(&roll, &track, window, TrimMethod::Match).unwrap_err();
            assert!(matches!(err, PitchError::InvalidRange { .. }));
        }
    }

    #[test]
    fn test_track_without_resolution_is_rejected() {
        let roll = ScoreRoll::new(vec![on(0.0, 60)], 1.0);
        let track = PitchTrack::new(vec![0.0], vec![Some(60.0)], None).unwrap();
        let err = estimate_trim(&roll, &track, 0.5, TrimMethod::Match).unwrap_err();
        assert!(matches!(err, PitchError::InvalidRange { .. }));
    }

    #[test]
    fn test_unvoiced_track_is_degenerate() {
        let roll = ScoreRoll::new(vec![on(0.0, 60)], 1.0);
        let track = track_voiced_over(1.0, 0.0, 0.0, 60.0);
        let err = estimate_trim(&roll, &track, 0.5, TrimMethod::Match).unwrap_err();
        assert_eq!(err, PitchError::DegenerateTrack);
    }

    #[test]
    fn test_silent_roll_is_an_error_not_a_window_edge() {
        let roll = ScoreRoll::new(vec![], 1.0);
        let track = track_voiced_over(1.0, 0.0, 1.0, 60.0);
        for method in [TrimMethod::Match, TrimMethod::Error] {
            let err = estimate_trim(&roll, &track, 0.5, method).unwrap_err();
            assert_eq!(err, PitchError::EmptyRoll);
        }
    }

    #[test]
    fn test_no_reachable_overlap_is_an_error() {
        // Activity exists but lies beyond the search window from every
        // voiced sample: all candidates score on an empty overlap.
        let roll = ScoreRoll::new(vec![on(2.0, 60), off(0.5, 60)], 2.5);
        let track = track_voiced_over(3.0, 0.0, 0.5, 60.0);
        for method in [TrimMethod::Match, TrimMethod::Error] {
            let err = estimate_trim(&roll, &track, 0.2, method).unwrap_err();
            assert_eq!(err, PitchError::EmptyRoll);
        }
    }
}
