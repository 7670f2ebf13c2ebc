// End-to-end reconciliation: score in, corrected pitch track out.
//
// Builds a synthetic two-phrase score and a "recording" that starts
// 0.3 s late, sings the first phrase an octave sharp, drops a spurious
// low note mid-phrase, and keeps humming after the score ends. The
// pipeline — trim estimation, simulated re-extraction, octave folding,
// range filtering — must straighten all of it out. The only
// test-specific code is the synthetic extraction in `extract_track`;
// everything else is the same path a real caller runs.

use midi_pitch::align::{TrimMethod, estimate_trim};
use midi_pitch::events::NoteEvent;
use midi_pitch::note::NoteRange;
use midi_pitch::octave::fold_octaves;
use midi_pitch::range::filter_range;
use midi_pitch::roll::ScoreRoll;
use midi_pitch::track::PitchTrack;

/// Grid spacing of the synthetic pitch estimator.
const STEP: f64 = 0.05;
/// Recording length in seconds.
const TOTAL: f64 = 5.5;
/// How late the vocal starts relative to the score.
const LATENESS: f64 = 0.3;

/// Two phrases: note 60 over [0, 2), note 64 over [2, 4).
fn score() -> ScoreRoll {
    ScoreRoll::new(
        vec![
            NoteEvent { delta: 0.0, note: 60, on: true },
            NoteEvent { delta: 2.0, note: 60, on: false },
            NoteEvent { delta: 0.0, note: 64, on: true },
            NoteEvent { delta: 2.0, note: 64, on: false },
        ],
        4.0,
    )
}

/// What the pitch estimator hears at recording time `r`.
fn detected_at(r: f64) -> Option<f64> {
    if (LATENESS..LATENESS + 2.0).contains(&r) {
        Some(72.0) // first phrase, an octave sharp
    } else if (2.5..2.6).contains(&r) {
        Some(57.0) // spurious low note
    } else if (LATENESS + 2.0..LATENESS + 4.0).contains(&r) {
        Some(64.0)
    } else if (4.5..5.0).contains(&r) {
        Some(60.0) // humming on after the score ends
    } else {
        None
    }
}

/// Simulate (re-)extraction with `skip` seconds trimmed off the start.
fn extract_track(skip: f64) -> PitchTrack {
    let count = (TOTAL / STEP).round() as usize;
    let times: Vec<f64> = (0..count).map(|i| i as f64 * STEP).collect();
    let notes = times.iter().map(|&t| detected_at(t + skip)).collect();
    PitchTrack::new(times, notes, None).unwrap()
}

#[test]
fn full_reconciliation_pipeline() {
    let roll = score();

    // 1. Estimate the trim from the raw extraction.
    let raw = extract_track(0.0);
    let trim = estimate_trim(&roll, &raw, 0.5, TrimMethod::Match).unwrap();
    assert!((trim + LATENESS).abs() < 1e-9, "estimated trim {trim}");

    // 2. Re-extract at the corrected offset — the caller's job; the
    // aligner itself never rewrites samples.
    let mut track = extract_track(-trim);

    // 3. Fold octave errors: the whole first phrase plus the low note.
    let changed = fold_octaves(&roll, &mut track).unwrap();
    assert_eq!(changed, 42);
    assert_eq!(track.note(10), Some(60.0)); // was 72
    assert_eq!(track.note(50), Some(64.0)); // already right, untouched
    assert_eq!(track.note(44), Some(69.0)); // 57 folded up to 69

    // 4. Range-filter what the score cannot explain.
    let report = filter_range(&roll, &mut track).unwrap();
    assert_eq!(report.range, NoteRange { low: 58, high: 66 });
    assert_eq!(report.removed, 6);
    assert_eq!(track.note(44), None); // folded low note now out of range
    assert_eq!(track.note(45), None);
    assert_eq!(track.note(86), Some(60.0)); // tail inside the dilation
    assert_eq!(track.note(92), None); // tail beyond the dilation
    assert_eq!(track.voiced_count(), 84);
}

#[test]
fn pipeline_is_stable_once_corrected() {
    // A second octave-fold and range-filter pass over an already
    // corrected track changes nothing.
    let roll = score();
    let mut track = extract_track(LATENESS);
    fold_octaves(&roll, &mut track).unwrap();
    filter_range(&roll, &mut track).unwrap();
    let corrected = track.notes().to_vec();

    let changed = fold_octaves(&roll, &mut track).unwrap();
    assert_eq!(changed, 0);
    let report = filter_range(&roll, &mut track).unwrap();
    assert_eq!(report.removed, 0);
    assert_eq!(track.notes(), &corrected[..]);
}
