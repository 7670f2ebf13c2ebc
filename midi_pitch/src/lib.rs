// midi_pitch — reconcile a vocal pitch track against a MIDI score.
//
// The pitch estimator hears what was sung; the score says what should
// have been sung. This crate closes the gap between the two: it estimates
// the constant time offset separating the recording from the score's
// timeline, folds octave-sized detection errors back onto the score's
// reference notes, and silences detections the score cannot explain.
//
// Architecture (leaves first):
// - note.rs:   frequency <-> note-number math, note names, `NoteRange`
// - events.rs: `NoteEvent` + the midly SMF adapter
// - roll.rs:   `ScoreRoll` / `SampledRoll` — note activity over time
// - track.rs:  `PitchTrack` — the pitch contour under repair
// - align.rs:  trim estimation (mask-match / note-error strategies)
// - octave.rs: octave folding against the roll's reference note
// - range.rs:  out-of-range and out-of-score rejection
// - error.rs:  `PitchError`
//
// Processing is batch and synchronous: each fixer takes an exclusive
// borrow of one track and a shared borrow of one roll for the duration
// of the call, and either completes its full pass or fails leaving the
// track unmodified. The crate does no I/O beyond `PitchTrack` JSON
// load/save and owns no audio, MIDI-file, or rendering surface — those
// belong to the surrounding tooling.

pub mod align;
pub mod error;
pub mod events;
pub mod note;
pub mod octave;
pub mod range;
pub mod roll;
pub mod track;
