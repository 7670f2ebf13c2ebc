// Error kinds for the reconciliation pipeline.
//
// Every failure mode is detected explicitly and surfaced as a typed
// variant — the fixers never let NaN or Inf stand in for an error, and
// any division by a possibly-empty overlap count guards first. Each
// fixer validates before it mutates, so a returned error guarantees the
// track is exactly as it was.

use thiserror::Error;

/// Errors produced by roll sampling, trim estimation, and the fixers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PitchError {
    /// The score roll has no active note anywhere, so the note range —
    /// and any scoring against the roll — is undefined.
    #[error("score roll has no active notes")]
    EmptyRoll,

    /// The pitch track has no voiced samples, so alignment and octave
    /// correction have nothing to score.
    #[error("pitch track has no voiced samples")]
    DegenerateTrack,

    /// Non-positive trim search window or step.
    #[error("invalid trim search range: window {window}s, step {step}s")]
    InvalidRange { window: f64, step: f64 },

    /// A pitch track that violates its construction invariants.
    #[error("malformed pitch track: {0}")]
    MalformedTrack(String),
}
