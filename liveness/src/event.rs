//! Inputs consumed by the challenge machine.

use thiserror::Error;
use veriface_verification::CapturedImage;

/// Events emitted by the external challenge detector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChallengeEvent {
    /// The requested head motion was observed.
    ChallengeCompleted,
    /// Steady-state signal; after completion it triggers the photo.
    IdleTick,
}

/// Identifies one scheduled capture. Results carrying an older token are stale.
pub type CaptureToken = u64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct CaptureFailure(pub String);

/// Everything the machine reacts to.
#[derive(Debug)]
pub enum Input {
    Start,
    Challenge(ChallengeEvent),
    /// The capture delay for `token` elapsed.
    CaptureDue(CaptureToken),
    /// The capture device answered the request for `token`.
    Captured {
        token: CaptureToken,
        result: Result<CapturedImage, CaptureFailure>,
    },
    Pause,
    Resume,
    /// Begin a fresh challenge and forget earlier distance failures.
    Reset,
    Stop,
}
