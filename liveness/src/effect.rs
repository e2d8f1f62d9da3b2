//! Side effects requested by the challenge machine.

use std::time::Duration;
use veriface_types::Motion;
use veriface_verification::VerificationReport;

use crate::event::CaptureToken;

pub const INITIAL_INSTRUCTION: &str = "Look at the camera and place your face inside the overlay";
pub const SUCCESS_INSTRUCTION: &str = "Look at the camera again to take the photo";

/// Outbound presentation updates. The machine never waits on them.
#[derive(Clone, Debug, PartialEq)]
pub enum Notice {
    Instruction(&'static str),
    Prompt(Motion),
    Outcome(VerificationReport),
    /// The session ended because a collaborator failed.
    Fatal(String),
}

/// Work for the host, in the order returned.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    Present(Notice),
    /// Tell the detector which motion to look for.
    ArmDetector(Motion),
    /// Tell the detector the challenge is satisfied.
    MarkChallengeDone,
    /// Feed `Input::CaptureDue(token)` back after `delay`.
    ScheduleCapture { token: CaptureToken, delay: Duration },
    CancelCapture,
    /// Take one photo and answer with `Input::Captured { token, .. }`.
    RequestCapture(CaptureToken),
    StartPreview,
    StopPreview,
    /// Drop detector events queued before this point.
    ClearPendingEvents,
    /// The session is over; release collaborators.
    Finish,
}

impl Notice {
    /// Text a presenter shows for this notice.
    pub fn text(&self) -> String {
        match self {
            Self::Instruction(text) => text.to_string(),
            Self::Prompt(motion) => motion.instruction().to_string(),
            Self::Outcome(report) => report.outcome.reason().to_string(),
            Self::Fatal(reason) => format!("Verification stopped: {reason}"),
        }
    }
}
