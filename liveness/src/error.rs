use crate::event::CaptureFailure;
use thiserror::Error;
use veriface_types::OperatingMode;
use veriface_verification::VerificationError;

/// Failures that end the session. Rejections are never errors.
#[derive(Debug, Error)]
pub enum LivenessError {
    #[error("no motion prompts configured")]
    NoMotions,

    #[error("profile is enrolled for {profile} but the session runs {session}")]
    ProfileModeMismatch {
        profile: OperatingMode,
        session: OperatingMode,
    },

    #[error("capture failed: {0}")]
    Capture(CaptureFailure),

    #[error("verification collaborator failed: {0}")]
    Verification(#[from] VerificationError),
}
