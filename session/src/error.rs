use thiserror::Error;
use veriface_liveness::{CaptureFailure, LivenessError};
use veriface_store::StoreError;
use veriface_types::TypesError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid session input: {0}")]
    Types(#[from] TypesError),

    #[error("profile load failed: {0}")]
    Profile(#[from] StoreError),

    #[error("camera failed: {0}")]
    Capture(CaptureFailure),

    #[error("liveness session failed: {0}")]
    Liveness(#[from] LivenessError),

    #[error("session has already terminated")]
    Terminated,

    #[error("session controller is gone")]
    Closed,

    #[error("session command queue is full")]
    QueueFull,
}

impl SessionError {
    /// Whether the error came from a collaborator rather than from setup.
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(self, Self::Profile(_) | Self::Capture(_) | Self::Liveness(_))
    }
}
