use thiserror::Error;
use veriface_types::TypesError;

/// Failure reported by a perception collaborator (model load, inference, ...).
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct PerceptionError(pub String);

/// Collaborator failures. Rejections are outcomes, not errors.
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("face cropper failed: {0}")]
    Cropper(PerceptionError),

    #[error("anti-spoof scorer failed: {0}")]
    AntiSpoof(PerceptionError),

    #[error("embedding generator failed: {0}")]
    Embedder(PerceptionError),

    #[error("anti-spoof score is not finite: {0}")]
    InvalidSpoofScore(f32),

    #[error("embedding error: {0}")]
    Embedding(#[from] TypesError),
}
