//! Capability traits for the external perception models.

use crate::PerceptionError;
use veriface_types::Embedding;

/// Raw bytes of one captured photo, as delivered by the capture device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapturedImage {
    bytes: Vec<u8>,
}

impl CapturedImage {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// An aligned, cropped face region ready for scoring and embedding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CroppedFace {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Detects, aligns and crops the largest face in an image.
pub trait FaceCropper: Send {
    /// `Ok(None)` when no face reaches `min_confidence`.
    fn crop(
        &self,
        image: &CapturedImage,
        min_confidence: f32,
    ) -> Result<Option<CroppedFace>, PerceptionError>;
}

/// Scores how likely a face is a presentation attack. Higher means more likely spoof.
pub trait AntiSpoofScorer: Send {
    fn score(&self, face: &CroppedFace) -> Result<f32, PerceptionError>;
}

/// Produces the fixed-length embedding of a face.
pub trait EmbeddingGenerator: Send {
    fn embed(&self, face: &CroppedFace) -> Result<Embedding, PerceptionError>;
}
