//! Platform collaborators driven by the session.

use veriface_liveness::{CaptureFailure, MotionPicker, Notice};
use veriface_types::Motion;
use veriface_verification::{AntiSpoofScorer, CapturedImage, EmbeddingGenerator, FaceCropper};

/// Camera-equivalent: preview stream plus single-photo capture.
pub trait CaptureDevice: Send {
    fn start_preview(&mut self) -> Result<(), CaptureFailure>;
    fn stop_preview(&mut self);
    fn capture(&mut self) -> Result<CapturedImage, CaptureFailure>;
    /// Free the underlying device. Called exactly once.
    fn release(&mut self);
}

/// The component watching live video for the requested head motion.
pub trait ChallengeDetector: Send {
    /// Start looking for `motion`; discards any earlier challenge progress.
    fn arm(&mut self, motion: Motion);
    /// The challenge is satisfied; emit idle ticks from now on.
    fn mark_challenge_done(&mut self);
    /// Called exactly once when the session ends.
    fn release(&mut self);
}

/// Outbound presentation (instructions, prompts, outcome messages).
pub trait Presenter: Send {
    fn present(&mut self, notice: &Notice);
}

/// Everything a session needs besides its configuration and profile store.
pub struct Collaborators {
    pub camera: Box<dyn CaptureDevice>,
    pub detector: Box<dyn ChallengeDetector>,
    pub presenter: Box<dyn Presenter>,
    pub cropper: Box<dyn FaceCropper>,
    pub anti_spoof: Box<dyn AntiSpoofScorer>,
    pub embedder: Box<dyn EmbeddingGenerator>,
    pub picker: Box<dyn MotionPicker>,
}
