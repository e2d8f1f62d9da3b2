//! Scoped ownership of the camera and detector.

use crate::collaborators::{CaptureDevice, ChallengeDetector};
use veriface_liveness::CaptureFailure;
use veriface_verification::CapturedImage;

/// Owns the session's hardware-backed collaborators and releases them when
/// dropped, whichever way the session ends.
pub struct DeviceGuard {
    camera: Box<dyn CaptureDevice>,
    detector: Box<dyn ChallengeDetector>,
    previewing: bool,
    released: bool,
}

impl DeviceGuard {
    pub fn new(camera: Box<dyn CaptureDevice>, detector: Box<dyn ChallengeDetector>) -> Self {
        Self {
            camera,
            detector,
            previewing: false,
            released: false,
        }
    }

    pub fn is_previewing(&self) -> bool {
        self.previewing
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn start_preview(&mut self) -> Result<(), CaptureFailure> {
        if self.released || self.previewing {
            return Ok(());
        }
        self.camera.start_preview()?;
        self.previewing = true;
        Ok(())
    }

    pub fn stop_preview(&mut self) {
        if self.previewing {
            self.camera.stop_preview();
            self.previewing = false;
        }
    }

    pub fn capture(&mut self) -> Result<CapturedImage, CaptureFailure> {
        if self.released {
            return Err(CaptureFailure("camera already released".to_string()));
        }
        self.camera.capture()
    }

    pub fn detector(&mut self) -> &mut dyn ChallengeDetector {
        self.detector.as_mut()
    }

    /// Stop the preview and release both devices. Idempotent.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.stop_preview();
        self.camera.release();
        self.detector.release();
        self.released = true;
        tracing::debug!("camera and detector released");
    }
}

impl Drop for DeviceGuard {
    fn drop(&mut self) {
        self.release();
    }
}
