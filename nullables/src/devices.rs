//! Nullable camera, challenge detector and presenter.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use veriface_liveness::{CaptureFailure, Notice};
use veriface_session::{CaptureDevice, ChallengeDetector, Presenter};
use veriface_types::Motion;
use veriface_verification::{CapturedImage, VerificationOutcome};

#[derive(Default)]
struct CameraState {
    captures: VecDeque<Result<CapturedImage, CaptureFailure>>,
    preview_failure: Option<CaptureFailure>,
    preview_starts: usize,
    preview_stops: usize,
    capture_calls: usize,
    releases: usize,
}

/// A camera that returns scripted photos.
///
/// With an empty script every capture returns a small placeholder image.
#[derive(Clone, Default)]
pub struct NullCamera {
    inner: Arc<Mutex<CameraState>>,
}

impl NullCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result of a future capture.
    pub fn push_capture(&self, result: Result<CapturedImage, CaptureFailure>) {
        self.inner.lock().unwrap().captures.push_back(result);
    }

    /// Queue a capture failure.
    pub fn fail_next_capture(&self, reason: &str) {
        self.push_capture(Err(CaptureFailure(reason.to_string())));
    }

    /// Make every `start_preview` fail.
    pub fn fail_preview(&self, reason: &str) {
        self.inner.lock().unwrap().preview_failure = Some(CaptureFailure(reason.to_string()));
    }

    pub fn preview_starts(&self) -> usize {
        self.inner.lock().unwrap().preview_starts
    }

    pub fn preview_stops(&self) -> usize {
        self.inner.lock().unwrap().preview_stops
    }

    pub fn capture_calls(&self) -> usize {
        self.inner.lock().unwrap().capture_calls
    }

    pub fn releases(&self) -> usize {
        self.inner.lock().unwrap().releases
    }
}

impl CaptureDevice for NullCamera {
    fn start_preview(&mut self) -> Result<(), CaptureFailure> {
        let mut state = self.inner.lock().unwrap();
        if let Some(failure) = &state.preview_failure {
            return Err(failure.clone());
        }
        state.preview_starts += 1;
        Ok(())
    }

    fn stop_preview(&mut self) {
        self.inner.lock().unwrap().preview_stops += 1;
    }

    fn capture(&mut self) -> Result<CapturedImage, CaptureFailure> {
        let mut state = self.inner.lock().unwrap();
        state.capture_calls += 1;
        state
            .captures
            .pop_front()
            .unwrap_or_else(|| Ok(CapturedImage::new(vec![0xFF, 0xD8, 0xFF])))
    }

    fn release(&mut self) {
        self.inner.lock().unwrap().releases += 1;
    }
}

#[derive(Default)]
struct DetectorState {
    armed: Vec<Motion>,
    done_marks: usize,
    releases: usize,
}

/// A challenge detector that only records what it was told.
#[derive(Clone, Default)]
pub struct NullDetector {
    inner: Arc<Mutex<DetectorState>>,
}

impl NullDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Motions armed so far, oldest first.
    pub fn armed(&self) -> Vec<Motion> {
        self.inner.lock().unwrap().armed.clone()
    }

    pub fn done_marks(&self) -> usize {
        self.inner.lock().unwrap().done_marks
    }

    pub fn releases(&self) -> usize {
        self.inner.lock().unwrap().releases
    }
}

impl ChallengeDetector for NullDetector {
    fn arm(&mut self, motion: Motion) {
        self.inner.lock().unwrap().armed.push(motion);
    }

    fn mark_challenge_done(&mut self) {
        self.inner.lock().unwrap().done_marks += 1;
    }

    fn release(&mut self) {
        self.inner.lock().unwrap().releases += 1;
    }
}

/// A presenter that records every notice.
#[derive(Clone, Default)]
pub struct NullPresenter {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl NullPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    /// Rendered text of every notice, oldest first.
    pub fn texts(&self) -> Vec<String> {
        self.notices.lock().unwrap().iter().map(Notice::text).collect()
    }

    /// Verification outcomes presented so far, oldest first.
    pub fn outcomes(&self) -> Vec<VerificationOutcome> {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .filter_map(|n| match n {
                Notice::Outcome(report) => Some(report.outcome),
                _ => None,
            })
            .collect()
    }

    pub fn fatal_messages(&self) -> Vec<String> {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .filter_map(|n| match n {
                Notice::Fatal(reason) => Some(reason.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Presenter for NullPresenter {
    fn present(&mut self, notice: &Notice) {
        self.notices.lock().unwrap().push(notice.clone());
    }
}
