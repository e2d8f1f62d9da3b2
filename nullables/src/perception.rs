//! Nullable perception models.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use veriface_types::Embedding;
use veriface_verification::{
    AntiSpoofScorer, CapturedImage, CroppedFace, EmbeddingGenerator, FaceCropper, PerceptionError,
};

/// A face cropper answering from a script.
///
/// Once the script is exhausted the last answer repeats.
#[derive(Clone)]
pub struct NullCropper {
    inner: Arc<Mutex<CropperState>>,
}

struct CropperState {
    script: VecDeque<Result<Option<CroppedFace>, PerceptionError>>,
    last: Result<Option<CroppedFace>, PerceptionError>,
    confidences: Vec<f32>,
}

impl NullCropper {
    fn scripted(first: Result<Option<CroppedFace>, PerceptionError>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CropperState {
                script: VecDeque::new(),
                last: first,
                confidences: Vec::new(),
            })),
        }
    }

    /// Always finds a face.
    pub fn face() -> Self {
        Self::scripted(Ok(Some(Self::sample_face())))
    }

    /// Never finds a face.
    pub fn no_face() -> Self {
        Self::scripted(Ok(None))
    }

    /// Every call fails.
    pub fn failing(reason: &str) -> Self {
        Self::scripted(Err(PerceptionError(reason.to_string())))
    }

    /// Answer `found` in order, one per call.
    pub fn sequence(found: Vec<bool>) -> Self {
        let cropper = Self::face();
        {
            let mut state = cropper.inner.lock().unwrap();
            state.script = found
                .into_iter()
                .map(|f| Ok(f.then(Self::sample_face)))
                .collect();
        }
        cropper
    }

    pub fn sample_face() -> CroppedFace {
        CroppedFace {
            width: 112,
            height: 112,
            pixels: vec![0; 16],
        }
    }

    /// Detector confidence passed on each call.
    pub fn confidences(&self) -> Vec<f32> {
        self.inner.lock().unwrap().confidences.clone()
    }

    pub fn calls(&self) -> usize {
        self.inner.lock().unwrap().confidences.len()
    }
}

impl FaceCropper for NullCropper {
    fn crop(
        &self,
        _image: &CapturedImage,
        min_confidence: f32,
    ) -> Result<Option<CroppedFace>, PerceptionError> {
        let mut state = self.inner.lock().unwrap();
        state.confidences.push(min_confidence);
        if let Some(next) = state.script.pop_front() {
            state.last = next.clone();
            return next;
        }
        state.last.clone()
    }
}

/// An anti-spoof scorer returning one fixed score.
#[derive(Clone)]
pub struct NullAntiSpoof {
    score: Arc<Mutex<Result<f32, PerceptionError>>>,
    calls: Arc<Mutex<usize>>,
}

impl NullAntiSpoof {
    pub fn constant(score: f32) -> Self {
        Self {
            score: Arc::new(Mutex::new(Ok(score))),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            score: Arc::new(Mutex::new(Err(PerceptionError(reason.to_string())))),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn set_score(&self, score: f32) {
        *self.score.lock().unwrap() = Ok(score);
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl AntiSpoofScorer for NullAntiSpoof {
    fn score(&self, _face: &CroppedFace) -> Result<f32, PerceptionError> {
        *self.calls.lock().unwrap() += 1;
        self.score.lock().unwrap().clone()
    }
}

/// An embedding generator answering from a script; the last answer repeats.
#[derive(Clone)]
pub struct NullEmbedder {
    inner: Arc<Mutex<EmbedderState>>,
}

struct EmbedderState {
    script: VecDeque<Vec<f32>>,
    last: Result<Vec<f32>, PerceptionError>,
    calls: usize,
}

impl NullEmbedder {
    pub fn constant(values: Vec<f32>) -> Self {
        Self::sequence(vec![values])
    }

    /// Return `embeddings` in order, one per call.
    pub fn sequence(embeddings: Vec<Vec<f32>>) -> Self {
        let last = embeddings.last().cloned().unwrap_or_default();
        Self {
            inner: Arc::new(Mutex::new(EmbedderState {
                script: embeddings.into(),
                last: Ok(last),
                calls: 0,
            })),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            inner: Arc::new(Mutex::new(EmbedderState {
                script: VecDeque::new(),
                last: Err(PerceptionError(reason.to_string())),
                calls: 0,
            })),
        }
    }

    pub fn calls(&self) -> usize {
        self.inner.lock().unwrap().calls
    }
}

impl EmbeddingGenerator for NullEmbedder {
    fn embed(&self, _face: &CroppedFace) -> Result<Embedding, PerceptionError> {
        let mut state = self.inner.lock().unwrap();
        state.calls += 1;
        if let Some(next) = state.script.pop_front() {
            state.last = Ok(next);
        }
        let values = state.last.clone()?;
        Embedding::new(values).map_err(|e| PerceptionError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cropper_sequence_then_repeats_last() {
        let cropper = NullCropper::sequence(vec![false, true]);
        let image = CapturedImage::new(vec![1]);
        assert!(cropper.crop(&image, 0.5).unwrap().is_none());
        assert!(cropper.crop(&image, 0.5).unwrap().is_some());
        assert!(cropper.crop(&image, 0.6).unwrap().is_some());
        assert_eq!(cropper.confidences(), vec![0.5, 0.5, 0.6]);
    }

    #[test]
    fn embedder_sequence_then_repeats_last() {
        let embedder = NullEmbedder::sequence(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        let face = NullCropper::sample_face();
        assert_eq!(embedder.embed(&face).unwrap().as_slice(), &[1.0, 0.0]);
        assert_eq!(embedder.embed(&face).unwrap().as_slice(), &[0.0, 1.0]);
        assert_eq!(embedder.embed(&face).unwrap().as_slice(), &[0.0, 1.0]);
        assert_eq!(embedder.calls(), 3);
    }

    #[test]
    fn clones_share_state() {
        let spoof = NullAntiSpoof::constant(0.1);
        let clone = spoof.clone();
        clone.score(&NullCropper::sample_face()).unwrap();
        assert_eq!(spoof.calls(), 1);
    }
}
