//! The crop -> anti-spoof -> compare -> decide pipeline.

use crate::outcomes::{VerificationOutcome, VerificationReport};
use crate::perception::{AntiSpoofScorer, CapturedImage, EmbeddingGenerator, FaceCropper};
use crate::VerificationError;
use veriface_types::{IdentityProfile, OperatingMode, ThresholdConfig, VerificationParams};

/// Consecutive offline distance failures within a session.
///
/// Only distance failures count; detection, spoof and profile rejections
/// leave it untouched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RetryCounter(u32);

impl RetryCounter {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    /// Record one distance failure and return the new count.
    pub fn increment(&mut self) -> u32 {
        self.0 = self.0.saturating_add(1);
        self.0
    }

    pub fn reset(&mut self) {
        self.0 = 0;
    }

    /// Whether more than `timeout` failures have been recorded.
    pub fn exceeded(&self, timeout: u32) -> bool {
        self.0 > timeout
    }
}

/// Read-only inputs of one pipeline run, fixed for the session.
#[derive(Clone, Copy, Debug)]
pub struct VerificationContext<'a> {
    pub mode: OperatingMode,
    pub profile: &'a IdentityProfile,
    pub thresholds: &'a ThresholdConfig,
}

/// Threshold decision on a minimum distance, applying the retry policy.
///
/// Acceptance does not reset `retries`; callers own that policy.
pub fn decide(
    min_distance: f32,
    thresholds: &ThresholdConfig,
    params: &VerificationParams,
    retries: &mut RetryCounter,
) -> VerificationOutcome {
    if thresholds.accepts_distance(min_distance) {
        return VerificationOutcome::Accepted;
    }
    retries.increment();
    if retries.exceeded(params.retry_timeout) {
        VerificationOutcome::NeedsExternalFallback
    } else {
        VerificationOutcome::RejectedDistance
    }
}

/// Runs one captured image through the perception models and the decision rules.
pub struct VerificationPipeline {
    cropper: Box<dyn FaceCropper>,
    anti_spoof: Box<dyn AntiSpoofScorer>,
    embedder: Box<dyn EmbeddingGenerator>,
    params: VerificationParams,
}

impl VerificationPipeline {
    pub fn new(
        cropper: Box<dyn FaceCropper>,
        anti_spoof: Box<dyn AntiSpoofScorer>,
        embedder: Box<dyn EmbeddingGenerator>,
        params: VerificationParams,
    ) -> Self {
        Self {
            cropper,
            anti_spoof,
            embedder,
            params,
        }
    }

    pub fn params(&self) -> &VerificationParams {
        &self.params
    }

    /// Verify `image` against the session's profile.
    ///
    /// Returns `Err` only for collaborator failures; `retries` is unchanged
    /// in that case. The profile is never modified.
    pub fn run(
        &self,
        image: &CapturedImage,
        ctx: &VerificationContext<'_>,
        retries: &mut RetryCounter,
    ) -> Result<VerificationReport, VerificationError> {
        let face = match self
            .cropper
            .crop(image, ctx.thresholds.detector_confidence)
            .map_err(VerificationError::Cropper)?
        {
            Some(face) => face,
            None => {
                tracing::info!(subject = %ctx.profile.subject(), "no face detected");
                return Ok(VerificationReport::early(
                    VerificationOutcome::RejectedNoFace,
                    retries.get(),
                ));
            }
        };

        if !ctx.profile.is_sufficient(self.params.min_base_data) {
            tracing::warn!(
                subject = %ctx.profile.subject(),
                enrolled = ctx.profile.len(),
                required = self.params.min_base_data,
                "profile has too few embeddings for offline verification"
            );
            return Ok(VerificationReport::early(
                VerificationOutcome::RejectedInsufficientProfile,
                retries.get(),
            ));
        }

        let mut spoof_score = None;
        if ctx.mode.requires_anti_spoof() {
            let score = self
                .anti_spoof
                .score(&face)
                .map_err(VerificationError::AntiSpoof)?;
            if !score.is_finite() {
                return Err(VerificationError::InvalidSpoofScore(score));
            }
            tracing::debug!(score, threshold = ctx.thresholds.anti_spoof_threshold, "anti-spoof score");
            if ctx.thresholds.is_spoof(score) {
                tracing::info!(subject = %ctx.profile.subject(), score, "spoof detected");
                return Ok(VerificationReport {
                    spoof_score: Some(score),
                    ..VerificationReport::early(VerificationOutcome::RejectedSpoof, retries.get())
                });
            }
            spoof_score = Some(score);
        }

        let probe = self
            .embedder
            .embed(&face)
            .map_err(VerificationError::Embedder)?;
        let distances = ctx.profile.distances(&probe)?;
        for (index, distance) in distances.iter().enumerate() {
            tracing::debug!(index, distance, "embedding distance");
        }
        // The sufficiency gate guarantees at least one distance unless min_base_data is 0.
        let Some(nearest) = veriface_types::nearest_distance(&distances) else {
            return Ok(VerificationReport {
                spoof_score,
                ..VerificationReport::early(
                    VerificationOutcome::RejectedInsufficientProfile,
                    retries.get(),
                )
            });
        };

        let outcome = decide(nearest.distance, ctx.thresholds, &self.params, retries);
        tracing::info!(
            subject = %ctx.profile.subject(),
            mode = %ctx.mode,
            min_distance = nearest.distance,
            nearest_index = nearest.index,
            retry_count = retries.get(),
            %outcome,
            "verification decided"
        );

        Ok(VerificationReport {
            outcome,
            spoof_score,
            nearest_index: Some(nearest.index),
            min_distance: Some(nearest.distance),
            retry_count: retries.get(),
        })
    }
}
