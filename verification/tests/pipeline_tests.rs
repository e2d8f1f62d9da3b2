use proptest::prelude::*;

use veriface_nullables::{profile_of, NullAntiSpoof, NullCropper, NullEmbedder};
use veriface_types::{select_config, IdentityProfile, OperatingMode, ThresholdConfig, VerificationParams};
use veriface_verification::{
    decide, CapturedImage, RetryCounter, VerificationContext, VerificationOutcome,
    VerificationPipeline,
};

fn basis_profile(mode: OperatingMode) -> IdentityProfile {
    profile_of(
        "8495",
        mode,
        vec![
            vec![1.0, 0.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0, 0.0],
            vec![0.0, 0.0, 1.0, 0.0],
        ],
    )
}

fn pipeline(cropper: &NullCropper, spoof: &NullAntiSpoof, embedder: &NullEmbedder) -> VerificationPipeline {
    VerificationPipeline::new(
        Box::new(cropper.clone()),
        Box::new(spoof.clone()),
        Box::new(embedder.clone()),
        VerificationParams::default(),
    )
}

fn image() -> CapturedImage {
    CapturedImage::new(vec![1, 2, 3])
}

#[test]
fn remote_match_is_accepted() {
    let cropper = NullCropper::face();
    let spoof = NullAntiSpoof::constant(0.05);
    let embedder = NullEmbedder::constant(vec![0.0, 2.0, 0.0, 0.0]);
    let profile = basis_profile(OperatingMode::Remote);
    let thresholds = select_config(OperatingMode::Remote).thresholds;
    let ctx = VerificationContext {
        mode: OperatingMode::Remote,
        profile: &profile,
        thresholds: &thresholds,
    };
    let mut retries = RetryCounter::new();

    let report = pipeline(&cropper, &spoof, &embedder)
        .run(&image(), &ctx, &mut retries)
        .unwrap();
    assert_eq!(report.outcome, VerificationOutcome::Accepted);
    assert_eq!(report.nearest_index, Some(1));
    assert!(report.min_distance.unwrap() < 1e-6);
    assert_eq!(report.spoof_score, Some(0.05));
    assert_eq!(cropper.confidences(), vec![thresholds.detector_confidence]);
    assert_eq!(spoof.calls(), 1);
}

#[test]
fn remote_spoof_skips_embedding() {
    let cropper = NullCropper::face();
    let spoof = NullAntiSpoof::constant(0.9);
    let embedder = NullEmbedder::constant(vec![1.0, 0.0, 0.0, 0.0]);
    let profile = basis_profile(OperatingMode::Remote);
    let thresholds = ThresholdConfig::remote();
    let ctx = VerificationContext {
        mode: OperatingMode::Remote,
        profile: &profile,
        thresholds: &thresholds,
    };
    let mut retries = RetryCounter::new();
    retries.increment();

    let report = pipeline(&cropper, &spoof, &embedder)
        .run(&image(), &ctx, &mut retries)
        .unwrap();
    assert_eq!(report.outcome, VerificationOutcome::RejectedSpoof);
    assert_eq!(report.spoof_score, Some(0.9));
    assert_eq!(embedder.calls(), 0);
    assert_eq!(retries.get(), 1);
}

#[test]
fn on_site_never_scores_spoof() {
    let cropper = NullCropper::face();
    let spoof = NullAntiSpoof::constant(0.99);
    let embedder = NullEmbedder::constant(vec![1.0, 0.0, 0.0, 0.0]);
    let profile = basis_profile(OperatingMode::OnSite);
    let thresholds = ThresholdConfig::on_site();
    let ctx = VerificationContext {
        mode: OperatingMode::OnSite,
        profile: &profile,
        thresholds: &thresholds,
    };

    let report = pipeline(&cropper, &spoof, &embedder)
        .run(&image(), &ctx, &mut RetryCounter::new())
        .unwrap();
    assert_eq!(report.outcome, VerificationOutcome::Accepted);
    assert_eq!(spoof.calls(), 0);
    assert_eq!(report.spoof_score, None);
    assert_eq!(cropper.confidences(), vec![0.60]);
}

#[test]
fn small_profile_is_rejected_before_comparison() {
    let cropper = NullCropper::face();
    let spoof = NullAntiSpoof::constant(0.0);
    let embedder = NullEmbedder::constant(vec![1.0, 0.0]);
    let profile = profile_of("8495", OperatingMode::Remote, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    let thresholds = ThresholdConfig::remote();
    let ctx = VerificationContext {
        mode: OperatingMode::Remote,
        profile: &profile,
        thresholds: &thresholds,
    };

    let report = pipeline(&cropper, &spoof, &embedder)
        .run(&image(), &ctx, &mut RetryCounter::new())
        .unwrap();
    assert_eq!(report.outcome, VerificationOutcome::RejectedInsufficientProfile);
    assert_eq!(cropper.calls(), 1);
    assert_eq!(spoof.calls(), 0);
    assert_eq!(embedder.calls(), 0);
}

#[test]
fn repeated_mismatch_falls_back_after_retry_timeout() {
    let cropper = NullCropper::face();
    let spoof = NullAntiSpoof::constant(0.0);
    let embedder = NullEmbedder::constant(vec![0.0, 0.0, 0.0, 1.0]);
    let profile = basis_profile(OperatingMode::Remote);
    let thresholds = ThresholdConfig::remote();
    let ctx = VerificationContext {
        mode: OperatingMode::Remote,
        profile: &profile,
        thresholds: &thresholds,
    };
    let pipeline = pipeline(&cropper, &spoof, &embedder);
    let mut retries = RetryCounter::new();

    let outcomes: Vec<_> = (0..5)
        .map(|_| pipeline.run(&image(), &ctx, &mut retries).unwrap().outcome)
        .collect();
    assert_eq!(
        outcomes,
        vec![
            VerificationOutcome::RejectedDistance,
            VerificationOutcome::RejectedDistance,
            VerificationOutcome::RejectedDistance,
            VerificationOutcome::NeedsExternalFallback,
            VerificationOutcome::NeedsExternalFallback,
        ]
    );
    assert_eq!(retries.get(), 5);
}

#[test]
fn no_face_in_sequence_leaves_counter() {
    let cropper = NullCropper::sequence(vec![false, true]);
    let spoof = NullAntiSpoof::constant(0.0);
    let embedder = NullEmbedder::constant(vec![0.0, 0.0, 0.0, 1.0]);
    let profile = basis_profile(OperatingMode::Remote);
    let thresholds = ThresholdConfig::remote();
    let ctx = VerificationContext {
        mode: OperatingMode::Remote,
        profile: &profile,
        thresholds: &thresholds,
    };
    let pipeline = pipeline(&cropper, &spoof, &embedder);
    let mut retries = RetryCounter::new();

    let first = pipeline.run(&image(), &ctx, &mut retries).unwrap();
    assert_eq!(first.outcome, VerificationOutcome::RejectedNoFace);
    assert_eq!(retries.get(), 0);
    let second = pipeline.run(&image(), &ctx, &mut retries).unwrap();
    assert_eq!(second.outcome, VerificationOutcome::RejectedDistance);
    assert_eq!(retries.get(), 1);
}

#[test]
fn embedder_failure_is_an_error() {
    let cropper = NullCropper::face();
    let spoof = NullAntiSpoof::constant(0.0);
    let embedder = NullEmbedder::failing("model not loaded");
    let profile = basis_profile(OperatingMode::Remote);
    let thresholds = ThresholdConfig::remote();
    let ctx = VerificationContext {
        mode: OperatingMode::Remote,
        profile: &profile,
        thresholds: &thresholds,
    };
    let mut retries = RetryCounter::new();

    assert!(pipeline(&cropper, &spoof, &embedder)
        .run(&image(), &ctx, &mut retries)
        .is_err());
    assert_eq!(retries.get(), 0);
}

proptest! {
    /// A smaller distance is never rejected where a larger one is accepted.
    #[test]
    fn acceptance_is_monotonic(a in 0.0f32..2.0, b in 0.0f32..2.0) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let thresholds = ThresholdConfig::remote();
        let params = VerificationParams::default();
        let high_outcome = decide(high, &thresholds, &params, &mut RetryCounter::new());
        let low_outcome = decide(low, &thresholds, &params, &mut RetryCounter::new());
        if high_outcome.is_accepted() {
            prop_assert!(low_outcome.is_accepted());
        }
    }

    /// Acceptance leaves the counter alone; every rejection adds exactly one.
    #[test]
    fn counter_tracks_rejections(
        start in 0u32..10,
        distance in 0.0f32..2.0,
    ) {
        let thresholds = ThresholdConfig::on_site();
        let params = VerificationParams::default();
        let mut retries = RetryCounter::new();
        for _ in 0..start {
            retries.increment();
        }
        let outcome = decide(distance, &thresholds, &params, &mut retries);
        if outcome.is_accepted() {
            prop_assert_eq!(retries.get(), start);
        } else {
            prop_assert_eq!(retries.get(), start + 1);
            prop_assert_eq!(
                outcome == VerificationOutcome::NeedsExternalFallback,
                start + 1 > params.retry_timeout
            );
        }
    }
}
