//! Verification parameters and the per-mode threshold policy.

use crate::OperatingMode;
use serde::{Deserialize, Serialize};

/// Minimum number of enrolled embeddings for offline verification.
pub const MIN_BASE_DATA: usize = 3;

/// Consecutive distance failures tolerated before external fallback is required.
pub const RETRY_TIMEOUT: u32 = 3;

/// Delay between the post-challenge idle tick and the photo, letting the
/// subject re-center.
pub const DEFAULT_CAPTURE_DELAY_MS: u64 = 600;

/// Numeric policy applied to one session. Selected once from the mode.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Minimum face-detector confidence handed to the cropper.
    pub detector_confidence: f32,
    /// Spoof scores strictly above this are rejected.
    pub anti_spoof_threshold: f32,
    /// Minimum cosine distances at or below this are accepted.
    pub embedding_distance_threshold: f32,
}

impl ThresholdConfig {
    /// Supervised capture: stricter face presence, looser identity match.
    pub fn on_site() -> Self {
        Self {
            detector_confidence: 0.60,
            anti_spoof_threshold: 0.20,
            embedding_distance_threshold: 0.40,
        }
    }

    /// Unsupervised capture: looser face presence, stricter identity match.
    pub fn remote() -> Self {
        Self {
            detector_confidence: 0.55,
            anti_spoof_threshold: 0.20,
            embedding_distance_threshold: 0.30,
        }
    }

    pub fn accepts_distance(&self, min_distance: f32) -> bool {
        min_distance <= self.embedding_distance_threshold
    }

    pub fn is_spoof(&self, score: f32) -> bool {
        score > self.anti_spoof_threshold
    }
}

/// Threshold policy plus the profile-name suffix for a mode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModeConfig {
    pub thresholds: ThresholdConfig,
    pub profile_suffix: &'static str,
}

/// Select the session configuration for `mode`.
pub fn select_config(mode: OperatingMode) -> ModeConfig {
    match mode {
        OperatingMode::OnSite => ModeConfig {
            thresholds: ThresholdConfig::on_site(),
            profile_suffix: "onsite",
        },
        OperatingMode::Remote => ModeConfig {
            thresholds: ThresholdConfig::remote(),
            profile_suffix: "remote",
        },
    }
}

/// Session-independent limits of the decision pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationParams {
    /// Minimum enrolled embeddings before comparison is attempted.
    pub min_base_data: usize,
    /// Distance failures tolerated before `NeedsExternalFallback`.
    pub retry_timeout: u32,
}

impl Default for VerificationParams {
    fn default() -> Self {
        Self {
            min_base_data: MIN_BASE_DATA,
            retry_timeout: RETRY_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_site_is_stricter_on_detection_and_looser_on_distance() {
        let on_site = select_config(OperatingMode::OnSite).thresholds;
        let remote = select_config(OperatingMode::Remote).thresholds;
        assert!(on_site.detector_confidence > remote.detector_confidence);
        assert!(on_site.embedding_distance_threshold > remote.embedding_distance_threshold);
    }

    #[test]
    fn suffixes_differ_per_mode() {
        assert_eq!(select_config(OperatingMode::OnSite).profile_suffix, "onsite");
        assert_eq!(select_config(OperatingMode::Remote).profile_suffix, "remote");
    }

    #[test]
    fn threshold_boundaries() {
        let t = ThresholdConfig::remote();
        assert!(t.accepts_distance(0.30));
        assert!(!t.accepts_distance(0.3001));
        assert!(!t.is_spoof(0.20));
        assert!(t.is_spoof(0.2001));
    }
}
