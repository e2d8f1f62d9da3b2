//! Verification outcomes and the per-attempt report.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The decision for one captured image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerificationOutcome {
    Accepted,
    RejectedNoFace,
    /// Too few enrolled embeddings; needs an online enrollment check.
    RejectedInsufficientProfile,
    RejectedSpoof,
    RejectedDistance,
    /// Offline retries exhausted; needs an external verification path.
    NeedsExternalFallback,
}

impl VerificationOutcome {
    pub const ALL: [VerificationOutcome; 6] = [
        Self::Accepted,
        Self::RejectedNoFace,
        Self::RejectedInsufficientProfile,
        Self::RejectedSpoof,
        Self::RejectedDistance,
        Self::NeedsExternalFallback,
    ];

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Whether the outcome hands over to an external verification path.
    pub fn requires_external_verification(&self) -> bool {
        matches!(
            self,
            Self::RejectedInsufficientProfile | Self::NeedsExternalFallback
        )
    }

    /// Short human-readable reason, distinct per kind.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Accepted => "Face is verified",
            Self::RejectedNoFace => "No face detected",
            Self::RejectedInsufficientProfile => "Face hasn't been registered offline",
            Self::RejectedSpoof => "Face is spoof",
            Self::RejectedDistance => "Face is not verified",
            Self::NeedsExternalFallback => "Online face verification required",
        }
    }

    /// Stable identifier for logs and counters.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::RejectedNoFace => "rejected_no_face",
            Self::RejectedInsufficientProfile => "rejected_insufficient_profile",
            Self::RejectedSpoof => "rejected_spoof",
            Self::RejectedDistance => "rejected_distance",
            Self::NeedsExternalFallback => "needs_external_fallback",
        }
    }
}

impl fmt::Display for VerificationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome plus the measurements that led to it.
#[derive(Clone, Debug, PartialEq)]
pub struct VerificationReport {
    pub outcome: VerificationOutcome,
    /// Spoof score, when the anti-spoof gate ran.
    pub spoof_score: Option<f32>,
    /// Index of the closest enrolled embedding, when comparison ran.
    pub nearest_index: Option<usize>,
    /// Minimum cosine distance, when comparison ran.
    pub min_distance: Option<f32>,
    /// Retry counter after this attempt.
    pub retry_count: u32,
}

impl VerificationReport {
    pub(crate) fn early(outcome: VerificationOutcome, retry_count: u32) -> Self {
        Self {
            outcome,
            spoof_score: None,
            nearest_index: None,
            min_distance: None,
            retry_count,
        }
    }
}
