//! Fundamental types for on-device face verification.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! subject keys, operating modes, motion prompts, embeddings, identity profiles,
//! and the per-mode threshold policy.

pub mod embedding;
pub mod error;
pub mod mode;
pub mod motion;
pub mod params;
pub mod profile;
pub mod subject;

pub use embedding::Embedding;
pub use error::TypesError;
pub use mode::OperatingMode;
pub use motion::Motion;
pub use params::{
    select_config, ModeConfig, ThresholdConfig, VerificationParams, DEFAULT_CAPTURE_DELAY_MS,
    MIN_BASE_DATA, RETRY_TIMEOUT,
};
pub use profile::{nearest_distance, IdentityProfile, Nearest};
pub use subject::SubjectKey;
