//! Face verification decision pipeline.
//!
//! For one captured image:
//! 1. **Crop** the face (no face: reject, nothing else touched).
//! 2. **Profile gate**: too few enrolled embeddings means offline verification
//!    cannot be attempted.
//! 3. **Anti-spoof gate**, remote mode only.
//! 4. **Compare** the probe embedding against every enrolled embedding and take
//!    the minimum cosine distance.
//! 5. **Decide** against the mode's threshold and apply the retry policy.
//!
//! Perception models are external; they plug in through the capability traits
//! in [`perception`].

pub mod error;
pub mod outcomes;
pub mod perception;
pub mod pipeline;

pub use error::{PerceptionError, VerificationError};
pub use outcomes::{VerificationOutcome, VerificationReport};
pub use perception::{AntiSpoofScorer, CapturedImage, CroppedFace, EmbeddingGenerator, FaceCropper};
pub use pipeline::{decide, RetryCounter, VerificationContext, VerificationPipeline};
