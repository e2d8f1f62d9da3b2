//! Nullable collaborators for deterministic testing.
//!
//! Every external dependency of a session (camera, challenge detector,
//! presenter, perception models, profile store, prompt randomness) sits
//! behind a trait. The implementations here:
//! - return scripted values
//! - record every call for later inspection
//! - never touch hardware, models or the filesystem
//!
//! Each nullable is `Clone`; clones share state, so a test keeps one copy
//! for inspection and hands the other to the code under test.

pub mod devices;
pub mod perception;
pub mod random;
pub mod store;

pub use devices::{NullCamera, NullDetector, NullPresenter};
pub use perception::{NullAntiSpoof, NullCropper, NullEmbedder};
pub use random::NullMotionPicker;
pub use store::{profile_of, NullProfileStore};
