//! Identity profile storage for face verification.
//!
//! The verification core depends only on the [`ProfileStore`] trait. Profiles
//! are enrolled elsewhere; this crate only loads them.

pub mod cache;
pub mod error;
pub mod json;
pub mod profile;

pub use cache::CachingProfileStore;
pub use error::StoreError;
pub use json::{EnrollmentDocument, JsonProfileStore, ProfileDocument};
pub use profile::{profile_name, ProfileStore};
