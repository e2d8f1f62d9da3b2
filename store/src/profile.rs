//! Profile store trait.

use crate::StoreError;
use veriface_types::{select_config, IdentityProfile, OperatingMode, SubjectKey};

/// Loads enrolled identity profiles.
///
/// A subject may be enrolled separately per operating mode; implementations
/// must return a profile whose `mode()` equals the requested mode.
pub trait ProfileStore {
    fn load(
        &self,
        subject: &SubjectKey,
        mode: OperatingMode,
    ) -> Result<IdentityProfile, StoreError>;
}

impl<S: ProfileStore + ?Sized> ProfileStore for &S {
    fn load(
        &self,
        subject: &SubjectKey,
        mode: OperatingMode,
    ) -> Result<IdentityProfile, StoreError> {
        (**self).load(subject, mode)
    }
}

/// Storage name of a subject's profile for `mode`, e.g. `8495-remote`.
pub fn profile_name(subject: &SubjectKey, mode: OperatingMode) -> String {
    format!("{}-{}", subject, select_config(mode).profile_suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_includes_mode_suffix() {
        let subject = SubjectKey::new("8495").unwrap();
        assert_eq!(profile_name(&subject, OperatingMode::OnSite), "8495-onsite");
        assert_eq!(profile_name(&subject, OperatingMode::Remote), "8495-remote");
    }
}
