//! Memoizing wrapper around another profile store.

use crate::{ProfileStore, StoreError};
use std::collections::HashMap;
use std::sync::Mutex;
use veriface_types::{IdentityProfile, OperatingMode, SubjectKey};

/// Caches successful loads by subject and mode. Failures are not cached.
pub struct CachingProfileStore<S> {
    inner: S,
    cache: Mutex<HashMap<(SubjectKey, OperatingMode), IdentityProfile>>,
}

impl<S: ProfileStore> CachingProfileStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Drop the cached profile so the next load hits the inner store.
    pub fn invalidate(&self, subject: &SubjectKey, mode: OperatingMode) {
        self.lock().remove(&(subject.clone(), mode));
    }

    pub fn cached_len(&self) -> usize {
        self.lock().len()
    }

    fn lock(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<(SubjectKey, OperatingMode), IdentityProfile>> {
        // A poisoned map still holds only complete, validated profiles.
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<S: ProfileStore> ProfileStore for CachingProfileStore<S> {
    fn load(
        &self,
        subject: &SubjectKey,
        mode: OperatingMode,
    ) -> Result<IdentityProfile, StoreError> {
        let key = (subject.clone(), mode);
        if let Some(profile) = self.lock().get(&key) {
            tracing::trace!(%subject, %mode, "profile cache hit");
            return Ok(profile.clone());
        }

        let profile = self.inner.load(subject, mode)?;
        self.lock().insert(key, profile.clone());
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use veriface_types::Embedding;

    struct CountingStore {
        loads: Cell<u32>,
        fail: bool,
    }

    impl ProfileStore for CountingStore {
        fn load(
            &self,
            subject: &SubjectKey,
            mode: OperatingMode,
        ) -> Result<IdentityProfile, StoreError> {
            self.loads.set(self.loads.get() + 1);
            if self.fail {
                return Err(StoreError::NotFound(subject.to_string()));
            }
            let e = Embedding::new(vec![1.0, 0.0]).unwrap();
            Ok(IdentityProfile::new(subject.clone(), mode, vec![e]).unwrap())
        }
    }

    #[test]
    fn second_load_is_served_from_cache() {
        let store = CachingProfileStore::new(CountingStore {
            loads: Cell::new(0),
            fail: false,
        });
        let subject = SubjectKey::new("8495").unwrap();
        store.load(&subject, OperatingMode::Remote).unwrap();
        store.load(&subject, OperatingMode::Remote).unwrap();
        assert_eq!(store.inner.loads.get(), 1);

        store.load(&subject, OperatingMode::OnSite).unwrap();
        assert_eq!(store.inner.loads.get(), 2);
        assert_eq!(store.cached_len(), 2);

        store.invalidate(&subject, OperatingMode::Remote);
        store.load(&subject, OperatingMode::Remote).unwrap();
        assert_eq!(store.inner.loads.get(), 3);
    }

    #[test]
    fn failures_are_not_cached() {
        let store = CachingProfileStore::new(CountingStore {
            loads: Cell::new(0),
            fail: true,
        });
        let subject = SubjectKey::new("8495").unwrap();
        assert!(store.load(&subject, OperatingMode::Remote).is_err());
        assert!(store.load(&subject, OperatingMode::Remote).is_err());
        assert_eq!(store.inner.loads.get(), 2);
        assert_eq!(store.cached_len(), 0);
    }
}
