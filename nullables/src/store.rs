//! Nullable profile store: thread-safe in-memory profiles for testing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use veriface_store::{profile_name, ProfileStore, StoreError};
use veriface_types::{Embedding, IdentityProfile, OperatingMode, SubjectKey};

/// Build a profile from raw vectors. Panics on invalid input.
pub fn profile_of(subject: &str, mode: OperatingMode, embeddings: Vec<Vec<f32>>) -> IdentityProfile {
    let embeddings = embeddings
        .into_iter()
        .map(|v| Embedding::new(v).unwrap())
        .collect();
    IdentityProfile::new(SubjectKey::new(subject).unwrap(), mode, embeddings).unwrap()
}

/// An in-memory profile store keyed by subject and mode.
#[derive(Clone, Default)]
pub struct NullProfileStore {
    profiles: Arc<Mutex<HashMap<(SubjectKey, OperatingMode), IdentityProfile>>>,
    failure: Arc<Mutex<Option<String>>>,
    loads: Arc<Mutex<usize>>,
}

impl NullProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(profile: IdentityProfile) -> Self {
        let store = Self::new();
        store.insert(profile);
        store
    }

    pub fn insert(&self, profile: IdentityProfile) {
        self.profiles
            .lock()
            .unwrap()
            .insert((profile.subject().clone(), profile.mode()), profile);
    }

    /// Make every load fail with a backend error.
    pub fn fail_with(&self, reason: &str) {
        *self.failure.lock().unwrap() = Some(reason.to_string());
    }

    pub fn loads(&self) -> usize {
        *self.loads.lock().unwrap()
    }
}

impl ProfileStore for NullProfileStore {
    fn load(
        &self,
        subject: &SubjectKey,
        mode: OperatingMode,
    ) -> Result<IdentityProfile, StoreError> {
        *self.loads.lock().unwrap() += 1;
        if let Some(reason) = self.failure.lock().unwrap().as_ref() {
            return Err(StoreError::Backend(reason.clone()));
        }
        self.profiles
            .lock()
            .unwrap()
            .get(&(subject.clone(), mode))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(profile_name(subject, mode)))
    }
}
