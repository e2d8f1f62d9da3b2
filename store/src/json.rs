//! Directory of JSON profile documents, one file per subject and mode.

use crate::{profile_name, ProfileStore, StoreError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use veriface_types::{Embedding, IdentityProfile, OperatingMode, SubjectKey};

/// Numeric profile layout, as written by the profile cache.
///
/// The cache keeps a fixed-capacity ring of embeddings; `count` then says
/// how many leading entries are valid. Without it every entry is.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProfileDocument {
    pub embeddings: Vec<Vec<f32>>,
    #[serde(default, alias = "idx_read", skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl ProfileDocument {
    /// Validate the document into a profile for `subject` and `mode`.
    pub fn into_profile(
        self,
        name: &str,
        subject: &SubjectKey,
        mode: OperatingMode,
    ) -> Result<IdentityProfile, StoreError> {
        let malformed = |reason: String| StoreError::Malformed {
            name: name.to_string(),
            reason,
        };

        let mut rows = self.embeddings;
        if let Some(count) = self.count {
            if count > rows.len() {
                return Err(malformed(format!(
                    "count {count} exceeds {} stored embeddings",
                    rows.len()
                )));
            }
            rows.truncate(count);
        }

        let embeddings = rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                Embedding::new(row).map_err(|e| malformed(format!("embedding {i}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        IdentityProfile::new(subject.clone(), mode, embeddings)
            .map_err(|e| malformed(e.to_string()))
    }
}

/// Enrollment export: one string per embedding, a one-character tag
/// followed by `|`-separated values (`"e0.12|-0.4|..."`).
#[derive(Clone, Debug, Deserialize)]
pub struct EnrollmentDocument {
    pub embedding: Vec<String>,
}

impl EnrollmentDocument {
    fn parse_row(row: &str) -> Result<Vec<f32>, String> {
        let mut chars = row.chars();
        if chars.next().is_none() {
            return Err("empty entry".into());
        }
        let body = chars.as_str();
        let body = body.strip_suffix('|').unwrap_or(body);
        body.split('|')
            .map(|value| {
                value
                    .trim()
                    .parse::<f32>()
                    .map_err(|e| format!("value {value:?}: {e}"))
            })
            .collect()
    }

    pub fn into_document(self, name: &str) -> Result<ProfileDocument, StoreError> {
        let embeddings = self
            .embedding
            .iter()
            .enumerate()
            .map(|(i, row)| {
                Self::parse_row(row).map_err(|reason| StoreError::Malformed {
                    name: name.to_string(),
                    reason: format!("embedding {i}: {reason}"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ProfileDocument {
            embeddings,
            count: None,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredDocument {
    Profile(ProfileDocument),
    Enrollment(EnrollmentDocument),
}

/// Loads `<dir>/<subject>-<suffix>.json` in either stored layout.
pub struct JsonProfileStore {
    dir: PathBuf,
}

impl JsonProfileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of the document for `subject` in `mode`.
    pub fn path_for(&self, subject: &SubjectKey, mode: OperatingMode) -> PathBuf {
        self.dir.join(format!("{}.json", profile_name(subject, mode)))
    }
}

impl ProfileStore for JsonProfileStore {
    fn load(
        &self,
        subject: &SubjectKey,
        mode: OperatingMode,
    ) -> Result<IdentityProfile, StoreError> {
        let name = profile_name(subject, mode);
        let path = self.path_for(subject, mode);

        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(name));
            }
            Err(e) => return Err(StoreError::Io(e)),
        };

        let stored: StoredDocument =
            serde_json::from_str(&content).map_err(|e| StoreError::Malformed {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        let document = match stored {
            StoredDocument::Profile(document) => document,
            StoredDocument::Enrollment(export) => export.into_document(&name)?,
        };

        let profile = document.into_profile(&name, subject, mode)?;
        tracing::debug!(
            profile = %name,
            embeddings = profile.len(),
            dimension = ?profile.dimension(),
            "loaded profile"
        );
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject() -> SubjectKey {
        SubjectKey::new("8495").unwrap()
    }

    fn write(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn loads_profile_for_mode() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "8495-remote.json",
            r#"{"embeddings": [[1.0, 0.0], [0.0, 1.0], [0.5, 0.5]]}"#,
        );
        let store = JsonProfileStore::new(dir.path());
        let profile = store.load(&subject(), OperatingMode::Remote).unwrap();
        assert_eq!(profile.len(), 3);
        assert_eq!(profile.mode(), OperatingMode::Remote);
        assert_eq!(profile.dimension(), Some(2));
    }

    #[test]
    fn modes_are_stored_separately() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "8495-remote.json", r#"{"embeddings": [[1.0]]}"#);
        let store = JsonProfileStore::new(dir.path());
        assert!(matches!(
            store.load(&subject(), OperatingMode::OnSite),
            Err(StoreError::NotFound(name)) if name == "8495-onsite"
        ));
    }

    #[test]
    fn count_limits_valid_entries() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "8495-onsite.json",
            r#"{"embeddings": [[1.0, 0.0], [0.0, 1.0], [0.0, 0.0], [0.0, 0.0]], "idx_read": 2}"#,
        );
        let store = JsonProfileStore::new(dir.path());
        let profile = store.load(&subject(), OperatingMode::OnSite).unwrap();
        assert_eq!(profile.len(), 2);
    }

    #[test]
    fn reads_enrollment_exports() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "8495-onsite.json",
            r#"{"embedding": ["e1.0|0.0|0.0", "e0.0|1.0|0.0|", "e0.5|0.5|-0.25"]}"#,
        );
        let store = JsonProfileStore::new(dir.path());
        let profile = store.load(&subject(), OperatingMode::OnSite).unwrap();
        assert_eq!(profile.len(), 3);
        assert_eq!(profile.dimension(), Some(3));

        write(
            dir.path(),
            "8495-onsite.json",
            r#"{"embedding": ["e1.0|x|0.0"]}"#,
        );
        assert!(matches!(
            store.load(&subject(), OperatingMode::OnSite),
            Err(StoreError::Malformed { reason, .. }) if reason.starts_with("embedding 0")
        ));
    }

    #[test]
    fn rejects_malformed_documents() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonProfileStore::new(dir.path());

        write(dir.path(), "8495-onsite.json", "not json");
        assert!(matches!(
            store.load(&subject(), OperatingMode::OnSite),
            Err(StoreError::Malformed { .. })
        ));

        write(
            dir.path(),
            "8495-onsite.json",
            r#"{"embeddings": [[1.0, 0.0], [1.0]]}"#,
        );
        assert!(matches!(
            store.load(&subject(), OperatingMode::OnSite),
            Err(StoreError::Malformed { .. })
        ));

        write(
            dir.path(),
            "8495-onsite.json",
            r#"{"embeddings": [[1.0]], "count": 5}"#,
        );
        assert!(matches!(
            store.load(&subject(), OperatingMode::OnSite),
            Err(StoreError::Malformed { .. })
        ));
    }
}
