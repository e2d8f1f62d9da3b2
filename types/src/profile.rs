//! Identity profiles and nearest-embedding search.

use crate::{Embedding, OperatingMode, SubjectKey, TypesError};

/// The enrolled embeddings of one subject for one operating mode.
///
/// Read-only for the lifetime of a session. All embeddings share one
/// dimension; this is checked on construction.
#[derive(Clone, Debug, PartialEq)]
pub struct IdentityProfile {
    subject: SubjectKey,
    mode: OperatingMode,
    embeddings: Vec<Embedding>,
}

/// Index and distance of the closest enrolled embedding.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Nearest {
    pub index: usize,
    pub distance: f32,
}

impl IdentityProfile {
    pub fn new(
        subject: SubjectKey,
        mode: OperatingMode,
        embeddings: Vec<Embedding>,
    ) -> Result<Self, TypesError> {
        if let Some(first) = embeddings.first() {
            let expected = first.dimension();
            if let Some(bad) = embeddings.iter().find(|e| e.dimension() != expected) {
                return Err(TypesError::DimensionMismatch {
                    expected,
                    actual: bad.dimension(),
                });
            }
        }
        Ok(Self {
            subject,
            mode,
            embeddings,
        })
    }

    pub fn subject(&self) -> &SubjectKey {
        &self.subject
    }

    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    pub fn embeddings(&self) -> &[Embedding] {
        &self.embeddings
    }

    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }

    /// Shared embedding dimension, or `None` for an empty profile.
    pub fn dimension(&self) -> Option<usize> {
        self.embeddings.first().map(Embedding::dimension)
    }

    /// Whether enough embeddings are enrolled to attempt offline verification.
    pub fn is_sufficient(&self, min_base_data: usize) -> bool {
        self.len() >= min_base_data
    }

    /// Cosine distance from `probe` to every enrolled embedding, in order.
    pub fn distances(&self, probe: &Embedding) -> Result<Vec<f32>, TypesError> {
        self.embeddings
            .iter()
            .map(|e| probe.cosine_distance(e))
            .collect()
    }

    /// Closest enrolled embedding to `probe`; `None` for an empty profile.
    pub fn nearest(&self, probe: &Embedding) -> Result<Option<Nearest>, TypesError> {
        Ok(nearest_distance(&self.distances(probe)?))
    }
}

/// Minimum of `distances`, ties resolved to the lowest index.
pub fn nearest_distance(distances: &[f32]) -> Option<Nearest> {
    let (first, rest) = distances.split_first()?;
    let mut best = Nearest {
        index: 0,
        distance: *first,
    };
    for (offset, &d) in rest.iter().enumerate() {
        if d < best.distance {
            best = Nearest {
                index: offset + 1,
                distance: d,
            };
        }
    }
    Some(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject() -> SubjectKey {
        SubjectKey::new("8495").unwrap()
    }

    fn emb(values: &[f32]) -> Embedding {
        Embedding::new(values.to_vec()).unwrap()
    }

    #[test]
    fn nearest_picks_minimum() {
        let n = nearest_distance(&[0.5, 0.2, 0.9]).unwrap();
        assert_eq!(n.index, 1);
        assert_eq!(n.distance, 0.2);
    }

    #[test]
    fn nearest_breaks_ties_by_lowest_index() {
        let n = nearest_distance(&[0.7, 0.1, 0.4, 0.1]).unwrap();
        assert_eq!(n.index, 1);
    }

    #[test]
    fn nearest_of_empty_is_none() {
        assert!(nearest_distance(&[]).is_none());
    }

    #[test]
    fn profile_rejects_mixed_dimensions() {
        let result = IdentityProfile::new(
            subject(),
            OperatingMode::OnSite,
            vec![emb(&[1.0, 0.0]), emb(&[1.0, 0.0, 0.0])],
        );
        assert_eq!(
            result,
            Err(TypesError::DimensionMismatch { expected: 2, actual: 3 })
        );
    }

    #[test]
    fn profile_nearest_uses_cosine_distance() {
        let profile = IdentityProfile::new(
            subject(),
            OperatingMode::Remote,
            vec![emb(&[0.0, 1.0]), emb(&[1.0, 0.1]), emb(&[-1.0, 0.0])],
        )
        .unwrap();
        let nearest = profile.nearest(&emb(&[1.0, 0.0])).unwrap().unwrap();
        assert_eq!(nearest.index, 1);
        assert!(nearest.distance < 0.01);
        assert_eq!(profile.dimension(), Some(2));
        assert!(profile.is_sufficient(3));
        assert!(!profile.is_sufficient(4));
    }

    #[test]
    fn probe_dimension_mismatch_is_reported() {
        let profile =
            IdentityProfile::new(subject(), OperatingMode::OnSite, vec![emb(&[1.0, 0.0])])
                .unwrap();
        assert!(profile.nearest(&emb(&[1.0])).is_err());
    }
}
