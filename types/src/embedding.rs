//! Face embeddings and the cosine distance between them.

use crate::TypesError;
use serde::{Deserialize, Serialize};

/// A fixed-length feature vector describing one face.
///
/// Immutable once produced. Construction rejects empty vectors and
/// non-finite values so that distances are always well defined.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f32>", into = "Vec<f32>")]
pub struct Embedding(Vec<f32>);

impl Embedding {
    pub fn new(values: Vec<f32>) -> Result<Self, TypesError> {
        if values.is_empty() {
            return Err(TypesError::EmptyEmbedding);
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(TypesError::NonFiniteValue { index });
        }
        Ok(Self(values))
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Vector length (the model's embedding size).
    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    /// Cosine distance `1 - cos(self, other)`.
    ///
    /// Identical directions yield 0, opposite directions 2. A zero vector has
    /// no direction and is treated as orthogonal to everything (distance 1).
    pub fn cosine_distance(&self, other: &Embedding) -> Result<f32, TypesError> {
        if self.dimension() != other.dimension() {
            return Err(TypesError::DimensionMismatch {
                expected: self.dimension(),
                actual: other.dimension(),
            });
        }

        let mut dot = 0.0f64;
        let mut norm_a = 0.0f64;
        let mut norm_b = 0.0f64;
        for (&a, &b) in self.0.iter().zip(other.0.iter()) {
            let (a, b) = (a as f64, b as f64);
            dot += a * b;
            norm_a += a * a;
            norm_b += b * b;
        }

        if norm_a == 0.0 || norm_b == 0.0 {
            return Ok(1.0);
        }

        let similarity = dot / (norm_a.sqrt() * norm_b.sqrt());
        Ok((1.0 - similarity).clamp(0.0, 2.0) as f32)
    }
}

impl TryFrom<Vec<f32>> for Embedding {
    type Error = TypesError;

    fn try_from(values: Vec<f32>) -> Result<Self, Self::Error> {
        Self::new(values)
    }
}

impl From<Embedding> for Vec<f32> {
    fn from(e: Embedding) -> Self {
        e.0
    }
}
