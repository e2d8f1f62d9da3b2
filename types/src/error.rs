//! Error type for constructing and comparing the fundamental types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TypesError {
    #[error("embedding must contain at least one value")]
    EmptyEmbedding,

    #[error("embedding value at index {index} is not finite")]
    NonFiniteValue { index: usize },

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid subject key: {0:?}")]
    InvalidSubjectKey(String),

    #[error("unknown operating mode: {0:?}")]
    UnknownMode(String),
}
