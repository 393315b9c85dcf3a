//! Embedding vector operations.

use crate::{EmbeddingError, PlasticError};
use serde::{Deserialize, Serialize};

/// Embedding vector with a dynamic dimension count, tagged with the model
/// that produced it (spec §6 `embedding_model`; §3 invariant 4: the
/// embedding must match `embedding_dim` and correspond to the current
/// payload).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EmbeddingVector {
    pub data: Vec<f32>,
    pub model_id: String,
    pub dimensions: i32,
}

impl EmbeddingVector {
    pub fn new(data: Vec<f32>, model_id: impl Into<String>) -> Self {
        let dimensions = data.len() as i32;
        Self {
            data,
            model_id: model_id.into(),
            dimensions,
        }
    }

    /// Cosine similarity in `[-1, 1]`. Errors if the two vectors were
    /// produced by models with different dimensionality.
    pub fn cosine_similarity(&self, other: &EmbeddingVector) -> Result<f32, PlasticError> {
        if self.dimensions != other.dimensions {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimensions,
                got: other.dimensions,
            }
            .into());
        }

        let mut dot = 0.0f32;
        let mut norm_a = 0.0f32;
        let mut norm_b = 0.0f32;
        for (a, b) in self.data.iter().zip(other.data.iter()) {
            dot += a * b;
            norm_a += a * a;
            norm_b += b * b;
        }

        let norm_a = norm_a.sqrt();
        let norm_b = norm_b.sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return Ok(0.0);
        }
        Ok(dot / (norm_a * norm_b))
    }

    /// True if `dimensions` matches the actual vector length and is
    /// consistent with the configured `embedding_dim`.
    pub fn matches_dim(&self, expected_dim: i32) -> bool {
        self.dimensions == expected_dim && self.data.len() == expected_dim as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_have_similarity_one() {
        let v = EmbeddingVector::new(vec![1.0, 2.0, 3.0], "stub-v1");
        let sim = v.cosine_similarity(&v).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_have_similarity_zero() {
        let a = EmbeddingVector::new(vec![1.0, 0.0], "stub-v1");
        let b = EmbeddingVector::new(vec![0.0, 1.0], "stub-v1");
        let sim = a.cosine_similarity(&b).unwrap();
        assert!(sim.abs() < 1e-6);
    }

    #[test]
    fn dimension_mismatch_is_an_error() {
        let a = EmbeddingVector::new(vec![1.0, 0.0], "stub-v1");
        let b = EmbeddingVector::new(vec![1.0, 0.0, 0.0], "stub-v1");
        assert!(a.cosine_similarity(&b).is_err());
    }

    #[test]
    fn matches_dim_checks_configured_dimension() {
        let v = EmbeddingVector::new(vec![0.0; 384], "stub-v1");
        assert!(v.matches_dim(384));
        assert!(!v.matches_dim(768));
    }
}
