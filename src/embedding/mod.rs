//! Embedding vectors and the external embedder seam.
//!
//! This module provides the [`DocumentSet`] container that every downstream
//! stage (deduplication, clustering, selection) operates on, the cosine
//! similarity kernels shared across stages, the [`Embedder`] trait behind
//! which the external embedding model lives, and a deterministic
//! [`HashingEmbedder`] fallback for tests and offline runs.
//!
//! Vector positions in a `DocumentSet` are identities: every index emitted by
//! a downstream stage refers back to the construction order of the set.

pub mod embedder;
pub mod hashing;
pub mod similarity;

// Re-export main types for convenience
pub use embedder::Embedder;
pub use hashing::HashingEmbedder;
pub use similarity::{centroid, cosine_similarity, pairwise_cosine_similarity};

use ndarray::{Array1, Array2, ArrayView1};

use crate::error::EmbeddingError;

/// An ordered, immutable set of embedding vectors.
///
/// Row index is the canonical "original index" referenced by every
/// downstream artifact. All vectors share one dimension; construction
/// fails otherwise. Vector equality is never exact-compared, only measured
/// via cosine similarity.
#[derive(Debug, Clone)]
pub struct DocumentSet {
    matrix: Array2<f64>,
}

impl DocumentSet {
    /// Builds a document set from one vector per document.
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddingError::DimensionMismatch`] if the vectors disagree
    /// in dimension, or [`EmbeddingError::EmptyVector`] if vectors are
    /// zero-length.
    pub fn from_vectors(vectors: Vec<Array1<f64>>) -> Result<Self, EmbeddingError> {
        if vectors.is_empty() {
            return Ok(Self {
                matrix: Array2::zeros((0, 0)),
            });
        }

        let dim = vectors[0].len();
        if dim == 0 {
            return Err(EmbeddingError::EmptyVector);
        }
        for vector in &vectors {
            if vector.len() != dim {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: dim,
                    actual: vector.len(),
                });
            }
        }

        let mut matrix = Array2::zeros((vectors.len(), dim));
        for (i, vector) in vectors.iter().enumerate() {
            matrix.row_mut(i).assign(vector);
        }
        Ok(Self { matrix })
    }

    /// Wraps an already-assembled row matrix.
    pub(crate) fn from_matrix(matrix: Array2<f64>) -> Self {
        Self { matrix }
    }

    /// Number of documents in the set.
    pub fn len(&self) -> usize {
        self.matrix.nrows()
    }

    /// Returns `true` if the set holds no documents.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shared dimension of all vectors (0 for an empty set).
    pub fn dimension(&self) -> usize {
        self.matrix.ncols()
    }

    /// The vector at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn vector(&self, index: usize) -> ArrayView1<'_, f64> {
        self.matrix.row(index)
    }

    /// The full row matrix (documents × dimension).
    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    /// A new set holding the rows at `indices`, in the given order.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of range.
    pub fn subset(&self, indices: &[usize]) -> Self {
        let mut matrix = Array2::zeros((indices.len(), self.dimension()));
        for (row, &index) in indices.iter().enumerate() {
            matrix.row_mut(row).assign(&self.matrix.row(index));
        }
        Self { matrix }
    }
}
