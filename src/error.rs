//! Error types for topic-forge operations.
//!
//! Defines error types for all major subsystems:
//! - Embedding (external embedder contract violations)
//! - Deduplication (threshold validation)
//! - Clustering (parameter validation, numerical failures, exhausted searches)
//! - Representative selection
//! - Pipeline orchestration

use thiserror::Error;

/// Errors produced by an [`Embedder`](crate::embedding::Embedder) or by
/// assembling its output into a document set.
///
/// These are propagated to the caller unchanged; this crate never retries
/// a failed embedding call.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Failed to embed text at index {index}: {reason}")]
    EmbedFailed { index: usize, reason: String },

    #[error("Embedder returned {actual} vectors for {expected} texts")]
    BatchSizeMismatch { expected: usize, actual: usize },

    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedder produced an empty vector")]
    EmptyVector,
}

/// Errors that can occur during near-duplicate pruning.
#[derive(Debug, Error)]
pub enum DedupError {
    #[error("Similarity threshold must be in (0.0, 1.0], got {0}")]
    InvalidThreshold(f64),
}

/// Errors that can occur during clustering.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error(
        "min_cluster_size ({min_cluster_size}) must be smaller than the document count ({document_count})"
    )]
    ClusterSizeExceedsInput {
        min_cluster_size: usize,
        document_count: usize,
    },

    /// The density-clustering primitive hit a numerical failure for one
    /// candidate configuration. Recovered inside the hyperparameter search by
    /// scoring that candidate as worst-possible.
    #[error("Numerical failure during clustering: {0}")]
    Computation(String),

    /// Every attempted candidate in a hyperparameter search failed.
    #[error("All {attempted} attempted clustering candidates failed; last error: {last}")]
    SearchExhausted { attempted: usize, last: String },
}

/// Errors that can occur during representative selection.
#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("lambda must be in [0.0, 1.0], got {0}")]
    InvalidLambda(f64),

    #[error("Query vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Unified error surface for one (genre, window) pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Deduplication failed: {0}")]
    Dedup(#[from] DedupError),

    #[error("Clustering failed: {0}")]
    Cluster(#[from] ClusterError),

    #[error("Selection failed: {0}")]
    Selection(#[from] SelectionError),
}
