//! topic-forge: document organization engine for genre-partitioned articles.
//!
//! This library takes batches of short documents that an external classifier
//! has already grouped by genre, removes near-duplicates, clusters the rest
//! into coherent sub-topics with an automatically tuned density clusterer,
//! re-clusters the outlier bucket so few documents are wasted, and picks a
//! diverse set of representatives per cluster for a downstream summarizer.

// Core modules
pub mod cluster;
pub mod dedup;
pub mod embedding;
pub mod error;
pub mod pipeline;
pub mod select;

// Re-export commonly used error types
pub use error::{ClusterError, DedupError, EmbeddingError, PipelineError, SelectionError};
