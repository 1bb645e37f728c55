//! Pipeline orchestration for document organization.
//!
//! This module wires the organization stages together and exposes the main
//! entry point, [`DocumentOrganizer`].
//!
//! # Pipeline Flow
//!
//! 1. **Embedding**: Every document text is embedded by the injected
//!    [`Embedder`](crate::embedding::Embedder).
//! 2. **Deduplication**: Near-duplicate documents are pruned, first
//!    occurrence wins.
//! 3. **Clustering**: The survivors are clustered with an automatic
//!    hyperparameter search.
//! 4. **Refinement**: The outlier bucket is re-clustered so few documents
//!    are wasted.
//! 5. **Selection**: Each cluster contributes a small, diverse set of
//!    representatives for the downstream summarizer.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use topic_forge::embedding::HashingEmbedder;
//! use topic_forge::pipeline::{DocumentOrganizer, OrganizerConfig};
//!
//! let embedder = Arc::new(HashingEmbedder::default());
//! let organizer = DocumentOrganizer::new(embedder, OrganizerConfig::default())?;
//!
//! let organized = organizer.organize(&batch).await?;
//! for cluster in &organized.clusters {
//!     println!(
//!         "cluster {}: {} members, representatives {:?}",
//!         cluster.cluster_id,
//!         cluster.member_indices.len(),
//!         cluster.representative_indices,
//!     );
//! }
//! ```
//!
//! Batches are independent units of work: [`DocumentOrganizer::organize_all`]
//! runs several concurrently with no shared mutable state.

pub mod config;
pub mod orchestrator;

// Re-export main types for convenience
pub use config::OrganizerConfig;
pub use orchestrator::{
    BatchWindow, DocumentOrganizer, GenreBatch, GenreDocument, OrganizedBatch, OrganizerStats,
    TopicCluster,
};
