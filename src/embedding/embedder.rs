//! The external embedding capability.
//!
//! Embedding models live outside this crate; callers inject an [`Embedder`]
//! implementation into the pipeline. Nothing here consults ambient global
//! state, so the whole pipeline is testable with fakes.

use async_trait::async_trait;
use ndarray::Array1;

use crate::error::EmbeddingError;

/// A service that turns text into fixed-dimension embedding vectors.
///
/// Contract: `embed` returns exactly one vector per input text, in input
/// order, all of dimension [`dimension`](Embedder::dimension). Batch size
/// limits and the choice of model are the implementation's concern.
///
/// Implementations must fail with [`EmbeddingError::EmbedFailed`] if any
/// text cannot be embedded; this crate propagates that error unchanged and
/// never retries.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds a batch of texts.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Array1<f64>>, EmbeddingError>;

    /// Dimension of every vector this embedder produces.
    fn dimension(&self) -> usize;
}
