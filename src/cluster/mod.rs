//! Density-based topic clustering with automatic hyperparameter search.
//!
//! This module partitions a deduplicated [`DocumentSet`] into topic clusters:
//!
//! 1. **Density pass** - [`DensityClusterer`] runs one clustering pass with
//!    fixed hyperparameters (core distances, mutual reachability, minimum
//!    spanning tree, gap-threshold extraction).
//! 2. **Validity** - [`silhouette_score`] scores how well-separated and
//!    internally coherent a labeling is.
//! 3. **Reduction** - [`reduce_dimensionality`] optionally projects the set
//!    to a lower dimension before clustering; the reduction settings are
//!    themselves hyperparameters under search.
//! 4. **Search** - [`optimize_clustering`] grid-searches hyperparameters and
//!    keeps the best-scoring configuration.
//! 5. **Refinement** - [`recursive_cluster`] re-clusters the outlier bucket
//!    so few documents are wasted.
//!
//! [`DocumentSet`]: crate::embedding::DocumentSet

pub mod density;
pub mod reduce;
pub mod refine;
pub mod search;
pub mod validity;

// Re-export main types for convenience
pub use density::{ClusterExtraction, DensityClusterer};
pub use reduce::{reduce_dimensionality, ReductionParams};
pub use refine::{merge_refinement, recursive_cluster, subcluster_outliers, RefinerConfig};
pub use search::{optimize_clustering, SearchSpace};
pub use validity::silhouette_score;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Label assigned to documents that belong to no cluster.
pub const OUTLIER: i32 = -1;

/// Per-document cluster labels and membership strengths.
///
/// `labels[i]` is the cluster of document `i`, or [`OUTLIER`]. `strengths[i]`
/// is the confidence in [0, 1] that document `i` belongs to its assigned
/// cluster; outliers always carry 0.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    pub labels: Vec<i32>,
    pub strengths: Vec<f64>,
}

impl ClusterAssignment {
    /// An assignment placing all `n` documents in the outlier bucket.
    pub fn all_outliers(n: usize) -> Self {
        Self {
            labels: vec![OUTLIER; n],
            strengths: vec![0.0; n],
        }
    }

    /// Number of documents covered by this assignment.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns `true` if the assignment covers no documents.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of distinct non-outlier clusters.
    pub fn cluster_count(&self) -> usize {
        self.cluster_ids().len()
    }

    /// Sorted distinct non-outlier cluster labels.
    pub fn cluster_ids(&self) -> Vec<i32> {
        let mut ids: Vec<i32> = self
            .labels
            .iter()
            .copied()
            .filter(|&l| l != OUTLIER)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Indices of documents labeled [`OUTLIER`], in original order.
    pub fn outlier_indices(&self) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == OUTLIER)
            .map(|(i, _)| i)
            .collect()
    }

    /// Number of documents labeled [`OUTLIER`].
    pub fn outlier_count(&self) -> usize {
        self.labels.iter().filter(|&&l| l == OUTLIER).count()
    }

    /// Indices of documents assigned to `cluster`, in original order.
    pub fn members_of(&self, cluster: i32) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == cluster)
            .map(|(i, _)| i)
            .collect()
    }

    /// Largest assigned cluster label, if any cluster exists.
    pub fn max_label(&self) -> Option<i32> {
        self.labels.iter().copied().filter(|&l| l != OUTLIER).max()
    }
}

/// Hyperparameters that produced a clustering result.
///
/// Immutable once a run completes; stored alongside the result so every
/// published clustering is auditable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterParams {
    /// Minimum number of points required to form a cluster.
    pub min_cluster_size: usize,

    /// Number of neighbors defining a point's core distance.
    /// Must be <= min_cluster_size.
    pub min_samples: usize,

    /// Strategy for extracting clusters from the spanning tree.
    pub extraction: ClusterExtraction,

    /// Dimensionality reduction applied before clustering, if any.
    pub reduction: Option<ReductionParams>,
}

impl ClusterParams {
    /// Validates the parameter combination.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::InvalidParameter`] if:
    /// - min_cluster_size < 2
    /// - min_samples < 1
    /// - min_samples > min_cluster_size
    ///
    /// [`ClusterError::InvalidParameter`]: crate::error::ClusterError::InvalidParameter
    pub fn validate(&self) -> Result<(), crate::error::ClusterError> {
        use crate::error::ClusterError;

        if self.min_cluster_size < 2 {
            return Err(ClusterError::InvalidParameter(format!(
                "min_cluster_size must be >= 2, got {}",
                self.min_cluster_size
            )));
        }
        if self.min_samples < 1 {
            return Err(ClusterError::InvalidParameter(format!(
                "min_samples must be >= 1, got {}",
                self.min_samples
            )));
        }
        if self.min_samples > self.min_cluster_size {
            return Err(ClusterError::InvalidParameter(format!(
                "min_samples ({}) must be <= min_cluster_size ({})",
                self.min_samples, self.min_cluster_size
            )));
        }
        Ok(())
    }
}

/// Outcome of one clustering run: the assignment, the hyperparameters that
/// produced it, and an unsupervised quality score.
///
/// `quality` is `None` when the score is undefined (fewer than 2 clusters
/// over fewer than 2 points); an undefined score ranks below every defined
/// score during hyperparameter search.
#[derive(Debug, Clone)]
pub struct ClusterResult {
    pub assignment: ClusterAssignment,
    pub params: ClusterParams,
    pub quality: Option<f64>,
}

impl ClusterResult {
    /// Total-ordered score key for max-by-score folds; an undefined quality
    /// maps below every defined score.
    pub fn score_key(&self) -> OrderedFloat<f64> {
        OrderedFloat(self.quality.unwrap_or(f64::NEG_INFINITY))
    }
}
