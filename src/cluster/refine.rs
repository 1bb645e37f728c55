//! Outlier bucket refinement.
//!
//! A first clustering pass routinely strands a sizeable outlier bucket.
//! This module re-runs the hyperparameter search on that bucket with a
//! narrower candidate range and a permissive extraction strategy, so a
//! modest bucket can still become one loosely-defined cluster instead of
//! being wasted. Refinement repeats on whatever remains unassigned, bounded
//! by an explicit state machine so it always terminates.

use serde::{Deserialize, Serialize};

use crate::cluster::density::ClusterExtraction;
use crate::cluster::search::{optimize_clustering, SearchSpace};
use crate::cluster::{ClusterAssignment, ClusterResult, OUTLIER};
use crate::embedding::DocumentSet;
use crate::error::ClusterError;

/// Candidate ranges and bounds for outlier refinement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinerConfig {
    /// Candidate minimum cluster sizes; narrower and smaller than the
    /// top-level search since outlier buckets are small.
    pub min_cluster_sizes: Vec<usize>,

    /// Candidate sizes when documents are short (see `short_doc_tokens`).
    pub short_doc_sizes: Vec<usize>,

    /// Median token count below which the bucket counts as short-document.
    pub short_doc_tokens: usize,

    /// Candidate core-distance neighbor counts.
    pub min_samples: Vec<usize>,

    /// Maximum number of refinement passes.
    pub max_passes: usize,

    /// Outlier count below which refinement is a no-op.
    pub min_outliers: usize,
}

impl Default for RefinerConfig {
    fn default() -> Self {
        Self {
            min_cluster_sizes: vec![2, 3, 4],
            short_doc_sizes: vec![2, 3],
            short_doc_tokens: 24,
            min_samples: vec![1, 2],
            max_passes: 3,
            min_outliers: 3,
        }
    }
}

/// Refinement progress states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefineState {
    /// No refinement pass has run yet.
    Initial,
    /// At least one pass produced new clusters; another may follow.
    Refining,
    /// No further pass can improve the assignment.
    Stable,
}

/// Re-clusters a set of outlier documents.
///
/// Runs the clustering search restricted to the outlier subset, with the
/// narrow candidate range from `config` and the
/// [`Permissive`](ClusterExtraction::Permissive) extraction strategy. The
/// optional per-document weight hint (a token/length count per document)
/// only shifts the candidate range downward for short documents; it never
/// changes the similarity metric.
///
/// The returned assignment is scoped to the subset's local indices; use
/// [`merge_refinement`] to map it back onto a parent assignment.
///
/// # Errors
///
/// Propagates [`ClusterError`] from the underlying search.
pub fn subcluster_outliers(
    outliers: &DocumentSet,
    weight_hint: Option<&[usize]>,
    config: &RefinerConfig,
) -> Result<ClusterResult, ClusterError> {
    let space = SearchSpace {
        min_cluster_sizes: candidate_sizes(config, weight_hint),
        min_samples: config.min_samples.clone(),
        extraction: ClusterExtraction::Permissive,
        // Outlier buckets are small; reduction never joins this search.
        reduce_above: usize::MAX,
        force_reduction: false,
        target_dims: Vec::new(),
        neighbor_counts: Vec::new(),
    };

    let result = optimize_clustering(outliers, &space)?;
    tracing::debug!(
        outliers = outliers.len(),
        recovered_clusters = result.assignment.cluster_count(),
        still_unassigned = result.assignment.outlier_count(),
        "Subclustered outlier bucket"
    );
    Ok(result)
}

/// Candidate minimum cluster sizes, lowered for short-document buckets.
fn candidate_sizes(config: &RefinerConfig, weight_hint: Option<&[usize]>) -> Vec<usize> {
    if let Some(weights) = weight_hint {
        if !weights.is_empty() {
            let mut sorted = weights.to_vec();
            sorted.sort_unstable();
            let median = sorted[sorted.len() / 2];
            if median < config.short_doc_tokens {
                return config.short_doc_sizes.clone();
            }
        }
    }
    config.min_cluster_sizes.clone()
}

/// Maps a local refinement assignment back onto a parent assignment.
///
/// `outlier_indices[i]` is the parent index of the subset's local index `i`.
/// Newly found clusters receive fresh labels above the parent's current
/// maximum; documents the refinement left unassigned stay outliers.
pub fn merge_refinement(
    parent: &mut ClusterAssignment,
    outlier_indices: &[usize],
    local: &ClusterAssignment,
) {
    let offset = parent.max_label().map_or(0, |max| max + 1);

    for (local_idx, &parent_idx) in outlier_indices.iter().enumerate() {
        let label = local.labels[local_idx];
        if label != OUTLIER {
            parent.labels[parent_idx] = offset + label;
            parent.strengths[parent_idx] = local.strengths[local_idx];
        }
    }
}

/// Repeatedly refines an assignment's outlier bucket until stable.
///
/// Modeled as a bounded-iteration state machine
/// (`Initial -> Refining -> Stable`): each pass re-clusters the current
/// outliers and merges any recovered clusters back; the loop reaches
/// `Stable` as soon as a pass yields nothing new (the assignment is returned
/// unchanged rather than looping) or the pass budget runs out.
///
/// # Errors
///
/// Returns [`ClusterError::DimensionMismatch`] when the assignment or the
/// weight hint does not cover the set, and propagates [`ClusterError`]
/// from the underlying search.
pub fn recursive_cluster(
    set: &DocumentSet,
    assignment: &ClusterAssignment,
    weight_hint: Option<&[usize]>,
    config: &RefinerConfig,
) -> Result<ClusterAssignment, ClusterError> {
    if assignment.len() != set.len() {
        return Err(ClusterError::DimensionMismatch {
            expected: set.len(),
            actual: assignment.len(),
        });
    }
    if let Some(weights) = weight_hint {
        if weights.len() != set.len() {
            return Err(ClusterError::DimensionMismatch {
                expected: set.len(),
                actual: weights.len(),
            });
        }
    }

    let mut merged = assignment.clone();
    let mut state = RefineState::Initial;
    let mut passes = 0usize;

    loop {
        state = match state {
            RefineState::Stable => break,
            RefineState::Initial | RefineState::Refining => {
                if passes >= config.max_passes {
                    RefineState::Stable
                } else {
                    let outlier_indices = merged.outlier_indices();
                    if outlier_indices.len() < config.min_outliers.max(2) {
                        RefineState::Stable
                    } else {
                        let subset = set.subset(&outlier_indices);
                        let subset_hint: Option<Vec<usize>> = weight_hint
                            .map(|weights| outlier_indices.iter().map(|&i| weights[i]).collect());

                        let result =
                            subcluster_outliers(&subset, subset_hint.as_deref(), config)?;
                        passes += 1;

                        if result.assignment.cluster_count() == 0 {
                            // The bucket cannot be split further; stop
                            // without touching the assignment.
                            RefineState::Stable
                        } else {
                            merge_refinement(&mut merged, &outlier_indices, &result.assignment);
                            RefineState::Refining
                        }
                    }
                }
            }
        };
    }

    Ok(merged)
}
