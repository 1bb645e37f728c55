//! Hyperparameter search for density clustering.
//!
//! Evaluates a bounded grid of `(min_cluster_size, min_samples)` pairs — and,
//! for large batches, dimensionality-reduction settings — keeping the
//! configuration with the best validity score. Candidate evaluation is a pure
//! function of (vectors, params) and the best pick is an associative,
//! commutative max-by-score fold, so any evaluation order produces the same
//! winner.

use serde::{Deserialize, Serialize};

use crate::cluster::density::{ClusterExtraction, DensityClusterer};
use crate::cluster::reduce::{reduce_dimensionality, ReductionParams, PROJECTION_SEED};
use crate::cluster::validity::silhouette_score;
use crate::cluster::{ClusterAssignment, ClusterParams, ClusterResult};
use crate::embedding::DocumentSet;
use crate::error::ClusterError;

/// Bounded candidate grid for [`optimize_clustering`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSpace {
    /// Candidate minimum cluster sizes. Candidates not below the document
    /// count are skipped rather than attempted.
    pub min_cluster_sizes: Vec<usize>,

    /// Candidate core-distance neighbor counts. Values above the candidate
    /// min_cluster_size are skipped.
    pub min_samples: Vec<usize>,

    /// Extraction strategy used by every candidate.
    pub extraction: ClusterExtraction,

    /// Document count above which reduction settings join the search.
    pub reduce_above: usize,

    /// Search reduction settings regardless of document count.
    pub force_reduction: bool,

    /// Candidate reduction output dimensionalities. Values not below the
    /// input dimension are skipped.
    pub target_dims: Vec<usize>,

    /// Candidate neighborhood sizes for reduction smoothing.
    pub neighbor_counts: Vec<usize>,
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self {
            min_cluster_sizes: vec![2, 3, 5, 8, 12],
            min_samples: vec![1, 2, 3],
            extraction: ClusterExtraction::Balanced,
            reduce_above: 48,
            force_reduction: false,
            target_dims: vec![8, 16],
            neighbor_counts: vec![5, 15],
        }
    }
}

impl SearchSpace {
    /// Validates that the grid is non-degenerate.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::InvalidParameter`] when either parameter list
    /// is empty; an empty grid would silently produce an all-outlier result.
    pub fn validate(&self) -> Result<(), ClusterError> {
        if self.min_cluster_sizes.is_empty() {
            return Err(ClusterError::InvalidParameter(
                "search space has no min_cluster_size candidates".to_string(),
            ));
        }
        if self.min_samples.is_empty() {
            return Err(ClusterError::InvalidParameter(
                "search space has no min_samples candidates".to_string(),
            ));
        }
        Ok(())
    }
}

/// Grid-searches clustering hyperparameters and returns the best result.
///
/// Every viable candidate runs one clustering pass; the configuration with
/// the highest validity score wins. Ties break toward fewer outliers, then
/// toward the first-encountered candidate in the fixed iteration order, so
/// the search is deterministic.
///
/// Reduction settings join the grid when the batch exceeds
/// `space.reduce_above` documents (or when forced); the no-reduction
/// candidate always stays in the running, and each distinct reduction
/// setting is computed once and shared only across its own parameter grid.
///
/// Failure semantics:
/// - A candidate that fails numerically scores worst-possible and the search
///   continues.
/// - If every *attempted* candidate fails, the whole search fails with
///   [`ClusterError::SearchExhausted`].
/// - If no candidate is attemptable (the batch is below every viable floor),
///   the result is an all-outlier assignment with an undefined score —
///   reported honestly rather than fabricating a clustering.
///
/// # Errors
///
/// [`ClusterError::InvalidParameter`] for a degenerate search space,
/// [`ClusterError::SearchExhausted`] when all attempted candidates fail.
pub fn optimize_clustering(
    set: &DocumentSet,
    space: &SearchSpace,
) -> Result<ClusterResult, ClusterError> {
    space.validate()?;

    let n = set.len();
    let reductions = reduction_candidates(set, space);

    let mut attempted = 0usize;
    let mut failed = 0usize;
    let mut last_error = String::new();
    let mut best: Option<ClusterResult> = None;

    for reduction in &reductions {
        // One working set per distinct reduction setting.
        let working = match reduction {
            Some(params) => match reduce_dimensionality(set, params, PROJECTION_SEED) {
                Ok(reduced) => reduced,
                Err(error) => {
                    // The reduction itself failing fails every candidate
                    // that would have used it.
                    let cells = grid_size(space, n);
                    attempted += cells;
                    failed += cells;
                    last_error = error.to_string();
                    tracing::debug!(?reduction, error = %last_error, "Reduction candidate failed");
                    continue;
                }
            },
            None => set.clone(),
        };

        for &min_cluster_size in &space.min_cluster_sizes {
            // Clamp: a candidate must leave at least one point outside its
            // own minimum, or every point degenerates to an outlier.
            if min_cluster_size < 2 || min_cluster_size >= n {
                continue;
            }
            for &min_samples in &space.min_samples {
                if min_samples < 1 || min_samples > min_cluster_size {
                    continue;
                }

                let params = ClusterParams {
                    min_cluster_size,
                    min_samples,
                    extraction: space.extraction,
                    reduction: *reduction,
                };
                attempted += 1;

                match evaluate_candidate(set, &working, params) {
                    Ok(candidate) => {
                        tracing::debug!(
                            min_cluster_size,
                            min_samples,
                            clusters = candidate.assignment.cluster_count(),
                            outliers = candidate.assignment.outlier_count(),
                            quality = ?candidate.quality,
                            "Evaluated clustering candidate"
                        );
                        best = Some(pick_better(best.take(), candidate));
                    }
                    Err(error) => {
                        failed += 1;
                        last_error = error.to_string();
                        tracing::debug!(
                            min_cluster_size,
                            min_samples,
                            error = %last_error,
                            "Clustering candidate failed; scored worst-possible"
                        );
                    }
                }
            }
        }
    }

    if attempted == 0 {
        tracing::debug!(
            documents = n,
            "No viable clustering candidates; returning outlier-only assignment"
        );
        return Ok(fallback_result(n, space));
    }

    if failed == attempted {
        return Err(ClusterError::SearchExhausted {
            attempted,
            last: last_error,
        });
    }

    best.ok_or_else(|| ClusterError::Computation("search produced no candidate result".to_string()))
}

/// Reduction settings to search: always the no-reduction candidate, plus the
/// configured grid when the batch is large enough (or reduction is forced).
fn reduction_candidates(set: &DocumentSet, space: &SearchSpace) -> Vec<Option<ReductionParams>> {
    let mut candidates: Vec<Option<ReductionParams>> = vec![None];

    if space.force_reduction || set.len() > space.reduce_above {
        for &target_dim in &space.target_dims {
            if target_dim < 2 || target_dim >= set.dimension() {
                continue;
            }
            for &n_neighbors in &space.neighbor_counts {
                candidates.push(Some(ReductionParams {
                    target_dim,
                    n_neighbors,
                }));
            }
        }
    }

    candidates
}

/// Number of viable `(min_cluster_size, min_samples)` cells for a batch of
/// `n` documents.
fn grid_size(space: &SearchSpace, n: usize) -> usize {
    space
        .min_cluster_sizes
        .iter()
        .filter(|&&mcs| mcs >= 2 && mcs < n)
        .map(|&mcs| {
            space
                .min_samples
                .iter()
                .filter(|&&ms| ms >= 1 && ms <= mcs)
                .count()
        })
        .sum()
}

/// Evaluates one candidate: cluster the working set, score the labeling in
/// the original space. Pure function of its inputs.
fn evaluate_candidate(
    original: &DocumentSet,
    working: &DocumentSet,
    params: ClusterParams,
) -> Result<ClusterResult, ClusterError> {
    let clusterer = DensityClusterer::new(params.clone())?;
    let assignment = clusterer.fit(working)?;
    let quality = silhouette_score(original, &assignment.labels);

    Ok(ClusterResult {
        assignment,
        params,
        quality,
    })
}

/// Max-by-score fold step: higher score wins, ties break toward fewer
/// outliers, remaining ties keep the earlier candidate. Associative and
/// commutative up to the fixed candidate order.
fn pick_better(best: Option<ClusterResult>, candidate: ClusterResult) -> ClusterResult {
    match best {
        None => candidate,
        Some(incumbent) => {
            let (b, c) = (incumbent.score_key(), candidate.score_key());
            if c > b
                || (c == b
                    && candidate.assignment.outlier_count() < incumbent.assignment.outlier_count())
            {
                candidate
            } else {
                incumbent
            }
        }
    }
}

/// Outlier-only result for batches below every viable candidate floor.
fn fallback_result(n: usize, space: &SearchSpace) -> ClusterResult {
    let min_cluster_size = space
        .min_cluster_sizes
        .iter()
        .copied()
        .min()
        .unwrap_or(2)
        .max(2);

    ClusterResult {
        assignment: ClusterAssignment::all_outliers(n),
        params: ClusterParams {
            min_cluster_size,
            min_samples: 1,
            extraction: space.extraction,
            reduction: None,
        },
        quality: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::OUTLIER;
    use ndarray::Array1;

    fn set_of(rows: Vec<Vec<f64>>) -> DocumentSet {
        DocumentSet::from_vectors(rows.into_iter().map(Array1::from_vec).collect())
            .expect("uniform vectors should build")
    }

    /// 10 points forming two visually separated tight groups of 5.
    fn two_tight_groups() -> DocumentSet {
        set_of(vec![
            vec![1.0, 0.01, 0.0, 0.02],
            vec![0.99, 0.02, 0.01, 0.0],
            vec![1.0, 0.0, 0.02, 0.01],
            vec![0.98, 0.03, 0.0, 0.0],
            vec![1.0, 0.02, 0.01, 0.01],
            vec![0.01, 1.0, 0.02, 0.0],
            vec![0.02, 0.99, 0.0, 0.01],
            vec![0.0, 1.0, 0.01, 0.02],
            vec![0.03, 0.98, 0.0, 0.0],
            vec![0.01, 1.0, 0.02, 0.01],
        ])
    }

    #[test]
    fn test_finds_two_clusters_with_positive_quality() {
        let result = optimize_clustering(&two_tight_groups(), &SearchSpace::default())
            .expect("search should succeed");

        assert_eq!(result.assignment.cluster_count(), 2);
        assert!(result.assignment.outlier_count() <= 1);
        let quality = result.quality.expect("two clusters must be scored");
        assert!(quality > 0.0, "quality should be positive, got {quality}");
    }

    #[test]
    fn test_winner_respects_size_clamp() {
        // With 4 documents only min_cluster_size 2 and 3 are viable.
        let set = set_of(vec![
            vec![1.0, 0.02, 0.0],
            vec![0.99, 0.0, 0.01],
            vec![0.0, 1.0, 0.02],
            vec![0.01, 0.99, 0.0],
        ]);

        let result =
            optimize_clustering(&set, &SearchSpace::default()).expect("search should succeed");
        assert!(result.params.min_cluster_size < set.len());
    }

    #[test]
    fn test_below_floor_returns_outlier_only_fallback() {
        // Two documents cannot satisfy min_cluster_size >= 2 while staying
        // below the document count, so no candidate is attempted.
        let set = set_of(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);

        let result =
            optimize_clustering(&set, &SearchSpace::default()).expect("fallback, not an error");
        assert_eq!(result.assignment.labels, vec![OUTLIER, OUTLIER]);
        assert_eq!(result.assignment.strengths, vec![0.0, 0.0]);
        assert_eq!(result.quality, None);
    }

    #[test]
    fn test_empty_set_returns_empty_fallback() {
        let result = optimize_clustering(&set_of(Vec::new()), &SearchSpace::default())
            .expect("fallback, not an error");
        assert!(result.assignment.is_empty());
        assert_eq!(result.quality, None);
    }

    #[test]
    fn test_all_failing_candidates_exhaust_the_search() {
        let set = set_of(vec![
            vec![1.0, 0.0],
            vec![f64::NAN, 1.0],
            vec![0.0, 1.0],
            vec![0.5, 0.5],
        ]);

        match optimize_clustering(&set, &SearchSpace::default()) {
            Err(ClusterError::SearchExhausted { attempted, .. }) => {
                assert!(attempted > 0);
            }
            other => panic!("Expected SearchExhausted, got {:?}", other),
        }
    }

    #[test]
    fn test_degenerate_search_space_is_rejected() {
        let space = SearchSpace {
            min_cluster_sizes: Vec::new(),
            ..SearchSpace::default()
        };
        assert!(matches!(
            optimize_clustering(&two_tight_groups(), &space),
            Err(ClusterError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_deterministic_winner() {
        let set = two_tight_groups();
        let space = SearchSpace::default();

        let a = optimize_clustering(&set, &space).expect("first run");
        let b = optimize_clustering(&set, &space).expect("second run");

        assert_eq!(a.params, b.params);
        assert_eq!(a.assignment, b.assignment);
        assert_eq!(a.quality, b.quality);
    }

    #[test]
    fn test_forced_reduction_joins_the_search() {
        let space = SearchSpace {
            force_reduction: true,
            target_dims: vec![2],
            neighbor_counts: vec![2],
            ..SearchSpace::default()
        };

        // The search must complete and still pick a valid winner whether or
        // not a reduced candidate wins.
        let result =
            optimize_clustering(&two_tight_groups(), &space).expect("search should succeed");
        assert!(result.assignment.cluster_count() >= 1);
        if let Some(reduction) = result.params.reduction {
            assert_eq!(reduction.target_dim, 2);
        }
    }

    #[test]
    fn test_reduction_skipped_for_small_batches() {
        let space = SearchSpace {
            reduce_above: 48,
            ..SearchSpace::default()
        };
        let result =
            optimize_clustering(&two_tight_groups(), &space).expect("search should succeed");
        assert_eq!(result.params.reduction, None);
    }

    #[test]
    fn test_pick_better_prefers_fewer_outliers_on_ties() {
        let params = ClusterParams {
            min_cluster_size: 2,
            min_samples: 1,
            extraction: ClusterExtraction::Balanced,
            reduction: None,
        };
        let more_outliers = ClusterResult {
            assignment: ClusterAssignment {
                labels: vec![0, 0, OUTLIER, OUTLIER],
                strengths: vec![0.5, 0.5, 0.0, 0.0],
            },
            params: params.clone(),
            quality: Some(0.4),
        };
        let fewer_outliers = ClusterResult {
            assignment: ClusterAssignment {
                labels: vec![0, 0, 1, 1],
                strengths: vec![0.5, 0.5, 0.5, 0.5],
            },
            params,
            quality: Some(0.4),
        };

        let winner = pick_better(Some(more_outliers), fewer_outliers.clone());
        assert_eq!(winner.assignment, fewer_outliers.assignment);
    }

    #[test]
    fn test_pick_better_keeps_first_on_full_tie() {
        let params = ClusterParams {
            min_cluster_size: 2,
            min_samples: 1,
            extraction: ClusterExtraction::Balanced,
            reduction: None,
        };
        let first = ClusterResult {
            assignment: ClusterAssignment {
                labels: vec![0, 0, 1, 1],
                strengths: vec![0.5; 4],
            },
            params: params.clone(),
            quality: Some(0.4),
        };
        let second = ClusterResult {
            assignment: ClusterAssignment {
                labels: vec![0, 1, 0, 1],
                strengths: vec![0.5; 4],
            },
            params,
            quality: Some(0.4),
        };

        let winner = pick_better(Some(first.clone()), second);
        assert_eq!(winner.assignment, first.assignment);
    }
}
