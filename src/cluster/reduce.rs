//! Dimensionality reduction for large document batches.
//!
//! High-dimensional embeddings flatten density contrasts, so batches beyond a
//! configured size are projected down before clustering. The projection is a
//! seeded Gaussian random projection followed by an optional neighborhood
//! smoothing pass that pulls each point toward its nearest neighbors in the
//! original space, tightening local structure.
//!
//! The reduction settings are hyperparameters under search: candidates with
//! different targets never share a reduced set.

use ndarray::{Array1, Array2};
use rand::{RngExt, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::embedding::{pairwise_cosine_similarity, DocumentSet};
use crate::error::ClusterError;

/// Fixed seed for the projection matrix so identical inputs always reduce
/// to identical outputs.
pub(crate) const PROJECTION_SEED: u64 = 0x10_f0_4d;

/// Blend factor for the neighborhood smoothing pass.
const NEIGHBOR_BLEND: f64 = 0.5;

/// Settings for one dimensionality reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReductionParams {
    /// Output dimensionality; must be >= 2 and < the input dimension.
    pub target_dim: usize,

    /// Neighborhood size for the smoothing pass; 0 disables smoothing.
    pub n_neighbors: usize,
}

/// Projects a document set down to `params.target_dim` dimensions.
///
/// The projection matrix is drawn from a seeded normal distribution scaled
/// by `1/sqrt(target_dim)`, so the reduction is deterministic. When
/// `params.n_neighbors > 0` each projected point is then blended with the
/// mean of its nearest neighbors (measured in the original space), which
/// preserves local neighborhoods through the projection.
///
/// # Errors
///
/// Returns [`ClusterError::InvalidParameter`] when `target_dim < 2` or
/// `target_dim >= set.dimension()`.
pub fn reduce_dimensionality(
    set: &DocumentSet,
    params: &ReductionParams,
    seed: u64,
) -> Result<DocumentSet, ClusterError> {
    if params.target_dim < 2 {
        return Err(ClusterError::InvalidParameter(format!(
            "reduction target_dim must be >= 2, got {}",
            params.target_dim
        )));
    }
    if params.target_dim >= set.dimension() && !set.is_empty() {
        return Err(ClusterError::InvalidParameter(format!(
            "reduction target_dim ({}) must be smaller than the input dimension ({})",
            params.target_dim,
            set.dimension()
        )));
    }

    let n = set.len();
    if n == 0 {
        return Ok(DocumentSet::from_matrix(Array2::zeros((
            0,
            params.target_dim,
        ))));
    }

    let dim = set.dimension();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let scale = 1.0 / (params.target_dim as f64).sqrt();

    let mut projection = Array2::zeros((dim, params.target_dim));
    for value in projection.iter_mut() {
        let sample: f64 = rng.sample(StandardNormal);
        *value = sample * scale;
    }

    let mut reduced = set.matrix().dot(&projection);

    if params.n_neighbors > 0 && n > 2 {
        let k = params.n_neighbors.min(n - 1);
        let similarities = pairwise_cosine_similarity(set.matrix());
        let projected = reduced.clone();

        for i in 0..n {
            let mut order: Vec<usize> = (0..n).filter(|&j| j != i).collect();
            order.sort_by(|&a, &b| {
                similarities[[i, b]]
                    .partial_cmp(&similarities[[i, a]])
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.cmp(&b))
            });

            let mut neighbor_mean: Array1<f64> = Array1::zeros(params.target_dim);
            for &j in order.iter().take(k) {
                for d in 0..params.target_dim {
                    neighbor_mean[d] += projected[[j, d]];
                }
            }
            for d in 0..params.target_dim {
                let mean_d = neighbor_mean[d] / k as f64;
                reduced[[i, d]] =
                    (1.0 - NEIGHBOR_BLEND) * projected[[i, d]] + NEIGHBOR_BLEND * mean_d;
            }
        }
    }

    tracing::debug!(
        documents = n,
        input_dim = dim,
        target_dim = params.target_dim,
        n_neighbors = params.n_neighbors,
        "Reduced document set dimensionality"
    );

    Ok(DocumentSet::from_matrix(reduced))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    fn set_of(rows: Vec<Vec<f64>>) -> DocumentSet {
        DocumentSet::from_vectors(rows.into_iter().map(Array1::from_vec).collect())
            .expect("uniform vectors should build")
    }

    fn sample_set() -> DocumentSet {
        set_of(vec![
            vec![1.0, 0.0, 0.0, 0.1, 0.0, 0.0],
            vec![0.9, 0.1, 0.0, 0.0, 0.1, 0.0],
            vec![1.0, 0.05, 0.05, 0.0, 0.0, 0.1],
            vec![0.0, 0.0, 1.0, 0.0, 0.9, 0.1],
            vec![0.1, 0.0, 0.9, 0.0, 1.0, 0.0],
            vec![0.0, 0.1, 1.0, 0.1, 0.95, 0.0],
        ])
    }

    #[test]
    fn test_reduce_output_shape() {
        let params = ReductionParams {
            target_dim: 3,
            n_neighbors: 2,
        };
        let reduced = reduce_dimensionality(&sample_set(), &params, PROJECTION_SEED)
            .expect("reduction should succeed");

        assert_eq!(reduced.len(), 6);
        assert_eq!(reduced.dimension(), 3);
    }

    #[test]
    fn test_reduce_is_deterministic() {
        let params = ReductionParams {
            target_dim: 3,
            n_neighbors: 2,
        };
        let a = reduce_dimensionality(&sample_set(), &params, PROJECTION_SEED).expect("ok");
        let b = reduce_dimensionality(&sample_set(), &params, PROJECTION_SEED).expect("ok");

        for i in 0..a.len() {
            for d in 0..a.dimension() {
                assert!((a.vector(i)[d] - b.vector(i)[d]).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let params = ReductionParams {
            target_dim: 3,
            n_neighbors: 0,
        };
        let a = reduce_dimensionality(&sample_set(), &params, 1).expect("ok");
        let b = reduce_dimensionality(&sample_set(), &params, 2).expect("ok");

        let mut any_diff = false;
        for i in 0..a.len() {
            for d in 0..a.dimension() {
                if (a.vector(i)[d] - b.vector(i)[d]).abs() > 1e-9 {
                    any_diff = true;
                }
            }
        }
        assert!(any_diff, "different seeds should produce different projections");
    }

    #[test]
    fn test_reduce_rejects_target_not_below_input() {
        let params = ReductionParams {
            target_dim: 6,
            n_neighbors: 0,
        };
        let result = reduce_dimensionality(&sample_set(), &params, PROJECTION_SEED);
        assert!(matches!(result, Err(ClusterError::InvalidParameter(_))));
    }

    #[test]
    fn test_reduce_rejects_tiny_target() {
        let params = ReductionParams {
            target_dim: 1,
            n_neighbors: 0,
        };
        let result = reduce_dimensionality(&sample_set(), &params, PROJECTION_SEED);
        assert!(matches!(result, Err(ClusterError::InvalidParameter(_))));
    }

    #[test]
    fn test_reduce_empty_set() {
        let params = ReductionParams {
            target_dim: 3,
            n_neighbors: 5,
        };
        let empty = set_of(Vec::new());
        let reduced = reduce_dimensionality(&empty, &params, PROJECTION_SEED).expect("ok");
        assert!(reduced.is_empty());
        assert_eq!(reduced.dimension(), 3);
    }

    #[test]
    fn test_neighbor_count_clamped_to_set_size() {
        let params = ReductionParams {
            target_dim: 2,
            n_neighbors: 50,
        };
        let reduced = reduce_dimensionality(&sample_set(), &params, PROJECTION_SEED)
            .expect("oversized neighborhoods should clamp, not fail");
        assert_eq!(reduced.len(), 6);
    }

    #[test]
    fn test_smoothing_preserves_group_separation() {
        // Two tight groups should remain closer within than across after
        // projection with smoothing.
        let params = ReductionParams {
            target_dim: 2,
            n_neighbors: 2,
        };
        let reduced = reduce_dimensionality(&sample_set(), &params, PROJECTION_SEED).expect("ok");

        let dist = |i: usize, j: usize| {
            let a = reduced.vector(i);
            let b = reduced.vector(j);
            a.iter()
                .zip(b.iter())
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f64>()
                .sqrt()
        };

        let within = dist(0, 1) + dist(1, 2) + dist(3, 4) + dist(4, 5);
        let across = dist(0, 3) + dist(1, 4) + dist(2, 5);
        assert!(
            within / 4.0 < across / 3.0,
            "mean within-group distance ({within}) should stay below across-group ({across})"
        );
    }
}
