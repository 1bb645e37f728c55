//! Density-based clustering over cosine distance.
//!
//! One clustering pass works in four steps:
//!
//! 1. Compute core distances (distance to the `min_samples`-th nearest
//!    neighbor).
//! 2. Build the mutual reachability graph:
//!    `MR(a, b) = max(core_dist(a), core_dist(b), dist(a, b))`.
//! 3. Construct a minimum spanning tree with Prim's algorithm.
//! 4. Cut the tree at a data-driven edge-weight threshold and keep the
//!    resulting components of at least `min_cluster_size` points; everything
//!    else lands in the outlier bucket.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::cluster::validity::silhouette_score;
use crate::cluster::{ClusterAssignment, ClusterParams, ClusterResult, OUTLIER};
use crate::embedding::{cosine_similarity, DocumentSet};
use crate::error::ClusterError;

use super::reduce::{reduce_dimensionality, PROJECTION_SEED};

/// Smallest edge-weight gap considered a real cluster boundary.
const MIN_SIGNIFICANT_GAP: f64 = 0.02;

/// Floor for the merge threshold; keeps tight clusters from over-splitting.
const MERGE_FLOOR: f64 = 0.03;

/// Gap a `Permissive` extraction still honors as a boundary.
const PERMISSIVE_GAP: f64 = 0.15;

/// Largest edge weight a `Permissive` extraction will merge through.
/// Documents farther apart than this share no topic, loose or otherwise.
const PERMISSIVE_CEILING: f64 = 0.5;

/// Strategy for extracting clusters from the spanning tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ClusterExtraction {
    /// Cut at the largest significant gap in edge weights, falling back to
    /// the 75th percentile when no clear boundary exists. Good general
    /// purpose extraction.
    #[default]
    Balanced,

    /// Merge through everything short of a very large gap, up to an
    /// absolute cohesion ceiling, favoring a single, possibly
    /// loosely-defined cluster. Used when re-clustering outlier buckets,
    /// where a loose grouping beats no grouping - but genuinely unrelated
    /// documents still stay outliers.
    Permissive,
}

/// Density clusterer for one pass with fixed hyperparameters.
#[derive(Debug, Clone)]
pub struct DensityClusterer {
    params: ClusterParams,
}

impl DensityClusterer {
    /// Creates a clusterer with the given hyperparameters.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::InvalidParameter`] for parameter combinations
    /// rejected by [`ClusterParams::validate`].
    pub fn new(params: ClusterParams) -> Result<Self, ClusterError> {
        params.validate()?;
        Ok(Self { params })
    }

    /// The hyperparameters this clusterer runs with.
    pub fn params(&self) -> &ClusterParams {
        &self.params
    }

    /// Runs one clustering pass over a document set.
    ///
    /// Applies the configured dimensionality reduction (if any), clusters
    /// the working set, and scores the labeling in the *original* embedding
    /// space so results under different reductions remain comparable.
    ///
    /// # Errors
    ///
    /// - [`ClusterError::ClusterSizeExceedsInput`] if `min_cluster_size`
    ///   is not smaller than the document count. The guarded hyperparameter
    ///   search skips such candidates; a direct call reports them.
    /// - [`ClusterError::Computation`] on numerical failure (non-finite
    ///   distances).
    pub fn cluster(&self, set: &DocumentSet) -> Result<ClusterResult, ClusterError> {
        if self.params.min_cluster_size >= set.len() {
            return Err(ClusterError::ClusterSizeExceedsInput {
                min_cluster_size: self.params.min_cluster_size,
                document_count: set.len(),
            });
        }

        let assignment = match &self.params.reduction {
            Some(reduction) => {
                let working = reduce_dimensionality(set, reduction, PROJECTION_SEED)?;
                self.fit(&working)?
            }
            None => self.fit(set)?,
        };

        let quality = silhouette_score(set, &assignment.labels);

        Ok(ClusterResult {
            assignment,
            params: self.params.clone(),
            quality,
        })
    }

    /// Clusters a working set directly, without reduction or scoring.
    ///
    /// The hyperparameter search uses this entry so one reduced set can be
    /// shared across the parameter grid of a single reduction setting.
    pub(crate) fn fit(&self, set: &DocumentSet) -> Result<ClusterAssignment, ClusterError> {
        let n = set.len();
        if n == 0 {
            return Ok(ClusterAssignment::all_outliers(0));
        }

        let distances = self.distance_matrix(set)?;
        let core_distances = self.core_distances(&distances);
        let mutual_reach = self.mutual_reachability(&distances, &core_distances);
        let mst = self.build_mst(&mutual_reach);
        let (labels, strengths) = self.extract_clusters(&mst, n);

        Ok(ClusterAssignment { labels, strengths })
    }

    /// Pairwise cosine distance matrix.
    fn distance_matrix(&self, set: &DocumentSet) -> Result<Vec<Vec<f64>>, ClusterError> {
        let n = set.len();
        let mut distances = vec![vec![0.0; n]; n];

        for i in 0..n {
            for j in (i + 1)..n {
                let dist = 1.0 - cosine_similarity(&set.vector(i), &set.vector(j));
                if !dist.is_finite() {
                    return Err(ClusterError::Computation(format!(
                        "non-finite distance between documents {i} and {j}"
                    )));
                }
                distances[i][j] = dist;
                distances[j][i] = dist;
            }
        }

        Ok(distances)
    }

    /// Core distance of each point: distance to its `min_samples`-th
    /// nearest neighbor.
    fn core_distances(&self, distances: &[Vec<f64>]) -> Vec<f64> {
        let n = distances.len();
        let k = self.params.min_samples;
        let mut core_distances = Vec::with_capacity(n);

        for i in 0..n {
            let mut row: Vec<f64> = (0..n).filter(|&j| j != i).map(|j| distances[i][j]).collect();
            row.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

            let core = if k <= row.len() {
                row[k - 1]
            } else {
                row.last().copied().unwrap_or(f64::MAX)
            };
            core_distances.push(core);
        }

        core_distances
    }

    /// Mutual reachability: `MR(a,b) = max(core(a), core(b), dist(a,b))`.
    fn mutual_reachability(&self, distances: &[Vec<f64>], core_distances: &[f64]) -> Vec<Vec<f64>> {
        let n = distances.len();
        let mut mutual_reach = vec![vec![0.0; n]; n];

        for i in 0..n {
            for j in (i + 1)..n {
                let mr = distances[i][j].max(core_distances[i]).max(core_distances[j]);
                mutual_reach[i][j] = mr;
                mutual_reach[j][i] = mr;
            }
        }

        mutual_reach
    }

    /// Minimum spanning tree via Prim's algorithm.
    ///
    /// Returns edges sorted by weight: (node_a, node_b, weight).
    fn build_mst(&self, distances: &[Vec<f64>]) -> Vec<(usize, usize, f64)> {
        let n = distances.len();
        if n == 0 {
            return vec![];
        }

        let mut in_tree = vec![false; n];
        let mut edges = Vec::with_capacity(n.saturating_sub(1));
        let mut min_dist = vec![f64::MAX; n];
        let mut min_edge = vec![0usize; n];

        in_tree[0] = true;
        for j in 1..n {
            min_dist[j] = distances[0][j];
        }

        for _ in 1..n {
            let mut min_val = f64::MAX;
            let mut min_idx = 0;

            for j in 0..n {
                if !in_tree[j] && min_dist[j] < min_val {
                    min_val = min_dist[j];
                    min_idx = j;
                }
            }

            in_tree[min_idx] = true;
            edges.push((min_edge[min_idx], min_idx, min_val));

            for j in 0..n {
                if !in_tree[j] && distances[min_idx][j] < min_dist[j] {
                    min_dist[j] = distances[min_idx][j];
                    min_edge[j] = min_idx;
                }
            }
        }

        edges.sort_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal));
        edges
    }

    /// Merge threshold for the spanning tree, derived from the edge-weight
    /// distribution. Edges at or below the threshold merge; heavier edges
    /// separate components.
    fn merge_threshold(&self, mst: &[(usize, usize, f64)]) -> f64 {
        if mst.is_empty() {
            return f64::MAX;
        }

        let weights: Vec<f64> = mst.iter().map(|(_, _, w)| *w).collect();
        let n = weights.len();

        let mut max_gap = 0.0f64;
        let mut gap_idx = 0;
        for i in 1..n {
            let gap = weights[i] - weights[i - 1];
            if gap > max_gap {
                max_gap = gap;
                gap_idx = i;
            }
        }

        let threshold = match self.params.extraction {
            ClusterExtraction::Balanced => {
                if max_gap >= MIN_SIGNIFICANT_GAP && gap_idx >= 1 {
                    // Edges up to the weight just before the largest gap
                    // merge; the gap edge and above get cut.
                    weights[gap_idx - 1].max(MERGE_FLOOR)
                } else {
                    // No clear boundary; fall back to the 75th percentile.
                    let p75_idx = ((n as f64) * 0.75) as usize;
                    weights[p75_idx.min(n - 1)].max(MERGE_FLOOR)
                }
            }
            ClusterExtraction::Permissive => {
                if max_gap >= PERMISSIVE_GAP && gap_idx >= 1 {
                    weights[gap_idx - 1].max(MERGE_FLOOR).min(PERMISSIVE_CEILING)
                } else {
                    // No dominant boundary; merge everything below the
                    // cohesion ceiling into one loose component.
                    PERMISSIVE_CEILING
                }
            }
        };

        tracing::debug!(
            mst_edges = n,
            max_gap = %format!("{max_gap:.4}"),
            gap_at_edge = gap_idx,
            extraction = ?self.params.extraction,
            threshold = %format!("{threshold:.4}"),
            "Merge threshold selected"
        );

        threshold
    }

    /// Extracts cluster labels from the spanning tree.
    ///
    /// Components of at least `min_cluster_size` points become clusters,
    /// labeled in first-encounter order; the rest is the outlier bucket.
    fn extract_clusters(&self, mst: &[(usize, usize, f64)], n_points: usize) -> (Vec<i32>, Vec<f64>) {
        if n_points == 0 {
            return (vec![], vec![]);
        }

        let mut parent: Vec<usize> = (0..n_points).collect();
        let mut rank: Vec<usize> = vec![0; n_points];

        fn find(parent: &mut [usize], mut i: usize) -> usize {
            while parent[i] != i {
                parent[i] = parent[parent[i]];
                i = parent[i];
            }
            i
        }

        fn union(parent: &mut [usize], rank: &mut [usize], i: usize, j: usize) {
            let pi = find(parent, i);
            let pj = find(parent, j);
            if pi != pj {
                if rank[pi] < rank[pj] {
                    parent[pi] = pj;
                } else if rank[pi] > rank[pj] {
                    parent[pj] = pi;
                } else {
                    parent[pj] = pi;
                    rank[pi] += 1;
                }
            }
        }

        let threshold = self.merge_threshold(mst);

        for (i, j, weight) in mst {
            if *weight > threshold {
                break;
            }
            union(&mut parent, &mut rank, *i, *j);
        }

        // Component sizes
        let mut component_sizes: HashMap<usize, usize> = HashMap::new();
        for i in 0..n_points {
            let root = find(&mut parent, i);
            *component_sizes.entry(root).or_insert(0) += 1;
        }

        // Degenerate clustering watch: one component swallowing most points
        if n_points > 10 {
            for (&_root, &size) in &component_sizes {
                if size > n_points / 2 {
                    tracing::warn!(
                        component_size = size,
                        total_points = n_points,
                        pct = (size * 100) / n_points,
                        num_components = component_sizes.len(),
                        "Mega-cluster: single component contains {}% of all points",
                        (size * 100) / n_points
                    );
                }
            }
        }

        let mut labels = vec![OUTLIER; n_points];
        let mut strengths = vec![0.0f64; n_points];
        let mut cluster_map: HashMap<usize, i32> = HashMap::new();
        let mut next_cluster = 0i32;

        for i in 0..n_points {
            let root = find(&mut parent, i);
            let cluster_size = component_sizes.get(&root).copied().unwrap_or(1);

            if cluster_size >= self.params.min_cluster_size {
                let cluster_id = *cluster_map.entry(root).or_insert_with(|| {
                    let id = next_cluster;
                    next_cluster += 1;
                    id
                });
                labels[i] = cluster_id;
                // Larger clusters yield higher membership confidence.
                strengths[i] = 1.0 - (1.0 / cluster_size as f64).min(0.5);
            }
        }

        (labels, strengths)
    }
}
