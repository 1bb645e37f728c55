//! Unsupervised cluster validity scoring.
//!
//! Scores a labeling by the mean silhouette of its non-outlier points under
//! cosine distance. The score is only defined when at least two clusters
//! exist over at least two points; callers treat an undefined score as the
//! worst possible one.

use std::collections::HashSet;

use crate::cluster::OUTLIER;
use crate::embedding::{cosine_similarity, DocumentSet};

/// Computes the mean silhouette score of a labeling under cosine distance.
///
/// The silhouette of a point compares its mean distance to its own cluster
/// (`a`) against its smallest mean distance to any other cluster (`b`):
/// `s = (b - a) / max(a, b)`, in [-1, 1], higher is better. Outlier points
/// are excluded from the mean.
///
/// Returns `None` when the score is undefined: fewer than 2 distinct
/// clusters, fewer than 2 non-outlier points, or a labels/set length
/// mismatch.
pub fn silhouette_score(set: &DocumentSet, labels: &[i32]) -> Option<f64> {
    let n = set.len();
    if n < 2 || labels.len() != n {
        return None;
    }

    let clusters: HashSet<i32> = labels.iter().filter(|&&l| l != OUTLIER).copied().collect();
    if clusters.len() < 2 {
        return None;
    }

    let distance = |i: usize, j: usize| 1.0 - cosine_similarity(&set.vector(i), &set.vector(j));

    let mut total = 0.0;
    let mut count = 0usize;

    for i in 0..n {
        if labels[i] == OUTLIER {
            continue;
        }

        // a(i) = mean distance to same cluster
        let (same_sum, same_count) = (0..n)
            .filter(|&j| j != i && labels[j] == labels[i])
            .fold((0.0f64, 0usize), |(sum, cnt), j| (sum + distance(i, j), cnt + 1));
        let a_i = if same_count > 0 {
            same_sum / same_count as f64
        } else {
            0.0
        };

        // b(i) = min mean distance to other clusters
        let b_i = clusters
            .iter()
            .filter(|&&cluster| cluster != labels[i])
            .filter_map(|&cluster| {
                let (sum, cnt) = (0..n)
                    .filter(|&j| labels[j] == cluster)
                    .fold((0.0f64, 0usize), |(sum, cnt), j| (sum + distance(i, j), cnt + 1));
                if cnt > 0 {
                    Some(sum / cnt as f64)
                } else {
                    None
                }
            })
            .fold(f64::MAX, f64::min);
        let b_i = if b_i == f64::MAX { 0.0 } else { b_i };

        let max_ab = a_i.max(b_i);
        let s_i = if max_ab > 0.0 { (b_i - a_i) / max_ab } else { 0.0 };

        total += s_i;
        count += 1;
    }

    if count >= 2 {
        Some(total / count as f64)
    } else {
        None
    }
}
