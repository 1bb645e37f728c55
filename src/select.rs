//! Representative selection via Maximal Marginal Relevance.
//!
//! Given one cluster's documents, greedily picks a small subset that stays
//! relevant to the cluster's center while avoiding redundancy among the
//! picks. The selected indices feed the downstream summarizer in selection
//! order.

use ndarray::Array1;

use crate::embedding::{centroid, cosine_similarity, DocumentSet};
use crate::error::SelectionError;

/// Selects up to `k` diverse, relevance-ranked documents from a set.
///
/// At each step, every unselected index `i` is scored as
///
/// `score(i) = lambda * relevance(i) - (1 - lambda) * max_sim(i, selected)`
///
/// where `relevance(i)` is the cosine similarity of vector `i` to the
/// reference vector and the penalty term is 0 while nothing is selected.
/// The highest-scoring index is appended, ties breaking toward the lowest
/// original index, until `k` picks are made or the set is exhausted.
///
/// When no `query` vector is given, the centroid of the input vectors is
/// the relevance target. `lambda = 1.0` degenerates to pure relevance
/// ranking; `lambda = 0.0` to pure diversity after the first pick (which is
/// still relevance-chosen, since the penalty term is empty at that point).
///
/// # Errors
///
/// - [`SelectionError::InvalidLambda`] when `lambda` is outside [0, 1].
/// - [`SelectionError::DimensionMismatch`] when `query` does not match the
///   set's dimension.
pub fn mmr_select(
    set: &DocumentSet,
    k: usize,
    lambda: f64,
    query: Option<&Array1<f64>>,
) -> Result<Vec<usize>, SelectionError> {
    if !lambda.is_finite() || !(0.0..=1.0).contains(&lambda) {
        return Err(SelectionError::InvalidLambda(lambda));
    }

    let n = set.len();
    if n == 0 || k == 0 {
        return Ok(Vec::new());
    }

    if let Some(query) = query {
        if query.len() != set.dimension() {
            return Err(SelectionError::DimensionMismatch {
                expected: set.dimension(),
                actual: query.len(),
            });
        }
    }

    let reference = match query {
        Some(query) => query.clone(),
        None => centroid(set.matrix()),
    };

    let relevance: Vec<f64> = (0..n)
        .map(|i| cosine_similarity(&set.vector(i), &reference))
        .collect();

    let target = k.min(n);
    let mut selected: Vec<usize> = Vec::with_capacity(target);
    let mut is_selected = vec![false; n];
    // Highest similarity of each candidate to any selected document.
    let mut max_sim = vec![f64::NEG_INFINITY; n];

    while selected.len() < target {
        let mut best: Option<(usize, f64)> = None;

        for i in 0..n {
            if is_selected[i] {
                continue;
            }
            // The opening pick is pure relevance: with nothing selected the
            // penalty term is empty, and weighting relevance down by lambda
            // would only flatten the ranking it alone decides.
            let score = if selected.is_empty() {
                relevance[i]
            } else {
                lambda * relevance[i] - (1.0 - lambda) * max_sim[i]
            };

            // Strict comparison under ascending iteration keeps the lowest
            // index on ties.
            let better = match best {
                None => true,
                Some((_, best_score)) => score > best_score,
            };
            if better {
                best = Some((i, score));
            }
        }

        let Some((pick, _)) = best else {
            break;
        };
        is_selected[pick] = true;
        selected.push(pick);

        for i in 0..n {
            if !is_selected[i] {
                let sim = cosine_similarity(&set.vector(i), &set.vector(pick));
                if sim > max_sim[i] {
                    max_sim[i] = sim;
                }
            }
        }
    }

    Ok(selected)
}
