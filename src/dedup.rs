//! Near-duplicate pruning for document sets.
//!
//! Removes documents whose embeddings are near-identical to an earlier
//! document before clustering, so redundant paragraphs do not distort
//! cluster densities or waste representative slots.

use crate::embedding::{pairwise_cosine_similarity, DocumentSet};
use crate::error::DedupError;

/// Default similarity threshold for considering documents as duplicates.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.9;

/// Deduplicator for identifying and removing near-duplicate documents.
///
/// Uses embedding-based cosine similarity with a first-occurrence-wins
/// rule: the earliest occurrence of a near-duplicate group survives and
/// every later member is removed. Re-running on the kept subset with the
/// same threshold removes nothing further.
#[derive(Debug, Clone)]
pub struct Deduplicator {
    /// Similarity threshold at or above which two documents are duplicates.
    threshold: f64,
}

/// Result of a deduplication pass.
#[derive(Debug, Clone)]
pub struct DedupOutcome {
    /// Original indices to retain, in original order.
    pub kept: Vec<usize>,

    /// Number of documents removed as near-duplicates.
    pub removed: usize,
}

impl DedupOutcome {
    /// Total number of documents before deduplication.
    pub fn total_before(&self) -> usize {
        self.kept.len() + self.removed
    }

    /// Returns the retention ratio (kept / total), 1.0 for an empty input.
    pub fn retention_ratio(&self) -> f64 {
        let total = self.total_before();
        if total == 0 {
            return 1.0;
        }
        self.kept.len() as f64 / total as f64
    }
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl Deduplicator {
    /// Creates a deduplicator with the specified similarity threshold.
    ///
    /// # Errors
    ///
    /// Returns [`DedupError::InvalidThreshold`] unless the threshold lies in
    /// (0.0, 1.0]. Out-of-range thresholds are rejected, never corrected.
    pub fn new(threshold: f64) -> Result<Self, DedupError> {
        if !threshold.is_finite() || threshold <= 0.0 || threshold > 1.0 {
            return Err(DedupError::InvalidThreshold(threshold));
        }
        Ok(Self { threshold })
    }

    /// Returns the configured similarity threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Prunes near-duplicate documents from a set.
    ///
    /// For each pair (i, j) with i < j, if the cosine similarity of their
    /// vectors reaches the threshold, the later index j is removed as a
    /// duplicate of the earlier survivor i. An index removed once is never
    /// re-examined, either as an anchor or as a target, so the outcome is
    /// deterministic: re-running on the same input and threshold removes
    /// exactly the same indices.
    ///
    /// All pairs are compared directly; the pairwise pass is the correctness
    /// oracle for any future acceleration.
    ///
    /// # Returns
    ///
    /// The ordered list of original indices to retain and the removal count.
    pub fn prune_duplicates(&self, set: &DocumentSet) -> DedupOutcome {
        let n = set.len();
        if n < 2 {
            return DedupOutcome {
                kept: (0..n).collect(),
                removed: 0,
            };
        }

        let similarities = pairwise_cosine_similarity(set.matrix());
        let mut removed = vec![false; n];

        for i in 0..n {
            if removed[i] {
                continue;
            }
            for j in (i + 1)..n {
                if !removed[j] && similarities[[i, j]] >= self.threshold {
                    removed[j] = true;
                }
            }
        }

        let kept: Vec<usize> = (0..n).filter(|&i| !removed[i]).collect();
        let removed_count = n - kept.len();

        tracing::debug!(
            total = n,
            kept = kept.len(),
            removed = removed_count,
            threshold = self.threshold,
            "Pruned near-duplicate documents"
        );

        DedupOutcome {
            kept,
            removed: removed_count,
        }
    }
}
