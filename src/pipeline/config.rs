//! Configuration for the document organizer.

use serde::{Deserialize, Serialize};

use crate::cluster::{RefinerConfig, SearchSpace};
use crate::dedup::DEFAULT_SIMILARITY_THRESHOLD;
use crate::error::{DedupError, PipelineError, SelectionError};

/// Configuration for one [`DocumentOrganizer`](super::DocumentOrganizer).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizerConfig {
    // Deduplication settings
    /// Similarity threshold at or above which two documents are
    /// near-duplicates. Must lie in (0.0, 1.0].
    pub dedup_threshold: f64,

    // Selection settings
    /// Number of representatives requested per cluster.
    pub representatives_per_cluster: usize,
    /// Relevance/diversity trade-off for representative selection, in
    /// [0.0, 1.0]; higher favors relevance.
    pub mmr_lambda: f64,

    // Clustering settings
    /// Candidate grid for the top-level clustering search.
    pub search: SearchSpace,
    /// Candidate ranges and bounds for outlier refinement.
    pub refiner: RefinerConfig,
    /// Whether to re-cluster the outlier bucket after the top-level pass.
    pub refine_outliers: bool,
}

impl Default for OrganizerConfig {
    fn default() -> Self {
        Self {
            // Deduplication defaults
            dedup_threshold: DEFAULT_SIMILARITY_THRESHOLD,

            // Selection defaults
            representatives_per_cluster: 3,
            mmr_lambda: 0.7,

            // Clustering defaults
            search: SearchSpace::default(),
            refiner: RefinerConfig::default(),
            refine_outliers: true,
        }
    }
}

impl OrganizerConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the near-duplicate similarity threshold.
    pub fn with_dedup_threshold(mut self, threshold: f64) -> Self {
        self.dedup_threshold = threshold;
        self
    }

    /// Sets the number of representatives requested per cluster.
    pub fn with_representatives_per_cluster(mut self, count: usize) -> Self {
        self.representatives_per_cluster = count;
        self
    }

    /// Sets the relevance/diversity trade-off for selection.
    pub fn with_mmr_lambda(mut self, lambda: f64) -> Self {
        self.mmr_lambda = lambda;
        self
    }

    /// Sets the top-level clustering search space.
    pub fn with_search(mut self, search: SearchSpace) -> Self {
        self.search = search;
        self
    }

    /// Sets the outlier refinement configuration.
    pub fn with_refiner(mut self, refiner: RefinerConfig) -> Self {
        self.refiner = refiner;
        self
    }

    /// Enables or disables outlier refinement.
    pub fn with_refine_outliers(mut self, refine: bool) -> Self {
        self.refine_outliers = refine;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns the subsystem error for the first invalid field: an
    /// out-of-range dedup threshold, an out-of-range lambda, or a
    /// degenerate search space.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.dedup_threshold.is_finite()
            || self.dedup_threshold <= 0.0
            || self.dedup_threshold > 1.0
        {
            return Err(DedupError::InvalidThreshold(self.dedup_threshold).into());
        }
        if !self.mmr_lambda.is_finite() || !(0.0..=1.0).contains(&self.mmr_lambda) {
            return Err(SelectionError::InvalidLambda(self.mmr_lambda).into());
        }
        self.search.validate()?;
        Ok(())
    }
}
