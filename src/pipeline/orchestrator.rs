//! The document organizer: the main pipeline entry point.
//!
//! Coordinates one (genre, window) batch through the full flow:
//! embed, prune near-duplicates, cluster with hyperparameter search,
//! refine the outlier bucket, and pick per-cluster representatives.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cluster::{optimize_clustering, recursive_cluster, ClusterParams};
use crate::dedup::Deduplicator;
use crate::embedding::{DocumentSet, Embedder};
use crate::error::{EmbeddingError, PipelineError};
use crate::select::mmr_select;

use super::config::OrganizerConfig;

/// One document record handed over by the genre classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenreDocument {
    /// Upstream document id.
    pub id: Uuid,

    /// The document text (an article paragraph or sentence).
    pub text: String,

    /// Classifier confidence for the genre label, in [0, 1].
    pub confidence: f64,
}

impl GenreDocument {
    /// Creates a document record.
    pub fn new(id: Uuid, text: impl Into<String>, confidence: f64) -> Self {
        Self {
            id,
            text: text.into(),
            confidence,
        }
    }
}

/// The time window a batch was collected over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// One genre partition's worth of documents for one time window.
///
/// The organizer only ever sees one genre at a time; partitioning is the
/// upstream classifier's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenreBatch {
    /// Genre label shared by every document in the batch.
    pub genre: String,

    /// Collection window of the batch.
    pub window: BatchWindow,

    /// The documents, in upstream order. Positions in this list are the
    /// "original indices" referenced by every output field.
    pub documents: Vec<GenreDocument>,
}

impl GenreBatch {
    /// Creates a batch.
    pub fn new(genre: impl Into<String>, window: BatchWindow, documents: Vec<GenreDocument>) -> Self {
        Self {
            genre: genre.into(),
            window,
            documents,
        }
    }
}

/// One discovered sub-topic cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicCluster {
    /// Cluster label within this batch.
    pub cluster_id: i32,

    /// Original indices of every member document.
    pub member_indices: Vec<usize>,

    /// Original indices of the selected representatives, in selection order.
    pub representative_indices: Vec<usize>,

    /// Validity score of the clustering run that produced this cluster;
    /// `None` when undefined (e.g. a single-cluster result).
    pub quality_score: Option<f64>,

    /// Hyperparameters of the winning clustering run.
    pub params: ClusterParams,
}

/// Summary counters for one organized batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizerStats {
    pub total_documents: usize,
    pub duplicates_removed: usize,
    pub clusters_found: usize,
    pub outliers: usize,
    pub representatives_selected: usize,
}

/// The organizer's output for one (genre, window) batch.
///
/// A read-only artifact consumed once by the evidence-assembly stage. All
/// indices refer to positions in the input batch's document list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizedBatch {
    pub genre: String,
    pub window: BatchWindow,

    /// Discovered sub-topic clusters with their representatives.
    pub clusters: Vec<TopicCluster>,

    /// Original indices of documents no cluster claimed.
    pub outlier_indices: Vec<usize>,

    /// Original indices removed as near-duplicates before clustering.
    pub duplicate_indices: Vec<usize>,

    pub stats: OrganizerStats,
}

/// Organizes genre-partitioned document batches into sub-topic clusters
/// with per-cluster representatives.
///
/// The embedding model is injected at construction; the organizer holds no
/// global state and independent batches share nothing, so separate batches
/// can run concurrently (see [`organize_all`](DocumentOrganizer::organize_all)).
pub struct DocumentOrganizer {
    embedder: Arc<dyn Embedder>,
    config: OrganizerConfig,
}

impl DocumentOrganizer {
    /// Creates an organizer with the given embedder and configuration.
    ///
    /// # Errors
    ///
    /// Returns the underlying validation error for an invalid configuration.
    pub fn new(embedder: Arc<dyn Embedder>, config: OrganizerConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self { embedder, config })
    }

    /// The active configuration.
    pub fn config(&self) -> &OrganizerConfig {
        &self.config
    }

    /// Organizes one genre batch.
    ///
    /// Flow: embed all texts, prune near-duplicates, run the clustering
    /// search on the survivors, refine the outlier bucket, then select up
    /// to `representatives_per_cluster` documents per cluster. Every index
    /// in the output refers to the batch's original document order.
    ///
    /// # Errors
    ///
    /// Fails with a single [`PipelineError`] for the whole batch; partial
    /// results are never published.
    pub async fn organize(&self, batch: &GenreBatch) -> Result<OrganizedBatch, PipelineError> {
        let total = batch.documents.len();
        if total == 0 {
            return Ok(OrganizedBatch {
                genre: batch.genre.clone(),
                window: batch.window,
                clusters: Vec::new(),
                outlier_indices: Vec::new(),
                duplicate_indices: Vec::new(),
                stats: OrganizerStats {
                    total_documents: 0,
                    ..OrganizerStats::default()
                },
            });
        }

        // Embed
        let texts: Vec<String> = batch.documents.iter().map(|d| d.text.clone()).collect();
        let vectors = self.embedder.embed(&texts).await?;
        if vectors.len() != texts.len() {
            return Err(EmbeddingError::BatchSizeMismatch {
                expected: texts.len(),
                actual: vectors.len(),
            }
            .into());
        }
        let set = DocumentSet::from_vectors(vectors)?;

        // Prune near-duplicates
        let dedup = Deduplicator::new(self.config.dedup_threshold)?;
        let outcome = dedup.prune_duplicates(&set);
        let kept = outcome.kept;

        let mut is_kept = vec![false; total];
        for &index in &kept {
            is_kept[index] = true;
        }
        let duplicate_indices: Vec<usize> = (0..total).filter(|&i| !is_kept[i]).collect();

        let working = set.subset(&kept);

        // Cluster with hyperparameter search, then refine the outliers
        let mut result = optimize_clustering(&working, &self.config.search)?;
        if self.config.refine_outliers {
            let token_counts: Vec<usize> = kept
                .iter()
                .map(|&i| batch.documents[i].text.split_whitespace().count())
                .collect();
            result.assignment = recursive_cluster(
                &working,
                &result.assignment,
                Some(&token_counts),
                &self.config.refiner,
            )?;
        }

        // Select representatives per cluster, mapping local indices back to
        // the batch's original order.
        let mut clusters = Vec::new();
        let mut representatives_selected = 0usize;

        for cluster_id in result.assignment.cluster_ids() {
            let local_members = result.assignment.members_of(cluster_id);
            let cluster_set = working.subset(&local_members);

            let picks = mmr_select(
                &cluster_set,
                self.config.representatives_per_cluster,
                self.config.mmr_lambda,
                None,
            )?;

            let member_indices: Vec<usize> =
                local_members.iter().map(|&local| kept[local]).collect();
            let representative_indices: Vec<usize> = picks
                .iter()
                .map(|&pick| kept[local_members[pick]])
                .collect();
            representatives_selected += representative_indices.len();

            clusters.push(TopicCluster {
                cluster_id,
                member_indices,
                representative_indices,
                quality_score: result.quality,
                params: result.params.clone(),
            });
        }

        let outlier_indices: Vec<usize> = result
            .assignment
            .outlier_indices()
            .iter()
            .map(|&local| kept[local])
            .collect();

        let stats = OrganizerStats {
            total_documents: total,
            duplicates_removed: duplicate_indices.len(),
            clusters_found: clusters.len(),
            outliers: outlier_indices.len(),
            representatives_selected,
        };

        tracing::info!(
            genre = %batch.genre,
            total_documents = stats.total_documents,
            duplicates_removed = stats.duplicates_removed,
            clusters_found = stats.clusters_found,
            outliers = stats.outliers,
            representatives = stats.representatives_selected,
            "Organized genre batch"
        );

        Ok(OrganizedBatch {
            genre: batch.genre.clone(),
            window: batch.window,
            clusters,
            outlier_indices,
            duplicate_indices,
            stats,
        })
    }

    /// Organizes several independent batches concurrently.
    ///
    /// Batches share no mutable state; each produces its own result (or
    /// failure) in input order.
    pub async fn organize_all(
        &self,
        batches: &[GenreBatch],
    ) -> Vec<Result<OrganizedBatch, PipelineError>> {
        futures::future::join_all(batches.iter().map(|batch| self.organize(batch))).await
    }
}
