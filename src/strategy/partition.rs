//! K-means neighbors with k chosen by silhouette.

use ndarray::ArrayView2;

use super::{check_selected, pad_with_closest, same_group, Knn, NeighborStrategy, Neighbors};
use crate::cluster::{Kmeans, KmeansFit};
use crate::config::EngineConfig;
use crate::distance::{pairwise, rank, Metric};
use crate::error::{Error, Result};
use crate::metrics::calinski_harabasz;
use crate::quality::{ClusterQuality, QualityValidator};

/// Partitions the rows for every k in `2..=min(max_clusters, rows / 2)` and
/// keeps the k with the highest silhouette (the smallest such k on ties).
///
/// Every run is seeded, so the same input always yields the same partition.
/// With fewer than four rows there is no k to try and the strategy answers
/// with [`Knn`].
#[derive(Debug, Clone)]
pub struct Partition {
    seed: u64,
    n_init: usize,
    max_iter: usize,
    max_clusters: usize,
}

impl Default for Partition {
    fn default() -> Self {
        Self {
            seed: 42,
            n_init: 10,
            max_iter: 300,
            max_clusters: 10,
        }
    }
}

impl Partition {
    /// Strategy with seed 42, 10 restarts and k ≤ 10.
    pub fn new() -> Self {
        Self::default()
    }

    /// Strategy configured from engine settings.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            seed: config.seed,
            n_init: config.kmeans_restarts,
            max_iter: config.kmeans_max_iter,
            max_clusters: config.max_kmeans_clusters,
        }
    }

    /// Set the seed shared by every run.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the number of restarts per k.
    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    /// Set the largest k tried.
    pub fn with_max_clusters(mut self, max_clusters: usize) -> Self {
        self.max_clusters = max_clusters;
        self
    }

    /// Candidate cluster counts for `rows` rows; empty below four rows.
    pub fn candidate_counts(&self, rows: usize) -> std::ops::RangeInclusive<usize> {
        2..=self.max_clusters.min(rows / 2)
    }

    fn kmeans(&self, k: usize) -> Kmeans {
        Kmeans::new(k)
            .with_seed(self.seed)
            .with_n_init(self.n_init)
            .with_max_iter(self.max_iter)
    }
}

impl NeighborStrategy for Partition {
    fn name(&self) -> &'static str {
        "kmeans"
    }

    fn neighbors(&self, data: ArrayView2<'_, f64>, selected: usize, n: usize) -> Result<Neighbors> {
        check_selected(data, selected)?;
        let candidates = self.candidate_counts(data.nrows());
        if candidates.is_empty() {
            tracing::debug!(rows = data.nrows(), "too few rows to partition, using nearest neighbors");
            return Knn.neighbors(data, selected, n);
        }

        let distances = pairwise(data, Metric::Euclidean);

        let mut best: Option<(f64, KmeansFit)> = None;
        for k in candidates {
            let fit = self
                .kmeans(k)
                .fit(data)
                .map_err(|e| e.in_algorithm(self.name()))?;
            let score = QualityValidator::separation(&distances, &fit.labels);
            tracing::debug!(k, silhouette = score, inertia = fit.inertia, "kmeans candidate");
            if best.as_ref().is_none_or(|(top, _)| score > *top) {
                best = Some((score, fit));
            }
        }
        let (score, fit) = best.ok_or(Error::AlgorithmExecution {
            algorithm: "kmeans",
            reason: "no candidate cluster count".to_string(),
        })?;
        let n_clusters = fit.centroids.nrows();

        let ranking = rank(&distances.row(selected).to_vec());
        let members = same_group(&ranking, &fit.labels, selected);
        let indices = pad_with_closest(&ranking, &members, selected, n);

        let quality = ClusterQuality::new(self.name())
            .with_silhouette(score)
            .with_clusters(n_clusters)
            .with_partition(calinski_harabasz(data, &fit.labels), fit.inertia);

        Ok(Neighbors { indices, quality })
    }
}
