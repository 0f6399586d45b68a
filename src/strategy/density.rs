//! DBSCAN-based neighbors with a data-driven radius.
//!
//! ε is the `eps_percentile`-th percentile of every row's k-th nearest
//! neighbor distance, the row itself counted as the first neighbor and
//! `k = min(max_k, rows - 1)`. The minimum density is
//! `max(2, rows / 10)` rows, the row itself included.
//!
//! If the selected row lands in a cluster, the other members come first
//! (closest first) and the closest remaining rows pad the list. If it is
//! noise, [`NoisePolicy`] decides what happens.

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use super::{check_selected, pad_with_closest, same_group, Knn, NeighborStrategy, Neighbors};
use crate::cluster::Dbscan;
use crate::config::EngineConfig;
use crate::distance::{pairwise, rank, Metric};
use crate::error::{Error, Result};
use crate::preprocess::quantile;
use crate::quality::{ClusterQuality, QualityValidator};

/// Lower bound on ε, so identical rows still form a cluster.
pub const MIN_EPS: f64 = 1e-9;

/// What to return when the selected row is noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoisePolicy {
    /// Answer with cosine nearest neighbors ([`Knn`]) instead.
    #[default]
    NearestNeighbors,
    /// Keep the DBSCAN diagnostics and return the closest rows by Euclidean
    /// distance.
    ClosestPoints,
}

/// DBSCAN neighbor strategy.
#[derive(Debug, Clone)]
pub struct Density {
    eps_percentile: f64,
    max_k: usize,
    noise_policy: NoisePolicy,
}

impl Default for Density {
    fn default() -> Self {
        Self {
            eps_percentile: 75.0,
            max_k: 4,
            noise_policy: NoisePolicy::NearestNeighbors,
        }
    }
}

impl Density {
    /// Strategy with the default radius estimate (75th percentile, k ≤ 4).
    pub fn new() -> Self {
        Self::default()
    }

    /// Strategy configured from engine settings.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            eps_percentile: config.dbscan_eps_percentile,
            max_k: config.dbscan_max_k,
            noise_policy: config.noise_policy,
        }
    }

    /// Percentile (0 to 100) of k-distances used as ε.
    pub fn with_eps_percentile(mut self, percentile: f64) -> Self {
        self.eps_percentile = percentile;
        self
    }

    /// Upper bound on k for the k-distance.
    pub fn with_max_k(mut self, max_k: usize) -> Self {
        self.max_k = max_k;
        self
    }

    /// Behaviour when the selected row is noise.
    pub fn with_noise_policy(mut self, policy: NoisePolicy) -> Self {
        self.noise_policy = policy;
        self
    }

    /// Minimum neighborhood size for a core row.
    pub fn min_samples(rows: usize) -> usize {
        (rows / 10).max(2)
    }

    /// ε from a precomputed distance matrix.
    pub fn estimate_eps(&self, distances: &Array2<f64>) -> Result<f64> {
        let rows = distances.nrows();
        if rows < 2 {
            return Err(Error::InsufficientData {
                required: 2,
                found: rows,
            });
        }
        let k = self.max_k.clamp(1, rows - 1);

        let k_distances: Vec<f64> = distances
            .rows()
            .into_iter()
            .map(|row| {
                let mut sorted = row.to_vec();
                sorted.sort_by(f64::total_cmp);
                sorted[k - 1]
            })
            .collect();

        let eps = quantile(&k_distances, self.eps_percentile / 100.0);
        Ok(if eps.is_finite() { eps.max(MIN_EPS) } else { MIN_EPS })
    }
}

impl NeighborStrategy for Density {
    fn name(&self) -> &'static str {
        "dbscan"
    }

    fn neighbors(&self, data: ArrayView2<'_, f64>, selected: usize, n: usize) -> Result<Neighbors> {
        check_selected(data, selected)?;
        let rows = data.nrows();

        let distances = pairwise(data, Metric::Euclidean);
        let eps = self.estimate_eps(&distances).map_err(|e| e.in_algorithm(self.name()))?;
        let min_samples = Self::min_samples(rows);

        let fit = Dbscan::new(eps, min_samples)
            .fit_precomputed(&distances)
            .map_err(|e| e.in_algorithm(self.name()))?;

        tracing::debug!(
            eps,
            min_samples,
            n_clusters = fit.n_clusters,
            noise_points = fit.noise_points(),
            "dbscan fit"
        );

        let ranking = rank(&distances.row(selected).to_vec());
        let members = match (fit.labels[selected], self.noise_policy) {
            (Some(_), _) => same_group(&ranking, &fit.labels, selected),
            (None, NoisePolicy::NearestNeighbors) => {
                tracing::debug!(selected, "selected repository is noise, using nearest neighbors");
                return Knn.neighbors(data, selected, n);
            }
            (None, NoisePolicy::ClosestPoints) => Vec::new(),
        };
        let indices = pad_with_closest(&ranking, &members, selected, n);

        let quality = ClusterQuality::new(self.name())
            .with_silhouette(QualityValidator::separation(&distances, &fit.dense_labels()))
            .with_clusters(fit.n_clusters)
            .with_density(eps, fit.noise_points());

        Ok(Neighbors { indices, quality })
    }
}
