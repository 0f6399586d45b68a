//! DBSCAN: Density-Based Spatial Clustering of Applications with Noise.
//!
//! # The Algorithm (Ester et al., 1996)
//!
//! DBSCAN groups points by neighborhood density. Unlike k-means, it:
//!
//! - Discovers clusters of arbitrary shape
//! - Automatically determines the number of clusters
//! - Identifies noise points (outliers)
//!
//! ## Core Concepts
//!
//! - **Epsilon (ε)**: Maximum distance between two points to be neighbors.
//! - **MinPts**: Minimum points within ε, the point itself included, for a
//!   point to be "core".
//! - **Core point**: Has at least MinPts points within ε.
//! - **Border point**: Within ε of a core point but not core itself.
//! - **Noise point**: Neither core nor border.
//!
//! A border point reachable from several clusters joins the first cluster
//! that reaches it, so labels are deterministic for a fixed input order.
//!
//! ## Complexity
//!
//! O(n²) with the precomputed distance matrix used here; repository datasets
//! are tens to hundreds of rows.
//!
//! ## References
//!
//! Ester et al. (1996). "A Density-Based Algorithm for Discovering Clusters
//! in Large Spatial Databases with Noise." KDD-96.

use crate::distance::{pairwise, Metric};
use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView2};

/// DBSCAN clustering algorithm.
#[derive(Debug, Clone)]
pub struct Dbscan {
    /// Epsilon: maximum distance for neighborhood.
    epsilon: f64,
    /// Minimum points for core point classification.
    min_pts: usize,
}

/// Outcome of a DBSCAN fit.
#[derive(Debug, Clone, PartialEq)]
pub struct DbscanFit {
    /// Cluster per point; `None` marks noise.
    pub labels: Vec<Option<usize>>,
    /// Number of clusters found (noise excluded).
    pub n_clusters: usize,
}

impl DbscanFit {
    /// Number of noise points.
    pub fn noise_points(&self) -> usize {
        self.labels.iter().filter(|l| l.is_none()).count()
    }

    /// Labels with noise folded into one extra label `n_clusters`, the form
    /// label-based quality metrics expect.
    pub fn dense_labels(&self) -> Vec<usize> {
        self.labels
            .iter()
            .map(|l| l.unwrap_or(self.n_clusters))
            .collect()
    }
}

impl Dbscan {
    /// Create a new DBSCAN clusterer.
    ///
    /// # Arguments
    ///
    /// * `epsilon` - Maximum distance between two points to be neighbors.
    /// * `min_pts` - Minimum number of points (itself included) to form a dense region.
    pub fn new(epsilon: f64, min_pts: usize) -> Self {
        Self { epsilon, min_pts }
    }

    /// Set epsilon (neighborhood radius).
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Set minimum points for core classification.
    pub fn with_min_pts(mut self, min_pts: usize) -> Self {
        self.min_pts = min_pts;
        self
    }

    /// Fit on raw points with Euclidean distance.
    pub fn fit(&self, data: ArrayView2<'_, f64>) -> Result<DbscanFit> {
        if data.nrows() == 0 {
            return Err(Error::EmptyInput);
        }
        self.fit_precomputed(&pairwise(data, Metric::Euclidean))
    }

    /// Fit on a precomputed symmetric distance matrix.
    pub fn fit_precomputed(&self, distances: &Array2<f64>) -> Result<DbscanFit> {
        let n = distances.nrows();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if distances.ncols() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                found: distances.ncols(),
            });
        }
        if self.epsilon.is_nan() || self.epsilon <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "epsilon",
                message: "must be positive",
            });
        }
        if self.min_pts == 0 {
            return Err(Error::InvalidParameter {
                name: "min_pts",
                message: "must be at least 1",
            });
        }

        let region_query = |p: usize| -> Vec<usize> {
            (0..n)
                .filter(|&q| q != p && distances[[p, q]] <= self.epsilon)
                .collect()
        };

        let mut labels: Vec<Option<usize>> = vec![None; n];
        let mut visited = vec![false; n];
        let mut cluster_id = 0;

        for point in 0..n {
            if visited[point] {
                continue;
            }
            visited[point] = true;

            let neighbors = region_query(point);
            // MinPts includes the point itself
            if neighbors.len() + 1 < self.min_pts {
                // Noise for now; may become a border point later.
                continue;
            }

            labels[point] = Some(cluster_id);
            let mut to_process = neighbors;
            while let Some(q) = to_process.pop() {
                if labels[q].is_none() {
                    labels[q] = Some(cluster_id);
                }
                if visited[q] {
                    continue;
                }
                visited[q] = true;

                let q_neighbors = region_query(q);
                if q_neighbors.len() + 1 >= self.min_pts {
                    to_process.extend(
                        q_neighbors
                            .into_iter()
                            .filter(|&r| !visited[r] || labels[r].is_none()),
                    );
                }
            }
            cluster_id += 1;
        }

        Ok(DbscanFit {
            labels,
            n_clusters: cluster_id,
        })
    }
}

impl Default for Dbscan {
    fn default() -> Self {
        Self::new(0.5, 5)
    }
}
