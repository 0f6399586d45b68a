//! K-means clustering.
//!
//! Partitions data into k clusters by minimizing **within-cluster sum of squares**
//! (WCSS, reported as *inertia*):
//!
//! ```text
//! WCSS = Σₖ Σᵢ∈Cₖ ||xᵢ - μₖ||²
//! ```
//!
//! # Lloyd's Algorithm
//!
//! 1. Initialize k centroids with k-means++
//! 2. **Assign**: each point → nearest centroid
//! 3. **Update**: each centroid → mean of assigned points
//! 4. Repeat until the centroid shift drops below `tol`
//!
//! Lloyd only finds a local optimum, so [`Kmeans::fit`] runs `n_init`
//! independent k-means++ initialisations from one seeded RNG stream and keeps
//! the run with the lowest inertia. With a seed the result is reproducible.
//!
//! ## K-means++ Initialization
//!
//! 1. Choose the first centroid uniformly at random
//! 2. Choose each next centroid with probability proportional to D(x)²,
//!    the squared distance to the nearest existing centroid

use crate::distance::squared_euclidean;
use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView2};
use rand::prelude::*;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// K-means clustering algorithm.
#[derive(Debug, Clone)]
pub struct Kmeans {
    /// Number of clusters.
    k: usize,
    /// Maximum iterations per run.
    max_iter: usize,
    /// Convergence tolerance on total squared centroid shift.
    tol: f64,
    /// Number of k-means++ restarts.
    n_init: usize,
    /// Random seed.
    seed: Option<u64>,
}

/// Outcome of a k-means fit.
#[derive(Debug, Clone)]
pub struct KmeansFit {
    /// Cluster label per point, in `0..k`.
    pub labels: Vec<usize>,
    /// `k × d` centroids.
    pub centroids: Array2<f64>,
    /// Sum of squared distances of points to their centroid.
    pub inertia: f64,
}

impl Kmeans {
    /// Create a new K-means clusterer.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iter: 300,
            tol: 1e-4,
            n_init: 1,
            seed: None,
        }
    }

    /// Set maximum iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set convergence tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set the number of restarts; the lowest-inertia run wins.
    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init.max(1);
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of clusters.
    pub fn n_clusters(&self) -> usize {
        self.k
    }

    /// Fit and return labels only.
    pub fn fit_predict(&self, data: ArrayView2<'_, f64>) -> Result<Vec<usize>> {
        Ok(self.fit(data)?.labels)
    }

    /// Fit the model, returning labels, centroids and inertia.
    pub fn fit(&self, data: ArrayView2<'_, f64>) -> Result<KmeansFit> {
        let n = data.nrows();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if self.k == 0 || self.k > n {
            return Err(Error::InvalidClusterCount {
                requested: self.k,
                n_items: n,
            });
        }

        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };

        let mut best: Option<KmeansFit> = None;
        for _ in 0..self.n_init {
            let fit = self.fit_once(data, &mut rng);
            if best.as_ref().is_none_or(|b| fit.inertia < b.inertia) {
                best = Some(fit);
            }
        }
        best.ok_or(Error::EmptyInput)
    }

    fn fit_once(&self, data: ArrayView2<'_, f64>, rng: &mut impl Rng) -> KmeansFit {
        let (n, d) = data.dim();
        let mut centroids = self.init_centroids(data, rng);
        let mut labels = vec![0usize; n];

        for _iter in 0..self.max_iter {
            self.assign(data, &centroids, &mut labels);

            // Update step
            let mut new_centroids = Array2::zeros((self.k, d));
            let mut counts = vec![0usize; self.k];
            for (i, &k) in labels.iter().enumerate() {
                let mut row = new_centroids.row_mut(k);
                row += &data.row(i);
                counts[k] += 1;
            }
            for k in 0..self.k {
                if counts[k] > 0 {
                    let c = counts[k] as f64;
                    new_centroids.row_mut(k).mapv_inplace(|x| x / c);
                } else {
                    // Empty cluster: reinitialize randomly
                    let idx = rng.random_range(0..n);
                    new_centroids.row_mut(k).assign(&data.row(idx));
                }
            }

            let shift: f64 = centroids
                .iter()
                .zip(new_centroids.iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum();

            centroids = new_centroids;

            if shift < self.tol {
                break;
            }
        }

        // Labels must match the final centroids.
        self.assign(data, &centroids, &mut labels);
        let inertia = labels
            .iter()
            .enumerate()
            .map(|(i, &k)| squared_euclidean(data.row(i), centroids.row(k)))
            .sum();

        KmeansFit {
            labels,
            centroids,
            inertia,
        }
    }

    /// Assignment step: nearest centroid, lowest index on ties.
    fn assign(&self, data: ArrayView2<'_, f64>, centroids: &Array2<f64>, labels: &mut [usize]) {
        let nearest = |i: usize| {
            let point = data.row(i);
            let mut best_cluster = 0;
            let mut best_dist = f64::MAX;
            for k in 0..self.k {
                let dist = squared_euclidean(point, centroids.row(k));
                if dist < best_dist {
                    best_dist = dist;
                    best_cluster = k;
                }
            }
            best_cluster
        };

        #[cfg(feature = "parallel")]
        labels
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, label)| *label = nearest(i));

        #[cfg(not(feature = "parallel"))]
        for (i, label) in labels.iter_mut().enumerate() {
            *label = nearest(i);
        }
    }

    /// Initialize centroids using k-means++ algorithm.
    fn init_centroids(&self, data: ArrayView2<'_, f64>, rng: &mut impl Rng) -> Array2<f64> {
        let (n, d) = data.dim();
        let mut centroids = Array2::zeros((self.k, d));

        // First centroid: random point
        let first = rng.random_range(0..n);
        centroids.row_mut(0).assign(&data.row(first));

        // Remaining centroids: k-means++ selection
        for i in 1..self.k {
            let distances: Vec<f64> = (0..n)
                .map(|j| {
                    (0..i)
                        .map(|c| squared_euclidean(data.row(j), centroids.row(c)))
                        .fold(f64::MAX, f64::min)
                })
                .collect();

            // Sample proportional to squared distance
            let total: f64 = distances.iter().sum();
            if total == 0.0 {
                let idx = rng.random_range(0..n);
                centroids.row_mut(i).assign(&data.row(idx));
                continue;
            }

            let threshold = rng.random::<f64>() * total;
            let mut cumsum = 0.0;
            let mut selected = n - 1;
            for (j, &d) in distances.iter().enumerate() {
                cumsum += d;
                if cumsum >= threshold {
                    selected = j;
                    break;
                }
            }

            centroids.row_mut(i).assign(&data.row(selected));
        }

        centroids
    }
}
