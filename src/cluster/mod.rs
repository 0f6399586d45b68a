//! Clustering primitives the neighbor strategies are built on.
//!
//! ## Algorithms
//!
//! ### K-means
//!
//! Assign each point to the nearest centroid, then move centroids to the mean
//! of their points. Repeat.
//!
//! **Objective**: Minimize within-cluster sum of squares:
//!
//! ```text
//! J = Σ_k Σ_{x ∈ C_k} ||x - μ_k||²
//! ```
//!
//! **Assumptions**: roughly spherical clusters of similar size, k known in
//! advance (the partition strategy searches k by silhouette).
//!
//! ### DBSCAN
//!
//! Grows clusters from dense cores; points in sparse regions are labelled
//! noise. No k needed, but ε is data dependent (the density strategy derives
//! it from the k-distance distribution).
//!
//! | | K-means | DBSCAN |
//! |---|---|---|
//! | Cluster count | given | discovered |
//! | Noise | none | explicit |
//! | Shape | convex | arbitrary |
//!
//! ## Usage
//!
//! ```rust
//! use ndarray::array;
//! use reposim::cluster::{Dbscan, Kmeans};
//!
//! let data = array![[0.0, 0.0], [0.1, 0.1], [10.0, 10.0], [10.1, 10.1]];
//!
//! let labels = Kmeans::new(2).with_seed(42).fit_predict(data.view()).unwrap();
//! assert_eq!(labels[0], labels[1]);
//! assert_ne!(labels[0], labels[2]);
//!
//! let fit = Dbscan::new(0.5, 2).fit(data.view()).unwrap();
//! assert_eq!(fit.n_clusters, 2);
//! ```

mod dbscan;
mod kmeans;

pub use dbscan::{Dbscan, DbscanFit};
pub use kmeans::{Kmeans, KmeansFit};
