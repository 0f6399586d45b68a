//! # reposim
//!
//! Finds the repositories of a dataset most similar to a selected one, from
//! basic counters (stars, forks, contributors, commits, open issues, lines
//! of code) and any code-quality metrics stored for them.
//!
//! Each call extracts a feature matrix, weights and robust-scales it,
//! reduces it with PCA when it is wide, then runs one of three neighbor
//! strategies (cosine KNN, DBSCAN, k-means) chosen by dataset size or by the
//! caller. Every response carries quality diagnostics for the run. When the
//! pipeline fails the engine answers from the raw counters instead.
//!
//! ```
//! use reposim::{
//!     BasicCounters, ClusterRequest, InMemoryMetricStore, RepositoryRecord, SimilarityEngine,
//! };
//!
//! let repos: Vec<RepositoryRecord> = (1..=6)
//!     .map(|i| {
//!         RepositoryRecord::new(format!("r{i}"), format!("org/repo{i}")).with_counters(
//!             BasicCounters {
//!                 stars: 100 * i,
//!                 forks: 10 * i,
//!                 commits: 1000 + i,
//!                 ..BasicCounters::default()
//!             },
//!         )
//!     })
//!     .collect();
//!
//! let request = ClusterRequest::new("demo", "org/repo3", 2).with_algorithm("knn");
//! let result = SimilarityEngine::new()
//!     .cluster(&repos, &InMemoryMetricStore::new(), &request)
//!     .unwrap();
//!
//! assert_eq!(result.clustering_info.similar_found, 2);
//! assert_eq!(result.repos.len(), 5);
//! ```
//!
//! The crate logs through `tracing` and never installs a subscriber.
//!
//! Enable the `parallel` feature to compute distance matrices and k-means
//! assignments with `rayon`.

pub mod cluster;
pub mod config;
pub mod distance;
pub mod engine;
/// Error types used across `reposim`.
pub mod error;
pub mod features;
pub mod metrics;
pub mod model;
pub mod preprocess;
pub mod quality;
pub mod result;
pub mod strategy;

pub use config::EngineConfig;
pub use engine::{ClusterRequest, SimilarityEngine};
pub use error::{Error, Result};
pub use features::{CanonicalFeature, FeatureExtractor, FeatureMatrix, WeightTable};
pub use metrics::{calinski_harabasz, confidence, silhouette_score, QualityLevel};
pub use model::{
    BasicCounter, BasicCounters, InMemoryMetricStore, MetricDefinition, MetricStore, MetricValue,
    RepositoryRecord, UnavailableMetricStore,
};
pub use preprocess::{ProcessedMatrix, WeightedPreprocessor};
pub use quality::{ClusterQuality, QualityValidator};
pub use result::{ClusteringInfo, ClusteringResult, RepositoryEntry, SelectedRepository};
pub use strategy::{
    select_algorithm, Algorithm, Density, Knn, NeighborStrategy, Neighbors, NoisePolicy, Partition,
    RawEuclidean,
};
