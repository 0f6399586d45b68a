//! Neighbor strategies: given processed rows and a selected row, pick the
//! rows most similar to it.
//!
//! | Strategy | Grouping | Distance | Chosen by `auto` |
//! |---|---|---|---|
//! | [`Knn`] | none | cosine | fewer than 10 rows |
//! | [`Partition`] | k-means, k by silhouette | Euclidean | 10 to 49 rows |
//! | [`Density`] | DBSCAN, data-driven ε | Euclidean | 50 rows or more |
//! | [`RawEuclidean`] | none | Euclidean on raw counters | never (fallback) |
//!
//! Grouping strategies return members of the selected row's group first
//! (closest first) and pad with the closest remaining rows, so every
//! strategy returns `min(n, rows - 1)` neighbors.

use std::fmt;
use std::str::FromStr;

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::quality::ClusterQuality;

mod density;
mod fallback;
mod knn;
mod padding;
mod partition;

pub use density::{Density, NoisePolicy, MIN_EPS};
pub use fallback::RawEuclidean;
pub use knn::Knn;
pub use padding::{pad_with_closest, same_group};
pub use partition::Partition;

/// Neighbor set for one selected row.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbors {
    /// Neighbor row indices, most similar first; never contains the selected row.
    pub indices: Vec<usize>,
    /// Diagnostics of the run that produced them.
    pub quality: ClusterQuality,
}

/// A way of choosing neighbors for a selected row.
pub trait NeighborStrategy {
    /// Name reported in quality diagnostics.
    fn name(&self) -> &'static str;

    /// Up to `n` neighbors of row `selected` of `data`.
    fn neighbors(&self, data: ArrayView2<'_, f64>, selected: usize, n: usize) -> Result<Neighbors>;
}

/// Requested algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Choose by dataset size.
    #[default]
    Auto,
    /// Cosine nearest neighbors.
    Knn,
    /// Density clustering.
    Dbscan,
    /// Partitioning with k chosen by silhouette.
    Kmeans,
}

impl Algorithm {
    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Auto => "auto",
            Algorithm::Knn => "knn",
            Algorithm::Dbscan => "dbscan",
            Algorithm::Kmeans => "kmeans",
        }
    }

    /// Concrete algorithm for a dataset of `rows` rows. Pinned algorithms
    /// are returned unchanged.
    pub fn resolve(self, rows: usize, config: &EngineConfig) -> Algorithm {
        match self {
            Algorithm::Auto if rows < config.auto_knn_below => Algorithm::Knn,
            Algorithm::Auto if rows < config.auto_dbscan_from => Algorithm::Kmeans,
            Algorithm::Auto => Algorithm::Dbscan,
            pinned => pinned,
        }
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Algorithm::Auto),
            "knn" => Ok(Algorithm::Knn),
            "dbscan" => Ok(Algorithm::Dbscan),
            "kmeans" => Ok(Algorithm::Kmeans),
            _ => Err(Error::UnknownAlgorithm(s.to_string())),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve `hint` against the dataset size and build its strategy.
///
/// Returns the concrete algorithm alongside the strategy.
pub fn select_algorithm(
    hint: Algorithm,
    rows: usize,
    config: &EngineConfig,
) -> (Algorithm, Box<dyn NeighborStrategy + Send + Sync>) {
    let chosen = hint.resolve(rows, config);
    tracing::info!(hint = %hint, algorithm = %chosen, rows, "algorithm selected");

    let strategy: Box<dyn NeighborStrategy + Send + Sync> = match chosen {
        Algorithm::Auto | Algorithm::Knn => Box::new(Knn),
        Algorithm::Dbscan => Box::new(Density::from_config(config)),
        Algorithm::Kmeans => Box::new(Partition::from_config(config)),
    };
    (chosen, strategy)
}

pub(crate) fn check_selected(data: ArrayView2<'_, f64>, selected: usize) -> Result<()> {
    if data.nrows() == 0 {
        return Err(Error::EmptyInput);
    }
    if selected >= data.nrows() {
        return Err(Error::InvalidParameter {
            name: "selected",
            message: "row index out of range",
        });
    }
    Ok(())
}
