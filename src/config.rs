//! Engine configuration.
//!
//! Every field has a default, so an empty TOML file is a valid
//! configuration:
//!
//! ```toml
//! pca_threshold = 10
//! max_components = 10
//! seed = 42
//! kmeans_restarts = 10
//! kmeans_max_iter = 300
//! max_kmeans_clusters = 10
//! dbscan_eps_percentile = 75.0
//! dbscan_max_k = 4
//! noise_policy = "nearest_neighbors"
//! auto_knn_below = 10
//! auto_dbscan_from = 50
//! ```
//!
//! ```
//! use reposim::EngineConfig;
//!
//! let config = EngineConfig::from_toml_str("seed = 7").unwrap();
//! assert_eq!(config.seed, 7);
//! assert_eq!(config.pca_threshold, 10);
//! config.validate().unwrap();
//! ```

use std::env;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::preprocess::WeightedPreprocessor;
use crate::strategy::NoisePolicy;

/// Tunables of the clustering pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// PCA runs when the feature count exceeds this.
    pub pca_threshold: usize,
    /// Upper bound on PCA components.
    pub max_components: usize,
    /// Seed for every k-means run.
    pub seed: u64,
    /// k-means++ restarts per candidate k.
    pub kmeans_restarts: usize,
    /// Lloyd iterations per restart.
    pub kmeans_max_iter: usize,
    /// Largest k tried by the partition strategy.
    pub max_kmeans_clusters: usize,
    /// Percentile of k-distances used as DBSCAN ε.
    pub dbscan_eps_percentile: f64,
    /// Upper bound on k for the k-distance.
    pub dbscan_max_k: usize,
    /// What DBSCAN does when the selected repository is noise.
    pub noise_policy: NoisePolicy,
    /// `auto` uses knn below this many repositories.
    pub auto_knn_below: usize,
    /// `auto` uses dbscan from this many repositories on.
    pub auto_dbscan_from: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pca_threshold: 10,
            max_components: 10,
            seed: 42,
            kmeans_restarts: 10,
            kmeans_max_iter: 300,
            max_kmeans_clusters: 10,
            dbscan_eps_percentile: 75.0,
            dbscan_max_k: 4,
            noise_policy: NoisePolicy::NearestNeighbors,
            auto_knn_below: 10,
            auto_dbscan_from: 50,
        }
    }
}

impl EngineConfig {
    /// Load from a TOML file.
    ///
    /// # Errors
    /// `Error::Config` if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read config file '{}': {}", path.display(), e))
        })?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("failed to parse TOML in '{}': {}", path.display(), e)))
    }

    /// Parse from a TOML string.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        toml::from_str(toml).map_err(|e| Error::Config(format!("failed to parse TOML: {e}")))
    }

    /// Serialize to a TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(format!("failed to serialize to TOML: {e}")))
    }

    /// Apply `REPOSIM_*` environment overrides.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `REPOSIM_PCA_THRESHOLD` | `pca_threshold` |
    /// | `REPOSIM_MAX_COMPONENTS` | `max_components` |
    /// | `REPOSIM_SEED` | `seed` |
    /// | `REPOSIM_KMEANS_RESTARTS` | `kmeans_restarts` |
    /// | `REPOSIM_KMEANS_MAX_ITER` | `kmeans_max_iter` |
    /// | `REPOSIM_MAX_KMEANS_CLUSTERS` | `max_kmeans_clusters` |
    /// | `REPOSIM_DBSCAN_EPS_PERCENTILE` | `dbscan_eps_percentile` |
    /// | `REPOSIM_DBSCAN_MAX_K` | `dbscan_max_k` |
    /// | `REPOSIM_NOISE_POLICY` | `noise_policy` (`nearest_neighbors` or `closest_points`) |
    /// | `REPOSIM_AUTO_KNN_BELOW` | `auto_knn_below` |
    /// | `REPOSIM_AUTO_DBSCAN_FROM` | `auto_dbscan_from` |
    ///
    /// Unparseable values are ignored.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        override_from_env("REPOSIM_PCA_THRESHOLD", &mut self.pca_threshold);
        override_from_env("REPOSIM_MAX_COMPONENTS", &mut self.max_components);
        override_from_env("REPOSIM_SEED", &mut self.seed);
        override_from_env("REPOSIM_KMEANS_RESTARTS", &mut self.kmeans_restarts);
        override_from_env("REPOSIM_KMEANS_MAX_ITER", &mut self.kmeans_max_iter);
        override_from_env("REPOSIM_MAX_KMEANS_CLUSTERS", &mut self.max_kmeans_clusters);
        override_from_env("REPOSIM_DBSCAN_EPS_PERCENTILE", &mut self.dbscan_eps_percentile);
        override_from_env("REPOSIM_DBSCAN_MAX_K", &mut self.dbscan_max_k);
        override_from_env("REPOSIM_AUTO_KNN_BELOW", &mut self.auto_knn_below);
        override_from_env("REPOSIM_AUTO_DBSCAN_FROM", &mut self.auto_dbscan_from);

        if let Ok(val) = env::var("REPOSIM_NOISE_POLICY") {
            match val.trim().to_ascii_lowercase().as_str() {
                "nearest_neighbors" => self.noise_policy = NoisePolicy::NearestNeighbors,
                "closest_points" => self.noise_policy = NoisePolicy::ClosestPoints,
                other => tracing::warn!(value = other, "ignoring unknown REPOSIM_NOISE_POLICY"),
            }
        }

        self
    }

    /// Check value ranges.
    ///
    /// # Errors
    /// `Error::Config` naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.max_components == 0 {
            return Err(Error::Config("max_components must be at least 1".into()));
        }
        if self.kmeans_restarts == 0 {
            return Err(Error::Config("kmeans_restarts must be at least 1".into()));
        }
        if self.kmeans_max_iter == 0 {
            return Err(Error::Config("kmeans_max_iter must be at least 1".into()));
        }
        if self.max_kmeans_clusters < 2 {
            return Err(Error::Config("max_kmeans_clusters must be at least 2".into()));
        }
        if !(0.0..=100.0).contains(&self.dbscan_eps_percentile) {
            return Err(Error::Config(format!(
                "dbscan_eps_percentile must be in [0, 100], got {}",
                self.dbscan_eps_percentile
            )));
        }
        if self.dbscan_max_k == 0 {
            return Err(Error::Config("dbscan_max_k must be at least 1".into()));
        }
        if self.auto_knn_below > self.auto_dbscan_from {
            return Err(Error::Config(format!(
                "auto_knn_below ({}) must not exceed auto_dbscan_from ({})",
                self.auto_knn_below, self.auto_dbscan_from
            )));
        }
        Ok(())
    }

    /// Preprocessor with these PCA settings.
    pub fn preprocessor(&self) -> WeightedPreprocessor {
        WeightedPreprocessor::new()
            .with_pca_threshold(self.pca_threshold)
            .with_max_components(self.max_components)
    }
}

fn override_from_env<T: FromStr>(key: &str, field: &mut T) {
    if let Ok(val) = env::var(key) {
        match val.trim().parse::<T>() {
            Ok(parsed) => *field = parsed,
            Err(_) => tracing::warn!(key, value = %val, "ignoring unparseable override"),
        }
    }
}
