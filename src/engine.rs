//! The similarity engine: one call from repositories to a response.
//!
//! ```text
//! extract ─▶ weight/scale/reduce ─▶ select ─▶ strategy ─▶ quality ─▶ assemble
//!    │              │                            │
//!    └──────────────┴──── any failure ───────────┴─▶ raw-counter fallback
//! ```
//!
//! Only an unknown algorithm hint or a selected repository missing from the
//! input escape as errors; every other failure degrades to the fallback
//! path and is logged with `tracing::warn!`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::features::{basic_counter_matrix, FeatureExtractor, WeightTable};
use crate::model::{BasicCounter, MetricStore, RepoId, RepositoryRecord};
use crate::quality::QualityValidator;
use crate::result::{ClusteringResult, ResultAssembler};
use crate::strategy::{select_algorithm, Algorithm, NeighborStrategy, Neighbors, RawEuclidean};

fn default_algorithm() -> String {
    Algorithm::Auto.as_str().to_string()
}

/// One similarity query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRequest {
    /// Dataset the repositories belong to; used for logging.
    pub dataset_id: String,
    /// Name of the repository to find neighbors for.
    pub selected: String,
    /// Number of neighbors wanted.
    pub n: usize,
    /// `auto`, `knn`, `dbscan` or `kmeans`, any case.
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
}

impl ClusterRequest {
    /// Request with the `auto` hint.
    pub fn new(dataset_id: impl Into<String>, selected: impl Into<String>, n: usize) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            selected: selected.into(),
            n,
            algorithm: default_algorithm(),
        }
    }

    /// Set the algorithm hint.
    pub fn with_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithm = algorithm.into();
        self
    }

    /// Boundary check for callers exposing the engine: `0 < n < repo_count`.
    ///
    /// [`SimilarityEngine::cluster`] itself accepts any `n` and returns at
    /// most `repo_count - 1` neighbors.
    pub fn validate(&self, repo_count: usize) -> Result<()> {
        let max = repo_count.saturating_sub(1);
        if self.n == 0 || self.n > max {
            return Err(Error::InvalidNeighborCount { n: self.n, max });
        }
        Ok(())
    }
}

/// Finds the repositories most similar to a selected one.
///
/// Holds configuration only; one engine can serve concurrent calls.
#[derive(Debug, Clone, Default)]
pub struct SimilarityEngine {
    config: EngineConfig,
    extractor: FeatureExtractor,
}

impl SimilarityEngine {
    /// Engine with default configuration and weights.
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with the given configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            extractor: FeatureExtractor::new(),
        }
    }

    /// Replace the feature weight table.
    pub fn with_weights(mut self, weights: WeightTable) -> Self {
        self.extractor = self.extractor.with_weights(weights);
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Neighbors of `request.selected` among `repos`.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownAlgorithm`] before any computation
    /// - [`Error::RepositoryNotFound`] when no repository has the selected name
    ///
    /// Every other failure degrades to the raw-counter fallback.
    /// `RepositoryNotFound` is the one exception besides the algorithm hint:
    /// without a selected row the fallback has nothing to rank against.
    pub fn cluster(
        &self,
        repos: &[RepositoryRecord],
        store: &dyn MetricStore,
        request: &ClusterRequest,
    ) -> Result<ClusteringResult> {
        let hint: Algorithm = request.algorithm.parse()?;
        let selected = repos
            .iter()
            .position(|r| r.name == request.selected)
            .ok_or_else(|| Error::RepositoryNotFound(request.selected.clone()))?;

        match self.run_pipeline(repos, store, request, selected, hint) {
            Ok(result) => Ok(result),
            Err(e) if e.is_contract_violation() => Err(e),
            Err(e) => {
                tracing::warn!(
                    dataset_id = %request.dataset_id,
                    selected = %request.selected,
                    error = %e,
                    "clustering failed, falling back to raw counters"
                );
                self.fallback(repos, store, selected, request.n)
            }
        }
    }

    fn run_pipeline(
        &self,
        repos: &[RepositoryRecord],
        store: &dyn MetricStore,
        request: &ClusterRequest,
        selected: usize,
        hint: Algorithm,
    ) -> Result<ClusteringResult> {
        let features = self.extractor.extract(repos, store, &request.dataset_id)?;
        let processed = self.config.preprocessor().process(&features)?;

        let (algorithm, strategy) = select_algorithm(hint, processed.data.nrows(), &self.config);
        let neighbors = finalize(strategy.neighbors(processed.data.view(), selected, request.n)?);

        let metrics = store.values_by_repo(&reported_ids(repos, selected, &neighbors))?;

        tracing::debug!(
            dataset_id = %request.dataset_id,
            algorithm = %algorithm,
            found = neighbors.indices.len(),
            silhouette = neighbors.quality.silhouette_score,
            "clustering complete"
        );

        Ok(ResultAssembler::new(repos, &processed.data, &metrics).assemble(
            selected,
            neighbors,
            algorithm.as_str(),
            features.n_features(),
        ))
    }

    fn fallback(
        &self,
        repos: &[RepositoryRecord],
        store: &dyn MetricStore,
        selected: usize,
        n: usize,
    ) -> Result<ClusteringResult> {
        let data = basic_counter_matrix(repos);
        let strategy = RawEuclidean;
        let neighbors = finalize(strategy.neighbors(data.view(), selected, n)?);

        let metrics = store
            .values_by_repo(&reported_ids(repos, selected, &neighbors))
            .unwrap_or_else(|e| {
                tracing::debug!(error = %e, "metrics unavailable, responding without them");
                BTreeMap::new()
            });

        Ok(ResultAssembler::new(repos, &data, &metrics).assemble(
            selected,
            neighbors,
            strategy.name(),
            BasicCounter::ALL.len(),
        ))
    }
}

fn finalize(neighbors: Neighbors) -> Neighbors {
    Neighbors {
        quality: QualityValidator::finalize(neighbors.quality),
        ..neighbors
    }
}

/// Ids whose metrics appear in the response: the selected repository and
/// its neighbors.
fn reported_ids(repos: &[RepositoryRecord], selected: usize, neighbors: &Neighbors) -> Vec<RepoId> {
    std::iter::once(selected)
        .chain(neighbors.indices.iter().copied())
        .map(|i| repos[i].id.clone())
        .collect()
}
