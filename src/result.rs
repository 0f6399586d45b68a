//! Response assembly.
//!
//! The response lists the selected repository, every other repository
//! (neighbors first, in neighbor order, flagged `near`), and a
//! `clustering_info` block describing the run.

use std::collections::BTreeMap;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::distance::euclidean;
use crate::model::{BasicCounters, MetricId, RepoId, RepositoryRecord};
use crate::preprocess::coordinates;
use crate::quality::ClusterQuality;
use crate::strategy::Neighbors;

/// Metric values of one repository, keyed by metric id.
pub type MetricMap = BTreeMap<MetricId, f64>;

/// The repository neighbors were computed for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedRepository {
    /// Repository id.
    pub id: RepoId,
    /// Display name, `owner/repo`.
    pub name: String,
    /// Primary language, when known.
    #[serde(default)]
    pub language: Option<String>,
    /// Raw counters, flattened into the JSON object.
    #[serde(flatten)]
    pub counters: BasicCounters,
    /// First processed coordinate.
    pub x: f64,
    /// Second processed coordinate, 0 for single-column data.
    pub y: f64,
    /// Stored metric values; empty when the store has none or failed.
    #[serde(default)]
    pub metrics: MetricMap,
}

/// Any other repository of the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryEntry {
    /// Repository id.
    pub id: RepoId,
    /// Display name, `owner/repo`.
    pub name: String,
    /// Whether the repository is one of the returned neighbors.
    pub near: bool,
    /// Euclidean distance to the selected repository in processed space.
    pub distance: f64,
    /// First processed coordinate.
    pub x: f64,
    /// Second processed coordinate.
    pub y: f64,
    /// Present for neighbors only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricMap>,
}

/// How the neighbors were found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteringInfo {
    /// Algorithm chosen for the run (`fallback` on the degraded path).
    pub algorithm: String,
    /// Diagnostics reported by the strategy.
    pub quality_metrics: ClusterQuality,
    /// Columns of the matrix the strategy ran on, before reduction.
    pub features_used: usize,
    /// Repositories in the dataset, selected one included.
    pub total_repositories: usize,
    /// Neighbors returned.
    pub similar_found: usize,
}

/// Full response of one clustering call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteringResult {
    /// The repository neighbors were computed for.
    pub selected: SelectedRepository,
    /// Every other repository, neighbors first.
    pub repos: Vec<RepositoryEntry>,
    /// How the neighbors were found.
    pub clustering_info: ClusteringInfo,
}

impl ClusteringResult {
    /// Indented JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Entries flagged `near`, in neighbor order.
    pub fn neighbors(&self) -> impl Iterator<Item = &RepositoryEntry> {
        self.repos.iter().filter(|r| r.near)
    }

    /// Names of the neighbors, in neighbor order.
    pub fn neighbor_names(&self) -> Vec<&str> {
        self.neighbors().map(|r| r.name.as_str()).collect()
    }
}

/// Inputs shared by every entry of one response.
pub struct ResultAssembler<'a> {
    repos: &'a [RepositoryRecord],
    data: &'a Array2<f64>,
    metrics: &'a BTreeMap<RepoId, MetricMap>,
}

impl<'a> ResultAssembler<'a> {
    /// `data` must be row-aligned with `repos`; `metrics` may miss
    /// repositories, which then get an empty map.
    pub fn new(
        repos: &'a [RepositoryRecord],
        data: &'a Array2<f64>,
        metrics: &'a BTreeMap<RepoId, MetricMap>,
    ) -> Self {
        Self { repos, data, metrics }
    }

    /// Build the response for `selected`.
    pub fn assemble(
        &self,
        selected: usize,
        neighbors: Neighbors,
        algorithm: &str,
        features_used: usize,
    ) -> ClusteringResult {
        let origin = &self.repos[selected];
        let (x, y) = coordinates(self.data, selected);
        let selected_repo = SelectedRepository {
            id: origin.id.clone(),
            name: origin.name.clone(),
            language: origin.language.clone(),
            counters: origin.counters,
            x,
            y,
            metrics: self.metrics_of(origin),
        };

        let mut repos = Vec::with_capacity(self.repos.len().saturating_sub(1));
        for &i in &neighbors.indices {
            repos.push(self.entry(selected, i, true));
        }
        for i in 0..self.repos.len() {
            if i != selected && !neighbors.indices.contains(&i) {
                repos.push(self.entry(selected, i, false));
            }
        }

        ClusteringResult {
            selected: selected_repo,
            repos,
            clustering_info: ClusteringInfo {
                algorithm: algorithm.to_string(),
                quality_metrics: neighbors.quality,
                features_used,
                total_repositories: self.repos.len(),
                similar_found: neighbors.indices.len(),
            },
        }
    }

    fn entry(&self, selected: usize, i: usize, near: bool) -> RepositoryEntry {
        let repo = &self.repos[i];
        let (x, y) = coordinates(self.data, i);
        RepositoryEntry {
            id: repo.id.clone(),
            name: repo.name.clone(),
            near,
            distance: euclidean(self.data.row(i), self.data.row(selected)),
            x,
            y,
            metrics: near.then(|| self.metrics_of(repo)),
        }
    }

    fn metrics_of(&self, repo: &RepositoryRecord) -> MetricMap {
        self.metrics.get(&repo.id).cloned().unwrap_or_default()
    }
}
