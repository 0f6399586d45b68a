//! Inputs read from the persistence layer.
//!
//! The core never owns these records: it reads repositories, metric
//! definitions and metric values through [`MetricStore`] and drops everything
//! once a response is assembled.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Repository identifier as stored by the persistence layer.
pub type RepoId = String;

/// Metric identifier as stored by the persistence layer.
pub type MetricId = String;

/// The fixed set of counters every repository record carries.
///
/// Declaration order is the column order used when counters are laid out
/// without metric names (the fallback path).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BasicCounter {
    /// GitHub stars.
    Stars,
    /// Forks.
    Forks,
    /// Distinct contributors.
    Contributors,
    /// Commits on the default branch.
    Commits,
    /// Open issues.
    OpenIssues,
    /// Lines of code.
    Loc,
}

impl BasicCounter {
    /// All counters in declaration order.
    pub const ALL: [BasicCounter; 6] = [
        BasicCounter::Stars,
        BasicCounter::Forks,
        BasicCounter::Contributors,
        BasicCounter::Commits,
        BasicCounter::OpenIssues,
        BasicCounter::Loc,
    ];

    /// Feature name of this counter.
    pub fn as_str(&self) -> &'static str {
        match self {
            BasicCounter::Stars => "stars",
            BasicCounter::Forks => "forks",
            BasicCounter::Contributors => "contributors",
            BasicCounter::Commits => "commits",
            BasicCounter::OpenIssues => "open_issues",
            BasicCounter::Loc => "loc",
        }
    }
}

/// Basic counters of a repository. Absent values default to 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicCounters {
    /// GitHub stars.
    pub stars: u64,
    /// Forks.
    pub forks: u64,
    /// Distinct contributors.
    pub contributors: u64,
    /// Commits.
    pub commits: u64,
    /// Open issues.
    pub open_issues: u64,
    /// Lines of code.
    pub loc: u64,
}

impl BasicCounters {
    /// Value of one counter.
    pub fn get(&self, counter: BasicCounter) -> u64 {
        match counter {
            BasicCounter::Stars => self.stars,
            BasicCounter::Forks => self.forks,
            BasicCounter::Contributors => self.contributors,
            BasicCounter::Commits => self.commits,
            BasicCounter::OpenIssues => self.open_issues,
            BasicCounter::Loc => self.loc,
        }
    }

    /// `(counter, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (BasicCounter, u64)> + '_ {
        BasicCounter::ALL.iter().map(move |&c| (c, self.get(c)))
    }
}

/// A repository of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    /// Identifier.
    pub id: RepoId,
    /// Full name, e.g. `owner/repo`.
    pub name: String,
    /// Primary language, when known.
    #[serde(default)]
    pub language: Option<String>,
    /// Basic counters.
    #[serde(flatten)]
    pub counters: BasicCounters,
}

impl RepositoryRecord {
    /// Create a record with zeroed counters.
    pub fn new(id: impl Into<RepoId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            language: None,
            counters: BasicCounters::default(),
        }
    }

    /// Set the primary language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Set the basic counters.
    pub fn with_counters(mut self, counters: BasicCounters) -> Self {
        self.counters = counters;
        self
    }
}

/// Definition of an advanced metric produced by the code-quality scanner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDefinition {
    /// Identifier.
    pub id: MetricId,
    /// Display name, e.g. `Test Coverage`.
    pub name: String,
    /// Human description.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether higher values are better.
    #[serde(default)]
    pub is_upper: Option<bool>,
    /// Category the metric belongs to (`code_qual`, `test_qual`, `tech_debt`).
    #[serde(default)]
    pub category_id: Option<String>,
}

impl MetricDefinition {
    /// Create a definition with only id and name.
    pub fn new(id: impl Into<MetricId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            is_upper: None,
            category_id: None,
        }
    }
}

/// One measured value of a metric for a repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricValue {
    /// Repository the value belongs to.
    #[serde(alias = "id_repo")]
    pub repository_id: RepoId,
    /// Metric the value measures.
    #[serde(alias = "id_metric")]
    pub metric_id: MetricId,
    /// Measured value.
    pub value: f64,
}

impl MetricValue {
    /// Create a value triple.
    pub fn new(repository_id: impl Into<RepoId>, metric_id: impl Into<MetricId>, value: f64) -> Self {
        Self {
            repository_id: repository_id.into(),
            metric_id: metric_id.into(),
            value,
        }
    }
}

/// Read-only access to stored metric definitions and values.
///
/// Implementations may block (database access); the engine calls them
/// synchronously and treats any error as a reason to degrade to the
/// fallback path.
pub trait MetricStore {
    /// All metric definitions.
    fn definitions(&self) -> Result<Vec<MetricDefinition>>;

    /// Values for the given repositories.
    fn values_for(&self, repo_ids: &[RepoId]) -> Result<Vec<MetricValue>>;

    /// Values for the given repositories grouped as repository → metric id → value.
    fn values_by_repo(&self, repo_ids: &[RepoId]) -> Result<BTreeMap<RepoId, BTreeMap<MetricId, f64>>> {
        let mut grouped: BTreeMap<RepoId, BTreeMap<MetricId, f64>> = repo_ids
            .iter()
            .map(|id| (id.clone(), BTreeMap::new()))
            .collect();
        for v in self.values_for(repo_ids)? {
            if let Some(metrics) = grouped.get_mut(&v.repository_id) {
                let _ = metrics.insert(v.metric_id, v.value);
            }
        }
        Ok(grouped)
    }
}

/// A [`MetricStore`] backed by vectors, for tests, demos and callers that
/// already loaded everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryMetricStore {
    /// Metric definitions.
    #[serde(default)]
    pub metrics: Vec<MetricDefinition>,
    /// Metric values.
    #[serde(default)]
    pub values: Vec<MetricValue>,
}

impl InMemoryMetricStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a metric definition.
    pub fn with_metric(mut self, def: MetricDefinition) -> Self {
        self.metrics.push(def);
        self
    }

    /// Add a metric value.
    pub fn with_value(mut self, value: MetricValue) -> Self {
        self.values.push(value);
        self
    }
}

impl MetricStore for InMemoryMetricStore {
    fn definitions(&self) -> Result<Vec<MetricDefinition>> {
        Ok(self.metrics.clone())
    }

    fn values_for(&self, repo_ids: &[RepoId]) -> Result<Vec<MetricValue>> {
        let wanted: HashSet<&str> = repo_ids.iter().map(String::as_str).collect();
        Ok(self
            .values
            .iter()
            .filter(|v| wanted.contains(v.repository_id.as_str()))
            .cloned()
            .collect())
    }
}

/// A store that always fails. Useful to exercise degraded paths.
#[derive(Debug, Clone, Default)]
pub struct UnavailableMetricStore {
    /// Reason reported in every error.
    pub reason: String,
}

impl MetricStore for UnavailableMetricStore {
    fn definitions(&self) -> Result<Vec<MetricDefinition>> {
        Err(Error::MetricLookup(self.reason.clone()))
    }

    fn values_for(&self, _repo_ids: &[RepoId]) -> Result<Vec<MetricValue>> {
        Err(Error::MetricLookup(self.reason.clone()))
    }
}
