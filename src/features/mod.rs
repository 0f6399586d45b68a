//! Feature extraction: repositories + stored metric values → numeric matrix.
//!
//! Each repository contributes its six basic counters and every advanced
//! metric stored for it. Column names are canonicalised (see
//! [`canonical_name`]) and sorted; the column set is the union of the basic
//! counters and every metric seen for the dataset, fixed once per call.
//! A repository without a value for some column gets 0 there, so every row
//! has the same length and per-position meaning.

mod weights;

pub use weights::{canonical_name, CanonicalFeature, WeightTable};

use std::collections::{BTreeMap, BTreeSet, HashMap};

use ndarray::Array2;

use crate::error::{Error, Result};
use crate::model::{BasicCounter, MetricStore, RepoId, RepositoryRecord};

/// Clustering is undefined below this many repositories.
pub const MIN_REPOSITORIES: usize = 2;

/// One column of the feature matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Canonical column name.
    pub name: String,
    /// Identifier the weight was resolved from.
    pub kind: CanonicalFeature,
    /// Weight applied by the preprocessor.
    pub weight: f64,
}

/// Raw feature matrix, row-aligned with the repository list.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    /// `rows × features` raw values.
    pub data: Array2<f64>,
    /// Column descriptions, in column order.
    pub features: Vec<Feature>,
}

impl FeatureMatrix {
    /// Number of repositories.
    pub fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of features.
    pub fn n_features(&self) -> usize {
        self.features.len()
    }

    /// Column names, in column order.
    pub fn names(&self) -> Vec<&str> {
        self.features.iter().map(|f| f.name.as_str()).collect()
    }

    /// Column weights, in column order.
    pub fn weights(&self) -> Vec<f64> {
        self.features.iter().map(|f| f.weight).collect()
    }
}

/// Builds [`FeatureMatrix`] values from repositories and a [`MetricStore`].
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    weights: WeightTable,
}

impl FeatureExtractor {
    /// Extractor with the built-in weight table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom weight table.
    pub fn with_weights(mut self, weights: WeightTable) -> Self {
        self.weights = weights;
        self
    }

    /// Extract the feature matrix of `repos`.
    ///
    /// # Errors
    ///
    /// - [`Error::InsufficientData`] for fewer than [`MIN_REPOSITORIES`] repositories
    /// - [`Error::MetricLookup`] when the store fails
    pub fn extract(
        &self,
        repos: &[RepositoryRecord],
        store: &dyn MetricStore,
        dataset_id: &str,
    ) -> Result<FeatureMatrix> {
        if repos.len() < MIN_REPOSITORIES {
            return Err(Error::InsufficientData {
                required: MIN_REPOSITORIES,
                found: repos.len(),
            });
        }

        let metric_names: HashMap<String, String> = store
            .definitions()?
            .into_iter()
            .map(|def| (def.id, canonical_name(&def.name)))
            .collect();

        let repo_ids: Vec<RepoId> = repos.iter().map(|r| r.id.clone()).collect();
        let mut advanced: HashMap<RepoId, BTreeMap<String, f64>> = HashMap::new();
        let mut skipped = 0usize;
        for value in store.values_for(&repo_ids)? {
            match metric_names.get(&value.metric_id) {
                Some(name) => {
                    let _ = advanced
                        .entry(value.repository_id)
                        .or_default()
                        .insert(name.clone(), value.value);
                }
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            tracing::debug!(
                dataset_id,
                skipped,
                "ignored metric values without a definition"
            );
        }

        let rows: Vec<BTreeMap<String, f64>> = repos
            .iter()
            .map(|repo| {
                let mut row: BTreeMap<String, f64> = repo
                    .counters
                    .iter()
                    .map(|(c, v)| (c.as_str().to_string(), v as f64))
                    .collect();
                for (name, &value) in advanced.get(&repo.id).into_iter().flatten() {
                    // The record's own counter wins over a stored duplicate.
                    if row.contains_key(name) {
                        tracing::debug!(
                            repository = %repo.id,
                            metric = %name,
                            "stored metric shadows a basic counter, keeping the counter"
                        );
                        continue;
                    }
                    let _ = row.insert(name.clone(), value);
                }
                row
            })
            .collect();

        // Sorted union of every key; fixed for the rest of the call.
        let names: BTreeSet<&str> = rows
            .iter()
            .flat_map(|row| row.keys().map(String::as_str))
            .collect();

        let features: Vec<Feature> = names
            .iter()
            .map(|&name| {
                let (kind, weight) = self.weights.resolve(name);
                Feature {
                    name: name.to_string(),
                    kind,
                    weight,
                }
            })
            .collect();

        let mut data = Array2::zeros((rows.len(), features.len()));
        for (i, row) in rows.iter().enumerate() {
            for (j, feature) in features.iter().enumerate() {
                data[[i, j]] = row.get(&feature.name).copied().unwrap_or(0.0);
            }
        }

        tracing::debug!(
            dataset_id,
            repositories = data.nrows(),
            features = features.len(),
            "extracted feature matrix"
        );

        Ok(FeatureMatrix { data, features })
    }
}

/// Basic counters only, in [`BasicCounter::ALL`] order. No store access,
/// no weights. Used by the fallback path.
pub fn basic_counter_matrix(repos: &[RepositoryRecord]) -> Array2<f64> {
    let mut data = Array2::zeros((repos.len(), BasicCounter::ALL.len()));
    for (i, repo) in repos.iter().enumerate() {
        for (j, (_, value)) in repo.counters.iter().enumerate() {
            data[[i, j]] = value as f64;
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        BasicCounters, InMemoryMetricStore, MetricDefinition, MetricValue, UnavailableMetricStore,
    };
    use proptest::prelude::*;

    fn repo(id: &str, stars: u64) -> RepositoryRecord {
        RepositoryRecord::new(id, format!("owner/{id}")).with_counters(BasicCounters {
            stars,
            ..Default::default()
        })
    }

    #[test]
    fn test_insufficient_data() {
        let store = InMemoryMetricStore::new();
        let err = FeatureExtractor::new()
            .extract(&[repo("a", 1)], &store, "ds")
            .unwrap_err();
        assert_eq!(err, Error::InsufficientData { required: 2, found: 1 });

        let err = FeatureExtractor::new().extract(&[], &store, "ds").unwrap_err();
        assert!(matches!(err, Error::InsufficientData { found: 0, .. }));
    }

    #[test]
    fn test_stored_counter_name_keeps_record_value() {
        let store = InMemoryMetricStore::new()
            .with_metric(MetricDefinition::new("m_stars", "Stars"))
            .with_metric(MetricDefinition::new("m_loc", "LOC"))
            .with_value(MetricValue::new("a", "m_stars", 999.0))
            .with_value(MetricValue::new("b", "m_loc", 5.0));
        let m = FeatureExtractor::new()
            .extract(&[repo("a", 10), repo("b", 20)], &store, "ds")
            .unwrap();
        assert_eq!(m.n_features(), 6);
        assert_eq!(m.data[[0, 5]], 10.0);
        assert_eq!(m.data[[1, 3]], 0.0);
    }

    #[test]
    fn test_basic_counters_only() {
        let store = InMemoryMetricStore::new();
        let m = FeatureExtractor::new()
            .extract(&[repo("a", 10), repo("b", 20)], &store, "ds")
            .unwrap();
        assert_eq!(
            m.names(),
            vec!["commits", "contributors", "forks", "loc", "open_issues", "stars"]
        );
        assert_eq!(m.data[[0, 5]], 10.0);
        assert_eq!(m.data[[1, 5]], 20.0);
        assert_eq!(m.weights(), vec![0.9, 1.0, 0.8, 1.0, 0.7, 0.8]);
    }

    #[test]
    fn test_metric_missing_on_first_repo_is_kept() {
        let store = InMemoryMetricStore::new()
            .with_metric(MetricDefinition::new("m1", "Test Coverage"))
            .with_value(MetricValue::new("b", "m1", 75.0));
        let m = FeatureExtractor::new()
            .extract(&[repo("a", 1), repo("b", 2)], &store, "ds")
            .unwrap();
        let col = m.names().iter().position(|&n| n == "test_coverage").unwrap();
        assert_eq!(m.data[[0, col]], 0.0);
        assert_eq!(m.data[[1, col]], 75.0);
        assert_eq!(m.features[col].kind, CanonicalFeature::TestCoverage);
        assert_eq!(m.features[col].weight, 2.0);
    }

    #[test]
    fn test_values_without_definition_are_ignored() {
        let store = InMemoryMetricStore::new().with_value(MetricValue::new("a", "ghost", 3.0));
        let m = FeatureExtractor::new()
            .extract(&[repo("a", 1), repo("b", 2)], &store, "ds")
            .unwrap();
        assert_eq!(m.n_features(), 6);
    }

    #[test]
    fn test_store_failure_propagates() {
        let store = UnavailableMetricStore {
            reason: "timeout".into(),
        };
        let err = FeatureExtractor::new()
            .extract(&[repo("a", 1), repo("b", 2)], &store, "ds")
            .unwrap_err();
        assert_eq!(err, Error::MetricLookup("timeout".into()));
    }

    #[test]
    fn test_basic_counter_matrix_order() {
        let r = RepositoryRecord::new("a", "a").with_counters(BasicCounters {
            stars: 1,
            forks: 2,
            contributors: 3,
            commits: 4,
            open_issues: 5,
            loc: 6,
        });
        let m = basic_counter_matrix(&[r]);
        assert_eq!(m.row(0).to_vec(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    proptest! {
        #[test]
        fn feature_rows_have_identical_length(
            metric_mask in proptest::collection::vec(proptest::collection::vec(any::<bool>(), 4), 2..30),
        ) {
            let names = ["Test Coverage", "Code Smells", "Comment Ratio", "custom metric"];
            let mut store = InMemoryMetricStore::new();
            for (k, name) in names.iter().enumerate() {
                store = store.with_metric(MetricDefinition::new(format!("m{k}"), *name));
            }
            let repos: Vec<RepositoryRecord> = (0..metric_mask.len())
                .map(|i| repo(&format!("r{i}"), i as u64))
                .collect();
            for (i, mask) in metric_mask.iter().enumerate() {
                for (k, present) in mask.iter().enumerate() {
                    if *present {
                        store = store.with_value(MetricValue::new(format!("r{i}"), format!("m{k}"), (i + k) as f64));
                    }
                }
            }
            let seen = (0..4).filter(|&k| metric_mask.iter().any(|m| m[k])).count();

            let m = FeatureExtractor::new().extract(&repos, &store, "ds").unwrap();
            prop_assert_eq!(m.n_rows(), repos.len());
            prop_assert_eq!(m.n_features(), 6 + seen);
            for row in m.data.rows() {
                prop_assert_eq!(row.len(), m.n_features());
            }
        }
    }
}
