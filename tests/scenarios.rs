//! End-to-end behaviour of `SimilarityEngine::cluster`.

use std::sync::atomic::{AtomicUsize, Ordering};

use proptest::prelude::*;
use rand::prelude::*;
use rand::Rng;
use reposim::distance::{cosine, euclidean};
use reposim::model::RepoId;
use reposim::{
    BasicCounters, ClusterRequest, Error, FeatureExtractor, InMemoryMetricStore, MetricDefinition,
    MetricStore, MetricValue, RepositoryRecord, SimilarityEngine, UnavailableMetricStore,
    WeightedPreprocessor,
};

fn repo(id: &str, counters: BasicCounters) -> RepositoryRecord {
    RepositoryRecord::new(id, format!("org/{id}")).with_counters(counters)
}

fn stars_forks(id: &str, stars: u64, forks: u64) -> RepositoryRecord {
    repo(
        id,
        BasicCounters {
            stars,
            forks,
            ..BasicCounters::default()
        },
    )
}

fn uniform(id: &str, value: u64) -> RepositoryRecord {
    repo(
        id,
        BasicCounters {
            stars: value,
            forks: value,
            contributors: value,
            commits: value,
            open_issues: value,
            loc: value,
        },
    )
}

/// Five repositories: `sel` with two close followers and two lopsided ones.
fn small_dataset() -> Vec<RepositoryRecord> {
    vec![
        stars_forks("far1", 0, 500),
        stars_forks("sel", 1000, 1000),
        stars_forks("near2", 800, 800),
        stars_forks("far2", 500, 0),
        stars_forks("near1", 900, 900),
    ]
}

/// 50 scattered repositories and a tight group of 10 far away from them.
fn large_dataset() -> Vec<RepositoryRecord> {
    let mut rng = StdRng::seed_from_u64(7);
    let mut repos: Vec<RepositoryRecord> = (0..50)
        .map(|i| {
            repo(
                &format!("scatter{i}"),
                BasicCounters {
                    stars: rng.random_range(0..=1000),
                    forks: rng.random_range(0..=1000),
                    contributors: rng.random_range(0..=1000),
                    commits: rng.random_range(0..=1000),
                    open_issues: rng.random_range(0..=1000),
                    loc: rng.random_range(0..=1000),
                },
            )
        })
        .collect();
    repos.extend((0..10).map(|i| uniform(&format!("group{i}"), 5000 + i)));
    repos
}

/// Counts every call, then answers from an in-memory store.
#[derive(Default)]
struct CountingStore {
    inner: InMemoryMetricStore,
    calls: AtomicUsize,
}

impl MetricStore for CountingStore {
    fn definitions(&self) -> reposim::Result<Vec<MetricDefinition>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.definitions()
    }

    fn values_for(&self, repo_ids: &[RepoId]) -> reposim::Result<Vec<MetricValue>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.values_for(repo_ids)
    }
}

#[test]
fn small_dataset_knn_finds_close_followers() {
    let repos = small_dataset();
    let request = ClusterRequest::new("ds", "org/sel", 2).with_algorithm("knn");
    let result = SimilarityEngine::new()
        .cluster(&repos, &InMemoryMetricStore::new(), &request)
        .unwrap();

    assert_eq!(result.neighbor_names(), vec!["org/near1", "org/near2"]);
    assert_eq!(result.clustering_info.algorithm, "knn");
    assert_eq!(result.clustering_info.quality_metrics.algorithm, "knn");
    assert_eq!(result.clustering_info.similar_found, 2);
    assert_eq!(result.clustering_info.total_repositories, 5);
    assert_eq!(result.repos.len(), 4);
    assert!(result.repos.iter().all(|r| r.id != "sel"));

    let quality = &result.clustering_info.quality_metrics;
    assert_eq!(quality.n_neighbors, Some(2));
    assert!(quality.confidence.unwrap() > 0.0 && quality.confidence.unwrap() <= 1.0);
}

/// KNN ranks by cosine distance while every entry reports the Euclidean one,
/// so "smallest distance" for knn means smallest cosine distance in
/// processed space. The reported distances need not order the same way.
#[test]
fn knn_neighbors_have_smallest_cosine_distances() {
    let counters = [(854, 888, 59), (55, 688, 0), (713, 263, 64), (952, 4, 64), (980, 665, 5)];
    let repos: Vec<RepositoryRecord> = counters
        .iter()
        .enumerate()
        .map(|(i, &(stars, forks, contributors))| {
            repo(
                &format!("r{i}"),
                BasicCounters {
                    stars,
                    forks,
                    contributors,
                    ..BasicCounters::default()
                },
            )
        })
        .collect();
    let store = InMemoryMetricStore::new();
    let request = ClusterRequest::new("ds", "org/r0", 2).with_algorithm("knn");
    let result = SimilarityEngine::new().cluster(&repos, &store, &request).unwrap();
    assert_eq!(result.clustering_info.algorithm, "knn");

    let features = FeatureExtractor::new().extract(&repos, &store, "ds").unwrap();
    let processed = WeightedPreprocessor::new().process(&features).unwrap();
    let index = |id: &str| repos.iter().position(|r| r.id == id).unwrap();
    let angle = |id: &str| cosine(processed.data.row(index(id)), processed.data.row(0));

    let near: Vec<f64> = result.neighbors().map(|r| angle(&r.id)).collect();
    let far: Vec<f64> = result.repos.iter().filter(|r| !r.near).map(|r| angle(&r.id)).collect();
    assert_eq!((near.len(), far.len()), (2, 2));
    let worst_near = near.iter().copied().fold(f64::MIN, f64::max);
    assert!(far.iter().all(|&d| worst_near <= d), "{near:?} {far:?}");
}

#[test]
fn oversized_neighbor_count_returns_every_other_repository() {
    for algorithm in ["knn", "dbscan", "kmeans", "auto"] {
        let request = ClusterRequest::new("ds", "org/sel", usize::MAX).with_algorithm(algorithm);
        let result = SimilarityEngine::new()
            .cluster(&small_dataset(), &InMemoryMetricStore::new(), &request)
            .unwrap();
        assert_eq!(result.neighbor_names().len(), 4, "{algorithm}");
    }

    let request = ClusterRequest::new("ds", "org/sel", usize::MAX).with_algorithm("kmeans");
    let store = UnavailableMetricStore {
        reason: "database offline".into(),
    };
    let result = SimilarityEngine::new()
        .cluster(&small_dataset(), &store, &request)
        .unwrap();
    assert_eq!(result.clustering_info.algorithm, "fallback");
    assert_eq!(result.clustering_info.similar_found, 4);
}

#[test]
fn large_dataset_auto_uses_dbscan_and_stays_in_group() {
    let repos = large_dataset();
    let request = ClusterRequest::new("ds", "org/group3", 5);
    let result = SimilarityEngine::new()
        .cluster(&repos, &InMemoryMetricStore::new(), &request)
        .unwrap();

    assert_eq!(result.clustering_info.algorithm, "dbscan");
    assert_eq!(result.clustering_info.quality_metrics.algorithm, "dbscan");
    let names = result.neighbor_names();
    assert_eq!(names.len(), 5);
    assert!(names.iter().all(|n| n.starts_with("org/group")), "{names:?}");
    // Group members differ by one count per step: the adjacent ones come first.
    let mut closest = names[..2].to_vec();
    closest.sort_unstable();
    assert_eq!(closest, vec!["org/group2", "org/group4"]);

    let quality = &result.clustering_info.quality_metrics;
    assert!(quality.n_clusters.unwrap() >= 1);
    assert!(quality.eps.unwrap() > 0.0);
}

#[test]
fn unknown_algorithm_fails_before_any_lookup() {
    let store = CountingStore::default();
    let request = ClusterRequest::new("ds", "org/sel", 2).with_algorithm("bogus");
    let err = SimilarityEngine::new()
        .cluster(&small_dataset(), &store, &request)
        .unwrap_err();

    assert_eq!(err, Error::UnknownAlgorithm("bogus".into()));
    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn identical_repositories_are_neutral_not_errors() {
    let repos: Vec<RepositoryRecord> = (0..5).map(|i| uniform(&format!("same{i}"), 42)).collect();
    for algorithm in ["auto", "knn", "dbscan", "kmeans"] {
        let request = ClusterRequest::new("ds", "org/same2", 3).with_algorithm(algorithm);
        let result = SimilarityEngine::new()
            .cluster(&repos, &InMemoryMetricStore::new(), &request)
            .unwrap();

        let quality = &result.clustering_info.quality_metrics;
        assert_ne!(result.clustering_info.algorithm, "fallback", "{algorithm}");
        assert_eq!(quality.silhouette_score, 0.0, "{algorithm}");
        assert_eq!(result.neighbor_names().len(), 3, "{algorithm}");
        assert!(result.repos.iter().all(|r| r.distance == 0.0));
        assert!(quality.confidence.is_none_or(|c| c == 1.0), "{algorithm}");
        assert!(quality.calinski_harabasz_score.is_none_or(f64::is_finite));
    }
}

#[test]
fn single_repository_returns_selected_only() {
    let repos = vec![stars_forks("alone", 3, 4)];
    let request = ClusterRequest::new("ds", "org/alone", 1);
    let result = SimilarityEngine::new()
        .cluster(&repos, &InMemoryMetricStore::new(), &request)
        .unwrap();

    assert_eq!(result.selected.id, "alone");
    assert!(result.repos.is_empty());
    assert_eq!(result.clustering_info.algorithm, "fallback");
    assert_eq!(result.clustering_info.similar_found, 0);
}

#[test]
fn store_failure_degrades_to_raw_counters() {
    let store = UnavailableMetricStore {
        reason: "database offline".into(),
    };
    let request = ClusterRequest::new("ds", "org/sel", 2).with_algorithm("kmeans");
    let result = SimilarityEngine::new()
        .cluster(&small_dataset(), &store, &request)
        .unwrap();

    assert_eq!(result.clustering_info.algorithm, "fallback");
    assert_eq!(result.neighbor_names(), vec!["org/near1", "org/near2"]);
    assert!(result.selected.metrics.is_empty());
    // Raw stars/forks: near1 is (900, 900), 100√2 away.
    let near1 = &result.repos[0];
    assert!((near1.distance - 100.0 * 2f64.sqrt()).abs() < 1e-9);
    assert_eq!((near1.x, near1.y), (900.0, 900.0));
}

#[test]
fn neighbor_metrics_are_attached() {
    let repos = small_dataset();
    let store = InMemoryMetricStore::new()
        .with_metric(MetricDefinition::new("cov", "Test Coverage"))
        .with_value(MetricValue::new("sel", "cov", 81.0))
        .with_value(MetricValue::new("near1", "cov", 80.0))
        .with_value(MetricValue::new("far1", "cov", 10.0));
    let request = ClusterRequest::new("ds", "org/sel", 1).with_algorithm("knn");
    let result = SimilarityEngine::new().cluster(&repos, &store, &request).unwrap();

    assert_eq!(result.clustering_info.features_used, 7);
    assert_eq!(result.selected.metrics["cov"], 81.0);
    let near = result.neighbors().next().unwrap();
    assert!(near.metrics.is_some());
    assert!(result.repos.iter().filter(|r| !r.near).all(|r| r.metrics.is_none()));
}

#[test]
fn reported_distance_is_processed_euclidean() {
    let repos = large_dataset();
    let store = InMemoryMetricStore::new();
    let request = ClusterRequest::new("ds", "org/scatter4", 6).with_algorithm("kmeans");
    let result = SimilarityEngine::new().cluster(&repos, &store, &request).unwrap();

    let features = FeatureExtractor::new().extract(&repos, &store, "ds").unwrap();
    let processed = WeightedPreprocessor::new().process(&features).unwrap();
    let index = |id: &str| repos.iter().position(|r| r.id == id).unwrap();
    let selected = index("scatter4");

    for entry in &result.repos {
        let expected = euclidean(
            processed.data.row(index(&entry.id)),
            processed.data.row(selected),
        );
        assert!((entry.distance - expected).abs() < 1e-9, "{}", entry.id);
    }
}

#[test]
fn repeated_calls_are_identical() {
    let repos = large_dataset();
    let engine = SimilarityEngine::new();
    for algorithm in ["dbscan", "kmeans", "knn"] {
        let request = ClusterRequest::new("ds", "org/scatter11", 7).with_algorithm(algorithm);
        let a = engine.cluster(&repos, &InMemoryMetricStore::new(), &request).unwrap();
        let b = engine.cluster(&repos, &InMemoryMetricStore::new(), &request).unwrap();
        assert_eq!(a, b, "{algorithm}");
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn neighbor_count_is_min_of_n_and_others(
        counters in proptest::collection::vec(proptest::collection::vec(0u64..100_000, 6), 2..40),
        n in 1usize..50,
        selected_seed in any::<usize>(),
        algorithm in prop::sample::select(vec!["auto", "knn", "dbscan", "kmeans"]),
    ) {
        let repos: Vec<RepositoryRecord> = counters
            .iter()
            .enumerate()
            .map(|(i, c)| repo(&format!("r{i}"), BasicCounters {
                stars: c[0],
                forks: c[1],
                contributors: c[2],
                commits: c[3],
                open_issues: c[4],
                loc: c[5],
            }))
            .collect();
        let selected = selected_seed % repos.len();
        let request = ClusterRequest::new("ds", repos[selected].name.clone(), n).with_algorithm(algorithm);

        let result = SimilarityEngine::new()
            .cluster(&repos, &InMemoryMetricStore::new(), &request)
            .unwrap();

        let near: Vec<&str> = result.neighbors().map(|r| r.id.as_str()).collect();
        prop_assert_eq!(near.len(), n.min(repos.len() - 1));
        prop_assert!(!near.contains(&repos[selected].id.as_str()));
        let mut unique = near.clone();
        unique.sort_unstable();
        unique.dedup();
        prop_assert_eq!(unique.len(), near.len());
        prop_assert_eq!(result.repos.len(), repos.len() - 1);
        prop_assert!(result.clustering_info.quality_metrics.silhouette_score.is_finite());
    }
}
