//! Quality diagnostics attached to every neighbor set.
//!
//! Scores here are informational: they never change which neighbors a
//! strategy returns.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::metrics::{silhouette_score, QualityLevel};

/// Separation and confidence scores plus algorithm-specific diagnostics.
///
/// Serialises to the flat `quality_metrics` object of the response; absent
/// diagnostics are omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterQuality {
    /// Strategy that produced the neighbor set.
    pub algorithm: String,
    /// Silhouette-style separation, 0 when fewer than two groups exist.
    pub silhouette_score: f64,
    /// Neighbor confidence (nearest-neighbor strategies).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Mean distance to the returned neighbors (nearest-neighbor strategies).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_distance: Option<f64>,
    /// Neighborhood size actually used (nearest-neighbor strategies).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_neighbors: Option<usize>,
    /// Clusters found or chosen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_clusters: Option<usize>,
    /// Points labelled noise (DBSCAN).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noise_points: Option<usize>,
    /// Neighborhood radius (DBSCAN).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eps: Option<f64>,
    /// Variance ratio criterion (K-means).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calinski_harabasz_score: Option<f64>,
    /// Within-cluster sum of squares (K-means).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inertia: Option<f64>,
    /// Reading of `silhouette_score`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separation_level: Option<QualityLevel>,
    /// Reading of `confidence`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_level: Option<QualityLevel>,
}

impl ClusterQuality {
    /// Empty diagnostics for `algorithm`.
    pub fn new(algorithm: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            silhouette_score: 0.0,
            confidence: None,
            avg_distance: None,
            n_neighbors: None,
            n_clusters: None,
            noise_points: None,
            eps: None,
            calinski_harabasz_score: None,
            inertia: None,
            separation_level: None,
            confidence_level: None,
        }
    }

    /// Set the separation score.
    pub fn with_silhouette(mut self, score: f64) -> Self {
        self.silhouette_score = score;
        self
    }

    /// Set the nearest-neighbor diagnostics.
    pub fn with_neighbor_stats(mut self, avg_distance: f64, confidence: f64, n_neighbors: usize) -> Self {
        self.avg_distance = Some(avg_distance);
        self.confidence = Some(confidence);
        self.n_neighbors = Some(n_neighbors);
        self
    }

    /// Set the number of clusters.
    pub fn with_clusters(mut self, n_clusters: usize) -> Self {
        self.n_clusters = Some(n_clusters);
        self
    }

    /// Set the DBSCAN diagnostics.
    pub fn with_density(mut self, eps: f64, noise_points: usize) -> Self {
        self.eps = Some(eps);
        self.noise_points = Some(noise_points);
        self
    }

    /// Set the K-means diagnostics.
    pub fn with_partition(mut self, calinski_harabasz: f64, inertia: f64) -> Self {
        self.calinski_harabasz_score = Some(calinski_harabasz);
        self.inertia = Some(inertia);
        self
    }
}

/// Computes separation scores and finalises quality blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityValidator;

impl QualityValidator {
    /// Silhouette-style separation of `labels`, neutral 0 when fewer than
    /// two distinct labels exist.
    pub fn separation(distances: &Array2<f64>, labels: &[usize]) -> f64 {
        silhouette_score(distances, labels)
    }

    /// Replace non-finite scores with neutral values and attach the
    /// excellent/good/poor readings.
    pub fn finalize(mut quality: ClusterQuality) -> ClusterQuality {
        if !quality.silhouette_score.is_finite() {
            tracing::debug!(algorithm = %quality.algorithm, "non-finite silhouette replaced by 0");
            quality.silhouette_score = 0.0;
        }
        for value in [
            &mut quality.confidence,
            &mut quality.avg_distance,
            &mut quality.eps,
            &mut quality.calinski_harabasz_score,
            &mut quality.inertia,
        ] {
            if value.is_some_and(|v| !v.is_finite()) {
                *value = None;
            }
        }

        quality.separation_level = Some(QualityLevel::from_silhouette(quality.silhouette_score));
        quality.confidence_level = quality.confidence.map(QualityLevel::from_confidence);
        quality
    }
}
