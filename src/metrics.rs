//! Internal clustering quality metrics.
//!
//! These need no ground truth: they score how well a labelling separates the
//! points it was computed from.
//!
//! # Metrics Overview
//!
//! | Metric | Range | Best | Degenerate input |
//! |--------|-------|------|------------------|
//! | [`silhouette_score`] | [-1, 1] | 1 | 0 |
//! | [`calinski_harabasz`] | [0, ∞) | higher | 0 |
//! | [`confidence`] | (0, 1] | 1 | 1 |
//!
//! Degenerate inputs (one label, every point its own label, fewer than two
//! points) return the neutral value instead of failing.
//!
//! # References
//!
//! - Rousseeuw (1987). "Silhouettes: a graphical aid to the interpretation
//!   and validation of cluster analysis"
//! - Caliński & Harabasz (1974). "A dendrite method for cluster analysis"

use std::collections::BTreeMap;

use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::distance::squared_euclidean;

/// Added to the mean in [`confidence`] so a zero mean never divides by zero.
pub const CONFIDENCE_EPSILON: f64 = 1e-6;

/// Mean silhouette coefficient over all points.
///
/// For point i with label c:
///
/// ```text
/// a(i) = mean distance to the other points labelled c
/// b(i) = min over labels c' ≠ c of the mean distance to points labelled c'
/// s(i) = (b(i) - a(i)) / max(a(i), b(i))
/// ```
///
/// Points alone in their label score 0. Returns 0 unless there are between
/// 2 and n - 1 distinct labels.
///
/// # Arguments
///
/// * `distances` - Precomputed symmetric `n × n` distance matrix
/// * `labels` - One label per point
pub fn silhouette_score(distances: &Array2<f64>, labels: &[usize]) -> f64 {
    let n = labels.len();
    if n < 2 || distances.nrows() != n || distances.ncols() != n {
        return 0.0;
    }

    let groups = group_members(labels);
    if groups.len() < 2 || groups.len() > n - 1 {
        return 0.0;
    }

    let mut total = 0.0;
    for i in 0..n {
        let own = &groups[&labels[i]];
        if own.len() < 2 {
            continue;
        }

        let a = own
            .iter()
            .filter(|&&j| j != i)
            .map(|&j| distances[[i, j]])
            .sum::<f64>()
            / (own.len() - 1) as f64;

        let b = groups
            .iter()
            .filter(|(&label, _)| label != labels[i])
            .map(|(_, members)| {
                members.iter().map(|&j| distances[[i, j]]).sum::<f64>() / members.len() as f64
            })
            .fold(f64::INFINITY, f64::min);

        let max_ab = a.max(b);
        if max_ab > 0.0 && max_ab.is_finite() {
            total += (b - a) / max_ab;
        }
    }

    total / n as f64
}

/// Calinski–Harabasz variance ratio.
///
/// ```text
/// CH = [B / (k - 1)] / [W / (n - k)]
/// ```
///
/// where B is the between-cluster and W the within-cluster dispersion.
/// Returns 0 unless there are between 2 and n - 1 labels, and 1 when W is 0
/// (every cluster collapsed to a point).
pub fn calinski_harabasz(data: ArrayView2<'_, f64>, labels: &[usize]) -> f64 {
    let n = labels.len();
    if n != data.nrows() {
        return 0.0;
    }
    let groups = group_members(labels);
    let k = groups.len();
    if k < 2 || k > n.saturating_sub(1) {
        return 0.0;
    }

    let overall: Array1<f64> = match data.mean_axis(Axis(0)) {
        Some(m) => m,
        None => return 0.0,
    };

    let mut between = 0.0;
    let mut within = 0.0;
    for members in groups.values() {
        let rows = data.select(Axis(0), members);
        let centroid = match rows.mean_axis(Axis(0)) {
            Some(c) => c,
            None => continue,
        };
        between += members.len() as f64 * squared_euclidean(centroid.view(), overall.view());
        within += rows
            .rows()
            .into_iter()
            .map(|r| squared_euclidean(r, centroid.view()))
            .sum::<f64>();
    }

    if within == 0.0 {
        return 1.0;
    }
    between * (n - k) as f64 / (within * (k - 1) as f64)
}

/// Neighbor confidence from the spread of neighbor distances.
///
/// ```text
/// confidence = 1 / (1 + var(d) / (mean(d) + ε))
/// ```
///
/// Tightly grouped distances give values near 1. Fewer than two distances
/// give 1.
pub fn confidence(distances: &[f64]) -> f64 {
    if distances.len() < 2 {
        return 1.0;
    }
    let n = distances.len() as f64;
    let mean = distances.iter().sum::<f64>() / n;
    let variance = distances.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n;
    1.0 / (1.0 + variance / (mean + CONFIDENCE_EPSILON))
}

/// Arithmetic mean, 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Coarse reading of a score for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityLevel {
    /// Trust the grouping.
    Excellent,
    /// Usable, check the neighbors.
    Good,
    /// Weak separation or spread-out neighbors.
    Poor,
}

impl QualityLevel {
    /// Level of a silhouette score (≥ 0.7 excellent, ≥ 0.5 good).
    pub fn from_silhouette(score: f64) -> Self {
        Self::from_thresholds(score, 0.7, 0.5)
    }

    /// Level of a confidence score (≥ 0.8 excellent, ≥ 0.6 good).
    pub fn from_confidence(score: f64) -> Self {
        Self::from_thresholds(score, 0.8, 0.6)
    }

    fn from_thresholds(score: f64, excellent: f64, good: f64) -> Self {
        if score >= excellent {
            QualityLevel::Excellent
        } else if score >= good {
            QualityLevel::Good
        } else {
            QualityLevel::Poor
        }
    }
}

// Helper functions

fn group_members(labels: &[usize]) -> BTreeMap<usize, Vec<usize>> {
    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        groups.entry(label).or_default().push(i);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::{pairwise, Metric};
    use ndarray::array;

    #[test]
    fn test_silhouette_well_separated() {
        let data = array![[0.0, 0.0], [0.0, 0.1], [10.0, 10.0], [10.0, 10.1]];
        let d = pairwise(data.view(), Metric::Euclidean);
        let s = silhouette_score(&d, &[0, 0, 1, 1]);
        assert!(s > 0.95, "silhouette {s}");
    }

    #[test]
    fn test_silhouette_bad_labels_negative() {
        let data = array![[0.0, 0.0], [0.0, 0.1], [10.0, 10.0], [10.0, 10.1]];
        let d = pairwise(data.view(), Metric::Euclidean);
        assert!(silhouette_score(&d, &[0, 1, 0, 1]) < 0.0);
    }

    #[test]
    fn test_silhouette_degenerate_is_neutral() {
        let data = array![[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]];
        let d = pairwise(data.view(), Metric::Euclidean);
        // One label.
        assert_eq!(silhouette_score(&d, &[0, 0, 0]), 0.0);
        // Every point its own label.
        assert_eq!(silhouette_score(&d, &[0, 1, 2]), 0.0);
        // Mismatched lengths.
        assert_eq!(silhouette_score(&d, &[0, 1]), 0.0);
    }

    #[test]
    fn test_silhouette_identical_points() {
        let data = Array2::<f64>::zeros((4, 3));
        let d = pairwise(data.view(), Metric::Euclidean);
        assert_eq!(silhouette_score(&d, &[0, 0, 1, 1]), 0.0);
    }

    #[test]
    fn test_silhouette_singleton_scores_zero() {
        // Point 2 is alone; the pair scores 1 - 1/10 each.
        let data = array![[0.0], [1.0], [10.0]];
        let d = pairwise(data.view(), Metric::Euclidean);
        let s = silhouette_score(&d, &[0, 0, 1]);
        let expected = ((1.0 - 1.0 / 10.0) + (1.0 - 1.0 / 9.0)) / 3.0;
        assert!((s - expected).abs() < 1e-12, "{s} vs {expected}");
    }

    #[test]
    fn test_calinski_harabasz() {
        let data = array![[0.0], [2.0], [10.0], [12.0]];
        // Centroids 1 and 11, overall 6: B = 2*25 + 2*25 = 100, W = 4.
        // CH = (100 / 1) / (4 / 2) = 50.
        let ch = calinski_harabasz(data.view(), &[0, 0, 1, 1]);
        assert!((ch - 50.0).abs() < 1e-9);
        assert_eq!(calinski_harabasz(data.view(), &[0, 0, 0, 0]), 0.0);
    }

    #[test]
    fn test_calinski_harabasz_collapsed_clusters() {
        let data = array![[0.0], [0.0], [5.0], [5.0]];
        assert_eq!(calinski_harabasz(data.view(), &[0, 0, 1, 1]), 1.0);
    }

    #[test]
    fn test_confidence() {
        assert_eq!(confidence(&[]), 1.0);
        assert_eq!(confidence(&[0.3]), 1.0);
        assert_eq!(confidence(&[0.5, 0.5, 0.5]), 1.0);
        // All-zero distances: no division by zero.
        assert_eq!(confidence(&[0.0, 0.0]), 1.0);
        let spread = confidence(&[0.1, 2.0]);
        let tight = confidence(&[1.0, 1.1]);
        assert!(spread < tight);
        assert!(spread > 0.0 && tight <= 1.0);
    }

    #[test]
    fn test_quality_levels() {
        assert_eq!(QualityLevel::from_silhouette(0.75), QualityLevel::Excellent);
        assert_eq!(QualityLevel::from_silhouette(0.5), QualityLevel::Good);
        assert_eq!(QualityLevel::from_silhouette(0.1), QualityLevel::Poor);
        assert_eq!(QualityLevel::from_confidence(0.8), QualityLevel::Excellent);
        assert_eq!(QualityLevel::from_confidence(0.65), QualityLevel::Good);
        assert_eq!(QualityLevel::from_confidence(0.2), QualityLevel::Poor);
    }
}
