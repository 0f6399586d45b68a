//! Distances between processed rows and deterministic rankings.

use ndarray::{Array2, ArrayView1, ArrayView2};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Euclidean distance.
#[inline]
pub fn euclidean(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    squared_euclidean(a, b).sqrt()
}

/// Squared Euclidean distance.
#[inline]
pub fn squared_euclidean(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Cosine distance `1 - cos(a, b)`, in `[0, 2]`.
///
/// A zero-norm vector has similarity 0 with everything, so its distance to
/// any vector is 1.
#[inline]
pub fn cosine(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    let sim = (a.dot(&b) / (norm_a * norm_b)).clamp(-1.0, 1.0);
    1.0 - sim
}

/// Distance function selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// [`euclidean`].
    Euclidean,
    /// [`cosine`].
    Cosine,
}

impl Metric {
    /// Distance between two rows.
    #[inline]
    pub fn distance(self, a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
        match self {
            Metric::Euclidean => euclidean(a, b),
            Metric::Cosine => cosine(a, b),
        }
    }
}

/// Distances from row `from` to every row (including itself).
pub fn distances_from(data: ArrayView2<'_, f64>, from: usize, metric: Metric) -> Vec<f64> {
    let origin = data.row(from);
    data.rows()
        .into_iter()
        .map(|row| metric.distance(origin, row))
        .collect()
}

/// Symmetric `n × n` distance matrix.
pub fn pairwise(data: ArrayView2<'_, f64>, metric: Metric) -> Array2<f64> {
    let n = data.nrows();

    #[cfg(feature = "parallel")]
    let rows: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|i| {
            (0..n)
                .map(|j| metric.distance(data.row(i), data.row(j)))
                .collect()
        })
        .collect();

    #[cfg(not(feature = "parallel"))]
    let rows: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| metric.distance(data.row(i), data.row(j)))
                .collect()
        })
        .collect();

    let mut out = Array2::zeros((n, n));
    for (i, row) in rows.into_iter().enumerate() {
        for (j, d) in row.into_iter().enumerate() {
            out[[i, j]] = d;
        }
    }
    out
}

/// Indices sorted by ascending distance; equal distances keep ascending index
/// order.
pub fn rank(distances: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..distances.len()).collect();
    order.sort_by(|&a, &b| distances[a].total_cmp(&distances[b]).then(a.cmp(&b)));
    order
}
