//! Principal component projection.
//!
//! The covariance matrix goes through `faer`'s self-adjoint
//! eigendecomposition. Component signs are
//! fixed so the largest-magnitude loading of every component is positive,
//! which keeps projections reproducible.

use faer::{Mat, Side};
use ndarray::{Array1, Array2, Axis};

/// Result of fitting and applying PCA.
#[derive(Debug, Clone)]
pub struct PcaProjection {
    /// `rows × n_components` projected data.
    pub data: Array2<f64>,
    /// Variance ratio explained by each kept component.
    pub explained_variance_ratio: Vec<f64>,
}

impl PcaProjection {
    /// Fraction of total variance retained by the kept components.
    pub fn retained_variance(&self) -> f64 {
        self.explained_variance_ratio.iter().sum()
    }
}

/// Center `data` and project it onto its top `n_components` principal axes.
pub fn project(data: &Array2<f64>, n_components: usize) -> PcaProjection {
    let (rows, cols) = data.dim();
    let n_components = n_components.min(cols);

    let mean: Array1<f64> = data
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(cols));
    let centered = data - &mean;

    let denom = rows.saturating_sub(1).max(1) as f64;
    let covariance = centered.t().dot(&centered) / denom;

    let (eigenvalues, vectors) = symmetric_eigen(&covariance);

    let mut order: Vec<usize> = (0..cols).collect();
    order.sort_by(|&a, &b| eigenvalues[b].total_cmp(&eigenvalues[a]).then(a.cmp(&b)));

    let total: f64 = eigenvalues.iter().map(|v| v.max(0.0)).sum();

    let mut components = Array2::zeros((cols, n_components));
    let mut explained_variance_ratio = Vec::with_capacity(n_components);
    for (k, &idx) in order.iter().take(n_components).enumerate() {
        let mut axis = vectors.column(idx).to_owned();
        let pivot = axis
            .iter()
            .copied()
            .fold(0.0f64, |best, x| if x.abs() > best.abs() { x } else { best });
        if pivot < 0.0 {
            axis.mapv_inplace(|x| -x);
        }
        components.column_mut(k).assign(&axis);
        explained_variance_ratio.push(if total > 0.0 {
            eigenvalues[idx].max(0.0) / total
        } else {
            0.0
        });
    }

    PcaProjection {
        data: centered.dot(&components),
        explained_variance_ratio,
    }
}

/// Eigenvalues and unit eigenvectors (as columns) of a symmetric matrix.
fn symmetric_eigen(a: &Array2<f64>) -> (Vec<f64>, Array2<f64>) {
    let n = a.nrows();
    let evd = Mat::<f64>::from_fn(n, n, |i, j| a[[i, j]]).selfadjoint_eigendecomposition(Side::Lower);
    let values = evd.s().column_vector();
    let vectors = evd.u();
    (
        (0..n).map(|i| values.read(i)).collect(),
        Array2::from_shape_fn((n, n), |(i, j)| vectors.read(i, j)),
    )
}
