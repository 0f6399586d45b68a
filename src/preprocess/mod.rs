//! Weighting, robust scaling and dimensionality reduction.
//!
//! # Pipeline
//!
//! 1. **Weighting**: each column is multiplied by the weight resolved for its
//!    feature at extraction time.
//! 2. **Robust scaling**: `(x - median) / IQR` per column. Health metrics are
//!    heavy-tailed (one repository with 100k stars), and median/IQR keep such
//!    outliers from dominating every distance. Constant columns become 0.
//! 3. **PCA**: when there are more than `pca_threshold` columns the matrix is
//!    projected onto its top `min(max_components, cols - 1, rows - 1)`
//!    principal components and the retained variance is logged.
//!
//! Row count and row order never change.

mod pca;
mod scale;

pub use pca::{project, PcaProjection};
pub use scale::{quantile, quantile_sorted, RobustScaler};

use ndarray::{Array2, Axis};

use crate::error::{Error, Result};
use crate::features::FeatureMatrix;

/// Weighted, scaled and possibly reduced matrix, row-aligned with the
/// repository list.
#[derive(Debug, Clone)]
pub struct ProcessedMatrix {
    /// `rows × columns` values.
    pub data: Array2<f64>,
    /// Number of features before reduction.
    pub input_features: usize,
    /// Retained variance fraction when PCA ran.
    pub retained_variance: Option<f64>,
}

impl ProcessedMatrix {
    /// Wrap an already processed matrix.
    pub fn from_data(data: Array2<f64>) -> Self {
        let input_features = data.ncols();
        Self {
            data,
            input_features,
            retained_variance: None,
        }
    }

    /// 2-D projection coordinates of a row: the first two columns, `(0, 0)`
    /// when fewer than two columns exist.
    pub fn coordinates(&self, row: usize) -> (f64, f64) {
        coordinates(&self.data, row)
    }
}

/// First two columns of `row`, or `(0, 0)` when the matrix has fewer.
pub(crate) fn coordinates(data: &Array2<f64>, row: usize) -> (f64, f64) {
    if data.ncols() >= 2 {
        (data[[row, 0]], data[[row, 1]])
    } else {
        (0.0, 0.0)
    }
}

/// Weighted robust preprocessor.
#[derive(Debug, Clone)]
pub struct WeightedPreprocessor {
    pca_threshold: usize,
    max_components: usize,
}

impl Default for WeightedPreprocessor {
    fn default() -> Self {
        Self {
            pca_threshold: 10,
            max_components: 10,
        }
    }
}

impl WeightedPreprocessor {
    /// Preprocessor with default thresholds (PCA above 10 columns, at most
    /// 10 components).
    pub fn new() -> Self {
        Self::default()
    }

    /// Run PCA only when the column count exceeds this.
    pub fn with_pca_threshold(mut self, threshold: usize) -> Self {
        self.pca_threshold = threshold;
        self
    }

    /// Upper bound on kept components.
    pub fn with_max_components(mut self, max_components: usize) -> Self {
        self.max_components = max_components;
        self
    }

    /// Weight, scale and reduce.
    pub fn process(&self, features: &FeatureMatrix) -> Result<ProcessedMatrix> {
        let (rows, cols) = features.data.dim();
        if rows == 0 {
            return Err(Error::EmptyInput);
        }
        if cols != features.n_features() {
            return Err(Error::DimensionMismatch {
                expected: features.n_features(),
                found: cols,
            });
        }

        let mut weighted = features.data.clone();
        for (mut column, feature) in weighted.axis_iter_mut(Axis(1)).zip(&features.features) {
            column.mapv_inplace(|x| x * feature.weight);
        }

        let scaled = RobustScaler::fit(&weighted).transform(&weighted);
        if scaled.iter().any(|x| !x.is_finite()) {
            return Err(Error::InvalidParameter {
                name: "features",
                message: "non-finite value after scaling",
            });
        }

        if cols <= self.pca_threshold {
            return Ok(ProcessedMatrix {
                data: scaled,
                input_features: cols,
                retained_variance: None,
            });
        }

        let n_components = self
            .max_components
            .min(cols - 1)
            .min(rows.saturating_sub(1));
        if n_components == 0 {
            return Ok(ProcessedMatrix {
                data: scaled,
                input_features: cols,
                retained_variance: None,
            });
        }

        let projection = project(&scaled, n_components);
        let retained = projection.retained_variance();
        tracing::info!(
            features = cols,
            components = n_components,
            retained_variance = %format!("{:.3}", retained),
            "reduced feature space with PCA"
        );

        Ok(ProcessedMatrix {
            data: projection.data,
            input_features: cols,
            retained_variance: Some(retained),
        })
    }
}
