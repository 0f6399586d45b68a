//! Median / IQR scaling.

use ndarray::{Array1, Array2, ArrayView1, Axis};

/// IQR values at or below this are treated as zero (constant column).
const ZERO_SCALE: f64 = 10.0 * f64::EPSILON;

/// Quantile of a sample with linear interpolation between order statistics.
///
/// `q` is in `[0, 1]`. Returns 0 for an empty sample.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    quantile_sorted(&sorted, q)
}

/// [`quantile`] on already sorted input.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Fitted per-column center and scale.
#[derive(Debug, Clone)]
pub struct RobustScaler {
    /// Column medians.
    pub center: Array1<f64>,
    /// Column IQRs, 1 where the IQR is zero.
    pub scale: Array1<f64>,
}

impl RobustScaler {
    /// Fit on the columns of `data`.
    pub fn fit(data: &Array2<f64>) -> Self {
        let cols = data.ncols();
        let mut center = Array1::zeros(cols);
        let mut scale = Array1::ones(cols);
        for (j, column) in data.axis_iter(Axis(1)).enumerate() {
            let (median, iqr) = median_iqr(column);
            center[j] = median;
            if iqr > ZERO_SCALE {
                scale[j] = iqr;
            }
        }
        Self { center, scale }
    }

    /// `(x - center) / scale`, column-wise.
    pub fn transform(&self, data: &Array2<f64>) -> Array2<f64> {
        let mut out = data.clone();
        for (j, mut column) in out.axis_iter_mut(Axis(1)).enumerate() {
            let (c, s) = (self.center[j], self.scale[j]);
            column.mapv_inplace(|x| (x - c) / s);
        }
        out
    }
}

fn median_iqr(column: ArrayView1<'_, f64>) -> (f64, f64) {
    let mut sorted: Vec<f64> = column.to_vec();
    sorted.sort_by(f64::total_cmp);
    let q1 = quantile_sorted(&sorted, 0.25);
    let median = quantile_sorted(&sorted, 0.5);
    let q3 = quantile_sorted(&sorted, 0.75);
    (median, q3 - q1)
}
