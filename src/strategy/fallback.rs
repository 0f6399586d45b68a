//! Last-resort neighbors on raw counters.

use ndarray::ArrayView2;

use super::{check_selected, pad_with_closest, NeighborStrategy, Neighbors};
use crate::distance::{distances_from, rank, Metric};
use crate::error::Result;
use crate::metrics::{confidence, mean};
use crate::quality::ClusterQuality;

/// Plain Euclidean nearest neighbors, no weighting or scaling.
///
/// Used on the basic-counter matrix when the main pipeline fails, so it
/// must not depend on metric lookups. Ties go to the lower row index.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawEuclidean;

impl NeighborStrategy for RawEuclidean {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn neighbors(&self, data: ArrayView2<'_, f64>, selected: usize, n: usize) -> Result<Neighbors> {
        check_selected(data, selected)?;

        let distances = distances_from(data, selected, Metric::Euclidean);
        let indices = pad_with_closest(&rank(&distances), &[], selected, n);
        let found: Vec<f64> = indices.iter().map(|&i| distances[i]).collect();

        let quality = ClusterQuality::new(self.name())
            .with_neighbor_stats(mean(&found), confidence(&found), indices.len());

        Ok(Neighbors { indices, quality })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_raw_distances() {
        let data = array![[100.0, 10.0], [0.0, 0.0], [90.0, 10.0], [100.0, 30.0]];
        let out = RawEuclidean.neighbors(data.view(), 0, 2).unwrap();
        assert_eq!(out.indices, vec![2, 3]);
        assert_eq!(out.quality.algorithm, "fallback");
        assert_eq!(out.quality.avg_distance, Some(15.0));
    }

    #[test]
    fn test_single_row() {
        let data = array![[1.0, 2.0]];
        let out = RawEuclidean.neighbors(data.view(), 0, 3).unwrap();
        assert!(out.indices.is_empty());
        assert_eq!(out.quality.n_neighbors, Some(0));
    }
}
