//! Cosine nearest neighbors.

use ndarray::ArrayView2;

use super::{check_selected, pad_with_closest, NeighborStrategy, Neighbors};
use crate::distance::{distances_from, rank, Metric};
use crate::error::Result;
use crate::metrics::{confidence, mean};
use crate::quality::ClusterQuality;

/// The `n` rows closest to the selected row by cosine distance.
///
/// Compares direction, not magnitude: a repository with ten times the
/// activity of another but the same profile is its nearest neighbor.
/// Ties go to the lower row index.
#[derive(Debug, Clone, Copy, Default)]
pub struct Knn;

impl NeighborStrategy for Knn {
    fn name(&self) -> &'static str {
        "knn"
    }

    fn neighbors(&self, data: ArrayView2<'_, f64>, selected: usize, n: usize) -> Result<Neighbors> {
        check_selected(data, selected)?;

        let distances = distances_from(data, selected, Metric::Cosine);
        let indices = pad_with_closest(&rank(&distances), &[], selected, n);
        let found: Vec<f64> = indices.iter().map(|&i| distances[i]).collect();

        tracing::debug!(selected, requested = n, found = indices.len(), "knn neighbors");

        // One neighborhood, no second group to separate from.
        let quality = ClusterQuality::new(self.name())
            .with_silhouette(0.0)
            .with_neighbor_stats(mean(&found), confidence(&found), indices.len());

        Ok(Neighbors { indices, quality })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use ndarray::{array, Array2};

    #[test]
    fn test_direction_beats_magnitude() {
        let data = array![[1.0, 1.0], [10.0, 10.5], [1.0, -1.0], [-1.0, 0.2]];
        let out = Knn.neighbors(data.view(), 0, 2).unwrap();
        assert_eq!(out.indices, vec![1, 2]);
        assert_eq!(out.quality.algorithm, "knn");
        assert_eq!(out.quality.n_neighbors, Some(2));
        assert_eq!(out.quality.silhouette_score, 0.0);
    }

    #[test]
    fn test_ties_by_index() {
        let data = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]];
        let out = Knn.neighbors(data.view(), 2, 2).unwrap();
        assert_eq!(out.indices, vec![0, 1]);
    }

    #[test]
    fn test_zero_rows_do_not_divide_by_zero() {
        let data = Array2::<f64>::zeros((4, 3));
        let out = Knn.neighbors(data.view(), 0, 3).unwrap();
        assert_eq!(out.indices, vec![1, 2, 3]);
        assert_eq!(out.quality.avg_distance, Some(1.0));
        assert_eq!(out.quality.confidence, Some(1.0));
    }

    #[test]
    fn test_n_larger_than_rows() {
        let data = array![[1.0, 2.0], [2.0, 1.0]];
        let out = Knn.neighbors(data.view(), 1, 10).unwrap();
        assert_eq!(out.indices, vec![0]);
    }

    #[test]
    fn test_selected_out_of_range() {
        let data = array![[1.0, 2.0], [2.0, 1.0]];
        assert!(matches!(
            Knn.neighbors(data.view(), 2, 1),
            Err(Error::InvalidParameter { name: "selected", .. })
        ));
    }
}
