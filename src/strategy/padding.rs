//! Group members first, then the closest remaining rows.

/// Rows of `ranking` sharing the selected row's label, in ranking order.
///
/// `ranking` is every row ordered by distance to the selected row (ties by
/// index), so the members come out closest first.
pub fn same_group<L: PartialEq>(ranking: &[usize], labels: &[L], selected: usize) -> Vec<usize> {
    let own = &labels[selected];
    ranking
        .iter()
        .copied()
        .filter(|&i| i != selected && labels[i] == *own)
        .collect()
}

/// Up to `n` neighbors: `taken` first, then rows of `ranking` not yet used.
///
/// The selected row and duplicates are skipped.
pub fn pad_with_closest(ranking: &[usize], taken: &[usize], selected: usize, n: usize) -> Vec<usize> {
    let mut out: Vec<usize> = Vec::with_capacity(n.min(ranking.len()));
    for &i in taken.iter().chain(ranking) {
        if out.len() == n {
            break;
        }
        if i != selected && !out.contains(&i) {
            out.push(i);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_members_then_padding() {
        let ranking = [2, 0, 4, 1, 3];
        let members = [4];
        assert_eq!(pad_with_closest(&ranking, &members, 2, 3), vec![4, 0, 1]);
    }

    #[test]
    fn test_members_truncated() {
        let ranking = [0, 1, 2, 3];
        assert_eq!(pad_with_closest(&ranking, &[1, 2, 3], 0, 2), vec![1, 2]);
    }

    #[test]
    fn test_short_when_rows_exhausted() {
        let ranking = [1, 0];
        assert_eq!(pad_with_closest(&ranking, &[], 1, 5), vec![0]);
        assert!(pad_with_closest(&[0], &[], 0, 3).is_empty());
    }

    #[test]
    fn test_huge_n_is_bounded_by_rows() {
        let ranking = [1, 0, 2];
        assert_eq!(pad_with_closest(&ranking, &[], 1, usize::MAX), vec![0, 2]);
    }

    #[test]
    fn test_same_group_in_ranking_order() {
        let labels = [Some(0), None, Some(0), Some(1), Some(0)];
        let ranking = [0, 4, 3, 2, 1];
        assert_eq!(same_group(&ranking, &labels, 0), vec![4, 2]);
    }
}
