use crate::libs::chain::Chain;

/// Segments per worker. More segments select more anchors, which leaves less
/// refinement work for the expander.
pub const SEGMENTS_PER_WORKER: usize = 2;

/// A partition of `[0, #anchors)` into synchronization anchors and anchors that
/// need boundary refinement. Both lists are strictly increasing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColumnSets {
    pub selected: Vec<usize>,
    pub remaining: Vec<usize>,
}

/// Picks the synchronization anchors.
///
/// The chain is cut into `min(#anchors, SEGMENTS_PER_WORKER * width)`
/// contiguous segments of near-equal size; the longest anchor of each segment
/// is selected, the lowest index winning ties.
///
/// ```
/// use chainmsa::libs::chain::{Chain, Occurrence};
/// let rows = (0..5)
///     .map(|i| vec![Occurrence::new(i * 10, 4); 4])
///     .collect();
/// let chain = Chain::new(4, rows);
/// let sets = chainmsa::libs::select::select_columns(&chain, 2);
/// assert_eq!(sets.selected.len() + sets.remaining.len(), 5);
/// ```
pub fn select_columns(chain: &Chain, width: usize) -> ColumnSets {
    let n = chain.len();
    if n == 0 {
        return ColumnSets::default();
    }

    let segments = n.min(SEGMENTS_PER_WORKER * width.max(1));
    let mut selected = Vec::with_capacity(segments);
    for seg in 0..segments {
        let lo = seg * n / segments;
        let hi = (seg + 1) * n / segments;
        // max_by_key keeps the last maximum, so reverse to favour low indices
        let best = (lo..hi)
            .rev()
            .max_by_key(|&i| chain.anchor(i).len())
            .unwrap_or(lo);
        selected.push(best);
    }

    let remaining = remaining_columns(n, &selected);
    ColumnSets {
        selected,
        remaining,
    }
}

/// Every index of `[0, n)` not in `selected`; `selected` must be sorted.
pub fn remaining_columns(n: usize, selected: &[usize]) -> Vec<usize> {
    let mut remaining = Vec::with_capacity(n.saturating_sub(selected.len()));
    let mut sel = selected.iter().peekable();
    for i in 0..n {
        if sel.peek() == Some(&&i) {
            sel.next();
        } else {
            remaining.push(i);
        }
    }
    remaining
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::chain::Occurrence;

    fn chain_of_lens(n_seqs: usize, lens: &[usize]) -> Chain {
        let mut start = 0;
        let rows = lens
            .iter()
            .map(|&len| {
                let occ = Occurrence::new(start, len);
                start += len + 5;
                vec![occ; n_seqs]
            })
            .collect();
        Chain::new(n_seqs, rows)
    }

    fn assert_partition(sets: &ColumnSets, n: usize) {
        let mut all: Vec<usize> = sets
            .selected
            .iter()
            .chain(sets.remaining.iter())
            .copied()
            .collect();
        all.sort();
        assert_eq!(all, (0..n).collect::<Vec<_>>());
        assert!(sets.selected.windows(2).all(|w| w[0] < w[1]));
        assert!(sets.remaining.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_empty_chain() {
        let chain = Chain::new(3, vec![]);
        let sets = select_columns(&chain, 4);
        assert!(sets.selected.is_empty());
        assert!(sets.remaining.is_empty());
    }

    #[test]
    fn test_partition_five_anchors() {
        let chain = chain_of_lens(4, &[20, 30, 25, 40, 10]);
        let sets = select_columns(&chain, 2);
        assert_partition(&sets, 5);
        // 4 segments: [0], [1], [2], [3, 4]
        assert_eq!(sets.selected, vec![0, 1, 2, 3]);
        assert_eq!(sets.remaining, vec![4]);
    }

    #[test]
    fn test_longest_per_segment() {
        let chain = chain_of_lens(2, &[5, 9, 9, 3, 7, 8, 1, 2]);
        let sets = select_columns(&chain, 1);
        // 2 segments: [0, 4) and [4, 8)
        assert_eq!(sets.selected, vec![1, 5]);
        assert_eq!(sets.remaining, vec![0, 2, 3, 4, 6, 7]);
    }

    #[test]
    fn test_deterministic() {
        let chain = chain_of_lens(3, &[12, 7, 7, 30, 2, 2, 9, 11, 11, 4, 18]);
        for width in 0..6 {
            let a = select_columns(&chain, width);
            let b = select_columns(&chain, width);
            assert_eq!(a, b);
            assert_partition(&a, chain.len());
        }
    }

    #[test]
    fn test_remaining_columns() {
        assert_eq!(remaining_columns(6, &[0, 2, 5]), vec![1, 3, 4]);
        assert_eq!(remaining_columns(3, &[]), vec![0, 1, 2]);
        assert!(remaining_columns(0, &[]).is_empty());
    }
}
