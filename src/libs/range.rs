use crate::libs::expand::ResolvedChain;
use std::ops::Range;

/// The free stretch of every sequence between two chain-adjacent anchors.
///
/// Block `0` leads up to the first anchor, block `k` lies between anchors
/// `k - 1` and `k`, and the last block trails the last anchor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub index: usize,
    pub ranges: Vec<Range<usize>>,
}

impl Block {
    /// Empty in every sequence.
    pub fn is_degenerate(&self) -> bool {
        self.ranges.iter().all(|r| r.is_empty())
    }

    /// Sequences with at least one residue in this block.
    pub fn occupied(&self) -> Vec<usize> {
        self.ranges
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.is_empty())
            .map(|(i, _)| i)
            .collect()
    }
}

/// Computes the `#anchors + 1` blocks of a resolved chain.
///
/// A refinement miss has no coordinates: the block before it is empty for
/// that sequence and its residues fall into the next block.
pub fn block_ranges(resolved: &ResolvedChain, seq_lens: &[usize]) -> Vec<Block> {
    let n_seqs = seq_lens.len();
    let mut blocks: Vec<Block> = (0..=resolved.len())
        .map(|index| Block {
            index,
            ranges: Vec::with_capacity(n_seqs),
        })
        .collect();

    for (i, &seq_len) in seq_lens.iter().enumerate() {
        let mut cursor = 0;
        for (k, row) in resolved.fragments.iter().enumerate() {
            match row[i].occ {
                Some(occ) => {
                    blocks[k].ranges.push(cursor..occ.start);
                    cursor = occ.end();
                }
                None => blocks[k].ranges.push(cursor..cursor),
            }
        }
        blocks[resolved.len()].ranges.push(cursor..seq_len);
    }

    blocks
}
