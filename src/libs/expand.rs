//! Boundary refinement of anchors that were not selected as synchronization
//! points.
//!
//! Each such anchor is located in every sequence by a Smith-Waterman alignment
//! of its nominal residues against a window bounded by its neighbours. The
//! result is a fragment exactly as wide as the anchor, so all sequences share
//! the anchor's columns.

use crate::libs::chain::{Chain, Occurrence};
use crate::libs::error::MsaError;
use crate::libs::select::ColumnSets;
use crate::libs::seq::SeqSet;
use bio::alignment::pairwise::Aligner;
use bio::alignment::AlignmentOperation;
use rayon::prelude::*;

/// Scoring of the pairwise aligners. Defaults: match 2, mismatch -2,
/// gap open -2 and extend -1, so a 1-base gap scores -3.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoreParams {
    pub match_score: i32,
    pub mismatch_score: i32,
    pub gap_open: i32,
    pub gap_extend: i32,
}

impl Default for ScoreParams {
    fn default() -> Self {
        Self {
            match_score: 2,
            mismatch_score: -2,
            gap_open: -2,
            gap_extend: -1,
        }
    }
}

/// The aligned contribution of one sequence to one anchor or block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Fragment {
    /// Where the residues came from; `None` for a refinement miss
    pub occ: Option<Occurrence>,
    pub text: Vec<u8>,
}

impl Fragment {
    /// Residues of `seq` at `occ`, ungapped.
    pub fn materialize(seq: &[u8], occ: Occurrence) -> Self {
        Self {
            occ: Some(occ),
            text: seq[occ.start..occ.end()].to_vec(),
        }
    }

    /// A miss: no residues, only gaps.
    pub fn gap(width: usize) -> Self {
        Self {
            occ: None,
            text: vec![b'-'; width],
        }
    }

    pub fn width(&self) -> usize {
        self.text.len()
    }

    pub fn is_miss(&self) -> bool {
        self.occ.is_none()
    }
}

/// The state of one `(anchor, sequence)` cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Slot {
    Nominal(Occurrence),
    Resolved(Fragment),
}

/// All anchors with a fragment per sequence, indexed `[anchor][sequence]`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedChain {
    pub fragments: Vec<Vec<Fragment>>,
    pub misses: usize,
}

impl ResolvedChain {
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

/// Local alignment of `query` against `reference`.
///
/// Returns the occurrence in `reference` coordinates and the fragment in query
/// columns, or `None` when the best alignment scores below half of a perfect
/// match or needs reference residues that no query column can hold.
///
/// ```
/// use chainmsa::libs::expand::{local_align, ScoreParams};
/// let (occ, text) = local_align(b"TTTTACGTACTTTT", b"ACGTAC", &ScoreParams::default()).unwrap();
/// assert_eq!((occ.start, occ.len), (4, 6));
/// assert_eq!(text, b"ACGTAC".to_vec());
///
/// assert!(local_align(b"TTTTTTTT", b"ACGCAG", &ScoreParams::default()).is_none());
/// ```
pub fn local_align(
    reference: &[u8],
    query: &[u8],
    params: &ScoreParams,
) -> Option<(Occurrence, Vec<u8>)> {
    if query.is_empty() || reference.is_empty() {
        return None;
    }

    let score = |a: u8, b: u8| {
        if a == b {
            params.match_score
        } else {
            params.mismatch_score
        }
    };
    let mut aligner = Aligner::with_capacity(
        query.len(),
        reference.len(),
        params.gap_open,
        params.gap_extend,
        score,
    );
    let aln = aligner.local(query, reference);

    if (aln.score as i64) * 2 < (params.match_score as i64) * (query.len() as i64) {
        return None;
    }

    let mut text = vec![b'-'; aln.xstart];
    let mut y = aln.ystart;
    for op in &aln.operations {
        match op {
            AlignmentOperation::Match | AlignmentOperation::Subst => {
                text.push(reference[y]);
                y += 1;
            }
            // a query residue facing no reference residue
            AlignmentOperation::Ins => text.push(b'-'),
            // a reference residue with no query column to sit in
            AlignmentOperation::Del => return None,
            AlignmentOperation::Xclip(_) | AlignmentOperation::Yclip(_) => {}
        }
    }
    debug_assert_eq!(y, aln.yend);
    text.resize(query.len(), b'-');

    Some((Occurrence::new(aln.ystart, aln.yend - aln.ystart), text))
}

/// Selected anchors are materialized from their nominal occurrences, the others
/// stay nominal until expanded.
pub fn init_slots(set: &SeqSet, chain: &Chain, sets: &ColumnSets) -> Vec<Vec<Slot>> {
    let mut slots: Vec<Vec<Slot>> = chain
        .anchors()
        .iter()
        .map(|a| a.occurrences.iter().map(|&o| Slot::Nominal(o)).collect())
        .collect();
    for &k in &sets.selected {
        for (i, seq) in set.seqs.iter().enumerate() {
            let occ = chain.anchor(k).occurrences[i];
            slots[k][i] = Slot::Resolved(Fragment::materialize(seq, occ));
        }
    }
    slots
}

/// Read-only state shared by all expansion tasks.
pub struct Expander<'a> {
    set: &'a SeqSet,
    chain: &'a Chain,
    slots: &'a [Vec<Slot>],
    prev_selected: Vec<Option<usize>>,
    next_selected: Vec<Option<usize>>,
    params: &'a ScoreParams,
}

impl<'a> Expander<'a> {
    pub fn new(
        set: &'a SeqSet,
        chain: &'a Chain,
        sets: &ColumnSets,
        slots: &'a [Vec<Slot>],
        params: &'a ScoreParams,
    ) -> Self {
        let n = chain.len();
        let mut is_selected = vec![false; n];
        for &k in &sets.selected {
            is_selected[k] = true;
        }

        let mut prev_selected = vec![None; n];
        let mut last = None;
        for k in 0..n {
            prev_selected[k] = last;
            if is_selected[k] {
                last = Some(k);
            }
        }
        let mut next_selected = vec![None; n];
        let mut last = None;
        for k in (0..n).rev() {
            next_selected[k] = last;
            if is_selected[k] {
                last = Some(k);
            }
        }

        Self {
            set,
            chain,
            slots,
            prev_selected,
            next_selected,
            params,
        }
    }

    /// The stretch of sequence `i` searched for anchor `k`.
    pub fn window(&self, k: usize, i: usize) -> (usize, usize) {
        let nominal = self.chain.anchor(k).occurrences[i];

        let mut left = self
            .prev_selected[k]
            .map(|j| self.chain.anchor(j).occurrences[i].end())
            .unwrap_or(0);
        if k > 0 {
            let pred = self.chain.anchor(k - 1).occurrences[i];
            left = left.max(pred.end().min(nominal.start));
        }

        let mut right = nominal.end();
        if let Some(j) = self.next_selected[k] {
            right = right.min(self.chain.anchor(j).occurrences[i].start);
        }

        (left, right.max(left))
    }

    /// Resolves every sequence of anchor `k`. Already materialized slots are
    /// returned as stored.
    pub fn expand_anchor(&self, k: usize) -> Vec<Fragment> {
        let anchor = self.chain.anchor(k);
        let q_occ = anchor.occurrences[0];
        let query = &self.set.seqs[0][q_occ.start..q_occ.end()];

        self.set
            .seqs
            .iter()
            .enumerate()
            .map(|(i, seq)| match &self.slots[k][i] {
                Slot::Resolved(fragment) => fragment.clone(),
                Slot::Nominal(nominal) => {
                    let (left, right) = self.window(k, i);
                    if query.is_empty() {
                        let start = nominal.start.clamp(left, right);
                        return Fragment::materialize(seq, Occurrence::new(start, 0));
                    }
                    log::debug!(
                        "Anchor {} in {}: {} bp query against window [{}, {}) of {} bp",
                        k,
                        self.set.names[i],
                        query.len(),
                        left,
                        right,
                        right - left
                    );
                    match local_align(&seq[left..right], query, self.params) {
                        Some((occ, text)) => Fragment {
                            occ: Some(Occurrence::new(left + occ.start, occ.len)),
                            text,
                        },
                        None => {
                            log::debug!(
                                "No boundary for anchor {} in {} within [{}, {})",
                                k,
                                self.set.names[i],
                                left,
                                right
                            );
                            Fragment::gap(query.len())
                        }
                    }
                }
            })
            .collect()
    }
}

/// Resolves the whole chain.
///
/// Phase A of a run: one rayon task per remaining anchor, each returning its
/// own row. Rows are merged after all tasks finished, then any occurrence that
/// would overlap the previous one of its sequence becomes a miss.
pub fn expand_chain(
    set: &SeqSet,
    chain: &Chain,
    sets: &ColumnSets,
    threads: usize,
    params: &ScoreParams,
) -> anyhow::Result<ResolvedChain> {
    let mut slots = init_slots(set, chain, sets);

    let rows: Vec<(usize, Vec<Fragment>)> = {
        let expander = Expander::new(set, chain, sets, &slots, params);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .build()?;
        pool.install(|| {
            sets.remaining
                .par_iter()
                .map(|&k| (k, expander.expand_anchor(k)))
                .collect()
        })
    };

    let mut misses = 0;
    for (k, row) in rows {
        for (i, fragment) in row.into_iter().enumerate() {
            if fragment.is_miss() {
                misses += 1;
            }
            debug_assert!(matches!(slots[k][i], Slot::Nominal(_)));
            slots[k][i] = Slot::Resolved(fragment);
        }
    }

    let mut fragments: Vec<Vec<Fragment>> = Vec::with_capacity(chain.len());
    for (k, row) in slots.into_iter().enumerate() {
        let row = row
            .into_iter()
            .map(|slot| match slot {
                Slot::Resolved(fragment) => Ok(fragment),
                Slot::Nominal(_) => Err(MsaError::Integrity(format!(
                    "anchor {} left unresolved after expansion",
                    k
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        fragments.push(row);
    }

    misses += drop_overlaps(&mut fragments, set.len());

    for (k, row) in fragments.iter().enumerate() {
        let width = chain.anchor(k).len();
        if let Some((i, f)) = row.iter().enumerate().find(|(_, f)| f.width() != width) {
            return Err(MsaError::Integrity(format!(
                "anchor {} is {} columns wide in {} but {} in the chain",
                k,
                f.width(),
                set.names[i],
                width
            ))
            .into());
        }
    }

    log::info!(
        "Resolved {} anchors ({} selected, {} expanded), {} boundary misses",
        chain.len(),
        sets.selected.len(),
        sets.remaining.len(),
        misses
    );

    Ok(ResolvedChain { fragments, misses })
}

/// Turns into misses the occurrences that start before the end of the
/// previous occurrence of the same sequence. Returns how many were dropped.
fn drop_overlaps(fragments: &mut [Vec<Fragment>], n_seqs: usize) -> usize {
    let mut dropped = 0;
    for i in 0..n_seqs {
        let mut cursor = 0;
        for (k, row) in fragments.iter_mut().enumerate() {
            if let Some(occ) = row[i].occ {
                if occ.start < cursor {
                    log::debug!(
                        "Anchor {} at {} overlaps the previous anchor ending at {} in sequence {}",
                        k,
                        occ.start,
                        cursor,
                        i
                    );
                    row[i] = Fragment::gap(row[i].width());
                    dropped += 1;
                } else {
                    cursor = occ.end();
                }
            }
        }
    }
    dropped
}
