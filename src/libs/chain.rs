use crate::libs::error::MsaError;
use crate::libs::seq::SeqSet;
use std::io::BufRead;

/// A half-open stretch `[start, start + len)` of one sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Occurrence {
    pub start: usize,
    pub len: usize,
}

impl Occurrence {
    pub fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// One chain entry: an anchor with its nominal occurrence in every sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Anchor {
    pub index: usize,
    pub occurrences: Vec<Occurrence>,
}

impl Anchor {
    /// Nominal length. Occurrences of an anchor share one length.
    pub fn len(&self) -> usize {
        self.occurrences.first().map(|o| o.len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The ordered anchors shared by a sequence set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Chain {
    anchors: Vec<Anchor>,
    n_seqs: usize,
}

impl Chain {
    /// Builds a chain from per-anchor occurrence rows, in chain order.
    pub fn new(n_seqs: usize, rows: Vec<Vec<Occurrence>>) -> Self {
        let anchors = rows
            .into_iter()
            .enumerate()
            .map(|(index, occurrences)| Anchor { index, occurrences })
            .collect();
        Self { anchors, n_seqs }
    }

    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    pub fn anchor(&self, index: usize) -> &Anchor {
        &self.anchors[index]
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    pub fn n_seqs(&self) -> usize {
        self.n_seqs
    }

    /// Checks the chain against the sequences it was discovered on.
    ///
    /// * one occurrence per sequence
    /// * one length per anchor
    /// * occurrences inside their sequence
    /// * starts non-decreasing along the chain, per sequence
    pub fn validate(&self, set: &SeqSet) -> Result<(), String> {
        if self.n_seqs != set.len() {
            return Err(format!(
                "chain covers {} sequences, input has {}",
                self.n_seqs,
                set.len()
            ));
        }
        let mut last_start = vec![0usize; self.n_seqs];
        for anchor in &self.anchors {
            if anchor.occurrences.len() != self.n_seqs {
                return Err(format!(
                    "anchor {} has {} occurrences, expected {}",
                    anchor.index,
                    anchor.occurrences.len(),
                    self.n_seqs
                ));
            }
            let len = anchor.len();
            for (i, occ) in anchor.occurrences.iter().enumerate() {
                if occ.len != len {
                    return Err(format!(
                        "anchor {} has length {} in sequence {} but {} in sequence 0",
                        anchor.index, occ.len, i, len
                    ));
                }
                let end = occ.start.checked_add(occ.len);
                if end.map_or(true, |end| end > set.seqs[i].len()) {
                    return Err(format!(
                        "anchor {} at {},{} runs past the end of sequence {} ({})",
                        anchor.index,
                        occ.start,
                        occ.len,
                        set.names[i],
                        set.seqs[i].len()
                    ));
                }
                if occ.start < last_start[i] {
                    return Err(format!(
                        "anchor {} starts at {} before the previous anchor ({}) in sequence {}",
                        anchor.index, occ.start, last_start[i], set.names[i]
                    ));
                }
                last_start[i] = occ.start;
            }
        }
        Ok(())
    }
}

/// Parses one `start,length` field.
fn parse_field(field: &str) -> Option<Occurrence> {
    let (start, len) = field.trim().split_once(',')?;
    let start = start.trim().parse::<usize>().ok()?;
    let len = len.trim().parse::<usize>().ok()?;
    // end() must not overflow
    start.checked_add(len)?;
    Some(Occurrence::new(start, len))
}

/// Number of sequences a chain file covers, from its first anchor line; 0 for
/// a chain without anchors.
pub fn chain_width(infile: &str) -> anyhow::Result<usize> {
    let reader = crate::reader(infile)?;
    for line in reader.lines() {
        let line = line.map_err(|e| MsaError::input(infile, e.to_string()))?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        return Ok(line.trim_end().split('\t').count());
    }
    Ok(0)
}

/// Reads a chain file: one anchor per line, tab-separated `start,length`
/// fields in sequence order. Blank lines and `#` lines are skipped.
///
/// ```
/// let chain = chainmsa::libs::chain::read_chain("tests/msa/chain.tsv", 4).unwrap();
/// assert_eq!(chain.len(), 5);
/// assert_eq!(chain.anchor(0).occurrences[0].start, 10);
/// ```
pub fn read_chain(infile: &str, n_seqs: usize) -> anyhow::Result<Chain> {
    let reader = crate::reader(infile)?;

    let mut rows = vec![];
    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| MsaError::input(infile, e.to_string()))?;
        let line = line.trim_end();
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != n_seqs {
            return Err(MsaError::input(
                infile,
                format!(
                    "line {}: {} fields, expected one per sequence ({})",
                    i + 1,
                    fields.len(),
                    n_seqs
                ),
            )
            .into());
        }

        let mut row = Vec::with_capacity(n_seqs);
        for field in fields {
            let occ = parse_field(field).ok_or_else(|| {
                MsaError::input(
                    infile,
                    format!("line {}: malformed field {:?}, expected start,length", i + 1, field),
                )
            })?;
            row.push(occ);
        }
        rows.push(row);
    }

    Ok(Chain::new(n_seqs, rows))
}
