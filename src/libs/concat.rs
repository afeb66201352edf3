use crate::libs::block::BlockRows;
use crate::libs::error::MsaError;
use crate::libs::expand::ResolvedChain;
use crate::libs::seq::{ungap, SeqSet};

/// Stitches blocks and anchors into full rows:
/// block 0, anchor 0, block 1, anchor 1, ..., anchor N-1, block N.
///
/// Every block and every anchor must be as wide in one sequence as in all the
/// others, and so must the finished rows; anything else is an integrity fault.
pub fn concat_alignment(
    resolved: &ResolvedChain,
    blocks: &[BlockRows],
    n_seqs: usize,
) -> anyhow::Result<Vec<Vec<u8>>> {
    if blocks.len() != resolved.len() + 1 {
        return Err(MsaError::Integrity(format!(
            "{} blocks around {} anchors",
            blocks.len(),
            resolved.len()
        ))
        .into());
    }

    for (b, rows) in blocks.iter().enumerate() {
        check_width(rows.iter().map(|r| r.len()), n_seqs, || format!("block {}", b))?;
    }
    for (k, row) in resolved.fragments.iter().enumerate() {
        check_width(row.iter().map(|f| f.width()), n_seqs, || format!("anchor {}", k))?;
    }

    let width: usize = blocks
        .iter()
        .map(|rows| rows.first().map_or(0, |r| r.len()))
        .sum::<usize>()
        + resolved
            .fragments
            .iter()
            .map(|row| row.first().map_or(0, |f| f.width()))
            .sum::<usize>();

    let mut out: Vec<Vec<u8>> = Vec::with_capacity(n_seqs);
    for i in 0..n_seqs {
        let mut line = Vec::with_capacity(width);
        for (k, row) in resolved.fragments.iter().enumerate() {
            line.extend_from_slice(&blocks[k][i]);
            line.extend_from_slice(&row[i].text);
        }
        line.extend_from_slice(&blocks[resolved.len()][i]);
        out.push(line);
    }

    check_width(out.iter().map(|r| r.len()), n_seqs, || {
        "the final alignment".to_string()
    })?;
    log::info!("Alignment of {} sequences, {} columns", n_seqs, width);

    Ok(out)
}

/// One width shared by `n_seqs` rows.
fn check_width<I, F>(widths: I, n_seqs: usize, what: F) -> anyhow::Result<()>
where
    I: Iterator<Item = usize>,
    F: Fn() -> String,
{
    let widths: Vec<usize> = widths.collect();
    if widths.len() != n_seqs {
        return Err(MsaError::Integrity(format!(
            "{} has {} rows for {} sequences",
            what(),
            widths.len(),
            n_seqs
        ))
        .into());
    }
    if let Some((i, w)) = widths.iter().enumerate().find(|&(_, &w)| w != widths[0]) {
        return Err(MsaError::Integrity(format!(
            "{} is {} columns wide in sequence {} but {} in sequence 0",
            what(),
            w,
            i,
            widths[0]
        ))
        .into());
    }
    Ok(())
}

/// Checks a finished alignment and returns its column count.
///
/// Every row must be as wide as the first. With `origin`, rows must come in
/// the same order under the same names, and stripping gaps from each row must
/// give back its original sequence.
pub fn verify_alignment(aln: &SeqSet, origin: Option<&SeqSet>) -> anyhow::Result<usize> {
    check_width(aln.seqs.iter().map(|r| r.len()), aln.len(), || {
        "the alignment".to_string()
    })?;

    if let Some(origin) = origin {
        if origin.len() != aln.len() {
            return Err(MsaError::Integrity(format!(
                "{} aligned rows for {} sequences",
                aln.len(),
                origin.len()
            ))
            .into());
        }
        for i in 0..aln.len() {
            if aln.names[i] != origin.names[i] {
                return Err(MsaError::Integrity(format!(
                    "row {} is {}, expected {}",
                    i, aln.names[i], origin.names[i]
                ))
                .into());
            }
            if ungap(&aln.seqs[i].to_ascii_uppercase()) != origin.seqs[i] {
                return Err(MsaError::Integrity(format!(
                    "{} does not match its original sequence",
                    aln.names[i]
                ))
                .into());
            }
        }
    }

    Ok(aln.seqs.first().map_or(0, |r| r.len()))
}
