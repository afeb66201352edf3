use crate::libs::error::MsaError;
use std::io::{BufRead, Write};

/// Input sequences in file order. Index `i` of `names` and `seqs` is sequence `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeqSet {
    pub names: Vec<String>,
    pub seqs: Vec<Vec<u8>>,
}

impl SeqSet {
    pub fn from_pairs<N: Into<String>, S: AsRef<[u8]>>(pairs: Vec<(N, S)>) -> Self {
        let mut set = SeqSet::default();
        for (name, seq) in pairs {
            set.names.push(name.into());
            set.seqs.push(clean_seq(seq.as_ref()));
        }
        set
    }

    pub fn len(&self) -> usize {
        self.seqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seqs.is_empty()
    }

    pub fn total_len(&self) -> u64 {
        self.seqs.iter().map(|s| s.len() as u64).sum()
    }
}

/// Uppercases nucleotides and turns everything that is not `ACGT` into `N`,
/// so that `-` only ever means a gap.
///
/// ```
/// assert_eq!(chainmsa::libs::seq::clean_seq(b"acgT-ryN"), b"ACGTNNNN".to_vec());
/// ```
pub fn clean_seq(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .map(|&b| match b.to_ascii_uppercase() {
            c @ (b'A' | b'C' | b'G' | b'T') => c,
            _ => b'N',
        })
        .collect()
}

/// Reads all records of a FASTA or FASTQ file, cleaning each sequence.
pub fn read_seqs(infile: &str) -> anyhow::Result<SeqSet> {
    let mut set = read_raw(infile)?;
    for seq in set.seqs.iter_mut() {
        *seq = clean_seq(seq);
    }

    if set.is_empty() {
        return Err(MsaError::input(infile, "no FASTA records").into());
    }
    log::info!(
        "Read {} sequences, {} residues in total",
        set.len(),
        set.total_len()
    );

    Ok(set)
}

/// Reads all records of a FASTA or FASTQ file as they are, gaps and case
/// included. Input whose first byte is `@` is read as FASTQ; qualities are
/// dropped.
pub fn read_raw(infile: &str) -> anyhow::Result<SeqSet> {
    let mut reader = crate::reader(infile)?;
    let is_fastq = reader
        .fill_buf()
        .map_err(|e| MsaError::input(infile, e.to_string()))?
        .first()
        == Some(&b'@');

    let mut set = SeqSet::default();
    if is_fastq {
        let mut fq_in = noodles_fastq::io::Reader::new(reader);
        for result in fq_in.records() {
            let record = result.map_err(|e| MsaError::input(infile, e.to_string()))?;
            let name = String::from_utf8(record.name().to_vec())
                .map_err(|e| MsaError::input(infile, e.to_string()))?;
            set.names.push(name);
            set.seqs.push(record.sequence().to_vec());
        }
    } else {
        let mut fa_in = noodles_fasta::io::Reader::new(reader);
        for result in fa_in.records() {
            let record = result.map_err(|e| MsaError::input(infile, e.to_string()))?;
            let name = String::from_utf8(record.name().to_vec())
                .map_err(|e| MsaError::input(infile, e.to_string()))?;
            set.names.push(name);
            set.seqs.push(record.sequence().as_ref().to_vec());
        }
    }

    Ok(set)
}

/// Writes aligned rows as FASTA, one line per sequence.
pub fn write_fasta<W: Write + ?Sized>(
    writer: &mut W,
    names: &[String],
    rows: &[Vec<u8>],
) -> std::io::Result<()> {
    for (name, row) in names.iter().zip(rows) {
        writer.write_all(b">")?;
        writer.write_all(name.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.write_all(row)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

/// Coordinate width selected at runtime. Coordinates are `usize` in memory;
/// the width only bounds how much input a run accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoordWidth {
    W32,
    W64,
}

impl CoordWidth {
    pub fn from_bits(bits: u32) -> anyhow::Result<Self> {
        match bits {
            32 => Ok(CoordWidth::W32),
            64 => Ok(CoordWidth::W64),
            other => Err(MsaError::Configuration(format!(
                "coordinate width must be 32 or 64, got {}",
                other
            ))
            .into()),
        }
    }

    pub fn bits(&self) -> u32 {
        match self {
            CoordWidth::W32 => 32,
            CoordWidth::W64 => 64,
        }
    }

    pub fn limit(&self) -> u64 {
        match self {
            CoordWidth::W32 => u32::MAX as u64,
            // bounded by what this platform can index
            CoordWidth::W64 => usize::MAX as u64,
        }
    }

    /// Residues plus one separator per sequence must fit the width.
    pub fn check(&self, set: &SeqSet) -> anyhow::Result<()> {
        let required = set
            .total_len()
            .checked_add(set.len() as u64)
            .unwrap_or(u64::MAX);
        self.check_required(required)
    }

    /// Fails with a capacity error when `required` coordinates exceed the width.
    pub fn check_required(&self, required: u64) -> anyhow::Result<()> {
        if required > self.limit() {
            return Err(MsaError::Capacity {
                required,
                limit: self.limit(),
                bits: self.bits(),
            }
            .into());
        }
        Ok(())
    }
}

/// Removes gap characters.
pub fn ungap(row: &[u8]) -> Vec<u8> {
    row.iter().copied().filter(|&b| b != b'-').collect()
}
