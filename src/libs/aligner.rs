//! Block-level multiple sequence aligners.
//!
//! An aligner reads a FASTA job file and leaves an aligned FASTA at the output
//! path, or fails. It never sees more than one block.

use crate::libs::error::MsaError;
use crate::libs::expand::ScoreParams;
use crate::libs::seq::{read_raw, write_fasta};
use bio::alignment::pairwise::Aligner;
use bio::alignment::AlignmentOperation;
use std::path::Path;
use std::process::{Command, Stdio};

pub trait BlockAligner: Sync {
    fn name(&self) -> &str;

    /// Aligns the records of `job` into `output`.
    fn align(&self, job: &Path, output: &Path) -> anyhow::Result<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Engine {
    Builtin,
    Mafft,
}

impl std::str::FromStr for Engine {
    type Err = MsaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "builtin" => Ok(Engine::Builtin),
            "mafft" => Ok(Engine::Mafft),
            other => Err(MsaError::Configuration(format!(
                "unknown engine '{}', expected 'builtin' or 'mafft'",
                other
            ))),
        }
    }
}

impl Engine {
    /// Creates the aligner. External engines must be found on `PATH` (or at
    /// `bin`) now, before any work starts.
    pub fn build(&self, bin: Option<&str>) -> anyhow::Result<Box<dyn BlockAligner>> {
        match self {
            Engine::Builtin => Ok(Box::new(StarAligner::default())),
            Engine::Mafft => {
                let bin = bin.unwrap_or("mafft");
                let path = which::which(bin).map_err(|_| {
                    MsaError::Configuration(format!(
                        "{} not found. Please install mafft or pass --aligner-bin",
                        bin
                    ))
                })?;
                Ok(Box::new(MafftAligner {
                    bin: path.to_string_lossy().to_string(),
                }))
            }
        }
    }
}

/// Runs `mafft --quiet --auto --thread 1 <job> > <output>`.
pub struct MafftAligner {
    pub bin: String,
}

impl BlockAligner for MafftAligner {
    fn name(&self) -> &str {
        "mafft"
    }

    fn align(&self, job: &Path, output: &Path) -> anyhow::Result<()> {
        let file = std::fs::File::create(output)?;
        let status = Command::new(&self.bin)
            .args(["--quiet", "--auto", "--thread", "1"])
            .arg(job)
            .stdout(file)
            .stderr(Stdio::null())
            .status()?;

        if !status.success() {
            if let Err(e) = std::fs::remove_file(output) {
                log::debug!("Could not remove {}: {}", output.display(), e);
            }
            anyhow::bail!("{} exited with {}", self.bin, status);
        }
        Ok(())
    }
}

/// In-process center-star alignment: every sequence is aligned globally to
/// the longest one, and the pairwise gaps are merged.
#[derive(Default)]
pub struct StarAligner {
    pub params: ScoreParams,
}

impl BlockAligner for StarAligner {
    fn name(&self) -> &str {
        "builtin"
    }

    fn align(&self, job: &Path, output: &Path) -> anyhow::Result<()> {
        let set = read_raw(&job.to_string_lossy())?;
        let rows = center_star(&set.seqs, &self.params);

        let mut writer = std::io::BufWriter::new(std::fs::File::create(output)?);
        write_fasta(&mut writer, &set.names, &rows)?;
        Ok(())
    }
}

/// One sequence aligned to the center: the residue facing each center column
/// and the residues inserted before each center column (`n + 1` slots).
struct StarRow {
    columns: Vec<u8>,
    inserts: Vec<Vec<u8>>,
}

fn align_to_center(center: &[u8], seq: &[u8], params: &ScoreParams) -> StarRow {
    let n = center.len();
    if seq.is_empty() {
        return StarRow {
            columns: vec![b'-'; n],
            inserts: vec![vec![]; n + 1],
        };
    }

    let score = |a: u8, b: u8| {
        if a == b {
            params.match_score
        } else {
            params.mismatch_score
        }
    };
    let mut aligner =
        Aligner::with_capacity(n, seq.len(), params.gap_open, params.gap_extend, score);
    let aln = aligner.global(center, seq);

    let mut row = StarRow {
        columns: vec![b'-'; n],
        inserts: vec![vec![]; n + 1],
    };
    let (mut x, mut y) = (0, 0);
    for op in &aln.operations {
        match op {
            AlignmentOperation::Match | AlignmentOperation::Subst => {
                row.columns[x] = seq[y];
                x += 1;
                y += 1;
            }
            AlignmentOperation::Del => {
                row.inserts[x].extend_from_slice(&seq[y..y + 1]);
                y += 1;
            }
            AlignmentOperation::Ins => x += 1,
            AlignmentOperation::Xclip(len) => x += *len,
            AlignmentOperation::Yclip(len) => {
                row.inserts[x].extend_from_slice(&seq[y..y + *len]);
                y += *len;
            }
        }
    }
    row
}

/// Center-star multiple alignment. Rows come back in input order and share
/// one width; stripping gaps gives back each input.
///
/// ```
/// use chainmsa::libs::aligner::center_star;
/// use chainmsa::libs::expand::ScoreParams;
/// let seqs = vec![b"ACGTACGT".to_vec(), b"ACGACGT".to_vec(), b"ACGTTACGT".to_vec()];
/// let rows = center_star(&seqs, &ScoreParams::default());
/// assert_eq!(rows.len(), 3);
/// assert!(rows.iter().all(|r| r.len() == rows[2].len()));
/// ```
pub fn center_star(seqs: &[Vec<u8>], params: &ScoreParams) -> Vec<Vec<u8>> {
    if seqs.len() < 2 {
        return seqs.to_vec();
    }

    // longest sequence, lowest index on ties
    let center = (0..seqs.len())
        .rev()
        .max_by_key(|&i| seqs[i].len())
        .unwrap_or(0);
    let c = &seqs[center];
    let n = c.len();
    if n == 0 {
        return seqs.to_vec();
    }

    let star: Vec<Option<StarRow>> = seqs
        .iter()
        .enumerate()
        .map(|(i, s)| {
            if i == center {
                None
            } else {
                Some(align_to_center(c, s, params))
            }
        })
        .collect();

    let mut ins_max = vec![0usize; n + 1];
    for row in star.iter().flatten() {
        for (m, ins) in ins_max.iter_mut().zip(&row.inserts) {
            *m = (*m).max(ins.len());
        }
    }

    let width = n + ins_max.iter().sum::<usize>();
    let mut rows: Vec<Vec<u8>> = vec![Vec::with_capacity(width); seqs.len()];
    for p in 0..=n {
        for (out, row) in rows.iter_mut().zip(&star) {
            let filled = out.len();
            if let Some(row) = row {
                out.extend_from_slice(&row.inserts[p]);
            }
            out.resize(filled + ins_max[p], b'-');
            if p < n {
                match row {
                    Some(row) => out.push(row.columns[p]),
                    None => out.push(c[p]),
                }
            }
        }
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::seq::ungap;

    fn assert_msa(seqs: &[Vec<u8>], rows: &[Vec<u8>]) {
        assert_eq!(seqs.len(), rows.len());
        for (s, r) in seqs.iter().zip(rows) {
            assert_eq!(r.len(), rows[0].len());
            assert_eq!(&ungap(r), s);
        }
    }

    #[test]
    fn test_center_star_identical() {
        let seqs = vec![b"ACGT".to_vec(), b"ACGT".to_vec()];
        let rows = center_star(&seqs, &ScoreParams::default());
        assert_eq!(rows, seqs);
    }

    #[test]
    fn test_center_star_gaps() {
        let seqs = vec![b"ACT".to_vec(), b"ACGT".to_vec(), b"AGT".to_vec()];
        let rows = center_star(&seqs, &ScoreParams::default());
        assert_msa(&seqs, &rows);
        assert_eq!(rows[1], b"ACGT".to_vec());
        assert_eq!(rows[0], b"AC-T".to_vec());
        assert_eq!(rows[2], b"A-GT".to_vec());
    }

    #[test]
    fn test_center_star_insertions_merge() {
        // both insert relative to the center at the same place
        let seqs = vec![
            b"AAAACCCCGGGG".to_vec(),
            b"AAAACTCCCGGGG".to_vec(),
            b"AAAACCCCGGGGT".to_vec(),
            b"".to_vec(),
        ];
        let rows = center_star(&seqs, &ScoreParams::default());
        assert_msa(&seqs, &rows);
        assert!(rows[3].iter().all(|&b| b == b'-'));
    }

    #[test]
    fn test_engine_parse() {
        assert_eq!("builtin".parse::<Engine>().unwrap(), Engine::Builtin);
        assert_eq!("mafft".parse::<Engine>().unwrap(), Engine::Mafft);
        assert!("clustal".parse::<Engine>().is_err());
    }

    #[test]
    fn test_missing_binary_is_configuration_error() {
        let err = Engine::Mafft
            .build(Some("surely-not-an-aligner-binary"))
            .err()
            .unwrap();
        assert!(matches!(
            err.downcast_ref::<MsaError>(),
            Some(MsaError::Configuration(_))
        ));
    }

    #[test]
    fn test_star_aligner_files() {
        let dir = tempfile::tempdir().unwrap();
        let job = dir.path().join("job.fa");
        let out = dir.path().join("job.aln.fa");
        std::fs::write(&job, ">0\nACGTT\n>1\nACTT\n").unwrap();

        let aligner = StarAligner::default();
        assert_eq!(aligner.name(), "builtin");
        aligner.align(&job, &out).unwrap();
        assert_eq!(
            std::fs::read_to_string(&out).unwrap(),
            ">0\nACGTT\n>1\nAC-TT\n"
        );
    }

    #[test]
    fn test_mafft_failure_leaves_no_output() {
        let bin = match which::which("false") {
            Ok(p) => p,
            Err(_) => {
                eprintln!("Skipping test_mafft_failure_leaves_no_output: no `false` on PATH");
                return;
            }
        };
        let dir = tempfile::tempdir().unwrap();
        let job = dir.path().join("job.fa");
        let out = dir.path().join("job.aln.fa");
        std::fs::write(&job, ">0\nACGT\n>1\nACT\n").unwrap();

        let aligner = Engine::Mafft.build(Some(bin.to_str().unwrap())).unwrap();
        let err = aligner.align(&job, &out).unwrap_err();
        assert!(format!("{}", err).contains("exited with"));
        assert!(!out.exists());
    }

    #[test]
    fn test_mafft() {
        if which::which("mafft").is_err() {
            eprintln!("Skipping test_mafft: mafft not installed");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let job = dir.path().join("job.fa");
        let out = dir.path().join("job.aln.fa");
        std::fs::write(&job, ">0\nACGTTACGATCGA\n>1\nACTTACGATCGA\n").unwrap();

        let aligner = Engine::Mafft.build(None).unwrap();
        aligner.align(&job, &out).unwrap();
        let set = read_raw(&out.to_string_lossy()).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.seqs[0].len(), set.seqs[1].len());
    }
}
