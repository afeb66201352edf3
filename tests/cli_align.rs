use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use tempfile::TempDir;

fn read_rows(path: &std::path::Path) -> anyhow::Result<Vec<(String, String)>> {
    let content = std::fs::read_to_string(path)?;
    let lines: Vec<&str> = content.lines().collect();
    Ok(lines
        .chunks(2)
        .map(|c| (c[0].trim_start_matches('>').to_string(), c[1].to_string()))
        .collect())
}

#[test]
fn command_align_builtin() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let outfile = temp.path().join("aln.fa");

    let mut cmd = Command::cargo_bin("chainmsa")?;
    cmd.arg("align")
        .arg("tests/msa/seqs.fa")
        .arg("--chain")
        .arg("tests/msa/chain.tsv")
        .arg("--parallel")
        .arg("2")
        .arg("-o")
        .arg(&outfile)
        .assert()
        .success();

    let rows = read_rows(&outfile)?;
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].0, "seq1");
    assert_eq!(rows[3].0, "seq4");
    let width = rows[0].1.len();
    assert!(rows.iter().all(|(_, r)| r.len() == width), "equal columns");

    let origin = std::fs::read_to_string("tests/msa/seqs.fa")?;
    let seqs: Vec<&str> = origin.lines().filter(|l| !l.starts_with('>')).collect();
    for ((_, row), seq) in rows.iter().zip(seqs) {
        assert_eq!(row.replace('-', ""), seq, "gaps stripped");
    }

    Ok(())
}

#[test]
fn command_align_stdout() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("chainmsa")?;
    let output = cmd
        .arg("align")
        .arg("tests/msa/seqs.fa")
        .arg("--chain")
        .arg("tests/msa/chain.tsv")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert!(output.status.success());
    assert_eq!(stdout.lines().count(), 8);
    assert!(stdout.starts_with(">seq1\n"));

    Ok(())
}

#[test]
fn command_align_threads_agree() -> anyhow::Result<()> {
    let mut outputs = vec![];
    for p in ["1", "4"] {
        let output = Command::cargo_bin("chainmsa")?
            .arg("align")
            .arg("tests/msa/seqs.fa")
            .arg("--chain")
            .arg("tests/msa/chain.tsv")
            .arg("-p")
            .arg(p)
            .output()?;
        assert!(output.status.success());
        outputs.push(String::from_utf8(output.stdout)?);
    }

    // every row has one width whatever the thread count
    for stdout in &outputs {
        let widths: Vec<usize> = stdout
            .lines()
            .filter(|l| !l.starts_with('>'))
            .map(|l| l.len())
            .collect();
        assert!(widths.iter().all(|&w| w == widths[0]));
    }

    Ok(())
}

#[test]
fn command_align_failing_aligner() -> anyhow::Result<()> {
    let false_bin = match which::which("false") {
        Ok(p) => p,
        Err(_) => {
            eprintln!("Skipping command_align_failing_aligner: no `false` on PATH");
            return Ok(());
        }
    };
    let temp = TempDir::new()?;
    let outfile = temp.path().join("aln.fa");

    let mut cmd = Command::cargo_bin("chainmsa")?;
    cmd.arg("align")
        .arg("tests/msa/seqs.fa")
        .arg("--chain")
        .arg("tests/msa/chain.tsv")
        .arg("--engine")
        .arg("mafft")
        .arg("--aligner-bin")
        .arg(&false_bin)
        .arg("--tmp-dir")
        .arg(temp.path().join("work"))
        .arg("-o")
        .arg(&outfile)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Block alignment failed"))
        .stderr(predicate::str::contains("2 attempt(s)"));

    assert!(!outfile.exists());
    // nothing left behind in the workspace parent
    assert_eq!(std::fs::read_dir(temp.path().join("work"))?.count(), 0);

    Ok(())
}

#[test]
fn command_align_mafft() -> anyhow::Result<()> {
    if which::which("mafft").is_err() {
        eprintln!("Skipping command_align_mafft: mafft not installed");
        return Ok(());
    }
    let temp = TempDir::new()?;
    let outfile = temp.path().join("aln.fa");

    let mut cmd = Command::cargo_bin("chainmsa")?;
    cmd.arg("align")
        .arg("tests/msa/seqs.fa")
        .arg("--chain")
        .arg("tests/msa/chain.tsv")
        .arg("--engine")
        .arg("mafft")
        .arg("-p")
        .arg("2")
        .arg("-o")
        .arg(&outfile)
        .assert()
        .success();

    let rows = read_rows(&outfile)?;
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|(_, r)| r.len() == rows[0].1.len()));

    Ok(())
}

#[test]
fn command_align_missing_input() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("chainmsa")?;
    cmd.arg("align")
        .arg("tests/msa/not_there.fa")
        .arg("--chain")
        .arg("tests/msa/chain.tsv")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not_there.fa"));

    Ok(())
}

#[test]
fn command_align_missing_aligner() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("chainmsa")?;
    cmd.arg("align")
        .arg("tests/msa/seqs.fa")
        .arg("--chain")
        .arg("tests/msa/chain.tsv")
        .arg("--engine")
        .arg("mafft")
        .arg("--aligner-bin")
        .arg("surely-not-an-aligner-binary")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));

    Ok(())
}

#[test]
fn command_align_bad_width() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("chainmsa")?;
    cmd.arg("align")
        .arg("tests/msa/seqs.fa")
        .arg("--chain")
        .arg("tests/msa/chain.tsv")
        .arg("--width")
        .arg("16")
        .assert()
        .failure();

    Ok(())
}

#[test]
fn command_align_inconsistent_chain() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let chain = temp.path().join("chain.tsv");
    std::fs::write(&chain, "10,12\t10,12\t10,12\t11,11\n")?;

    let mut cmd = Command::cargo_bin("chainmsa")?;
    cmd.arg("align")
        .arg("tests/msa/seqs.fa")
        .arg("--chain")
        .arg(&chain)
        .assert()
        .failure()
        .stderr(predicate::str::contains("length"));

    Ok(())
}

#[test]
fn command_align_overflowing_chain() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let chain = temp.path().join("chain.tsv");
    std::fs::write(
        &chain,
        "10,12\t10,12\t10,12\t11,12\n18446744073709551615,5\t37,20\t36,20\t36,20\n",
    )?;

    let mut cmd = Command::cargo_bin("chainmsa")?;
    cmd.arg("align")
        .arg("tests/msa/seqs.fa")
        .arg("--chain")
        .arg(&chain)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Input error"))
        .stderr(predicate::str::contains("line 2"));

    Ok(())
}

#[test]
fn command_align_fastq() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let outfile = temp.path().join("aln.fa");

    let mut cmd = Command::cargo_bin("chainmsa")?;
    cmd.arg("align")
        .arg("tests/msa/seqs.fq")
        .arg("--chain")
        .arg("tests/msa/chain.tsv")
        .arg("-o")
        .arg(&outfile)
        .assert()
        .success();

    let rows = read_rows(&outfile)?;
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].0, "seq1");
    assert!(rows.iter().all(|(_, r)| r.len() == rows[0].1.len()));

    Command::cargo_bin("chainmsa")?
        .arg("check")
        .arg(&outfile)
        .arg("--origin")
        .arg("tests/msa/seqs.fa")
        .assert()
        .success();

    Ok(())
}
