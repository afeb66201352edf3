use crate::libs::aligner::BlockAligner;
use crate::libs::error::MsaError;
use crate::libs::range::Block;
use crate::libs::seq::{read_raw, ungap, write_fasta, SeqSet};
use crate::libs::workspace::Workspace;
use std::sync::atomic::{AtomicBool, Ordering};

/// Aligned rows of one block, one per sequence in input order.
pub type BlockRows = Vec<Vec<u8>>;

/// A block that needs the aligner, and the workspace slot it writes to.
#[derive(Clone, Debug)]
pub struct BlockTask<'a> {
    pub block: &'a Block,
    pub slot: usize,
}

/// Blocks split into the ones settled without an aligner and the tasks left
/// for the workers.
pub struct BlockPlan<'a> {
    pub tasks: Vec<BlockTask<'a>>,
    results: Vec<Option<BlockRows>>,
    pub degenerate: usize,
    pub trivial: usize,
}

/// Degenerate blocks become empty rows and blocks with residues in a single
/// sequence are copied as they are; everything else becomes a task.
pub fn plan_blocks<'a>(set: &SeqSet, blocks: &'a [Block]) -> BlockPlan<'a> {
    let mut plan = BlockPlan {
        tasks: vec![],
        results: vec![None; blocks.len()],
        degenerate: 0,
        trivial: 0,
    };

    for block in blocks {
        let occupied = block.occupied();
        match occupied.len() {
            0 => {
                plan.results[block.index] = Some(vec![vec![]; set.len()]);
                plan.degenerate += 1;
            }
            1 => {
                let i = occupied[0];
                let residues = &set.seqs[i][block.ranges[i].clone()];
                let mut rows = vec![vec![b'-'; residues.len()]; set.len()];
                rows[i] = residues.to_vec();
                plan.results[block.index] = Some(rows);
                plan.trivial += 1;
            }
            _ => {
                let slot = plan.tasks.len();
                plan.tasks.push(BlockTask { block, slot });
            }
        }
    }

    plan
}

/// Runs the tasks of `plan` on `threads` workers and returns the rows of every
/// block, in block order.
///
/// Tasks go through a bounded queue. After the first failure nothing new is
/// dispatched, queued tasks are skipped, and the failure is returned once the
/// running ones are done.
pub fn align_blocks(
    set: &SeqSet,
    plan: BlockPlan,
    aligner: &dyn BlockAligner,
    workspace: &Workspace,
    threads: usize,
    retries: usize,
) -> anyhow::Result<Vec<BlockRows>> {
    let BlockPlan {
        tasks,
        mut results,
        degenerate,
        trivial,
    } = plan;
    let threads = threads.max(1);
    log::info!(
        "Aligning {} blocks with {} on {} workers ({} degenerate, {} single-sequence)",
        tasks.len(),
        aligner.name(),
        threads,
        degenerate,
        trivial
    );

    let failed = AtomicBool::new(false);
    let mut first_error: Option<anyhow::Error> = None;

    // Channel 1 - Tasks
    let (snd1, rcv1) = crossbeam::channel::bounded::<BlockTask>(threads * 2);
    // Channel 2 - Results
    let (snd2, rcv2) = crossbeam::channel::bounded(threads * 2);

    crossbeam::scope(|s| {
        //----------------------------
        // Dispatcher thread
        //----------------------------
        s.spawn(|_| {
            for task in tasks {
                if failed.load(Ordering::SeqCst) {
                    break;
                }
                if snd1.send(task).is_err() {
                    break;
                }
            }
            // Close the channel so that workers leave their loops
            drop(snd1);
        });

        //----------------------------
        // Worker threads
        //----------------------------
        for _ in 0..threads {
            let (sendr, recvr) = (snd2.clone(), rcv1.clone());
            let failed = &failed;
            s.spawn(move |_| {
                for task in recvr.iter() {
                    if failed.load(Ordering::SeqCst) {
                        continue;
                    }
                    let result = run_task(set, &task, aligner, workspace, retries);
                    if result.is_err() {
                        failed.store(true, Ordering::SeqCst);
                    }
                    if sendr.send((task.block.index, result)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(snd2);

        //----------------------------
        // Collector
        //----------------------------
        for (index, result) in rcv2.iter() {
            match result {
                Ok(rows) => results[index] = Some(rows),
                Err(e) => {
                    log::error!("{:#}", e);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }
    })
    .map_err(|_| anyhow::anyhow!("A block alignment worker panicked"))?;

    if let Some(e) = first_error {
        return Err(e);
    }

    results
        .into_iter()
        .enumerate()
        .map(|(index, rows)| {
            rows.ok_or_else(|| {
                MsaError::Integrity(format!("block {} has no alignment", index)).into()
            })
        })
        .collect()
}

/// Aligns one block, retrying `retries` times. The task's files are removed
/// whatever the outcome.
fn run_task(
    set: &SeqSet,
    task: &BlockTask,
    aligner: &dyn BlockAligner,
    workspace: &Workspace,
    retries: usize,
) -> anyhow::Result<BlockRows> {
    let block = task.block;
    let occupied = block.occupied();
    let residues: Vec<&[u8]> = occupied
        .iter()
        .map(|&i| &set.seqs[i][block.ranges[i].clone()])
        .collect();

    let attempts = retries + 1;
    let mut reason = String::new();
    let mut aligned = None;
    for attempt in 1..=attempts {
        match attempt_block(task, &occupied, &residues, aligner, workspace) {
            Ok(rows) => {
                aligned = Some(rows);
                break;
            }
            Err(e) => {
                log::warn!(
                    "Block {}: attempt {}/{} failed: {:#}",
                    block.index,
                    attempt,
                    attempts,
                    e
                );
                reason = format!("{:#}", e);
            }
        }
    }

    if let Err(e) = workspace.release(task.slot) {
        log::warn!("Block {}: could not remove its files: {}", block.index, e);
    }

    let aligned = aligned.ok_or_else(|| MsaError::BlockAlignment {
        block: block.index,
        attempts,
        reason,
    })?;

    let width = aligned[0].len();
    let mut rows = vec![vec![b'-'; width]; set.len()];
    for (&i, row) in occupied.iter().zip(aligned) {
        rows[i] = row;
    }
    Ok(rows)
}

/// Writes the job, runs the aligner and reads its output back by record
/// position.
fn attempt_block(
    task: &BlockTask,
    occupied: &[usize],
    residues: &[&[u8]],
    aligner: &dyn BlockAligner,
    workspace: &Workspace,
) -> anyhow::Result<BlockRows> {
    let job = workspace.job_path(task.slot);
    let output = workspace.output_path(task.slot);

    {
        let names: Vec<String> = occupied.iter().map(|i| format!("s{}", i)).collect();
        let rows: Vec<Vec<u8>> = residues.iter().map(|r| r.to_vec()).collect();
        let mut writer = std::io::BufWriter::new(std::fs::File::create(&job)?);
        write_fasta(&mut writer, &names, &rows)?;
    }
    match std::fs::remove_file(&output) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e.into()),
        _ => {}
    }

    aligner.align(&job, &output)?;

    if !output.exists() {
        anyhow::bail!("no output at {}", output.display());
    }
    let mut rows = read_raw(&output.to_string_lossy())?.seqs;
    check_rows(&mut rows, residues)?;
    Ok(rows)
}

/// Uppercases the rows and checks them against the job: same count, one
/// width, and the job residues once gaps are removed.
fn check_rows(rows: &mut [Vec<u8>], residues: &[&[u8]]) -> anyhow::Result<()> {
    if rows.len() != residues.len() {
        anyhow::bail!(
            "malformed output: {} records for {} sequences",
            rows.len(),
            residues.len()
        );
    }
    let width = rows.first().map(|r| r.len()).unwrap_or(0);
    for (j, (row, res)) in rows.iter_mut().zip(residues).enumerate() {
        row.make_ascii_uppercase();
        if row.len() != width {
            anyhow::bail!(
                "malformed output: record {} is {} columns wide, record 0 is {}",
                j,
                row.len(),
                width
            );
        }
        if ungap(row) != *res {
            anyhow::bail!("malformed output: record {} does not match its input", j);
        }
    }
    Ok(())
}
