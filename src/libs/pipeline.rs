use crate::libs::aligner::{BlockAligner, Engine};
use crate::libs::block::{align_blocks, plan_blocks};
use crate::libs::chain::{read_chain, Chain};
use crate::libs::concat::concat_alignment;
use crate::libs::error::MsaError;
use crate::libs::expand::{expand_chain, ScoreParams};
use crate::libs::range::block_ranges;
use crate::libs::select::select_columns;
use crate::libs::seq::{read_seqs, write_fasta, CoordWidth, SeqSet};
use crate::libs::workspace::Workspace;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct MsaConfig {
    pub threads: usize,
    pub engine: Engine,
    /// Executable of an external engine, `PATH` lookup when `None`
    pub aligner_bin: Option<String>,
    pub retries: usize,
    pub width: CoordWidth,
    /// Parent of the workspace, the system temp dir when `None`
    pub tmp_dir: Option<PathBuf>,
    pub params: ScoreParams,
}

impl Default for MsaConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            engine: Engine::Builtin,
            aligner_bin: None,
            retries: 1,
            width: CoordWidth::W64,
            tmp_dir: None,
            params: ScoreParams::default(),
        }
    }
}

impl MsaConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.threads == 0 {
            return Err(MsaError::Configuration("threads must be at least 1".to_string()).into());
        }
        Ok(())
    }
}

/// Aligns `set` along `chain` and returns one row per sequence, in input order.
///
/// Runs the two parallel phases with a barrier in between: boundary
/// refinement of unselected anchors, then alignment of the blocks between
/// anchors. The workspace only lives for the second phase. `chain` must have
/// passed [`Chain::validate`] against `set`.
pub fn align_set(
    set: &SeqSet,
    chain: &Chain,
    aligner: &dyn BlockAligner,
    config: &MsaConfig,
) -> anyhow::Result<Vec<Vec<u8>>> {
    config.validate()?;

    let sets = select_columns(chain, config.threads);
    log::info!(
        "{} anchors: {} selected, {} to refine",
        chain.len(),
        sets.selected.len(),
        sets.remaining.len()
    );

    // Phase A, returns once every anchor is resolved
    let resolved = expand_chain(set, chain, &sets, config.threads, &config.params)?;

    let seq_lens: Vec<usize> = set.seqs.iter().map(|s| s.len()).collect();
    let blocks = block_ranges(&resolved, &seq_lens);

    // Phase B
    let plan = plan_blocks(set, &blocks);
    let block_rows = {
        let workspace = Workspace::new(config.tmp_dir.as_deref(), plan.tasks.len())?;
        align_blocks(
            set,
            plan,
            aligner,
            &workspace,
            config.threads,
            config.retries,
        )?
    };

    concat_alignment(&resolved, &block_rows, set.len())
}

/// Reads the inputs, aligns them and writes the alignment to `outfile`. The
/// output is only created once the alignment is complete.
pub fn run(infile: &str, chain_file: &str, outfile: &str, config: &MsaConfig) -> anyhow::Result<()> {
    config.validate()?;
    let aligner = config.engine.build(config.aligner_bin.as_deref())?;

    let set = read_seqs(infile)?;
    config.width.check(&set)?;
    let chain = read_chain(chain_file, set.len())?;
    chain
        .validate(&set)
        .map_err(|msg| MsaError::input(chain_file, msg))?;

    let rows = align_set(&set, &chain, aligner.as_ref(), config)?;

    let mut writer = crate::writer(outfile)?;
    write_fasta(&mut writer, &set.names, &rows)?;

    Ok(())
}
