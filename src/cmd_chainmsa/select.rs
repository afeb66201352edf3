use chainmsa::libs::chain::{chain_width, read_chain};
use chainmsa::libs::select::select_columns;
use clap::*;
use itertools::Itertools;
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("select")
        .about("Shows the anchors kept in place and the anchors to refine")
        .after_help(
            r###"
This command runs only the anchor selection step of `chainmsa align`.

The chain is cut into min(#anchors, 2 * threads) contiguous segments and the
longest anchor of each segment is kept at its given position. All other
anchors would have their boundaries refined by local alignment.

Output:
    selected<TAB>comma-separated anchor indices
    remaining<TAB>comma-separated anchor indices

Anchor indices are 0-based line numbers among the anchor lines of the chain
file.

Examples:
1. Selection for 4 threads:
   chainmsa select chain.tsv -p 4

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .index(1)
                .help("Chain file of anchors"),
        )
        .arg(
            Arg::new("parallel")
                .long("parallel")
                .short('p')
                .num_args(1)
                .default_value("1")
                .value_parser(value_parser!(usize))
                .help("Number of threads the selection is sized for"),
        )
        .arg(
            Arg::new("outfile")
                .long("outfile")
                .short('o')
                .num_args(1)
                .default_value("stdout")
                .help("Output filename. [stdout] for screen"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let infile = args.get_one::<String>("infile").unwrap();
    let opt_parallel = *args.get_one::<usize>("parallel").unwrap();
    let mut writer = chainmsa::writer(args.get_one::<String>("outfile").unwrap())?;

    let n_seqs = chain_width(infile)?;
    let chain = read_chain(infile, n_seqs)?;
    let sets = select_columns(&chain, opt_parallel);

    writer.write_fmt(format_args!("selected\t{}\n", sets.selected.iter().join(",")))?;
    writer.write_fmt(format_args!("remaining\t{}\n", sets.remaining.iter().join(",")))?;

    Ok(())
}
