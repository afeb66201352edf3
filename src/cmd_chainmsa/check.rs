use chainmsa::libs::concat::verify_alignment;
use chainmsa::libs::seq::{read_raw, read_seqs};
use clap::*;
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("check")
        .about("Verifies a multiple sequence alignment")
        .after_help(
            r###"
This command checks that all rows of an aligned FASTA file have the same
number of columns.

With --origin, it also checks that the rows come in the order and under the
names of the original FASTA file, and that removing the gaps from each row
gives back its original sequence (after the cleaning `chainmsa align` applies:
uppercase, non-ACGT as N).

On success the number of sequences and columns is printed. Any failure exits
non-zero.

Examples:
1. Column count only:
   chainmsa check aln.fa

2. Full round trip:
   chainmsa check aln.fa --origin seqs.fa

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .index(1)
                .help("Aligned FASTA file"),
        )
        .arg(
            Arg::new("origin")
                .long("origin")
                .num_args(1)
                .help("The unaligned FASTA file the alignment was built from"),
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

    let aln = read_raw(infile)?;
    let origin = match args.get_one::<String>("origin") {
        Some(path) => Some(read_seqs(path)?),
        None => None,
    };

    let columns = verify_alignment(&aln, origin.as_ref())?;

    let mut writer = chainmsa::writer(args.get_one::<String>("outfile").unwrap())?;
    writer.write_fmt(format_args!("{}\t{}\n", aln.len(), columns))?;

    Ok(())
}
