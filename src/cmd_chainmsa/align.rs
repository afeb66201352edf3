use chainmsa::libs::aligner::Engine;
use chainmsa::libs::expand::ScoreParams;
use chainmsa::libs::pipeline::{run, MsaConfig};
use chainmsa::libs::seq::CoordWidth;
use clap::*;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("align")
        .about("Aligns sequences along a chain of shared anchors")
        .after_help(
            r###"
This command builds a multiple sequence alignment of all sequences in a FASTA
file, using a chain of anchors (regions that match across every sequence) to
split the work.

Process:
1. A subset of anchors is kept at the positions given in the chain file
2. The boundaries of the others are refined in parallel by local alignment
   inside the window between the surrounding kept anchors
3. The regions between consecutive anchors are aligned in parallel
4. Blocks and anchors are concatenated into the final alignment

Chain file:
* One anchor per line, in chain order
* One tab-separated `start,length` field per sequence, in FASTA order
* 0-based starts; all lengths in a line must be equal
* Blank lines and lines starting with `#` are ignored

Notes:
* Residues are uppercased; anything other than ACGT becomes N
* Supports both plain text and gzipped (.gz) input
* The output file is only written after the whole run succeeded
* `--engine mafft` runs `mafft --quiet --auto --thread 1` per block
* A failed block is retried `--retries` times before the run aborts
* Use `--width 32` to refuse inputs that need more than 32-bit coordinates
* A refined anchor is searched between its neighbours; an unkept first or last
  anchor may be searched over a long stretch, which costs memory in proportion
  to the stretch times the anchor length
* FASTQ input (first byte `@`) is accepted; qualities are ignored

Examples:
1. Align with the builtin engine:
   chainmsa align seqs.fa --chain chain.tsv -o aln.fa

2. Use mafft on 8 threads:
   chainmsa align seqs.fa --chain chain.tsv --engine mafft -p 8 -o aln.fa

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .index(1)
                .help("Input FASTA or FASTQ file of the sequences to align"),
        )
        .arg(
            Arg::new("chain")
                .long("chain")
                .short('c')
                .required(true)
                .num_args(1)
                .help("Chain file of anchors"),
        )
        .arg(
            Arg::new("outfile")
                .long("outfile")
                .short('o')
                .num_args(1)
                .default_value("stdout")
                .help("Output filename. [stdout] for screen"),
        )
        .arg(
            Arg::new("parallel")
                .long("parallel")
                .short('p')
                .num_args(1)
                .default_value("1")
                .value_parser(value_parser!(usize))
                .help("Number of threads for parallel processing"),
        )
        .arg(
            Arg::new("engine")
                .long("engine")
                .num_args(1)
                .default_value("builtin")
                .value_parser(["builtin", "mafft"])
                .help("Block aligner"),
        )
        .arg(
            Arg::new("aligner_bin")
                .long("aligner-bin")
                .num_args(1)
                .help("Path to the external aligner executable"),
        )
        .arg(
            Arg::new("retries")
                .long("retries")
                .num_args(1)
                .default_value("1")
                .value_parser(value_parser!(usize))
                .help("Extra attempts for a failed block"),
        )
        .arg(
            Arg::new("width")
                .long("width")
                .num_args(1)
                .default_value("64")
                .value_parser(value_parser!(u32))
                .help("Coordinate width in bits, 32 or 64"),
        )
        .arg(
            Arg::new("tmp_dir")
                .long("tmp-dir")
                .num_args(1)
                .help("Parent directory of the temporary workspace"),
        )
        .arg(
            Arg::new("match")
                .long("match")
                .num_args(1)
                .default_value("2")
                .allow_negative_numbers(true)
                .value_parser(value_parser!(i32))
                .help("Match score of the pairwise aligners"),
        )
        .arg(
            Arg::new("mismatch")
                .long("mismatch")
                .num_args(1)
                .default_value("-2")
                .allow_negative_numbers(true)
                .value_parser(value_parser!(i32))
                .help("Mismatch score"),
        )
        .arg(
            Arg::new("gap_open")
                .long("gap-open")
                .num_args(1)
                .default_value("-2")
                .allow_negative_numbers(true)
                .value_parser(value_parser!(i32))
                .help("Gap open score"),
        )
        .arg(
            Arg::new("gap_extend")
                .long("gap-extend")
                .num_args(1)
                .default_value("-1")
                .allow_negative_numbers(true)
                .value_parser(value_parser!(i32))
                .help("Gap extension score"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let infile = args.get_one::<String>("infile").unwrap();
    let chain_file = args.get_one::<String>("chain").unwrap();
    let outfile = args.get_one::<String>("outfile").unwrap();

    let config = MsaConfig {
        threads: *args.get_one::<usize>("parallel").unwrap(),
        engine: args.get_one::<String>("engine").unwrap().parse::<Engine>()?,
        aligner_bin: args.get_one::<String>("aligner_bin").cloned(),
        retries: *args.get_one::<usize>("retries").unwrap(),
        width: CoordWidth::from_bits(*args.get_one::<u32>("width").unwrap())?,
        tmp_dir: args.get_one::<String>("tmp_dir").map(std::path::PathBuf::from),
        params: ScoreParams {
            match_score: *args.get_one::<i32>("match").unwrap(),
            mismatch_score: *args.get_one::<i32>("mismatch").unwrap(),
            gap_open: *args.get_one::<i32>("gap_open").unwrap(),
            gap_extend: *args.get_one::<i32>("gap_extend").unwrap(),
        },
    };

    //----------------------------
    // Ops
    //----------------------------
    run(infile, chain_file, outfile, &config)?;

    Ok(())
}
