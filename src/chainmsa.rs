extern crate clap;
use clap::*;

mod cmd_chainmsa;

fn main() -> anyhow::Result<()> {
    let app = Command::new("chainmsa")
        .version(crate_version!())
        .author(crate_authors!())
        .about("`chainmsa` - Chain-anchored parallel multiple sequence alignment")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count)
                .help("Log progress to stderr. -v for info, -vv for debug"),
        )
        .subcommand(cmd_chainmsa::align::make_subcommand())
        .subcommand(cmd_chainmsa::select::make_subcommand())
        .subcommand(cmd_chainmsa::check::make_subcommand())
        .after_help(
            r###"Subcommands:

* align  - Align sequences along a chain of anchors
* select - Show which anchors are fixed up front and which get refined
* check  - Verify an alignment: equal columns, gaps-stripped round trip

"###,
        );

    let matches = app.get_matches();
    setup_logger(matches.get_count("verbose"));

    // Check which subcomamnd the user ran...
    match matches.subcommand() {
        Some(("align", sub_matches)) => cmd_chainmsa::align::execute(sub_matches),
        Some(("select", sub_matches)) => cmd_chainmsa::select::execute(sub_matches),
        Some(("check", sub_matches)) => cmd_chainmsa::check::execute(sub_matches),
        _ => unreachable!(),
    }?;

    Ok(())
}

fn setup_logger(verbosity: u8) {
    env_logger::Builder::new()
        .filter_level(match verbosity {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp(None)
        .init();
}
