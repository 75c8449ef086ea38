use clap::{Arg, ArgAction, Command};

fn transcode_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("input")
            .help("Input file, or - for stdin")
            .required(true)
            .index(1),
    )
    .arg(
        Arg::new("output")
            .help("Output file, or - for stdout")
            .required(true)
            .index(2),
    )
    .arg(
        Arg::new("no_header")
            .short('n')
            .long("no-header")
            .help("Do not write the 0xFEFF stream header")
            .action(ArgAction::SetTrue),
    )
    .arg(
        Arg::new("sum")
            .short('c')
            .long("sum")
            .help("Embed/verify the remainder checksum for streamed input")
            .action(ArgAction::SetTrue),
    )
    .arg(
        Arg::new("force_sum")
            .short('C')
            .long("force-sum")
            .help("Embed/verify the remainder checksum even for single-shot input")
            .action(ArgAction::SetTrue),
    )
    .arg(
        Arg::new("timing")
            .short('t')
            .long("timing")
            .help("Print elapsed time to stderr")
            .action(ArgAction::SetTrue),
    )
}

pub fn build_cli() -> Command {
    Command::new("b16384")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Encode binary data into 16384-symbol UTF-16BE text and back")
        .arg_required_else_help(true)
        .subcommand_required(true)
        .subcommand(transcode_args(
            Command::new("encode")
                .visible_alias("e")
                .about("Encode a file or stdin"),
        ))
        .subcommand(transcode_args(
            Command::new("decode")
                .visible_alias("d")
                .about("Decode a file or stdin"),
        ))
}

pub fn parse_args() -> clap::ArgMatches {
    build_cli().get_matches()
}
