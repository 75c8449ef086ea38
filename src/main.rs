use std::time::Instant;

use anyhow::{Context, Result};
use base16384::file_ops::{self, StreamOptions, SumMode};

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    let matches = base16384::parse_args();
    let (name, sub) = matches.subcommand().expect("subcommand is required");
    let input = sub.get_one::<String>("input").expect("input is required");
    let output = sub.get_one::<String>("output").expect("output is required");
    let opts = StreamOptions {
        no_header: sub.get_flag("no_header"),
        sum: if sub.get_flag("force_sum") {
            SumMode::Forced
        } else if sub.get_flag("sum") {
            SumMode::OnRemain
        } else {
            SumMode::Off
        },
    };

    let start = Instant::now();
    let written = match name {
        "encode" => file_ops::encode_file(input, output, opts),
        "decode" => file_ops::decode_file(input, output, opts),
        _ => unreachable!(),
    }
    .with_context(|| format!("{name} {input} failed"))?;
    log::debug!("{written} bytes written");

    if sub.get_flag("timing") {
        eprintln!("spend time: {}ms", start.elapsed().as_millis());
    }
    Ok(())
}
