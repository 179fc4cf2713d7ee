//! Music Index - command-line front end for the library index.

use clap::Parser;
use music_index::cli;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_DIRECTIVES: &[&str] = &["music_index=info", "library=info", "db=info", "scanner=info"];

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Events use short targets ("library::songs", ...) besides the crate path
    let mut filter = EnvFilter::from_default_env();
    for directive in LOG_DIRECTIVES {
        filter = filter.add_directive(directive.parse()?);
    }

    // Logs go to stderr so `--json` output stays clean
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();

    cli::run_command(&args)
}
