// Entrypoint for the CLI application.
// - Keeps `main` small: parse arguments, set up logging, hand off to `cli::run`.
// - Returns `anyhow::Result` so failures print with their context chain.

use clap::Parser;
use kerbalstuff::cli::{self, Cli};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    // RUST_LOG wins; otherwise `--verbose` turns on request tracing.
    let default_filter = if args.verbose { "kerbalstuff=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    cli::run(args)
}
