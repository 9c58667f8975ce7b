mod cli;
mod commands;
mod formatting;
mod settings;

use std::process::ExitCode;

use cli::Commands;
use commands::{run_generate, run_upscale};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = cli::parse();
    init_tracing(args.verbose);

    match args.command {
        Commands::Generate { target } => {
            run_generate(&args.config, args.verbose, args.threads, args.format, target)
        }
        Commands::Upscale {
            design,
            output,
            scale,
            cpu,
            suffix,
            extension,
        } => run_upscale(
            args.verbose,
            args.threads,
            args.format,
            design,
            output,
            scale,
            cpu,
            suffix,
            extension,
        ),
    }
}

/// Logs go to stderr so stdout stays a clean JSON report. `RUST_LOG` wins
/// over the --verbose default.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
