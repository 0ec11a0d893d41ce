use clap::Parser;
use sectrader::cli::{run, Cli};
use tracing::Level;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();

    run(cli)
}
