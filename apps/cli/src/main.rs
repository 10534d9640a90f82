//! Glyphcast command-line entry point.

mod cli;
mod config;
mod receive;
mod send;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};

fn main() -> anyhow::Result<()> {
    // Records go to stdout, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config::Config::load(cli.config.as_deref())?;
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Command::Send(args) => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(send::run(&config, args))
        }
        Command::Receive(args) => receive::run(&config, args),
        Command::Capacity(args) => {
            cli::print_capacity(&config, &args);
            Ok(())
        }
    }
}
