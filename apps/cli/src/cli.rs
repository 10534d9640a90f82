//! Command-line argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use glyphcast_protocol::{CorrectionLevel, PayloadCapacity, QR_BYTE_CAPACITY};

use crate::config::Config;

/// glyphcast - move files through a one-way stream of barcode symbols.
#[derive(Debug, Parser)]
#[command(name = "glyphcast", version, about = "Move files through a one-way stream of barcode symbols")]
pub struct Cli {
    /// Configuration file (default: ~/.config/glyphcast/config.toml)
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Split a file into packets and show them as symbol records, one per line
    Send(SendArgs),
    /// Reassemble files from symbol records, one per line
    Receive(ReceiveArgs),
    /// Print symbol payload capacities
    Capacity(CapacityArgs),
}

#[derive(Debug, Args)]
pub struct SendArgs {
    /// File to send
    pub input: PathBuf,

    /// Write records here instead of stdout
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Name the receiver will save the file under (default: input file name)
    #[arg(long = "name")]
    pub name: Option<String>,

    /// Payload bytes per symbol (1-255)
    #[arg(long = "chunk-size")]
    pub chunk_size: Option<u32>,

    /// Error-correction level (L, M, Q, H)
    #[arg(short = 'e', long = "correction")]
    pub correction: Option<CorrectionLevel>,

    /// Symbol version the chunk size must fit (1-40)
    #[arg(long = "symbol-version")]
    pub symbol_version: Option<u8>,

    /// Times to cycle through all symbols (0 = until interrupted)
    #[arg(long = "passes")]
    pub passes: Option<u32>,

    /// Delay between symbols in milliseconds
    #[arg(long = "interval-ms")]
    pub interval_ms: Option<u64>,
}

#[derive(Debug, Args)]
pub struct ReceiveArgs {
    /// File of records to read (default: stdin)
    pub input: Option<PathBuf>,

    /// Directory completed files are written to
    #[arg(short = 'd', long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CapacityArgs {
    /// Only show this symbol version
    #[arg(long = "symbol-version")]
    pub symbol_version: Option<u8>,
}

/// Prints byte capacities per version and level, marking rows that fit the
/// configured chunk size.
pub fn print_capacity(config: &Config, args: &CapacityArgs) {
    let versions: Vec<u8> = match args.symbol_version {
        Some(v) => vec![v],
        None => (1..=QR_BYTE_CAPACITY.max_version()).collect(),
    };

    println!("version      L      M      Q      H");
    for version in versions {
        let caps: Vec<String> = CorrectionLevel::all()
            .iter()
            .map(|level| match QR_BYTE_CAPACITY.max_payload_bytes(version, level.as_str()) {
                Some(cap) => format!("{cap:>6}"),
                None => format!("{:>6}", "-"),
            })
            .collect();
        let fits = QR_BYTE_CAPACITY
            .max_payload_bytes(version, config.correction.as_str())
            .is_some_and(|cap| cap >= config.chunk_size as usize);
        let marker = if fits { " *" } else { "" };
        println!("{version:>7} {}{marker}", caps.join(" "));
    }
    println!(
        "* fits chunk size {} at correction {}",
        config.chunk_size, config.correction
    );
}
