//! `glyphcast send`: build packets from a file and cycle them out.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use glyphcast_link::{
    Display, DisplayControl, DisplayLoop, LinkError, RepeatPolicy, TextSymbolCodec,
};
use glyphcast_protocol::{CorrectionLevel, Packet, QR_BYTE_CAPACITY, TransferId};
use glyphcast_transfer::{build, validate_chunk_size};

use crate::cli::SendArgs;
use crate::config::Config;

/// Writes each symbol record as one line.
pub struct LineDisplay<W> {
    out: W,
}

impl<W: Write + Send> LineDisplay<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write + Send> Display for LineDisplay<W> {
    type Image = String;

    fn show(&mut self, image: String) -> Result<(), LinkError> {
        writeln!(self.out, "{image}")
            .and_then(|_| self.out.flush())
            .map_err(|e| LinkError::Display(e.to_string()))
    }

    fn clear(&mut self) {
        if let Err(e) = self.out.flush() {
            tracing::warn!(error = %e, "flush on clear failed");
        }
    }
}

/// Effective send settings after CLI overrides.
#[derive(Debug, Clone)]
struct SendSettings {
    chunk_size: u32,
    correction: CorrectionLevel,
    symbol_version: u8,
    policy: RepeatPolicy,
    interval: Duration,
}

impl SendSettings {
    fn resolve(config: &Config, args: &SendArgs) -> Self {
        let passes = args.passes.unwrap_or(config.passes);
        Self {
            chunk_size: args.chunk_size.unwrap_or(config.chunk_size),
            correction: args.correction.unwrap_or(config.correction),
            symbol_version: args.symbol_version.unwrap_or(config.symbol_version),
            policy: if passes == 0 {
                RepeatPolicy::Forever
            } else {
                RepeatPolicy::Passes(passes)
            },
            interval: Duration::from_millis(args.interval_ms.unwrap_or(config.frame_interval_ms)),
        }
    }
}

/// Reads `args.input` and splits it into packets under a fresh transfer id.
fn prepare(settings: &SendSettings, args: &SendArgs) -> anyhow::Result<Vec<Packet>> {
    let tag = settings.correction.as_str();
    validate_chunk_size(
        settings.chunk_size,
        settings.symbol_version,
        tag,
        &QR_BYTE_CAPACITY,
    )?;

    let file_name = match &args.name {
        Some(name) => name.clone(),
        None => file_name_of(&args.input)?,
    };
    let content = std::fs::read(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;

    let transfer_id = TransferId::generate();
    let packets = build(&transfer_id, &file_name, &content, settings.chunk_size, tag)?;
    tracing::info!(
        transfer_id = %transfer_id,
        file_name = %file_name,
        bytes = content.len(),
        symbols = packets.len(),
        correction = tag,
        "transfer prepared"
    );
    Ok(packets)
}

fn file_name_of(path: &Path) -> anyhow::Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name, pass --name", path.display()))
}

pub async fn run(config: &Config, args: SendArgs) -> anyhow::Result<()> {
    let settings = SendSettings::resolve(config, &args);
    let packets = prepare(&settings, &args)?;

    let out: Box<dyn Write + Send> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(std::io::stdout()),
    };
    let display_loop = DisplayLoop::new(
        &packets,
        TextSymbolCodec,
        LineDisplay::new(out),
        settings.policy,
    )?;

    let control = DisplayControl::new();
    let stopper = control.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupted, stopping");
            stopper.stop();
        }
    });

    let shown = display_loop.run(settings.interval, control).await?;
    tracing::info!(shown, "send finished");
    Ok(())
}
