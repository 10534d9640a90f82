//! `glyphcast receive`: reassemble files from a stream of symbol records.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use glyphcast_link::{FrameProcessor, FrameResult, TextSymbolCodec};
use glyphcast_transfer::{Assembler, ProcessStatus, write_assembled};

use crate::cli::ReceiveArgs;
use crate::config::Config;

/// What one receive session produced.
#[derive(Debug, Default)]
pub struct ReceiveSummary {
    pub written: Vec<PathBuf>,
    /// Transfers still missing pieces when input ended, with the count.
    pub incomplete: Vec<(String, usize)>,
    /// Records the assembler refused, plus completed files that could not
    /// be written.
    pub rejected: u64,
    /// Lines that were not text and never reached the decoder.
    pub unreadable: u64,
}

pub fn run(config: &Config, args: ReceiveArgs) -> anyhow::Result<()> {
    let output_dir = args.output_dir.unwrap_or_else(|| config.output_dir.clone());

    let summary = match &args.input {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
            receive_from(BufReader::new(file), &output_dir)?
        }
        None => receive_from(std::io::stdin().lock(), &output_dir)?,
    };

    for (transfer_id, missing) in &summary.incomplete {
        tracing::warn!(transfer_id = %transfer_id, missing, "input ended before transfer completed");
    }
    tracing::info!(
        written = summary.written.len(),
        incomplete = summary.incomplete.len(),
        rejected = summary.rejected,
        unreadable = summary.unreadable,
        "receive finished"
    );
    Ok(())
}

/// Feeds every line of `reader` to a fresh assembler, writing each file to
/// `output_dir` as soon as it completes.
///
/// A bad line only ever costs that line: only a failing reader ends the
/// session early.
pub fn receive_from<R: BufRead>(reader: R, output_dir: &Path) -> anyhow::Result<ReceiveSummary> {
    let processor = FrameProcessor::new(TextSymbolCodec, Arc::new(Assembler::new()));
    let mut summary = ReceiveSummary::default();

    for raw in reader.split(b'\n') {
        let raw = raw.context("reading records")?;
        let Ok(line) = String::from_utf8(raw) else {
            summary.unreadable += 1;
            tracing::debug!("skipping line that is not UTF-8");
            continue;
        };
        let FrameResult::Processed(outcome) = processor.handle(&line) else {
            continue;
        };

        if outcome.status.is_rejection() {
            summary.rejected += 1;
            if let Some(snapshot) = &outcome.snapshot {
                tracing::debug!(
                    transfer_id = %snapshot.transfer_id,
                    status = %outcome.status,
                    "record rejected"
                );
            }
        } else if outcome.status == ProcessStatus::Accepted {
            if let Some(snapshot) = &outcome.snapshot {
                tracing::debug!(
                    transfer_id = %snapshot.transfer_id,
                    received = snapshot.received_pieces,
                    total = snapshot.total_pieces,
                    "progress"
                );
            }
        }

        if let Some(file) = outcome.file {
            match write_assembled(output_dir, &file) {
                Ok(path) => summary.written.push(path),
                Err(e) => {
                    summary.rejected += 1;
                    tracing::warn!(
                        transfer_id = %file.transfer_id,
                        file_name = %file.file_name,
                        error = %e,
                        "received file not written"
                    );
                }
            }
        }
    }

    summary.incomplete = processor
        .assembler()
        .snapshots()
        .into_iter()
        .filter(|s| !s.completed)
        .map(|s| {
            let missing = s.missing_pieces().len();
            (s.transfer_id.to_string(), missing)
        })
        .collect();

    let stats = processor.stats();
    tracing::debug!(
        undecodable = stats.undecodable(),
        malformed = stats.malformed(),
        processed = stats.processed(),
        "records consumed"
    );
    Ok(summary)
}
