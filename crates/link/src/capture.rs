//! Receiver capture loop.
//!
//! At most one frame is decoded at a time. A frame captured while a decode
//! is outstanding is dropped, never queued: missing pieces come around
//! again on a later pass of the sender's loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use glyphcast_protocol::{ProtocolError, wire};
use glyphcast_transfer::{Assembler, ProcessOutcome};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::codec::{FrameSource, SymbolDecoder};

/// Callback invoked with every assembler outcome.
pub type OutcomeCallback = Box<dyn Fn(&ProcessOutcome) + Send + Sync + 'static>;

/// What became of one frame.
#[derive(Debug)]
pub enum FrameResult {
    /// No symbol could be read from the frame.
    Undecodable,
    /// A symbol was read but did not hold a valid record.
    Malformed(ProtocolError),
    /// The record reached the assembler.
    Processed(ProcessOutcome),
}

/// Frame counters, updated lock-free.
#[derive(Debug, Default)]
pub struct CaptureStats {
    captured: AtomicU64,
    dropped: AtomicU64,
    undecodable: AtomicU64,
    malformed: AtomicU64,
    processed: AtomicU64,
}

impl CaptureStats {
    pub fn captured(&self) -> u64 {
        self.captured.load(Ordering::Relaxed)
    }

    /// Frames discarded because a decode was already in flight.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn undecodable(&self) -> u64 {
        self.undecodable.load(Ordering::Relaxed)
    }

    pub fn malformed(&self) -> u64 {
        self.malformed.load(Ordering::Relaxed)
    }

    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Decodes frames and feeds the resulting packets to a shared assembler.
pub struct FrameProcessor<D> {
    decoder: D,
    assembler: Arc<Assembler>,
    busy: AtomicBool,
    stats: CaptureStats,
    on_outcome: Option<OutcomeCallback>,
}

impl<D: SymbolDecoder> FrameProcessor<D> {
    pub fn new(decoder: D, assembler: Arc<Assembler>) -> Self {
        Self {
            decoder,
            assembler,
            busy: AtomicBool::new(false),
            stats: CaptureStats::default(),
            on_outcome: None,
        }
    }

    /// Registers an observer for every outcome (e.g. a progress view).
    pub fn with_observer(mut self, callback: OutcomeCallback) -> Self {
        self.on_outcome = Some(callback);
        self
    }

    pub fn assembler(&self) -> &Arc<Assembler> {
        &self.assembler
    }

    pub fn stats(&self) -> &CaptureStats {
        &self.stats
    }

    /// Returns `true` while a decode is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Claims the single decode slot. Returns `None` if it is taken.
    pub fn try_begin(self: &Arc<Self>) -> Option<InFlight<D>> {
        if self.busy.swap(true, Ordering::AcqRel) {
            return None;
        }
        Some(InFlight {
            processor: Arc::clone(self),
        })
    }

    /// Decodes one frame and hands the packet to the assembler.
    ///
    /// Does not consult the decode slot; use [`try_begin`](Self::try_begin)
    /// for the drop-when-busy policy.
    pub fn handle(&self, frame: &D::Frame) -> FrameResult {
        let Some(record) = self.decoder.decode(frame) else {
            CaptureStats::bump(&self.stats.undecodable);
            tracing::trace!("no symbol in frame");
            return FrameResult::Undecodable;
        };

        let packet = match wire::decode_bytes(&record) {
            Ok(packet) => packet,
            Err(e) => {
                CaptureStats::bump(&self.stats.malformed);
                tracing::debug!(error = %e, "malformed record");
                return FrameResult::Malformed(e);
            }
        };

        let outcome = self.assembler.process(&packet);
        CaptureStats::bump(&self.stats.processed);
        if let Some(callback) = &self.on_outcome {
            callback(&outcome);
        }
        FrameResult::Processed(outcome)
    }
}

/// Holds the decode slot; releases it on drop.
pub struct InFlight<D> {
    processor: Arc<FrameProcessor<D>>,
}

impl<D: SymbolDecoder> InFlight<D> {
    /// Processes the frame and releases the slot.
    pub fn process(self, frame: &D::Frame) -> FrameResult {
        self.processor.handle(frame)
    }
}

impl<D> Drop for InFlight<D> {
    fn drop(&mut self) {
        self.processor.busy.store(false, Ordering::Release);
    }
}

/// Timer-driven capture loop.
pub struct CaptureLoop<S, D> {
    source: S,
    processor: Arc<FrameProcessor<D>>,
}

impl<S, D> CaptureLoop<S, D>
where
    S: FrameSource<Frame = D::Frame>,
    D: SymbolDecoder,
{
    pub fn new(source: S, processor: Arc<FrameProcessor<D>>) -> Self {
        Self { source, processor }
    }

    /// Captures one frame per `interval` until cancelled. Decoding runs on
    /// the blocking pool so a slow decoder never stalls the timer.
    pub async fn run(mut self, interval: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let Some(frame) = self.source.capture() else {
                continue;
            };
            CaptureStats::bump(&self.processor.stats.captured);

            let Some(in_flight) = self.processor.try_begin() else {
                CaptureStats::bump(&self.processor.stats.dropped);
                tracing::trace!("decode in flight, frame dropped");
                continue;
            };
            tokio::task::spawn_blocking(move || {
                in_flight.process(&frame);
            });
        }

        let stats = self.processor.stats();
        tracing::info!(
            captured = stats.captured(),
            dropped = stats.dropped(),
            undecodable = stats.undecodable(),
            malformed = stats.malformed(),
            processed = stats.processed(),
            "capture loop stopped"
        );
    }
}
