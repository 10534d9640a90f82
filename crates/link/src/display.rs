//! Sender display loop.
//!
//! Each step renders the next record completely before handing it to the
//! display, so pausing or stopping between steps never leaves a partial
//! symbol on screen.

use std::sync::Arc;
use std::time::Duration;

use glyphcast_protocol::{Packet, wire};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::LinkError;
use crate::codec::{Display, SymbolRenderer};

/// Shortest delay between symbols the loop will honor.
const MIN_FRAME_INTERVAL: Duration = Duration::from_millis(1);

/// How many times the packet sequence is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatPolicy {
    /// Cycle until stopped.
    Forever,
    /// Show the whole sequence this many times, then finish.
    Passes(u32),
}

/// Outcome of one display step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    Shown { index: usize, pass: u32 },
    Finished,
}

/// Pause, resume and stop handle for a running [`DisplayLoop`].
#[derive(Debug, Clone)]
pub struct DisplayControl {
    paused: Arc<watch::Sender<bool>>,
    cancel: CancellationToken,
}

impl Default for DisplayControl {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayControl {
    pub fn new() -> Self {
        let (paused, _) = watch::channel(false);
        Self {
            paused: Arc::new(paused),
            cancel: CancellationToken::new(),
        }
    }

    /// Holds the current symbol on screen until [`resume`](Self::resume).
    pub fn pause(&self) {
        self.paused.send_replace(true);
    }

    pub fn resume(&self) {
        self.paused.send_replace(false);
    }

    /// Ends the loop and clears the display.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_paused(&self) -> bool {
        *self.paused.borrow()
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Cycles the encoded packets of one build through a renderer onto a display.
pub struct DisplayLoop<R, D> {
    records: Vec<String>,
    renderer: R,
    display: D,
    policy: RepeatPolicy,
    next: usize,
    pass: u32,
}

impl<R, D> DisplayLoop<R, D>
where
    R: SymbolRenderer,
    D: Display<Image = R::Image>,
{
    /// Encodes `packets` up front; fails if there is nothing to show.
    pub fn new(
        packets: &[Packet],
        renderer: R,
        display: D,
        policy: RepeatPolicy,
    ) -> Result<Self, LinkError> {
        if packets.is_empty() {
            return Err(LinkError::Empty);
        }
        let records = packets
            .iter()
            .map(wire::encode)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            records,
            renderer,
            display,
            policy,
            next: 0,
            pass: 0,
        })
    }

    /// Number of distinct symbols per pass.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_finished(&self) -> bool {
        match self.policy {
            RepeatPolicy::Forever => false,
            RepeatPolicy::Passes(n) => self.pass >= n,
        }
    }

    /// Renders and shows the next symbol, then advances.
    ///
    /// A render failure leaves the display untouched and the position
    /// unchanged.
    pub fn step(&mut self) -> Result<StepResult, LinkError> {
        if self.is_finished() {
            return Ok(StepResult::Finished);
        }
        let index = self.next;
        let image = self.renderer.render(&self.records[index])?;
        self.display.show(image)?;

        let pass = self.pass;
        self.next = (index + 1) % self.records.len();
        if self.next == 0 {
            self.pass += 1;
        }
        Ok(StepResult::Shown { index, pass })
    }

    /// Steps once per `interval` until finished or stopped. Returns the
    /// number of symbols shown. The display is cleared on exit.
    pub async fn run(mut self, interval: Duration, control: DisplayControl) -> Result<u64, LinkError> {
        let result = self.drive(interval, &control).await;
        self.display.clear();
        match &result {
            Ok(shown) => tracing::info!(shown, symbols = self.records.len(), "display loop ended"),
            Err(e) => tracing::warn!(error = %e, "display loop failed"),
        }
        result
    }

    async fn drive(&mut self, interval: Duration, control: &DisplayControl) -> Result<u64, LinkError> {
        let mut ticker = tokio::time::interval(interval.max(MIN_FRAME_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut paused = control.paused.subscribe();
        let mut shown = 0u64;

        loop {
            let is_paused = *paused.borrow_and_update();
            if is_paused {
                tokio::select! {
                    _ = control.cancel.cancelled() => return Ok(shown),
                    _ = paused.changed() => continue,
                }
            }

            tokio::select! {
                _ = control.cancel.cancelled() => return Ok(shown),
                _ = ticker.tick() => {}
            }
            if *paused.borrow() {
                continue;
            }

            match self.step()? {
                StepResult::Shown { index, pass } => {
                    shown += 1;
                    tracing::trace!(index, pass, "symbol shown");
                }
                StepResult::Finished => return Ok(shown),
            }
        }
    }
}
