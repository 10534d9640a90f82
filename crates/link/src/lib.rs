//! Glue between the transfer core and the optical channel.
//!
//! The barcode codec, the screen and the camera are external collaborators
//! modeled as traits in [`codec`]. The [`display`] loop cycles a build's
//! packets through a renderer onto a display; the [`capture`] loop pulls
//! frames from a source, decodes at most one at a time and feeds the
//! assembler.

pub mod capture;
pub mod codec;
pub mod display;
pub mod error;

pub use capture::{CaptureLoop, CaptureStats, FrameProcessor, FrameResult};
pub use codec::{Display, FrameSource, SymbolDecoder, SymbolRenderer, TextSymbolCodec};
pub use display::{DisplayControl, DisplayLoop, RepeatPolicy, StepResult};
pub use error::LinkError;

use std::time::Duration;

/// Default delay between displayed symbols.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(250);

/// Default delay between capture attempts.
pub const DEFAULT_CAPTURE_INTERVAL: Duration = Duration::from_millis(100);
