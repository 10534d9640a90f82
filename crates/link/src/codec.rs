//! Seams to the barcode codec, the screen and the capture device.
//!
//! The codec only has to be lossless for the record bytes; detecting loss is
//! the assembler's job via checksums.

use crate::LinkError;

/// Turns a serialized packet record into a displayable symbol.
pub trait SymbolRenderer: Send {
    type Image: Send;

    fn render(&self, record: &str) -> Result<Self::Image, LinkError>;
}

/// Recovers a serialized packet record from a captured frame.
pub trait SymbolDecoder: Send + Sync + 'static {
    type Frame: Send + 'static;

    /// Returns `None` if the frame holds no readable symbol.
    fn decode(&self, frame: &Self::Frame) -> Option<Vec<u8>>;
}

/// Produces raw frames on demand.
pub trait FrameSource: Send {
    type Frame: Send + 'static;

    /// Returns `None` if no frame is available right now.
    fn capture(&mut self) -> Option<Self::Frame>;
}

/// Sender-side surface the rendered symbols are shown on.
pub trait Display: Send {
    type Image;

    /// Replaces the visible symbol with `image`.
    fn show(&mut self, image: Self::Image) -> Result<(), LinkError>;

    /// Removes whatever symbol is visible.
    fn clear(&mut self);
}

/// Lossless text stand-in for a barcode codec: one record per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextSymbolCodec;

impl SymbolRenderer for TextSymbolCodec {
    type Image = String;

    fn render(&self, record: &str) -> Result<String, LinkError> {
        if record.contains('\n') {
            return Err(LinkError::Render("record spans multiple lines".into()));
        }
        Ok(record.to_string())
    }
}

impl SymbolDecoder for TextSymbolCodec {
    type Frame = String;

    fn decode(&self, frame: &String) -> Option<Vec<u8>> {
        let line = frame.trim();
        if line.is_empty() {
            return None;
        }
        Some(line.as_bytes().to_vec())
    }
}
