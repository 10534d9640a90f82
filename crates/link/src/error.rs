//! Error types for the link layer.

use glyphcast_protocol::ProtocolError;

/// Errors produced by the display and capture loops.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("render failed: {0}")]
    Render(String),

    #[error("display failed: {0}")]
    Display(String),

    #[error("nothing to display")]
    Empty,
}
