//! Panel error types

use thiserror::Error;

/// Errors from decoding a single received line.
///
/// Both kinds are recoverable: the offending line is discarded and the
/// reader keeps going with the next one.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// Line length was not the fixed frame size (leader and terminator
    /// included).
    #[error("bad frame length: expected 5 bytes, got {len}")]
    Length { len: usize },

    /// A payload byte was not a hex digit.
    #[error("bad hex digit in frame: 0x{byte:02X}")]
    Hex { byte: u8 },
}

/// Errors from panel operations
#[derive(Error, Debug)]
pub enum PanelError {
    /// Serial port could not be opened. Fatal to connection establishment.
    #[error("failed to open panel port: {0}")]
    Open(#[from] serialport::Error),

    /// The inbound stream reached end of data. Terminal for the reader.
    #[error("panel disconnected")]
    Disconnected,

    /// Writing an outbound frame failed. Recoverable per row per batch.
    #[error("write failed: {0}")]
    Write(#[from] std::io::Error),
}
