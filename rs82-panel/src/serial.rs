//! Serial transport for the panel link.
//!
//! The panel is a plain byte-oriented serial device at a fixed rate.
//! The port is opened once and split into a read half and a write half
//! so the reader thread and the lights thread each own one direction
//! outright.

use std::time::Duration;

use serialport::SerialPort;

use crate::error::PanelError;

/// The panel's fixed line rate.
pub const BAUD_RATE: u32 = 9600;

/// Read timeout for the reader thread. Reads that time out are retried,
/// so this only bounds how long a torn-down port goes unnoticed.
pub const READ_TIMEOUT: Duration = Duration::from_millis(500);

/// Open the panel device and split it into reader and writer halves.
pub fn open(path: &str) -> Result<(Box<dyn SerialPort>, Box<dyn SerialPort>), PanelError> {
    let reader = serialport::new(path, BAUD_RATE)
        .timeout(READ_TIMEOUT)
        .open()?;
    let writer = reader.try_clone()?;
    Ok((reader, writer))
}
