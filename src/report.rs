//! Text lines for a serial console.
//!
//! The format is line-oriented and ends every line with `\r\n`, so it can be
//! fed straight to a UART and parsed on the host side with a simple pattern
//! such as `H=<float>%, T=<float>C`.

use core::fmt::{self, Write};

use crate::error::DhtError;
use crate::frame::Reading;

/// Line written when a read fails, whatever the reason.
pub const READ_FAILED: &str = "DHT11 read failed";

/// Writes the startup banner, e.g. `DHT11 ready (NUCLEO-F756ZG, D5=PE11)`.
pub fn write_banner<W: Write>(out: &mut W, label: &str) -> fmt::Result {
    write!(out, "DHT11 ready ({label})\r\n")
}

/// Writes one report line for the outcome of a read.
pub fn write_report<W: Write, E>(
    out: &mut W,
    result: &Result<Reading, DhtError<E>>,
) -> fmt::Result {
    match result {
        Ok(reading) => write!(out, "{reading}\r\n"),
        Err(_) => write!(out, "{READ_FAILED}\r\n"),
    }
}
