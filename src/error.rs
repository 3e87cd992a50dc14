use core::fmt;

use crate::frame::ChecksumError;

/// The point in a read at which the sensor stopped answering.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Sensor never pulled the released line low.
    AckLow,
    /// Sensor never let go of its acknowledge low pulse.
    AckHigh,
    /// Sensor never ended its acknowledge high pulse to start the data.
    DataStart,
    /// Rising edge of data bit `n` (0-based, MSB of byte 0 first) never came.
    BitStart(u8),
    /// Data bit `n` never went low again.
    BitEnd(u8),
}

impl Stage {
    /// `true` for the acknowledge stages before any data bit.
    pub fn is_handshake(&self) -> bool {
        matches!(self, Stage::AckLow | Stage::AckHigh | Stage::DataStart)
    }
}

/// Possible errors from the DHT11 driver.
#[derive(Debug, PartialEq, Eq)]
pub enum DhtError<E> {
    /// Timed out waiting for a pin state change.
    Timeout(Stage),
    /// Checksum did not match the received data.
    ChecksumMismatch(ChecksumError),
    /// The timing profile cannot produce a valid read.
    InvalidTiming,
    /// Error from the GPIO pin (input/output/direction).
    PinError(E),
}

impl<E> DhtError<E> {
    /// Timed out before the first data bit.
    pub fn is_handshake_timeout(&self) -> bool {
        matches!(self, DhtError::Timeout(stage) if stage.is_handshake())
    }

    /// Timed out while receiving data bits.
    pub fn is_capture_timeout(&self) -> bool {
        matches!(self, DhtError::Timeout(stage) if !stage.is_handshake())
    }
}

impl<E> From<E> for DhtError<E> {
    fn from(value: E) -> Self {
        Self::PinError(value)
    }
}

impl<E: fmt::Debug> fmt::Display for DhtError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DhtError::Timeout(stage) => write!(f, "timed out at {stage:?}"),
            DhtError::ChecksumMismatch(ChecksumError { computed, received }) => write!(
                f,
                "checksum mismatch: computed {computed:#04x}, received {received:#04x}"
            ),
            DhtError::InvalidTiming => f.write_str("invalid timing profile"),
            DhtError::PinError(e) => write!(f, "pin error: {e:?}"),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for DhtError<E> {}

#[cfg(feature = "defmt")]
impl<E> defmt::Format for DhtError<E> {
    fn format(&self, f: defmt::Formatter<'_>) {
        match self {
            DhtError::Timeout(stage) => defmt::write!(f, "Timeout({})", stage),
            DhtError::ChecksumMismatch(err) => defmt::write!(f, "ChecksumMismatch({})", err),
            DhtError::InvalidTiming => defmt::write!(f, "InvalidTiming"),
            DhtError::PinError(_) => defmt::write!(f, "PinError"),
        }
    }
}
