use core::fmt;

/// Number of bytes in one transmission from the sensor.
pub const FRAME_LEN: usize = 5;

/// Checksum over the four data bytes: the low 8 bits of their sum.
pub fn checksum(data: [u8; 4]) -> u8 {
    data.iter().fold(0u8, |sum, v| sum.wrapping_add(*v))
}

/// The checksum byte did not match the data bytes.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChecksumError {
    /// Checksum computed from the received data bytes.
    pub computed: u8,
    /// Checksum byte sent by the sensor.
    pub received: u8,
}

/// A complete, checksum-consistent transmission.
///
/// Layout: humidity integral, humidity fraction, temperature integral,
/// temperature fraction, checksum.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawFrame {
    bytes: [u8; FRAME_LEN],
}

impl RawFrame {
    /// Accepts `bytes` only if the last one is the checksum of the other four.
    pub fn from_bytes(bytes: [u8; FRAME_LEN]) -> Result<Self, ChecksumError> {
        let [b0, b1, b2, b3, received] = bytes;
        let computed = checksum([b0, b1, b2, b3]);
        if computed != received {
            return Err(ChecksumError { computed, received });
        }
        Ok(RawFrame { bytes })
    }

    pub fn bytes(&self) -> &[u8; FRAME_LEN] {
        &self.bytes
    }

    pub fn humidity_integral(&self) -> u8 {
        self.bytes[0]
    }

    pub fn humidity_fraction(&self) -> u8 {
        self.bytes[1]
    }

    pub fn temperature_integral(&self) -> u8 {
        self.bytes[2]
    }

    pub fn temperature_fraction(&self) -> u8 {
        self.bytes[3]
    }

    pub fn checksum(&self) -> u8 {
        self.bytes[4]
    }

    /// Converts the frame into physical units. See [`convert`].
    pub fn to_reading(&self) -> Reading {
        convert(self)
    }
}

impl TryFrom<[u8; FRAME_LEN]> for RawFrame {
    type Error = ChecksumError;

    fn try_from(bytes: [u8; FRAME_LEN]) -> Result<Self, Self::Error> {
        RawFrame::from_bytes(bytes)
    }
}

/// Reading returned by the DHT11 sensor.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reading {
    /// Temperature in degrees Celsius.
    pub temperature: f32,
    /// Relative humidity in percent.
    pub relative_humidity: f32,
}

/// Converts a frame into a [`Reading`].
///
/// Only the integral bytes are used. The DHT11 reports whole units, and the
/// fraction bytes are deliberately left out of the result, as is any sign
/// handling for sub-zero temperatures.
pub fn convert(frame: &RawFrame) -> Reading {
    Reading {
        temperature: f32::from(frame.temperature_integral()),
        relative_humidity: f32::from(frame.humidity_integral()),
    }
}

impl From<RawFrame> for Reading {
    fn from(frame: RawFrame) -> Self {
        convert(&frame)
    }
}

/// Renders the reading as `H=60.0%, T=25.0C`.
impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "H={:.1}%, T={:.1}C",
            self.relative_humidity, self.temperature
        )
    }
}
