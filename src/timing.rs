/// Timing profile for one read of the sensor.
///
/// The defaults in [`DHT11_TIMING`] match the DHT11 datasheet. Override
/// them for sensors or boards that drift from the datasheet; the sample
/// delay is the value that matters most, since it has to sit between the
/// ~28 us "0" pulse and the ~70 us "1" pulse.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timing {
    /// How long the host holds the line low to wake the sensor.
    pub wake_pulse_ms: u32,
    /// How long the host drives the line high before releasing it.
    pub release_us: u32,
    /// Timeout for each of the three edges of the sensor's acknowledge.
    pub ack_timeout_us: u32,
    /// Timeout for each edge of a data bit.
    pub bit_timeout_us: u32,
    /// Delay after a bit's rising edge before the line is sampled.
    pub sample_delay_us: u32,
    /// Pause between reads in the reporting loop.
    pub read_interval_ms: u32,
}

/// Datasheet timing for the DHT11.
pub const DHT11_TIMING: Timing = Timing {
    wake_pulse_ms: 20,
    release_us: 30,
    ack_timeout_us: 100,
    bit_timeout_us: 70,
    sample_delay_us: 40,
    read_interval_ms: 2000,
};

impl Default for Timing {
    fn default() -> Self {
        DHT11_TIMING
    }
}

/// Upper bound for the microsecond fields of a [`Timing`].
///
/// One second stays inside half a 32-bit counter period for core clocks up
/// to 2 GHz.
pub const MAX_FINE_US: u32 = 1_000_000;

impl Timing {
    /// Checks that a read with this profile can succeed at all.
    pub fn is_valid(&self) -> bool {
        let fine = [
            self.release_us,
            self.ack_timeout_us,
            self.bit_timeout_us,
            self.sample_delay_us,
        ];
        self.wake_pulse_ms > 0
            && self.ack_timeout_us > 0
            && self.sample_delay_us > 0
            && self.sample_delay_us < self.bit_timeout_us
            && fine.iter().all(|&us| us <= MAX_FINE_US)
    }

    /// Worst-case duration of one read in microseconds, ignoring polling
    /// overhead.
    pub fn worst_case_us(&self) -> u32 {
        const BITS: u32 = 40;
        let per_bit = self
            .bit_timeout_us
            .saturating_mul(2)
            .saturating_add(self.sample_delay_us);
        self.wake_pulse_ms
            .saturating_mul(1_000)
            .saturating_add(self.release_us)
            .saturating_add(self.ack_timeout_us.saturating_mul(3))
            .saturating_add(per_bit.saturating_mul(BITS))
    }
}
