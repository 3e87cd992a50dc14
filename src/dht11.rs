use core::fmt;

use embedded_hal::{delay::DelayNs, digital::PinState};

use crate::error::{DhtError, Stage};
use crate::frame::{FRAME_LEN, RawFrame, Reading};
use crate::pin::{Direction, DirectionalPin, wait_for_level};
use crate::report::write_report;
use crate::timer::{CycleCounter, CycleTimer};
use crate::timing::Timing;

/// Driver for the DHT11 temperature and humidity sensor.
///
/// The driver owns the data pin and the cycle timer for its whole life, so
/// two reads can never overlap on the same line.
pub struct Dht11<PIN, C> {
    pin: PIN,
    timer: CycleTimer<C>,
    timing: Timing,
}

impl<PIN, C, E> Dht11<PIN, C>
where
    PIN: DirectionalPin<Error = E>,
    C: CycleCounter,
{
    /// Creates a new instance of the DHT11 driver with datasheet timing.
    ///
    /// # Arguments
    ///
    /// * `pin` - The GPIO pin connected to the DHT11 data line. Must support
    ///   switching between input and output.
    /// * `timer` - Cycle timer used for every delay and timeout.
    pub fn new(pin: PIN, timer: CycleTimer<C>) -> Self {
        Dht11 {
            pin,
            timer,
            timing: Timing::default(),
        }
    }

    /// Creates a driver with a custom timing profile.
    ///
    /// Returns [`DhtError::InvalidTiming`] if the profile cannot work, e.g.
    /// a sample delay that is not shorter than the bit timeout.
    pub fn with_timing(
        pin: PIN,
        timer: CycleTimer<C>,
        timing: Timing,
    ) -> Result<Self, DhtError<E>> {
        if !timing.is_valid() {
            return Err(DhtError::InvalidTiming);
        }
        Ok(Dht11 { pin, timer, timing })
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    /// Gives back the pin and the timer.
    pub fn release(self) -> (PIN, CycleTimer<C>) {
        (self.pin, self.timer)
    }

    /// Reads a temperature and humidity measurement from the DHT11 sensor.
    ///
    /// Performs one complete exchange: wake pulse, acknowledge, 40 data
    /// bits, checksum. There are no retries; call again on the next poll.
    ///
    /// # Returns
    ///
    /// * `Ok(Reading)` if the read is successful and the checksum is valid.
    /// * `Err(DhtError)` if a communication or checksum error occurs.
    pub fn read(&mut self) -> Result<Reading, DhtError<E>> {
        self.read_raw().map(Reading::from)
    }

    /// Like [`read`](Self::read) but returns the checksum-verified frame.
    ///
    /// The pin is switched back to input before returning, on success and on
    /// every error path. If that switch fails too, the original error wins.
    pub fn read_raw(&mut self) -> Result<RawFrame, DhtError<E>> {
        let transferred = self.transfer();
        let idle = self.pin.set_direction(Direction::Input);
        let data = transferred?;
        idle?;

        let frame = RawFrame::from_bytes(data).map_err(|err| {
            debug!("dht11: checksum mismatch {:?}", err);
            DhtError::ChecksumMismatch(err)
        })?;
        trace!("dht11: frame {:?}", frame.bytes());
        Ok(frame)
    }

    /// One pass of the reporting loop.
    ///
    /// Reads the sensor, writes the report line to `out` and then waits out
    /// the read interval. A failing sink does not affect the returned result.
    pub fn poll<W: fmt::Write>(&mut self, out: &mut W) -> Result<Reading, DhtError<E>> {
        let result = self.read();
        if write_report(out, &result).is_err() {
            debug!("dht11: report sink failed");
        }
        DelayNs::delay_ms(&mut self.timer, self.timing.read_interval_ms);
        result
    }

    fn transfer(&mut self) -> Result<[u8; FRAME_LEN], DhtError<E>> {
        self.wake()?;

        with_interrupts_masked(|| -> Result<[u8; FRAME_LEN], DhtError<E>> {
            self.release_line()?;
            self.acknowledge()?;

            let mut data = [0; FRAME_LEN];
            for (index, b) in (0u8..).zip(data.iter_mut()) {
                *b = self.read_byte(index)?;
            }
            Ok(data)
        })
    }

    /// Holds the line low long enough for the sensor to notice.
    fn wake(&mut self) -> Result<(), DhtError<E>> {
        self.pin.set_direction(Direction::Output)?;
        self.pin.set_low()?;
        DelayNs::delay_ms(&mut self.timer, self.timing.wake_pulse_ms);
        Ok(())
    }

    /// Drives the line high briefly, then lets go of it.
    fn release_line(&mut self) -> Result<(), DhtError<E>> {
        self.pin.set_high()?;
        self.timer.delay_us(self.timing.release_us);
        self.pin.set_direction(Direction::Input)?;
        Ok(())
    }

    /// Sensor answers with ~80us low, ~80us high, then the first bit's low.
    fn acknowledge(&mut self) -> Result<(), DhtError<E>> {
        let timeout = self.timing.ack_timeout_us;
        self.expect(PinState::Low, timeout, Stage::AckLow)?;
        self.expect(PinState::High, timeout, Stage::AckHigh)?;
        self.expect(PinState::Low, timeout, Stage::DataStart)?;
        Ok(())
    }

    /// Reads byte `index` of the frame, MSB first.
    fn read_byte(&mut self, index: u8) -> Result<u8, DhtError<E>> {
        let mut byte: u8 = 0;

        for i in 0..8 {
            let bit = self.read_bit(index * 8 + i)?;
            byte = (byte << 1) | u8::from(bit);
        }

        Ok(byte)
    }

    /// Reads data bit `n`.
    ///
    /// A "0" is a ~28us high pulse and a "1" a ~70us one, so sampling at a
    /// fixed offset after the rising edge tells them apart.
    fn read_bit(&mut self, n: u8) -> Result<bool, DhtError<E>> {
        let timeout = self.timing.bit_timeout_us;
        self.expect(PinState::High, timeout, Stage::BitStart(n))?;

        self.timer.delay_us(self.timing.sample_delay_us);

        // Still high: long pulse, bit is 1
        let bit_is_one = self.pin.is_high()?;
        self.expect(PinState::Low, timeout, Stage::BitEnd(n))?;

        Ok(bit_is_one)
    }

    fn expect(
        &mut self,
        level: PinState,
        timeout_us: u32,
        stage: Stage,
    ) -> Result<(), DhtError<E>> {
        if wait_for_level(&mut self.pin, &self.timer, level, timeout_us)? {
            Ok(())
        } else {
            debug!("dht11: timed out at {:?}", stage);
            Err(DhtError::Timeout(stage))
        }
    }
}

#[cfg(feature = "critical-section")]
fn with_interrupts_masked<R>(f: impl FnOnce() -> R) -> R {
    critical_section::with(|_| f())
}

#[cfg(not(feature = "critical-section"))]
fn with_interrupts_masked<R>(f: impl FnOnce() -> R) -> R {
    f()
}
