use embedded_hal::delay::DelayNs;

/// A free-running hardware cycle counter.
///
/// The counter is expected to increase by one per core clock cycle and wrap
/// at `u32::MAX`. All elapsed-time math in this crate uses wrapping
/// subtraction, so a wrap in the middle of a wait is harmless as long as a
/// single wait stays shorter than one full counter period.
pub trait CycleCounter {
    /// Returns the current counter value.
    fn cycles(&self) -> u32;
}

impl<T: CycleCounter + ?Sized> CycleCounter for &T {
    fn cycles(&self) -> u32 {
        T::cycles(self)
    }
}

/// Longest single wait, in cycles: half a counter period.
///
/// Wrapping subtraction can only tell "elapsed" from "not yet" for spans
/// shorter than this, so timeouts and delay steps are capped here.
pub const MAX_WAIT_CYCLES: u32 = u32::MAX / 2;

/// Microsecond timing on top of a [`CycleCounter`].
///
/// The cycles-per-microsecond ratio is computed once from the core clock
/// frequency. Clocks slower than 1 MHz are rounded up to one cycle per
/// microsecond, so delays on such parts run long rather than collapsing to
/// zero.
pub struct CycleTimer<C> {
    counter: C,
    cycles_per_us: u32,
}

impl<C: CycleCounter> CycleTimer<C> {
    /// Creates a timer for a core running at `core_clock_hz`.
    ///
    /// The counter must already be running. Timers built from the same
    /// counter share its baseline, so resetting the counter while a wait is
    /// in flight corrupts that wait.
    pub fn new(counter: C, core_clock_hz: u32) -> Self {
        CycleTimer {
            counter,
            cycles_per_us: (core_clock_hz / 1_000_000).max(1),
        }
    }

    /// Current counter value.
    #[inline]
    pub fn now(&self) -> u32 {
        self.counter.cycles()
    }

    pub fn cycles_per_us(&self) -> u32 {
        self.cycles_per_us
    }

    /// Converts microseconds into counter cycles, capped at [`MAX_WAIT_CYCLES`].
    #[inline]
    pub fn us_to_cycles(&self, us: u32) -> u32 {
        us.saturating_mul(self.cycles_per_us).min(MAX_WAIT_CYCLES)
    }

    /// Cycles elapsed since `since`, wrap-safe.
    #[inline]
    pub fn elapsed_cycles(&self, since: u32) -> u32 {
        self.now().wrapping_sub(since)
    }

    /// Busy-waits for at least `us` microseconds.
    ///
    /// Long delays are split into 1 ms steps, so any `u32` duration works
    /// regardless of the counter period.
    pub fn delay_us(&self, us: u32) {
        for _ in 0..us / 1_000 {
            self.spin(self.us_to_cycles(1_000));
        }
        self.spin(self.us_to_cycles(us % 1_000));
    }

    /// Gives the counter back.
    pub fn release(self) -> C {
        self.counter
    }

    fn spin(&self, cycles: u32) {
        let start = self.now();
        while self.elapsed_cycles(start) < cycles {}
    }
}

impl<C: CycleCounter> DelayNs for CycleTimer<C> {
    fn delay_ns(&mut self, ns: u32) {
        CycleTimer::delay_us(self, ns.div_ceil(1_000));
    }

    fn delay_us(&mut self, us: u32) {
        CycleTimer::delay_us(self, us);
    }

    fn delay_ms(&mut self, ms: u32) {
        for _ in 0..ms {
            self.spin(self.us_to_cycles(1_000));
        }
    }
}

#[cfg(feature = "cortex-m")]
pub use self::dwt::DwtCounter;

#[cfg(feature = "cortex-m")]
mod dwt {
    use cortex_m::peripheral::{DCB, DWT};

    use super::CycleCounter;

    /// [`CycleCounter`] backed by the DWT `CYCCNT` register.
    ///
    /// Not available on ARMv6-M parts, which have no cycle counter.
    pub struct DwtCounter {
        _dwt: DWT,
    }

    impl DwtCounter {
        /// Enables tracing, zeroes `CYCCNT` and starts it counting.
        ///
        /// Creating a second counter resets the baseline for every timer
        /// built on the first one.
        pub fn new(mut dwt: DWT, dcb: &mut DCB) -> Self {
            dcb.enable_trace();
            dwt.set_cycle_count(0);
            dwt.enable_cycle_counter();
            DwtCounter { _dwt: dwt }
        }
    }

    impl CycleCounter for DwtCounter {
        #[inline]
        fn cycles(&self) -> u32 {
            DWT::cycle_count()
        }
    }
}
