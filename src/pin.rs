use embedded_hal::digital::{InputPin, OutputPin, PinState};

use crate::timer::{CycleCounter, CycleTimer};

/// Electrical direction of a bidirectional GPIO line.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// High impedance; the line is read and the external pull-up holds it high.
    Input,
    /// Push-pull output driven by the host.
    Output,
}

/// A GPIO line whose direction can be switched at runtime.
///
/// embedded-hal 1.0 has no trait for this, so HAL flex pins need a thin
/// adapter. Writes are only meaningful in [`Direction::Output`]; reads must
/// reflect the line level in [`Direction::Input`].
pub trait DirectionalPin: InputPin + OutputPin {
    /// Reconfigures the pin. Input mode must not enable an internal pull.
    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error>;
}

impl<T: DirectionalPin + ?Sized> DirectionalPin for &mut T {
    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error> {
        T::set_direction(self, direction)
    }
}

/// Polls `pin` until it reads `level` or `timeout_us` has passed.
///
/// Returns `Ok(true)` as soon as the level matches and `Ok(false)` on
/// timeout. The pin is sampled before the clock, so a line that is already
/// at `level` succeeds even with a zero timeout. Timeouts longer than
/// [`MAX_WAIT_CYCLES`](crate::timer::MAX_WAIT_CYCLES) are cut down to it.
/// Nothing is kept between calls.
pub fn wait_for_level<P, C>(
    pin: &mut P,
    timer: &CycleTimer<C>,
    level: PinState,
    timeout_us: u32,
) -> Result<bool, P::Error>
where
    P: InputPin + ?Sized,
    C: CycleCounter,
{
    let start = timer.now();
    let timeout = timer.us_to_cycles(timeout_us);

    loop {
        if PinState::from(pin.is_high()?) == level {
            return Ok(true);
        }
        if timer.elapsed_cycles(start) > timeout {
            return Ok(false);
        }
    }
}
