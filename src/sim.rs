//! Simulated clock and pins for host tests.

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin, PinState};
use embedded_hal_mock::eh1::MockError;
use embedded_hal_mock::eh1::digital::Mock as PinMock;

use crate::pin::{Direction, DirectionalPin};
use crate::timer::CycleCounter;

/// Counter that advances by `step` cycles every time it is read.
///
/// Clones share the same time base, so a simulated pin can look at the
/// clock the driver is spinning on.
#[derive(Clone)]
pub struct SimClock {
    now: Rc<Cell<u32>>,
    step: u32,
}

impl SimClock {
    pub fn new(step: u32) -> Self {
        Self::starting_at(0, step)
    }

    pub fn starting_at(start: u32, step: u32) -> Self {
        SimClock {
            now: Rc::new(Cell::new(start)),
            step,
        }
    }

    /// Current time without advancing it.
    pub fn peek(&self) -> u32 {
        self.now.get()
    }
}

impl CycleCounter for SimClock {
    fn cycles(&self) -> u32 {
        let now = self.now.get();
        self.now.set(now.wrapping_add(self.step));
        now
    }
}

/// An `embedded-hal-mock` pin that also records direction changes.
///
/// Switching to a direction registered with [`FlexMock::failing`] returns
/// the given error and leaves no record.
pub struct FlexMock {
    pub pin: PinMock,
    pub directions: Vec<Direction>,
    failures: Vec<(Direction, MockError)>,
}

impl FlexMock {
    pub fn new(pin: PinMock) -> Self {
        FlexMock {
            pin,
            directions: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn failing(mut self, direction: Direction, error: MockError) -> Self {
        self.failures.push((direction, error));
        self
    }

    pub fn direction(&self) -> Option<Direction> {
        self.directions.last().copied()
    }
}

impl ErrorType for FlexMock {
    type Error = MockError;
}

impl InputPin for FlexMock {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.pin.is_high()
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.pin.is_low()
    }
}

impl OutputPin for FlexMock {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.pin.set_low()
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.pin.set_high()
    }
}

impl DirectionalPin for FlexMock {
    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error> {
        if let Some((_, err)) = self.failures.iter().find(|(d, _)| *d == direction) {
            return Err(err.clone());
        }
        self.directions.push(direction);
        Ok(())
    }
}

/// Nominal DHT11 pulse widths in microseconds.
pub mod pulse {
    pub const RESPONSE_DELAY: u32 = 20;
    pub const RESPONSE_LOW: u32 = 80;
    pub const RESPONSE_HIGH: u32 = 80;
    pub const BIT_LOW: u32 = 50;
    pub const ZERO_HIGH: u32 = 28;
    pub const ONE_HIGH: u32 = 70;
}

/// One piece of the sensor's output: `level` held for `us` microseconds.
#[derive(Clone, Copy, Debug)]
pub struct Segment {
    pub level: PinState,
    pub us: u32,
}

const fn segment(level: PinState, us: u32) -> Segment {
    Segment { level, us }
}

/// The sensor's acknowledge after the host releases the line.
pub fn response() -> Vec<Segment> {
    vec![
        segment(PinState::High, pulse::RESPONSE_DELAY),
        segment(PinState::Low, pulse::RESPONSE_LOW),
        segment(PinState::High, pulse::RESPONSE_HIGH),
    ]
}

/// Data bits for `bytes`, MSB first, without the acknowledge.
pub fn data_bits(bytes: &[u8]) -> Vec<Segment> {
    bytes
        .iter()
        .flat_map(|byte| (0..8).map(move |i| (byte >> (7 - i)) & 1 == 1))
        .flat_map(|one| {
            let high = if one { pulse::ONE_HIGH } else { pulse::ZERO_HIGH };
            [
                segment(PinState::Low, pulse::BIT_LOW),
                segment(PinState::High, high),
            ]
        })
        .collect()
}

/// A full, well-formed transmission of `bytes`.
pub fn transmission(bytes: &[u8]) -> Vec<Segment> {
    let mut waveform = response();
    waveform.extend(data_bits(bytes));
    waveform.push(segment(PinState::Low, pulse::BIT_LOW));
    waveform
}

#[derive(Default)]
struct SensorState {
    direction: Option<Direction>,
    driven: Option<PinState>,
    released_at: Option<u32>,
    restored_at: Option<u32>,
    direction_changes: usize,
}

/// A DHT11 on the end of a wire.
///
/// While the host drives the line it reads back what was written. Once the
/// host switches to input after driving, the sensor plays `waveform` from
/// that instant and then leaves the line to the pull-up. Clones share state
/// so a test can keep a handle after giving the pin to the driver.
#[derive(Clone)]
pub struct SimSensor {
    clock: SimClock,
    cycles_per_us: u32,
    waveform: Rc<Vec<Segment>>,
    state: Rc<RefCell<SensorState>>,
}

impl SimSensor {
    pub fn new(clock: &SimClock, cycles_per_us: u32, waveform: Vec<Segment>) -> Self {
        SimSensor {
            clock: clock.clone(),
            cycles_per_us,
            waveform: Rc::new(waveform),
            state: Rc::new(RefCell::new(SensorState::default())),
        }
    }

    /// A sensor that never answers; the line stays high.
    pub fn silent(clock: &SimClock, cycles_per_us: u32) -> Self {
        Self::new(clock, cycles_per_us, Vec::new())
    }

    pub fn direction(&self) -> Option<Direction> {
        self.state.borrow().direction
    }

    pub fn direction_changes(&self) -> usize {
        self.state.borrow().direction_changes
    }

    /// Cycles between releasing the line and the last switch back to input.
    pub fn busy_cycles(&self) -> Option<u32> {
        let state = self.state.borrow();
        Some(state.restored_at?.wrapping_sub(state.released_at?))
    }

    fn level(&self) -> PinState {
        let state = self.state.borrow();
        if state.direction == Some(Direction::Output) {
            return state.driven.unwrap_or(PinState::High);
        }
        let Some(released_at) = state.released_at else {
            return PinState::High;
        };

        let mut elapsed_us =
            self.clock.peek().wrapping_sub(released_at) / self.cycles_per_us;
        for seg in self.waveform.iter() {
            if elapsed_us < seg.us {
                return seg.level;
            }
            elapsed_us -= seg.us;
        }
        PinState::High
    }
}

impl ErrorType for SimSensor {
    type Error = Infallible;
}

impl InputPin for SimSensor {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level() == PinState::High)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level() == PinState::Low)
    }
}

impl OutputPin for SimSensor {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.state.borrow_mut().driven = Some(PinState::Low);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.state.borrow_mut().driven = Some(PinState::High);
        Ok(())
    }
}

impl DirectionalPin for SimSensor {
    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error> {
        let now = self.clock.peek();
        let mut state = self.state.borrow_mut();
        state.direction_changes += 1;
        if direction == Direction::Input {
            if state.direction == Some(Direction::Output) {
                state.released_at = Some(now);
            } else {
                state.restored_at = Some(now);
            }
        }
        state.direction = Some(direction);
        Ok(())
    }
}
