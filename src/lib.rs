//! DHT11 Sensor Driver for Embedded Rust
//!
//! This crate provides a platform-agnostic driver for the DHT11 temperature
//! and humidity sensor, built on top of the [`embedded-hal`] traits and a
//! free-running cycle counter such as the Cortex-M DWT.
//!
//! Every delay and timeout is a busy-wait against the cycle counter. The
//! protocol's pulses are tens of microseconds wide, which is too tight for
//! a timer interrupt or an async executor to wake up in time.
//!
//! # Features
//! - Blocking synchronous API using `embedded-hal` traits
//! - Designed for `no_std` environments
//! - Timing profile overridable at runtime ([`Timing`])
//! - Serial report lines ([`report`])
//!
//! # Optional Features
//! - `defmt`: Implements `defmt::Format` and emits `defmt` logs
//! - `log`: Emits logs through the `log` facade
//! - `cortex-m`: [`DwtCounter`] backed by the DWT cycle counter
//! - `critical-section`: Masks interrupts during the timing-critical part of a read
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod dht11;
pub mod error;
pub mod frame;
pub mod pin;
pub mod report;
pub mod timer;
pub mod timing;

#[cfg(test)]
mod sim;

pub use dht11::Dht11;
pub use error::{DhtError, Stage};
pub use frame::{ChecksumError, RawFrame, Reading, convert};
pub use pin::{Direction, DirectionalPin, wait_for_level};
#[cfg(feature = "cortex-m")]
pub use timer::DwtCounter;
pub use timer::{CycleCounter, CycleTimer};
pub use timing::{DHT11_TIMING, Timing};
