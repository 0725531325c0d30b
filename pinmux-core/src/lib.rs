//! Board-agnostic pin multiplexing core
//!
//! This crate owns the logic that decides which hardware feature currently
//! drives each I/O line:
//!
//! - Pin registry and routing table (pin number → pin slot)
//! - Pin mode state machine (digital, analog, touch, edge/pulse modes)
//! - Peripheral ownership protocol (exclusive connect, safe teardown)
//! - PWM channel allocator (shared pool, round-robin, period rescaling)
//! - Port interrupt demultiplexer (latch bitmask → per-pin edges)
//! - Button, touch and pulse timing adapters
//! - Board configuration types
//!
//! Hardware access goes through the traits in `pinmux-hal`; the whole
//! state lives in one [`PinMux`] value, shared between foreground code and
//! the port interrupt through [`SharedPinMux`].

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod config;
pub mod error;
pub mod irq;
pub mod mux;
pub mod ownership;
pub mod peripheral;
pub mod pin;
pub mod pwm;
pub mod registry;
pub mod shared;
pub mod state;

#[cfg(test)]
pub(crate) mod sim;

pub use config::{BoardConfig, Capability, Level, PinEntry, TouchCalibration, TouchMode};
pub use error::{PinError, Result};
pub use mux::{Hardware, PinMux, Platform};
pub use peripheral::{PeripheralKind, PulseSlots, PulseWaiter};
pub use pin::{Pin, PinEventMode};
pub use shared::SharedPinMux;
pub use state::{EdgeSense, InputMode, PinMode, PinPrefs, PinStatus};
