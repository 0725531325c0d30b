//! Pinmux Hardware Abstraction Layer
//!
//! This crate defines the hardware boundary of the pin multiplexing core.
//! A chip-specific layer implements these traits over its register file and
//! on-chip peripherals; the core only ever talks to the traits.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (sensing, actuation, ...)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  pinmux-core (mode machine, PWM pool,   │
//! │  interrupt demux, adapters)             │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  pinmux-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ chip register │       │  host-side    │
//! │ file backend  │       │  simulation   │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::PortRegisters`] - Direction/output/input/config/latch registers
//! - [`pwm::PwmHardware`] - Shared PWM peripheral with a duty buffer
//! - [`adc::AdcSampler`] - Raw analog samples per pin
//! - [`touch::TouchSensor`] - Raw capacitive readings per pin
//! - [`notify::EventSink`] - Notification delivery

#![no_std]
#![deny(unsafe_code)]

pub mod adc;
pub mod gpio;
pub mod notify;
pub mod pwm;
pub mod touch;

// Re-export key traits at crate root for convenience
pub use adc::AdcSampler;
pub use gpio::{DriveMode, PinConfig, PinLocation, PortRegisters, Pull, Sense};
pub use notify::{EventSink, Notification};
pub use pwm::PwmHardware;
pub use touch::TouchSensor;
