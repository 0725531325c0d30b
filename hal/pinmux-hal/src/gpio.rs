//! GPIO register file abstraction
//!
//! Models the per-port registers the pin multiplexer needs: line input,
//! direction, output set/clear, per-pin configuration and the edge latch.
//! Bit positions and addresses stay in the chip layer; this module only
//! carries the typed contents.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of pins addressed by one port's 32-bit registers
pub const PINS_PER_PORT: u8 = 32;

/// Pull resistor configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Pull {
    /// No pull resistor
    #[default]
    None,
    /// Pull down to ground
    Down,
    /// Pull up to supply
    Up,
}

/// Edge-detect sense configuration
///
/// The hardware flags a pin in the latch register when its level matches
/// the sense setting. Alternating between `High` and `Low` after every
/// detection turns level sensing into edge sensing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Sense {
    /// Detection disabled
    #[default]
    Disabled,
    /// Detect a high level (next edge is rising)
    High,
    /// Detect a low level (next edge is falling)
    Low,
}

impl Sense {
    /// Flip to the opposite polarity; `Disabled` stays disabled
    pub fn toggled(self) -> Self {
        match self {
            Sense::Disabled => Sense::Disabled,
            Sense::High => Sense::Low,
            Sense::Low => Sense::High,
        }
    }
}

/// Output drive strength for the '0' and '1' levels
///
/// Discriminants match the conventional 3-bit drive field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum DriveMode {
    /// Standard '0', standard '1'
    #[default]
    S0S1 = 0,
    /// High drive '0', standard '1'
    H0S1 = 1,
    /// Standard '0', high drive '1'
    S0H1 = 2,
    /// High drive '0', high drive '1'
    H0H1 = 3,
    /// Disconnect '0', standard '1'
    D0S1 = 4,
    /// Disconnect '0', high drive '1'
    D0H1 = 5,
    /// Standard '0', disconnect '1'
    S0D1 = 6,
    /// High drive '0', disconnect '1'
    H0D1 = 7,
}

impl DriveMode {
    /// Get the drive mode as a field value
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Create a drive mode from a field value (0-7)
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(DriveMode::S0S1),
            1 => Some(DriveMode::H0S1),
            2 => Some(DriveMode::S0H1),
            3 => Some(DriveMode::H0H1),
            4 => Some(DriveMode::D0S1),
            5 => Some(DriveMode::D0H1),
            6 => Some(DriveMode::S0D1),
            7 => Some(DriveMode::H0D1),
            _ => None,
        }
    }
}

/// Typed contents of one pin's configuration register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinConfig {
    /// Direction: true = output
    pub output: bool,
    /// Input buffer connected
    pub input_connected: bool,
    /// Pull resistor
    pub pull: Pull,
    /// Drive strength
    pub drive: DriveMode,
    /// Edge-detect sense
    pub sense: Sense,
}

/// Port and bit position of a global pin number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinLocation {
    /// Port index (pin number / 32)
    pub port: u8,
    /// Bit within the port (pin number % 32)
    pub bit: u8,
}

impl PinLocation {
    /// Split a global pin number into port and bit
    pub const fn of(pin: u8) -> Self {
        Self {
            port: pin / PINS_PER_PORT,
            bit: pin % PINS_PER_PORT,
        }
    }

    /// Single-bit mask for this pin in its port's registers
    pub const fn mask(&self) -> u32 {
        1 << self.bit
    }

    /// Global pin number of a port/bit pair
    pub const fn pin(&self) -> u8 {
        self.port * PINS_PER_PORT + self.bit
    }
}

/// Memory-mapped GPIO register file
///
/// Implementations perform the raw register access for a specific chip.
/// Every method maps to a single register read or write so that the
/// caller controls sequencing relative to the port interrupt.
pub trait PortRegisters {
    /// Number of ports on this chip
    fn port_count(&self) -> u8 {
        1
    }

    /// Read the sampled line levels of a port
    fn input(&self, port: u8) -> u32;

    /// Read the direction register (1 = output)
    fn direction(&self, port: u8) -> u32;

    /// Drive the masked output latch bits high
    fn set_output_bits(&mut self, port: u8, mask: u32);

    /// Drive the masked output latch bits low
    fn clear_output_bits(&mut self, port: u8, mask: u32);

    /// Switch the masked pins to output direction (write-one-to-set)
    fn set_direction_bits(&mut self, port: u8, mask: u32);

    /// Read a pin's configuration register
    fn pin_config(&self, port: u8, bit: u8) -> PinConfig;

    /// Write a pin's configuration register
    fn set_pin_config(&mut self, port: u8, bit: u8, config: PinConfig);

    /// Read the port's edge latch (pins that matched their sense setting)
    fn latch(&self, port: u8) -> u32;

    /// Acknowledge the masked latch bits (write-one-to-clear)
    fn clear_latch(&mut self, port: u8, mask: u32);

    /// Enable the shared port-change interrupt source
    fn enable_port_interrupt(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_split() {
        let loc = PinLocation::of(37);
        assert_eq!(loc.port, 1);
        assert_eq!(loc.bit, 5);
        assert_eq!(loc.mask(), 1 << 5);
        assert_eq!(loc.pin(), 37);

        assert_eq!(PinLocation::of(31).port, 0);
        assert_eq!(PinLocation::of(32).bit, 0);
    }

    #[test]
    fn test_sense_toggle() {
        assert_eq!(Sense::High.toggled(), Sense::Low);
        assert_eq!(Sense::Low.toggled(), Sense::High);
        assert_eq!(Sense::Disabled.toggled(), Sense::Disabled);
    }

    #[test]
    fn test_drive_mode_field() {
        for v in 0..8u8 {
            assert_eq!(DriveMode::from_u8(v).map(DriveMode::as_u8), Some(v));
        }
        assert_eq!(DriveMode::from_u8(8), None);
    }
}
