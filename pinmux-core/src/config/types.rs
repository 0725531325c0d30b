//! Configuration type definitions
//!
//! These types describe the board: which pins exist, what each one can do,
//! and the defaults the multiplexer starts from. A board configuration can
//! be persisted in flash as postcard-serialized binary data.

use heapless::Vec;
use pinmux_hal::Pull;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{PinError, Result};

/// Size of the routing table: two 32-bit ports, the second partly populated
pub const MAX_PINS: usize = 48;

/// Highest analog output level
pub const MAX_OUTPUT: u16 = 1023;

/// Highest servo angle in degrees
pub const MAX_SERVO_ANGLE: u16 = 180;

/// Default servo span in microseconds (center ± range/2)
pub const DEFAULT_SERVO_RANGE_US: u32 = 2000;

/// Default servo center pulse in microseconds
pub const DEFAULT_SERVO_CENTER_US: u32 = 1500;

/// PWM period used for servo output (50 Hz)
pub const SERVO_PERIOD_US: u32 = 20_000;

/// Right shift applied to raw ADC samples (14-bit → 10-bit)
pub const ADC_SAMPLE_SHIFT: u32 = 4;

/// Event id of pin 0; pin `n` raises notifications as `base + n`
pub const DEFAULT_EVENT_ID_BASE: u16 = 100;

/// Default capacitive touch threshold in raw sensor units
pub const DEFAULT_TOUCH_THRESHOLD: u16 = 3500;

/// Magic number to identify a valid board configuration
pub const BOARD_CONFIG_MAGIC: u32 = 0x504D_5558; // "PMUX"

/// Current board configuration version
pub const BOARD_CONFIG_VERSION: u8 = 1;

bitflags::bitflags! {
    /// Set of hardware functions a pin can be multiplexed onto
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct Capability: u8 {
        /// Digital input/output (including resistive touch and edge events)
        const DIGITAL = 1 << 0;
        /// Analog output (PWM) and analog input
        const ANALOG = 1 << 1;
        /// Capacitive touch sensing
        const TOUCH = 1 << 2;
        /// Digital and analog
        const AD = Self::DIGITAL.bits() | Self::ANALOG.bits();
        /// Everything
        const ALL = Self::AD.bits() | Self::TOUCH.bits();
    }
}

impl Default for Capability {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Capability {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Capability({=u8:#x})", self.bits())
    }
}

/// Touch sensing variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TouchMode {
    /// Shared capacitive sensor peripheral
    Capacitive,
    /// Digital input, active low, no internal pull ("makey makey" style)
    #[default]
    Resistive,
}

/// Logic level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Level {
    Low,
    #[default]
    High,
}

/// Debounce integrator thresholds for button and touch adapters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DebounceConfig {
    /// Integrator ceiling
    pub sigma_max: u8,
    /// Integrator value at which a press is recognised
    pub press_threshold: u8,
    /// Integrator value at which a release is recognised
    pub release_threshold: u8,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            sigma_max: 12,
            press_threshold: 8,
            release_threshold: 2,
        }
    }
}

/// One physical pin on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PinEntry {
    /// Global pin number (port × 32 + bit)
    pub number: u8,
    /// Declared capability set
    pub capability: Capability,
}

/// Complete board configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoardConfig {
    /// Magic number for validation
    pub magic: u32,
    /// Data format version
    pub version: u8,
    /// Pins constructed at init
    pub pins: Vec<PinEntry, MAX_PINS>,
    /// Pull applied when a pin first becomes a digital input
    pub default_pull: Pull,
    /// PWM period applied when the PWM peripheral is first used
    pub pwm_period_us: u32,
    /// Event id of pin 0
    pub event_id_base: u16,
    /// Capacitive threshold for pins without a calibration entry
    pub touch_threshold: u16,
    /// Button/touch debounce
    pub debounce: DebounceConfig,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardConfig {
    /// Empty configuration with default settings
    pub fn new() -> Self {
        Self {
            magic: BOARD_CONFIG_MAGIC,
            version: BOARD_CONFIG_VERSION,
            pins: Vec::new(),
            default_pull: Pull::None,
            pwm_period_us: SERVO_PERIOD_US,
            event_id_base: DEFAULT_EVENT_ID_BASE,
            touch_threshold: DEFAULT_TOUCH_THRESHOLD,
            debounce: DebounceConfig::default(),
        }
    }

    /// Add a pin to the table
    ///
    /// Fails with `InvalidParameter` if the number is out of range or
    /// already listed.
    pub fn add_pin(&mut self, number: u8, capability: Capability) -> Result<()> {
        if number as usize >= MAX_PINS || self.find_pin(number).is_some() {
            return Err(PinError::InvalidParameter);
        }
        self.pins
            .push(PinEntry { number, capability })
            .map_err(|_| PinError::InvalidParameter)
    }

    /// Builder form of [`add_pin`](Self::add_pin)
    pub fn with_pin(mut self, number: u8, capability: Capability) -> Result<Self> {
        self.add_pin(number, capability)?;
        Ok(self)
    }

    /// Look up a pin entry by number
    pub fn find_pin(&self, number: u8) -> Option<&PinEntry> {
        self.pins.iter().find(|p| p.number == number)
    }

    /// Event id raised by a pin
    pub fn event_id(&self, number: u8) -> u16 {
        self.event_id_base.wrapping_add(number as u16)
    }

    /// Check if the header matches this firmware
    pub fn is_valid(&self) -> bool {
        self.magic == BOARD_CONFIG_MAGIC && self.version == BOARD_CONFIG_VERSION
    }

    /// Serialize into `buf`, returning the used prefix
    #[cfg(feature = "serde")]
    pub fn to_bytes<'a>(&self, buf: &'a mut [u8]) -> Result<&'a mut [u8]> {
        postcard::to_slice(self, buf).map_err(|_| PinError::InvalidParameter)
    }

    /// Deserialize and validate a stored configuration
    #[cfg(feature = "serde")]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let config: Self = postcard::from_bytes(bytes).map_err(|_| PinError::InvalidParameter)?;
        if !config.is_valid() {
            return Err(PinError::InvalidParameter);
        }
        Ok(config)
    }
}
