//! Capacitive touch calibration data
//!
//! Stores per-pin touch thresholds measured by `touch_calibrate()` so they
//! can be persisted to flash and applied on the next boot.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Magic number to identify valid calibration data
pub const TOUCH_CALIBRATION_MAGIC: u32 = 0x5443_414C; // "TCAL"

/// Current calibration data version
pub const TOUCH_CALIBRATION_VERSION: u8 = 1;

/// Maximum number of calibrated touch pins
pub const MAX_TOUCH_PINS: usize = 8;

/// Calibrated threshold for one pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TouchThreshold {
    /// Pin number
    pub pin: u8,
    /// Whether this slot is in use
    pub valid: bool,
    /// Raw reading above which the pin counts as touched
    pub threshold: u16,
}

/// Complete touch calibration data
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TouchCalibration {
    /// Magic number for validation
    pub magic: u32,
    /// Data format version
    pub version: u8,
    /// Per-pin thresholds
    pub entries: [TouchThreshold; MAX_TOUCH_PINS],
}

impl Default for TouchCalibration {
    fn default() -> Self {
        Self::new()
    }
}

impl TouchCalibration {
    /// Create empty calibration data
    pub const fn new() -> Self {
        Self {
            magic: TOUCH_CALIBRATION_MAGIC,
            version: TOUCH_CALIBRATION_VERSION,
            entries: [TouchThreshold {
                pin: 0,
                valid: false,
                threshold: 0,
            }; MAX_TOUCH_PINS],
        }
    }

    /// Check if the data is valid (magic and version match)
    pub fn is_valid(&self) -> bool {
        self.magic == TOUCH_CALIBRATION_MAGIC && self.version == TOUCH_CALIBRATION_VERSION
    }

    /// Threshold for a pin, if calibrated
    pub fn get(&self, pin: u8) -> Option<u16> {
        self.entries
            .iter()
            .find(|e| e.valid && e.pin == pin)
            .map(|e| e.threshold)
    }

    /// Record a threshold for a pin
    ///
    /// Reuses the pin's slot or takes a free one. Returns false if all
    /// slots are in use by other pins.
    pub fn set(&mut self, pin: u8, threshold: u16) -> bool {
        let slot = match self.entries.iter().position(|e| e.valid && e.pin == pin) {
            Some(i) => i,
            None => match self.entries.iter().position(|e| !e.valid) {
                Some(i) => i,
                None => return false,
            },
        };

        self.entries[slot] = TouchThreshold {
            pin,
            valid: true,
            threshold,
        };
        true
    }

    /// Forget a pin's threshold
    pub fn clear(&mut self, pin: u8) {
        for entry in &mut self.entries {
            if entry.pin == pin {
                entry.valid = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut cal = TouchCalibration::new();
        assert!(cal.is_valid());
        assert_eq!(cal.get(4), None);

        assert!(cal.set(4, 1200));
        assert_eq!(cal.get(4), Some(1200));

        // Overwrites in place
        assert!(cal.set(4, 1300));
        assert_eq!(cal.get(4), Some(1300));
        assert_eq!(cal.entries.iter().filter(|e| e.valid).count(), 1);

        cal.clear(4);
        assert_eq!(cal.get(4), None);
    }

    #[test]
    fn test_full_table() {
        let mut cal = TouchCalibration::new();
        for pin in 0..MAX_TOUCH_PINS as u8 {
            assert!(cal.set(pin, 1000 + pin as u16));
        }
        assert!(!cal.set(40, 1));
        // Existing pins can still be updated
        assert!(cal.set(0, 999));
        assert_eq!(cal.get(0), Some(999));
    }
}
