//! Capacitive touch adapter
//!
//! Compares raw sensor readings against a threshold and debounces the
//! result with the same integrator as [`Button`].

use crate::config::DebounceConfig;
use crate::peripheral::Button;
use crate::state::ButtonEvent;

/// Debounced capacitive touch electrode
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TouchButton {
    threshold: u16,
    button: Button,
}

impl TouchButton {
    /// Create an untouched electrode with the given threshold
    pub fn new(threshold: u16, debounce: DebounceConfig) -> Self {
        Self {
            threshold,
            button: Button::new(false, debounce),
        }
    }

    /// Feed one raw sensor reading
    pub fn sample(&mut self, reading: u16) -> Option<ButtonEvent> {
        self.button.integrate(reading > self.threshold)
    }

    /// Recalibrate from an untouched reading, returning the new threshold
    ///
    /// The threshold is placed 25% above the baseline.
    pub fn calibrate(&mut self, baseline: u16) -> u16 {
        self.threshold = baseline.saturating_add(baseline / 4);
        self.threshold
    }

    /// Reading above which the electrode counts as touched
    pub fn threshold(&self) -> u16 {
        self.threshold
    }

    /// Current debounced state
    pub fn is_pressed(&self) -> bool {
        self.button.is_pressed()
    }

    /// Number of touches since the last call
    pub fn was_pressed(&mut self) -> u16 {
        self.button.was_pressed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_crossing() {
        let mut touch = TouchButton::new(1000, DebounceConfig::default());

        for _ in 0..20 {
            touch.sample(900);
        }
        assert!(!touch.is_pressed());

        let events: heapless::Vec<ButtonEvent, 4> =
            (0..20).filter_map(|_| touch.sample(1500)).collect();
        assert_eq!(events.as_slice(), &[ButtonEvent::Down]);
        assert!(touch.is_pressed());
        assert_eq!(touch.was_pressed(), 1);
    }

    #[test]
    fn test_calibrate() {
        let mut touch = TouchButton::new(3500, DebounceConfig::default());
        assert_eq!(touch.calibrate(800), 1000);
        assert_eq!(touch.threshold(), 1000);
        assert_eq!(touch.calibrate(u16::MAX), u16::MAX);
    }
}
