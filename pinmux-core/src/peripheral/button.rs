//! Debounced two-state input
//!
//! A saturating integrator ("sigma") counts up while the input is active
//! and down while it is idle. Crossing the press threshold upwards
//! registers a press; falling below the release threshold registers a
//! release. The gap between the two thresholds is the hysteresis.

use crate::config::DebounceConfig;
use crate::state::ButtonEvent;

/// Debounced button state
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Button {
    active_low: bool,
    debounce: DebounceConfig,
    sigma: u8,
    pressed: bool,
    presses: u16,
}

impl Button {
    /// Create a released button
    ///
    /// `active_low` selects whether a low line level counts as active.
    pub fn new(active_low: bool, debounce: DebounceConfig) -> Self {
        Self {
            active_low,
            debounce,
            sigma: 0,
            pressed: false,
            presses: 0,
        }
    }

    /// Feed one sampled line level
    ///
    /// Returns `Down` on a debounced press and `Up` on a debounced release.
    pub fn sample(&mut self, level_high: bool) -> Option<ButtonEvent> {
        self.integrate(level_high != self.active_low)
    }

    /// Feed one already-polarised sample (true = active)
    pub(crate) fn integrate(&mut self, active: bool) -> Option<ButtonEvent> {
        if active {
            if self.sigma < self.debounce.sigma_max {
                self.sigma += 1;
            }
        } else {
            self.sigma = self.sigma.saturating_sub(1);
        }

        if !self.pressed && self.sigma > self.debounce.press_threshold {
            self.pressed = true;
            self.presses = self.presses.saturating_add(1);
            return Some(ButtonEvent::Down);
        }

        if self.pressed && self.sigma < self.debounce.release_threshold {
            self.pressed = false;
            return Some(ButtonEvent::Up);
        }

        None
    }

    /// Current debounced state
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Number of presses since the last call
    pub fn was_pressed(&mut self) -> u16 {
        core::mem::take(&mut self.presses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(button: &mut Button, level: bool, count: usize) -> heapless::Vec<ButtonEvent, 4> {
        let mut events = heapless::Vec::new();
        for _ in 0..count {
            if let Some(evt) = button.sample(level) {
                events.push(evt).unwrap();
            }
        }
        events
    }

    #[test]
    fn test_active_low_press_release() {
        let mut button = Button::new(true, DebounceConfig::default());

        // Idle high, nothing happens
        assert!(feed(&mut button, true, 20).is_empty());
        assert!(!button.is_pressed());

        let down = feed(&mut button, false, 20);
        assert_eq!(down.as_slice(), &[ButtonEvent::Down]);
        assert!(button.is_pressed());

        let up = feed(&mut button, true, 20);
        assert_eq!(up.as_slice(), &[ButtonEvent::Up]);
        assert!(!button.is_pressed());

        assert_eq!(button.was_pressed(), 1);
        assert_eq!(button.was_pressed(), 0);
    }

    #[test]
    fn test_glitch_rejected() {
        let mut button = Button::new(false, DebounceConfig::default());

        // Short bursts never reach the press threshold
        for _ in 0..10 {
            assert!(feed(&mut button, true, 3).is_empty());
            assert!(feed(&mut button, false, 3).is_empty());
        }
        assert_eq!(button.was_pressed(), 0);
    }

    #[test]
    fn test_hold_counts_once() {
        let mut button = Button::new(false, DebounceConfig::default());
        feed(&mut button, true, 100);
        assert!(button.is_pressed());
        assert_eq!(button.was_pressed(), 1);
    }
}
