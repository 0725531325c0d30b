//! Peripheral adapters that can own a pin
//!
//! At most one adapter owns a pin at a time. The owner is a tagged variant
//! stored in the pin's slot; teardown goes through [`Peripheral::release`]
//! and can be refused while [`Peripheral::is_pin_locked`] holds.

mod button;
mod pulse;
mod touch;

pub use button::Button;
pub use pulse::{elapsed_us, now_us, PulseIn, PulseSlot, PulseSlots, PulseWaiter};
pub use touch::TouchButton;

/// The function currently bound to a pin
pub enum Peripheral {
    /// Active-low digital button (resistive touch)
    Button(Button),
    /// Capacitive touch electrode
    Touch(TouchButton),
    /// Pulse timer
    Pulse(PulseIn),
    /// A channel of the shared PWM pool
    Pwm,
}

/// Owner kind, for queries that must not expose the adapter itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PeripheralKind {
    Button,
    Touch,
    Pulse,
    Pwm,
}

impl Peripheral {
    /// Kind of this adapter
    pub fn kind(&self) -> PeripheralKind {
        match self {
            Peripheral::Button(_) => PeripheralKind::Button,
            Peripheral::Touch(_) => PeripheralKind::Touch,
            Peripheral::Pulse(_) => PeripheralKind::Pulse,
            Peripheral::Pwm => PeripheralKind::Pwm,
        }
    }

    /// Whether the adapter currently refuses teardown
    pub fn is_pin_locked(&self) -> bool {
        match self {
            Peripheral::Pulse(pulse) => pulse.is_capturing(),
            _ => false,
        }
    }

    /// Whether `other` denotes the same adapter instance
    ///
    /// The PWM owner is a singleton; a pulse timer is identified by the slot
    /// it signals. Buttons are always fresh instances.
    pub fn is_same_instance(&self, other: &Peripheral) -> bool {
        match (self, other) {
            (Peripheral::Pwm, Peripheral::Pwm) => true,
            (Peripheral::Pulse(a), Peripheral::Pulse(b)) => a.same_slot(b),
            _ => false,
        }
    }

    /// Detach the adapter from its pin
    ///
    /// Called once, just before the adapter is dropped. PWM channel
    /// bookkeeping is handled by the caller.
    pub fn release(self, pin: u8) {
        match self {
            Peripheral::Button(_) | Peripheral::Touch(_) => {
                trace!("pin {}: released button", pin);
            }
            Peripheral::Pulse(pulse) => {
                trace!("pin {}: released pulse timer (last edge {})", pin, pulse.last_edge());
            }
            Peripheral::Pwm => {
                trace!("pin {}: released pwm", pin);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DebounceConfig;

    #[test]
    fn test_instance_identity() {
        let slot: &'static PulseSlot = Box::leak(Box::new(PulseSlot::new()));
        let other: &'static PulseSlot = Box::leak(Box::new(PulseSlot::new()));

        let a = Peripheral::Pulse(PulseIn::new(slot, 0));
        let b = Peripheral::Pulse(PulseIn::new(slot, 50));
        let c = Peripheral::Pulse(PulseIn::new(other, 0));
        assert!(a.is_same_instance(&b));
        assert!(!a.is_same_instance(&c));

        assert!(Peripheral::Pwm.is_same_instance(&Peripheral::Pwm));

        let button = Peripheral::Button(Button::new(true, DebounceConfig::default()));
        let again = Peripheral::Button(Button::new(true, DebounceConfig::default()));
        assert!(!button.is_same_instance(&again));
    }

    #[test]
    fn test_only_capturing_pulse_locks() {
        let slot: &'static PulseSlot = Box::leak(Box::new(PulseSlot::new()));
        let pulse = PulseIn::new(slot, 0);
        let waiter = pulse.arm().unwrap();
        let owner = Peripheral::Pulse(pulse);
        assert!(owner.is_pin_locked());
        drop(waiter);
        assert!(!owner.is_pin_locked());

        assert!(!Peripheral::Pwm.is_pin_locked());
        assert_eq!(owner.kind(), PeripheralKind::Pulse);
    }
}
