//! Peripheral ownership protocol
//!
//! A pin has at most one owner. Connecting a new owner tears down the old
//! one first; teardown is skipped while the owner is pin-locked, and a
//! per-pin flag stops a teardown from being re-entered.

use pinmux_hal::Sense;

use crate::error::{PinError, Result};
use crate::mux::{PinMux, Platform};
use crate::peripheral::Peripheral;

impl<P: Platform> PinMux<P> {
    /// Tear down whatever owns the pin at `index`
    ///
    /// Releases the owner and any PWM channel, disables edge sensing and
    /// drops every transient mode while keeping preferences. Does nothing
    /// while a teardown is already in progress or the owner is pin-locked,
    /// so repeated calls are harmless.
    pub(crate) fn disconnect_index(&mut self, index: usize) {
        let slot = self.pins.slot_mut(index);
        if slot.status.is_disconnecting() {
            return;
        }
        if slot.is_locked() {
            warn!("pin {}: owner is pin-locked, teardown deferred", slot.number);
            return;
        }

        slot.status.set_disconnecting(true);
        let number = slot.number;
        if let Some(owner) = slot.owner.take() {
            owner.release(number);
        }

        self.pwm.release(number);
        self.update_config(index, |cfg| cfg.sense = Sense::Disabled);
        self.pins.slot_mut(index).status.reset();
    }

    /// Make `peripheral` the owner of the pin at `index`
    ///
    /// Reconnecting the current instance is a no-op. Fails with `Busy` if
    /// the current owner is pin-locked.
    pub(crate) fn connect_index(&mut self, index: usize, peripheral: Peripheral) -> Result<()> {
        if let Some(current) = self.pins.slot(index).owner.as_ref() {
            if current.is_same_instance(&peripheral) {
                return Ok(());
            }
            if current.is_pin_locked() {
                return Err(PinError::Busy);
            }
            self.disconnect_index(index);
        }

        let slot = self.pins.slot_mut(index);
        if slot.owner.is_some() {
            return Err(PinError::Busy);
        }
        trace!("pin {}: connected {:?}", slot.number, peripheral.kind());
        slot.owner = Some(peripheral);
        Ok(())
    }
}
