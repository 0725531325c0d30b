//! Pin arena and interrupt routing table
//!
//! Pins are registered once and never removed. The routing table maps a
//! physical pin number to the pin's index in the arena; it exists only
//! for O(1) lookup from the port interrupt and never owns anything.

use heapless::Vec;
use pinmux_hal::Pull;

use crate::config::{Capability, MAX_PINS};
use crate::error::{PinError, Result};
use crate::peripheral::{Peripheral, PeripheralKind};
use crate::state::PinStatus;

/// Raw edge callback, invoked from the port interrupt with the new level
pub type IrqHandler = fn(bool);

/// Everything the multiplexer tracks for one pin
pub struct PinSlot {
    pub(crate) number: u8,
    pub(crate) event_id: u16,
    pub(crate) capability: Capability,
    pub(crate) status: PinStatus,
    pub(crate) owner: Option<Peripheral>,
    pub(crate) irq_handler: Option<IrqHandler>,
}

impl PinSlot {
    fn new(number: u8, event_id: u16, capability: Capability, pull: Pull) -> Self {
        Self {
            number,
            event_id,
            capability,
            status: PinStatus::new(pull),
            owner: None,
            irq_handler: None,
        }
    }

    /// Physical pin number
    pub fn number(&self) -> u8 {
        self.number
    }

    /// Event id notifications are raised on
    pub fn event_id(&self) -> u16 {
        self.event_id
    }

    /// Declared capability set
    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// Current status
    pub fn status(&self) -> &PinStatus {
        &self.status
    }

    /// Kind of the current owner
    pub fn owner_kind(&self) -> Option<PeripheralKind> {
        self.owner.as_ref().map(Peripheral::kind)
    }

    /// Check if an owner is present and refuses teardown
    pub fn is_locked(&self) -> bool {
        self.owner.as_ref().is_some_and(Peripheral::is_pin_locked)
    }

    /// Check if an owner is present and may be torn down
    pub fn has_active_owner(&self) -> bool {
        self.owner.as_ref().is_some_and(|o| !o.is_pin_locked())
    }
}

/// Fixed-capacity arena of pins plus the routing table
pub struct PinTable {
    slots: Vec<PinSlot, MAX_PINS>,
    routes: [Option<u8>; MAX_PINS],
}

impl Default for PinTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PinTable {
    /// Create an empty table
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            routes: [None; MAX_PINS],
        }
    }

    /// Add a pin and its route
    ///
    /// Fails with `InvalidParameter` for out-of-range or duplicate numbers.
    pub fn register(
        &mut self,
        number: u8,
        event_id: u16,
        capability: Capability,
        pull: Pull,
    ) -> Result<usize> {
        let route = self
            .routes
            .get_mut(number as usize)
            .ok_or(PinError::InvalidParameter)?;
        if route.is_some() {
            return Err(PinError::InvalidParameter);
        }

        let index = self.slots.len();
        self.slots
            .push(PinSlot::new(number, event_id, capability, pull))
            .map_err(|_| PinError::NotSupported)?;
        *route = Some(index as u8);
        Ok(index)
    }

    /// Arena index of a pin number
    pub fn index_of(&self, number: u8) -> Option<usize> {
        self.routes
            .get(number as usize)
            .copied()
            .flatten()
            .map(usize::from)
    }

    /// Pin at an arena index
    pub fn get(&self, index: usize) -> Option<&PinSlot> {
        self.slots.get(index)
    }

    pub(crate) fn slot(&self, index: usize) -> &PinSlot {
        &self.slots[index]
    }

    pub(crate) fn slot_mut(&mut self, index: usize) -> &mut PinSlot {
        &mut self.slots[index]
    }

    /// Registered pins in registration order
    pub fn iter(&self) -> impl Iterator<Item = &PinSlot> {
        self.slots.iter()
    }

    /// Number of registered pins
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if no pin is registered
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_exists_iff_registered() {
        let mut table = PinTable::new();
        assert_eq!(table.index_of(3), None);

        let idx = table.register(3, 103, Capability::ALL, Pull::None).unwrap();
        assert_eq!(table.index_of(3), Some(idx));
        assert_eq!(table.get(idx).map(PinSlot::number), Some(3));

        for n in 0..MAX_PINS as u8 {
            assert_eq!(table.index_of(n).is_some(), n == 3);
        }
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut table = PinTable::new();
        table.register(40, 140, Capability::DIGITAL, Pull::Up).unwrap();
        assert_eq!(
            table.register(40, 140, Capability::DIGITAL, Pull::Up),
            Err(PinError::InvalidParameter)
        );
        assert_eq!(
            table.register(MAX_PINS as u8, 0, Capability::DIGITAL, Pull::Up),
            Err(PinError::InvalidParameter)
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_fresh_slot() {
        let mut table = PinTable::new();
        let idx = table.register(7, 107, Capability::AD, Pull::Down).unwrap();
        let slot = table.slot(idx);
        assert_eq!(slot.event_id(), 107);
        assert_eq!(slot.status().prefs.pull, Pull::Down);
        assert_eq!(slot.owner_kind(), None);
        assert!(!slot.is_locked());
    }
}
