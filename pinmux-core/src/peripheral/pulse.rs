//! Pulse width measurement
//!
//! The port interrupt timestamps every edge of a pin in pulse mode. A
//! foreground caller arms the pin's [`PulseSlot`] and waits on it; the
//! interrupt signals the slot when an edge completes a pulse of the
//! requested polarity. The slot lives in static memory so the wait can
//! proceed without holding the multiplexer lock.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{with_timeout, Duration, Instant};
use portable_atomic::{AtomicBool, Ordering};

use crate::config::{Level, MAX_PINS};
use crate::error::{PinError, Result};
use crate::state::PinEvent;

/// Current time on the free-running microsecond timer
///
/// Wraps after about 71 minutes; durations use wrapping arithmetic.
pub fn now_us() -> u32 {
    Instant::now().as_micros() as u32
}

/// Time between two wrapping microsecond timestamps
pub fn elapsed_us(since: u32, now: u32) -> u32 {
    now.wrapping_sub(since)
}

/// Rendezvous between the interrupt and one waiting caller
pub struct PulseSlot {
    signal: Signal<CriticalSectionRawMutex, u32>,
    capturing: AtomicBool,
}

impl PulseSlot {
    /// Create an idle slot
    pub const fn new() -> Self {
        Self {
            signal: Signal::new(),
            capturing: AtomicBool::new(false),
        }
    }

    /// Check if a caller is currently waiting for a pulse
    pub fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::Acquire)
    }
}

impl Default for PulseSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// One pulse slot per routable pin
pub struct PulseSlots([PulseSlot; MAX_PINS]);

impl PulseSlots {
    /// Create the slot table
    ///
    /// Intended for a `static`.
    pub const fn new() -> Self {
        Self([const { PulseSlot::new() }; MAX_PINS])
    }

    /// Slot belonging to a pin number
    pub fn slot(&self, pin: u8) -> Option<&PulseSlot> {
        self.0.get(pin as usize)
    }
}

impl Default for PulseSlots {
    fn default() -> Self {
        Self::new()
    }
}

/// Pulse timer attached to a pin in pulse mode
pub struct PulseIn {
    slot: &'static PulseSlot,
    last_edge: u32,
}

impl PulseIn {
    /// Start timing from `now`
    ///
    /// The first edge measures from the moment pulse mode was entered, so a
    /// line that is already active still produces a duration.
    pub fn new(slot: &'static PulseSlot, now: u32) -> Self {
        Self {
            slot,
            last_edge: now,
        }
    }

    /// Record an edge and return the pulse it ended
    ///
    /// A rising edge ends a low pulse and a falling edge ends a high pulse.
    /// If a caller is waiting for pulses of `polarity`, it is woken with
    /// the duration.
    pub fn on_edge(&mut self, now: u32, rising: bool, polarity: Level) -> (PinEvent, u32) {
        let duration = elapsed_us(self.last_edge, now);
        self.last_edge = now;

        let ended = if rising { Level::Low } else { Level::High };
        if ended == polarity && self.slot.is_capturing() {
            self.slot.signal.signal(duration);
        }

        (PinEvent::pulse_ended_by(rising), duration)
    }

    /// Begin a capture
    ///
    /// Fails with `Busy` if another caller is already waiting on this pin.
    pub fn arm(&self) -> Result<PulseWaiter> {
        if self
            .slot
            .capturing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(PinError::Busy);
        }
        self.slot.signal.reset();
        Ok(PulseWaiter { slot: self.slot })
    }

    /// Check if a capture is in progress
    ///
    /// While capturing, the pin refuses teardown.
    pub fn is_capturing(&self) -> bool {
        self.slot.is_capturing()
    }

    /// Timestamp of the most recent edge
    pub fn last_edge(&self) -> u32 {
        self.last_edge
    }

    pub(crate) fn same_slot(&self, other: &PulseIn) -> bool {
        core::ptr::eq(self.slot, other.slot)
    }
}

/// Handle to an armed capture
///
/// Dropping the waiter ends the capture and unlocks the pin.
pub struct PulseWaiter {
    slot: &'static PulseSlot,
}

impl PulseWaiter {
    /// Wait for the next pulse of the armed polarity
    ///
    /// Returns the pulse width in microseconds, or `Cancelled` if no pulse
    /// completed within `timeout_us`.
    pub async fn wait(self, timeout_us: u32) -> Result<u32> {
        with_timeout(
            Duration::from_micros(timeout_us as u64),
            self.slot.signal.wait(),
        )
        .await
        .map_err(|_| PinError::Cancelled)
    }
}

impl Drop for PulseWaiter {
    fn drop(&mut self) {
        self.slot.capturing.store(false, Ordering::Release);
    }
}
