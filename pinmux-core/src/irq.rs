//! Port interrupt demultiplexer
//!
//! One interrupt serves every pin of every port. Each entry drains the
//! latch snapshot of each port completely, highest pin first, then
//! acknowledges the whole latch.
//!
//! Edge sensing is level matching with the sense polarity flipped after
//! every detection: a pin sensing `High` that fires has just risen, and is
//! switched to sensing `Low` for its falling edge.

use pinmux_hal::notify::{NOTIFY_SOURCE_ID, POWER_EVT_CANCEL_DEEPSLEEP};
use pinmux_hal::{EventSink, Notification, PinLocation, PortRegisters, Sense};

use crate::mux::{PinMux, Platform};
use crate::peripheral::{now_us, Peripheral};
use crate::state::{EdgeSense, PinEvent};

/// Index of the most significant set bit
pub fn highest_set_bit(bits: u32) -> Option<u8> {
    if bits == 0 {
        None
    } else {
        Some(31 - bits.leading_zeros() as u8)
    }
}

impl<P: Platform> PinMux<P> {
    /// Service the shared port interrupt
    ///
    /// Returns the number of edges dispatched.
    pub fn on_port_interrupt(&mut self) -> usize {
        let mut dispatched = 0;
        for port in 0..self.port.port_count() {
            dispatched += self.process_port(port);
        }
        dispatched
    }

    fn process_port(&mut self, port: u8) -> usize {
        let mut pending = self.port.latch(port);
        let mut dispatched = 0;

        while let Some(bit) = highest_set_bit(pending) {
            pending &= !(1 << bit);

            let number = PinLocation { port, bit }.pin();
            let Some(index) = self.pins.index_of(number) else {
                continue;
            };
            let status = self.pins.slot(index).status;

            if let Some(edge) = status.mode.edge_sense() {
                let mut cfg = self.port.pin_config(port, bit);
                cfg.sense = cfg.sense.toggled();
                self.port.set_pin_config(port, bit, cfg);

                // Now waiting for the falling edge, so this one rose
                let rising = cfg.sense == Sense::Low;
                self.dispatch_edge(index, edge, rising);
                dispatched += 1;
            }

            if status.prefs.wake_on_active && self.events.deep_sleep_pending() {
                self.events
                    .raise(Notification::new(NOTIFY_SOURCE_ID, POWER_EVT_CANCEL_DEEPSLEEP));
            }
        }

        self.port.clear_latch(port, u32::MAX);
        dispatched
    }

    fn dispatch_edge(&mut self, index: usize, edge: EdgeSense, rising: bool) {
        let polarity = self.pins.slot(index).status.prefs.pulse_polarity;
        let slot = self.pins.slot_mut(index);
        let id = slot.event_id;

        match edge {
            EdgeSense::Pulse => {
                if let Some(Peripheral::Pulse(pulse)) = slot.owner.as_mut() {
                    let (event, duration) = pulse.on_edge(now_us(), rising, polarity);
                    self.events
                        .raise(Notification::with_timestamp(id, event.value(), duration));
                }
            }
            EdgeSense::Events => {
                let event = if rising { PinEvent::Rise } else { PinEvent::Fall };
                self.events.raise(Notification::new(id, event.value()));
            }
            EdgeSense::Interrupt => {
                if let Some(handler) = slot.irq_handler {
                    handler(rising);
                }
            }
        }
    }
}
