//! Notification values raised on a pin's event id

/// Values raised by the edge demultiplexer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum PinEvent {
    /// Rising edge (edge-event mode)
    Rise = 2,
    /// Falling edge (edge-event mode)
    Fall = 3,
    /// A high pulse ended; timestamp carries its width in µs
    PulseHigh = 4,
    /// A low pulse ended; timestamp carries its width in µs
    PulseLow = 5,
}

/// Values raised by button and touch adapters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum ButtonEvent {
    /// Debounced press
    Down = 1,
    /// Debounced release
    Up = 2,
    /// Press followed by release
    Click = 3,
}

impl PinEvent {
    /// Raw notification value
    pub fn value(self) -> u16 {
        self as u16
    }

    /// Pulse event for an edge: a rising edge ends a low pulse
    pub fn pulse_ended_by(rising: bool) -> Self {
        if rising {
            PinEvent::PulseLow
        } else {
            PinEvent::PulseHigh
        }
    }
}

impl ButtonEvent {
    /// Raw notification value
    pub fn value(self) -> u16 {
        self as u16
    }
}
