//! State machine definition
//!
//! Mode changes are a function of the current mode, the requested mode and
//! whether an unlocked peripheral currently owns the pin.

use pinmux_hal::Pull;

use crate::config::{Level, TouchMode};

/// Which edge listener is attached to a digital input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EdgeSense {
    /// Raise rise/fall notifications
    Events,
    /// Measure pulse widths between edges
    Pulse,
    /// Invoke the raw interrupt callback
    Interrupt,
}

/// Digital input sub-state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputMode {
    /// Plain level sampling
    #[default]
    Plain,
    /// Debounced touch sensing
    Touch(TouchMode),
    /// Edge detection through the port interrupt
    Edge(EdgeSense),
}

/// Exclusive pin modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinMode {
    /// Nothing configured since construction or the last teardown
    #[default]
    Unconfigured,
    /// Driving a level
    DigitalOut,
    /// Sampling a level, optionally with a listener attached
    DigitalIn(InputMode),
    /// PWM output through the shared channel pool
    AnalogOut,
    /// ADC input
    AnalogIn,
}

/// Mode a caller asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModeRequest {
    DigitalOut,
    DigitalIn,
    AnalogOut,
    AnalogIn,
    Touch(TouchMode),
    Edge(EdgeSense),
}

impl PinMode {
    /// Check if this is a digital or analog input mode
    pub fn is_input(&self) -> bool {
        matches!(self, PinMode::DigitalIn(_) | PinMode::AnalogIn)
    }

    /// Check if this is a digital or analog output mode
    pub fn is_output(&self) -> bool {
        matches!(self, PinMode::DigitalOut | PinMode::AnalogOut)
    }

    /// Check if this is a digital mode
    pub fn is_digital(&self) -> bool {
        matches!(self, PinMode::DigitalOut | PinMode::DigitalIn(_))
    }

    /// Check if this is an analog mode
    pub fn is_analog(&self) -> bool {
        matches!(self, PinMode::AnalogOut | PinMode::AnalogIn)
    }

    /// Edge listener, if one is attached
    pub fn edge_sense(&self) -> Option<EdgeSense> {
        match self {
            PinMode::DigitalIn(InputMode::Edge(sense)) => Some(*sense),
            _ => None,
        }
    }

    /// Touch variant, if touch sensing is active
    pub fn touch_mode(&self) -> Option<TouchMode> {
        match self {
            PinMode::DigitalIn(InputMode::Touch(mode)) => Some(*mode),
            _ => None,
        }
    }

    /// Whether carrying out `request` must first tear down the current owner
    ///
    /// `active_owner` is true when a peripheral that is not pin-locked owns
    /// the pin. Plain digital in/out keep their fast path only while nothing
    /// (or only a locked peripheral) owns the pin; switching between edge
    /// listeners happens in place.
    pub fn needs_teardown(self, request: ModeRequest, active_owner: bool) -> bool {
        match request {
            ModeRequest::DigitalOut => !(self == PinMode::DigitalOut && !active_owner),
            ModeRequest::DigitalIn => !(matches!(self, PinMode::DigitalIn(_)) && !active_owner),
            ModeRequest::AnalogOut => self != PinMode::AnalogOut,
            ModeRequest::AnalogIn => self != PinMode::AnalogIn,
            ModeRequest::Touch(mode) => self.touch_mode() != Some(mode),
            ModeRequest::Edge(_) => self.edge_sense().is_none(),
        }
    }

    /// Mode reached once `request` has been carried out
    ///
    /// A digital-input request keeps any listener already attached.
    pub fn transition(self, request: ModeRequest) -> Self {
        match (self, request) {
            (_, ModeRequest::DigitalOut) => PinMode::DigitalOut,
            (PinMode::DigitalIn(input), ModeRequest::DigitalIn) => PinMode::DigitalIn(input),
            (_, ModeRequest::DigitalIn) => PinMode::DigitalIn(InputMode::Plain),
            (_, ModeRequest::AnalogOut) => PinMode::AnalogOut,
            (_, ModeRequest::AnalogIn) => PinMode::AnalogIn,
            (_, ModeRequest::Touch(mode)) => PinMode::DigitalIn(InputMode::Touch(mode)),
            (_, ModeRequest::Edge(sense)) => PinMode::DigitalIn(InputMode::Edge(sense)),
        }
    }
}

/// Preferences that survive teardown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinPrefs {
    /// Pull applied whenever the pin becomes a digital input
    pub pull: Pull,
    /// Touch variant used when none is given
    pub touch: TouchMode,
    /// Cancel pending deep sleep when this pin changes
    pub wake_on_active: bool,
    /// Which pulse `get_pulse_us` measures
    pub pulse_polarity: Level,
}

/// Complete per-pin status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinStatus {
    /// Current exclusive mode
    pub mode: PinMode,
    /// Persistent preferences
    pub prefs: PinPrefs,
    /// Teardown in progress
    disconnecting: bool,
}

impl PinStatus {
    /// Fresh status with the given pull preference
    pub fn new(pull: Pull) -> Self {
        Self {
            mode: PinMode::Unconfigured,
            prefs: PinPrefs {
                pull,
                ..PinPrefs::default()
            },
            disconnecting: false,
        }
    }

    /// Check if a teardown is in progress
    pub fn is_disconnecting(&self) -> bool {
        self.disconnecting
    }

    pub(crate) fn set_disconnecting(&mut self, disconnecting: bool) {
        self.disconnecting = disconnecting;
    }

    /// Drop every transient mode, keeping preferences
    pub(crate) fn reset(&mut self) {
        self.mode = PinMode::Unconfigured;
        self.disconnecting = false;
    }
}
