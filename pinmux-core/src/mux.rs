//! The pin multiplexer
//!
//! [`PinMux`] owns every piece of shared state: the pin arena and routing
//! table, the PWM pool, and the hardware collaborators. Foreground code
//! reaches a pin through [`PinMux::pin`]; the port interrupt enters through
//! [`PinMux::on_port_interrupt`].

use pinmux_hal::{
    AdcSampler, EventSink, Notification, PinConfig, PinLocation, PortRegisters, PwmHardware,
    TouchSensor,
};

use crate::config::{BoardConfig, Capability, TouchCalibration, MAX_PINS};
use crate::error::{PinError, Result};
use crate::peripheral::{Peripheral, PeripheralKind, PulseSlots};
use crate::pin::Pin;
use crate::pwm::PwmPool;
use crate::registry::PinTable;
use crate::state::ButtonEvent;

/// Hardware collaborator types of one board
pub trait Platform {
    type Port: PortRegisters;
    type Pwm: PwmHardware;
    type Adc: AdcSampler;
    type Touch: TouchSensor;
    type Events: EventSink;
}

/// Hardware handed to [`PinMux::new`]
///
/// Optional peripherals are `None` on boards that lack them; operations
/// needing them then fail with `NotSupported`.
pub struct Hardware<P: Platform> {
    pub port: P::Port,
    pub pwm: Option<P::Pwm>,
    pub adc: Option<P::Adc>,
    pub touch: Option<P::Touch>,
    pub events: P::Events,
}

/// Runtime pin multiplexer
pub struct PinMux<P: Platform> {
    pub(crate) port: P::Port,
    pub(crate) pwm: PwmPool<P::Pwm>,
    pub(crate) adc: Option<P::Adc>,
    pub(crate) touch: Option<P::Touch>,
    pub(crate) events: P::Events,
    pub(crate) pins: PinTable,
    pub(crate) pulse_slots: &'static PulseSlots,
    pub(crate) config: BoardConfig,
    pub(crate) calibration: TouchCalibration,
}

impl<P: Platform> PinMux<P> {
    /// Build the multiplexer and register every configured pin
    ///
    /// Fails with `InvalidParameter` if the configuration header is not
    /// valid or lists a pin twice.
    pub fn new(config: BoardConfig, hw: Hardware<P>, pulse_slots: &'static PulseSlots) -> Result<Self> {
        if !config.is_valid() {
            return Err(PinError::InvalidParameter);
        }

        let mut mux = Self {
            port: hw.port,
            pwm: PwmPool::new(hw.pwm, config.pwm_period_us),
            adc: hw.adc,
            touch: hw.touch,
            events: hw.events,
            pins: PinTable::new(),
            pulse_slots,
            config,
            calibration: TouchCalibration::new(),
        };

        for i in 0..mux.config.pins.len() {
            let entry = mux.config.pins[i];
            mux.register_pin(entry.number, entry.capability)?;
        }

        mux.port.enable_port_interrupt();
        info!("pinmux ready, {} pins", mux.pins.len());
        Ok(mux)
    }

    /// Register a pin that is not part of the board configuration
    pub fn register_pin(&mut self, number: u8, capability: Capability) -> Result<()> {
        let event_id = self.config.event_id(number);
        self.pins
            .register(number, event_id, capability, self.config.default_pull)?;
        trace!("pin {} registered, event id {}", number, event_id);
        Ok(())
    }

    /// Handle to a registered pin
    ///
    /// Fails with `InvalidParameter` for numbers beyond the routing table
    /// and `NotSupported` for pins that were never registered.
    pub fn pin(&mut self, number: u8) -> Result<Pin<'_, P>> {
        if number as usize >= MAX_PINS {
            return Err(PinError::InvalidParameter);
        }
        let index = self.pins.index_of(number).ok_or(PinError::NotSupported)?;
        Ok(Pin::new(self, index))
    }

    /// Feed every button and touch adapter one sample
    ///
    /// Call periodically (the debounce thresholds assume a few ms between
    /// calls). Raises `Down`, or `Up` followed by `Click`, on the pin's
    /// event id.
    pub fn sample_inputs(&mut self) {
        for index in 0..self.pins.len() {
            let number = self.pins.slot(index).number;

            let event = match self.pins.slot(index).owner_kind() {
                Some(PeripheralKind::Button) => {
                    let level = self.line_level(index);
                    match self.pins.slot_mut(index).owner.as_mut() {
                        Some(Peripheral::Button(button)) => button.sample(level),
                        _ => None,
                    }
                }
                Some(PeripheralKind::Touch) => {
                    let Some(sensor) = self.touch.as_mut() else {
                        continue;
                    };
                    let reading = sensor.read(number);
                    match self.pins.slot_mut(index).owner.as_mut() {
                        Some(Peripheral::Touch(touch)) => touch.sample(reading),
                        _ => None,
                    }
                }
                _ => None,
            };

            let Some(event) = event else { continue };
            let id = self.pins.slot(index).event_id;
            self.events.raise(Notification::new(id, event.value()));
            if event == ButtonEvent::Up {
                self.events
                    .raise(Notification::new(id, ButtonEvent::Click.value()));
            }
        }
    }

    /// Registered pins
    pub fn pins(&self) -> &PinTable {
        &self.pins
    }

    /// Board configuration in use
    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// PWM channel pool
    pub fn pwm(&self) -> &PwmPool<P::Pwm> {
        &self.pwm
    }

    /// Register file
    pub fn port(&self) -> &P::Port {
        &self.port
    }

    /// Register file, mutably
    pub fn port_mut(&mut self) -> &mut P::Port {
        &mut self.port
    }

    /// Event sink
    pub fn events(&self) -> &P::Events {
        &self.events
    }

    /// Event sink, mutably
    pub fn events_mut(&mut self) -> &mut P::Events {
        &mut self.events
    }

    /// Touch sensor, if present
    pub fn touch_sensor_mut(&mut self) -> Option<&mut P::Touch> {
        self.touch.as_mut()
    }

    /// Current touch calibration
    pub fn touch_calibration(&self) -> &TouchCalibration {
        &self.calibration
    }

    /// Replace the touch calibration, e.g. with data loaded from flash
    pub fn set_touch_calibration(&mut self, calibration: TouchCalibration) -> Result<()> {
        if !calibration.is_valid() {
            return Err(PinError::InvalidParameter);
        }
        self.calibration = calibration;
        Ok(())
    }

    pub(crate) fn location(&self, index: usize) -> PinLocation {
        PinLocation::of(self.pins.slot(index).number)
    }

    pub(crate) fn read_config(&self, index: usize) -> PinConfig {
        let loc = self.location(index);
        self.port.pin_config(loc.port, loc.bit)
    }

    /// Read-modify-write of a pin's configuration register
    pub(crate) fn update_config(&mut self, index: usize, f: impl FnOnce(&mut PinConfig)) {
        let loc = self.location(index);
        let mut cfg = self.port.pin_config(loc.port, loc.bit);
        f(&mut cfg);
        self.port.set_pin_config(loc.port, loc.bit, cfg);
    }

    pub(crate) fn line_level(&self, index: usize) -> bool {
        let loc = self.location(index);
        self.port.input(loc.port) & loc.mask() != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DebounceConfig;
    use crate::sim::{self, Sim};
    use crate::peripheral::Button;

    #[test]
    fn test_new_registers_board_pins() {
        let mux = sim::mux();
        assert_eq!(mux.pins().len(), 5);
        assert!(mux.port().interrupt_enabled);
        for number in [2, 3, 7, 20, 33] {
            assert!(mux.pins().index_of(number).is_some());
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = sim::board();
        config.magic = 0;
        let slots: &'static PulseSlots = Box::leak(Box::new(PulseSlots::new()));
        assert!(matches!(
            PinMux::<Sim>::new(config, sim::hardware(), slots),
            Err(PinError::InvalidParameter)
        ));
    }

    #[test]
    fn test_pin_lookup_errors() {
        let mut mux = sim::mux();
        assert!(matches!(mux.pin(MAX_PINS as u8), Err(PinError::InvalidParameter)));
        assert!(matches!(mux.pin(5), Err(PinError::NotSupported)));
        assert!(mux.pin(33).is_ok());
    }

    #[test]
    fn test_register_extra_pin() {
        let mut mux = sim::mux();
        mux.register_pin(12, Capability::DIGITAL).unwrap();
        assert_eq!(
            mux.register_pin(12, Capability::DIGITAL),
            Err(PinError::InvalidParameter)
        );
        assert!(mux.pin(12).is_ok());
    }

    #[test]
    fn test_sample_inputs_raises_button_events() {
        let mut mux = sim::mux();
        let index = mux.pins().index_of(7).unwrap();
        mux.pins.slot_mut(index).owner =
            Some(Peripheral::Button(Button::new(true, DebounceConfig::default())));
        let id = mux.config().event_id(7);

        mux.port_mut().drive(7, Some(false));
        for _ in 0..20 {
            mux.sample_inputs();
        }
        mux.port_mut().drive(7, Some(true));
        for _ in 0..20 {
            mux.sample_inputs();
        }

        assert_eq!(
            mux.events().values(id),
            vec![
                ButtonEvent::Down.value(),
                ButtonEvent::Up.value(),
                ButtonEvent::Click.value()
            ]
        );
    }

    #[test]
    fn test_calibration_header_checked() {
        let mut mux = sim::mux();
        let mut cal = TouchCalibration::new();
        cal.set(2, 900);
        mux.set_touch_calibration(cal.clone()).unwrap();
        assert_eq!(mux.touch_calibration().get(2), Some(900));

        cal.version = 0;
        assert_eq!(mux.set_touch_calibration(cal), Err(PinError::InvalidParameter));
    }
}
