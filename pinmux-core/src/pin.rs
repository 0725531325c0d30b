//! Per-pin operations
//!
//! A [`Pin`] borrows the multiplexer for the duration of one or more
//! operations. Every operation that changes mode asks the state machine
//! whether the current owner must be torn down first; plain digital reads
//! and writes skip teardown when the mode already fits.
//!
//! Mutating operations check capability, range and hardware presence
//! before touching anything.

use pinmux_hal::{
    AdcSampler, DriveMode, PinLocation, PortRegisters, Pull, Sense, TouchSensor,
};

use crate::config::{
    Capability, Level, TouchMode, ADC_SAMPLE_SHIFT, DEFAULT_SERVO_CENTER_US,
    DEFAULT_SERVO_RANGE_US, MAX_OUTPUT, SERVO_PERIOD_US,
};
use crate::error::{PinError, Result};
use crate::mux::{PinMux, Platform};
use crate::peripheral::{
    now_us, Button, Peripheral, PeripheralKind, PulseIn, PulseWaiter, TouchButton,
};
use crate::pwm::{pulse_to_level, servo_pulse_us};
use crate::registry::{IrqHandler, PinSlot};
use crate::state::{EdgeSense, ModeRequest, PinMode, PinStatus};

/// Event generation modes for [`Pin::event_on`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinEventMode {
    /// Stop generating events
    None,
    /// Rise/fall notifications
    Edge,
    /// Pulse width notifications
    Pulse,
    /// Raw interrupt callback
    Interrupt,
    /// Button events from resistive/capacitive touch
    Touch,
}

/// Handle to one registered pin
pub struct Pin<'a, P: Platform> {
    mux: &'a mut PinMux<P>,
    index: usize,
}

impl<'a, P: Platform> Pin<'a, P> {
    pub(crate) fn new(mux: &'a mut PinMux<P>, index: usize) -> Self {
        Self { mux, index }
    }

    fn slot(&self) -> &PinSlot {
        self.mux.pins.slot(self.index)
    }

    fn slot_mut(&mut self) -> &mut PinSlot {
        self.mux.pins.slot_mut(self.index)
    }

    fn location(&self) -> PinLocation {
        PinLocation::of(self.slot().number)
    }

    fn require(&self, capability: Capability) -> Result<()> {
        if self.slot().capability.contains(capability) {
            Ok(())
        } else {
            Err(PinError::NotSupported)
        }
    }

    fn require_unlocked(&self) -> Result<()> {
        if self.slot().is_locked() {
            Err(PinError::Busy)
        } else {
            Ok(())
        }
    }

    /// Tear down the current owner if `request` needs it
    ///
    /// Returns true if the pin had to be reconfigured.
    fn prepare(&mut self, request: ModeRequest) -> bool {
        let slot = self.slot();
        if slot
            .status
            .mode
            .needs_teardown(request, slot.has_active_owner())
        {
            self.mux.disconnect_index(self.index);
            true
        } else {
            false
        }
    }

    fn enter(&mut self, request: ModeRequest) {
        let status = &mut self.slot_mut().status;
        status.mode = status.mode.transition(request);
        trace!("pin {}: {:?}", self.slot().number, self.slot().status.mode);
    }

    fn write_output(&mut self, high: bool) {
        let loc = self.location();
        if high {
            self.mux.port.set_output_bits(loc.port, loc.mask());
        } else {
            self.mux.port.clear_output_bits(loc.port, loc.mask());
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Physical pin number
    pub fn number(&self) -> u8 {
        self.slot().number
    }

    /// Event id this pin raises notifications on
    pub fn event_id(&self) -> u16 {
        self.slot().event_id
    }

    /// Declared capability set
    pub fn capability(&self) -> Capability {
        self.slot().capability
    }

    /// Current mode
    pub fn mode(&self) -> PinMode {
        self.slot().status.mode
    }

    /// Mode plus persistent preferences
    pub fn status(&self) -> PinStatus {
        self.slot().status
    }

    /// Kind of the attached peripheral, if any
    pub fn owner_kind(&self) -> Option<PeripheralKind> {
        self.slot().owner_kind()
    }

    /// Check if the pin is an input (digital or analog)
    pub fn is_input(&self) -> bool {
        self.mode().is_input()
    }

    /// Check if the pin is an output, by mode or by direction register
    pub fn is_output(&self) -> bool {
        let loc = self.location();
        self.mode().is_output() || self.mux.port.direction(loc.port) & loc.mask() != 0
    }

    /// Check if the pin is in a digital mode
    pub fn is_digital(&self) -> bool {
        self.mode().is_digital()
    }

    /// Check if the pin is in an analog mode
    pub fn is_analog(&self) -> bool {
        self.mode().is_analog()
    }

    // ── Digital ───────────────────────────────────────────────

    /// Drive the pin to 0 or 1, switching to digital output if needed
    pub fn set_digital_value(&mut self, value: u8) -> Result<()> {
        if value > 1 {
            return Err(PinError::InvalidParameter);
        }
        self.require_unlocked()?;

        if !self.prepare(ModeRequest::DigitalOut) {
            self.write_output(value == 1);
            return Ok(());
        }

        self.write_output(value == 1);
        self.mux.update_config(self.index, |cfg| cfg.output = true);
        self.enter(ModeRequest::DigitalOut);
        Ok(())
    }

    /// Sample the line, switching to digital input if needed
    ///
    /// Listeners attached to a digital input (edge or pulse events without
    /// an active owner) are kept.
    pub fn get_digital_value(&mut self) -> u8 {
        if self.prepare(ModeRequest::DigitalIn) {
            self.mux.update_config(self.index, |cfg| {
                cfg.output = false;
                cfg.input_connected = true;
            });
            let pull = self.slot().status.prefs.pull;
            self.set_pull(pull);
        }
        self.enter(ModeRequest::DigitalIn);

        self.mux.line_level(self.index) as u8
    }

    /// Set the pull preference, then sample the line
    pub fn get_digital_value_with_pull(&mut self, pull: Pull) -> u8 {
        self.set_pull(pull);
        self.get_digital_value()
    }

    /// Set the persistent pull preference and apply it
    pub fn set_pull(&mut self, pull: Pull) {
        self.slot_mut().status.prefs.pull = pull;
        self.mux.update_config(self.index, |cfg| cfg.pull = pull);
    }

    /// Drive `value` only if the line currently reads the opposite level
    ///
    /// Used for bus arbitration on a shared line: the direction switches to
    /// output only where the sampled input differs from `value`. If the
    /// switch did not happen another driver won and `Busy` is returned. A
    /// pin that is already an output is left alone.
    pub fn get_and_set_digital_value(&mut self, value: u8) -> Result<()> {
        if value > 1 {
            return Err(PinError::InvalidParameter);
        }
        self.require_unlocked()?;

        let loc = self.location();
        let mask = loc.mask();
        if self.mux.port.direction(loc.port) & mask != 0 {
            return Ok(());
        }

        self.write_output(value == 1);
        let input = self.mux.port.input(loc.port);
        let differs = if value == 1 { !input } else { input };
        self.mux.port.set_direction_bits(loc.port, differs & mask);

        if self.mux.port.direction(loc.port) & mask == 0 {
            return Err(PinError::Busy);
        }

        self.mux.disconnect_index(self.index);
        self.set_digital_value(value)
    }

    // ── Drive strength ────────────────────────────────────────

    /// Set the output drive strength
    pub fn set_drive_mode(&mut self, mode: DriveMode) {
        self.mux.update_config(self.index, |cfg| cfg.drive = mode);
    }

    /// Set the output drive strength from its raw field value (0-7)
    pub fn set_drive_mode_raw(&mut self, value: u8) -> Result<()> {
        let mode = DriveMode::from_u8(value).ok_or(PinError::InvalidParameter)?;
        self.set_drive_mode(mode);
        Ok(())
    }

    /// Current drive strength
    pub fn drive_mode(&self) -> DriveMode {
        self.mux.read_config(self.index).drive
    }

    /// Switch between high drive on both levels and standard drive
    pub fn set_high_drive(&mut self, enabled: bool) {
        let mode = if enabled {
            DriveMode::H0H1
        } else {
            DriveMode::S0S1
        };
        self.set_drive_mode(mode);
    }

    /// Check if both levels use high drive
    pub fn is_high_drive(&self) -> bool {
        self.drive_mode() == DriveMode::H0H1
    }

    // ── Analog output ─────────────────────────────────────────

    /// Output `level` (0..=1023) through a shared PWM channel
    ///
    /// Reuses the pin's channel if it still has one; otherwise takes the
    /// next channel round-robin, silently evicting its previous holder.
    pub fn set_analog_value(&mut self, level: u16) -> Result<()> {
        self.require(Capability::ANALOG)?;
        if level > MAX_OUTPUT {
            return Err(PinError::InvalidParameter);
        }
        if !self.mux.pwm.is_present() {
            return Err(PinError::NotSupported);
        }
        self.require_unlocked()?;

        self.prepare(ModeRequest::AnalogOut);

        let number = self.number();
        let allocation = self.mux.pwm.allocate(number)?;
        self.mux.connect_index(self.index, Peripheral::Pwm)?;
        self.enter(ModeRequest::AnalogOut);

        self.mux.pwm.set_level(allocation.channel, level)
    }

    /// Position a servo: `angle` in degrees (clipped to 180)
    ///
    /// `range_us` is the pulse span of the full sweep and `center_us` the
    /// pulse at 90°.
    pub fn set_servo_value(&mut self, angle: u16, range_us: u32, center_us: u32) -> Result<()> {
        self.require(Capability::ANALOG)?;
        let pulse_us = servo_pulse_us(angle, range_us, center_us)?;
        self.set_servo_pulse_us(pulse_us)
    }

    /// Position a servo with the default 1000..2000 µs span around 1500 µs
    pub fn set_servo_angle(&mut self, angle: u16) -> Result<()> {
        self.set_servo_value(angle, DEFAULT_SERVO_RANGE_US, DEFAULT_SERVO_CENTER_US)
    }

    /// Emit a pulse of `pulse_us` every 20 ms
    ///
    /// Switches the shared PWM period to 20 ms if needed, which rescales
    /// every other channel.
    pub fn set_servo_pulse_us(&mut self, pulse_us: u32) -> Result<()> {
        self.require(Capability::ANALOG)?;
        let level = u16::try_from(pulse_to_level(pulse_us))
            .ok()
            .filter(|level| *level <= MAX_OUTPUT)
            .ok_or(PinError::InvalidParameter)?;
        if !self.mux.pwm.is_present() {
            return Err(PinError::NotSupported);
        }
        self.require_unlocked()?;

        if self.mux.pwm.period_us()? != SERVO_PERIOD_US {
            self.mux.pwm.set_period_us(SERVO_PERIOD_US)?;
        }
        self.set_analog_value(level)
    }

    /// Change the shared PWM period, preserving every channel's duty cycle
    ///
    /// Only valid while this pin is an analog output.
    pub fn set_analog_period_us(&mut self, period_us: u32) -> Result<()> {
        if self.mode() != PinMode::AnalogOut {
            return Err(PinError::NotSupported);
        }
        self.mux.pwm.set_period_us(period_us)
    }

    /// Millisecond form of [`set_analog_period_us`](Self::set_analog_period_us)
    pub fn set_analog_period(&mut self, period_ms: u32) -> Result<()> {
        let period_us = period_ms
            .checked_mul(1000)
            .ok_or(PinError::InvalidParameter)?;
        self.set_analog_period_us(period_us)
    }

    /// Shared PWM period; only valid while this pin is an analog output
    pub fn get_analog_period_us(&mut self) -> Result<u32> {
        if self.mode() != PinMode::AnalogOut {
            return Err(PinError::NotSupported);
        }
        self.mux.pwm.period_us()
    }

    /// Millisecond form of [`get_analog_period_us`](Self::get_analog_period_us)
    pub fn get_analog_period(&mut self) -> Result<u32> {
        Ok(self.get_analog_period_us()? / 1000)
    }

    // ── Analog input ──────────────────────────────────────────

    /// Sample the pin's ADC channel, scaled to 10 bits
    pub fn get_analog_value(&mut self) -> Result<u16> {
        self.require(Capability::ANALOG)?;
        let number = self.number();
        let has_channel = self
            .mux
            .adc
            .as_ref()
            .is_some_and(|adc| adc.has_channel(number));
        if !has_channel {
            return Err(PinError::NotSupported);
        }

        self.prepare(ModeRequest::AnalogIn);
        if !self.slot().is_locked() {
            self.enter(ModeRequest::AnalogIn);
        }

        let raw = self
            .mux
            .adc
            .as_mut()
            .and_then(|adc| adc.sample(number))
            .ok_or(PinError::NotSupported)?;
        Ok(raw >> ADC_SAMPLE_SHIFT)
    }

    // ── Touch ─────────────────────────────────────────────────

    /// Debounced touch state, using the last selected touch variant
    pub fn is_touched(&mut self) -> Result<bool> {
        let mode = self.slot().status.prefs.touch;
        self.is_touched_with(mode)
    }

    /// Debounced touch state, switching to `mode` if needed
    ///
    /// Switching variant replaces the adapter, which resets its press
    /// count.
    pub fn is_touched_with(&mut self, mode: TouchMode) -> Result<bool> {
        self.require(Capability::DIGITAL)?;
        if mode == TouchMode::Capacitive {
            self.require(Capability::TOUCH)?;
            if self.mux.touch.is_none() {
                return Err(PinError::NotSupported);
            }
        }

        if self.prepare(ModeRequest::Touch(mode)) {
            self.require_unlocked()?;
            let debounce = self.mux.config.debounce;

            let adapter = match mode {
                TouchMode::Capacitive => {
                    let number = self.number();
                    let threshold = self
                        .mux
                        .calibration
                        .get(number)
                        .unwrap_or(self.mux.config.touch_threshold);
                    Peripheral::Touch(TouchButton::new(threshold, debounce))
                }
                TouchMode::Resistive => {
                    self.get_digital_value();
                    self.set_pull(Pull::None);
                    Peripheral::Button(Button::new(true, debounce))
                }
            };

            self.mux.connect_index(self.index, adapter)?;
            self.slot_mut().status.prefs.touch = mode;
            self.enter(ModeRequest::Touch(mode));
        }

        Ok(match self.slot().owner.as_ref() {
            Some(Peripheral::Touch(touch)) => touch.is_pressed(),
            Some(Peripheral::Button(button)) => button.is_pressed(),
            _ => false,
        })
    }

    /// Touches since the last call, using the last selected touch variant
    pub fn was_touched(&mut self) -> Result<u16> {
        let mode = self.slot().status.prefs.touch;
        self.was_touched_with(mode)
    }

    /// Touches since the last call
    ///
    /// Counting only carries over between consecutive calls with the same
    /// variant and no other mode change in between; otherwise the adapter
    /// is replaced and the count restarts.
    pub fn was_touched_with(&mut self, mode: TouchMode) -> Result<u16> {
        if self.mode().touch_mode() != Some(mode) {
            self.is_touched_with(mode)?;
        }

        Ok(match self.slot_mut().owner.as_mut() {
            Some(Peripheral::Touch(touch)) => touch.was_pressed(),
            Some(Peripheral::Button(button)) => button.was_pressed(),
            _ => 0,
        })
    }

    /// Recalibrate a capacitive touch pin from its current reading
    ///
    /// Records the new threshold in the touch calibration and returns it.
    pub fn touch_calibrate(&mut self) -> Result<u16> {
        if self.mode().touch_mode() != Some(TouchMode::Capacitive) {
            return Err(PinError::NotSupported);
        }
        let number = self.number();
        let reading = self
            .mux
            .touch
            .as_mut()
            .map(|sensor| sensor.read(number))
            .ok_or(PinError::NotSupported)?;

        let threshold = match self.slot_mut().owner.as_mut() {
            Some(Peripheral::Touch(touch)) => touch.calibrate(reading),
            _ => return Err(PinError::NotSupported),
        };
        if !self.mux.calibration.set(number, threshold) {
            warn!("pin {}: touch calibration table full", number);
        }
        debug!("pin {}: touch threshold {}", number, threshold);
        Ok(threshold)
    }

    // ── Events ────────────────────────────────────────────────

    /// Select which events this pin generates
    pub fn event_on(&mut self, mode: PinEventMode) -> Result<()> {
        match mode {
            PinEventMode::None => {
                self.disable_events();
                Ok(())
            }
            PinEventMode::Edge => self.enable_rise_fall_events(EdgeSense::Events),
            PinEventMode::Pulse => self.enable_rise_fall_events(EdgeSense::Pulse),
            PinEventMode::Interrupt => self.enable_rise_fall_events(EdgeSense::Interrupt),
            PinEventMode::Touch => self.is_touched().map(|_| ()),
        }
    }

    /// Attach an edge listener
    ///
    /// Entering edge detection from another mode makes the pin a digital
    /// input and arms sensing for the opposite of the current level.
    /// Switching between listeners keeps the sense configuration.
    fn enable_rise_fall_events(&mut self, sense: EdgeSense) -> Result<()> {
        let current = self.mode().edge_sense();
        let leaving_pulse = current == Some(EdgeSense::Pulse) && sense != EdgeSense::Pulse;
        if leaving_pulse {
            self.require_unlocked()?;
        }

        if current.is_none() {
            let level = self.get_digital_value();
            self.mux.update_config(self.index, |cfg| {
                cfg.sense = if level == 1 { Sense::Low } else { Sense::High };
            });
            let loc = self.location();
            self.mux.port.clear_latch(loc.port, loc.mask());
        }

        if leaving_pulse {
            let number = self.number();
            if let Some(owner) = self.slot_mut().owner.take() {
                owner.release(number);
            }
        }

        self.enter(ModeRequest::Edge(sense));

        if sense == EdgeSense::Pulse && current != Some(EdgeSense::Pulse) {
            let number = self.number();
            let slots = self.mux.pulse_slots;
            let slot = slots.slot(number).ok_or(PinError::NotSupported)?;
            self.mux
                .connect_index(self.index, Peripheral::Pulse(PulseIn::new(slot, now_us())))?;
        }
        Ok(())
    }

    /// Stop edge and touch event generation
    pub fn disable_events(&mut self) {
        let mode = self.mode();
        if mode.edge_sense().is_some() || mode.touch_mode().is_some() {
            self.mux.disconnect_index(self.index);
        }
    }

    /// Set or clear the raw edge callback used in interrupt mode
    pub fn set_interrupt_handler(&mut self, handler: Option<IrqHandler>) {
        self.slot_mut().irq_handler = handler;
    }

    // ── Pulse timing ──────────────────────────────────────────

    /// Enter pulse mode and arm a capture
    ///
    /// The returned waiter completes on the next pulse of the configured
    /// polarity. While it is alive the pin refuses teardown. Fails with
    /// `Busy` if a capture is already armed.
    pub fn arm_pulse(&mut self) -> Result<PulseWaiter> {
        self.get_digital_value();
        if self.mode().edge_sense() != Some(EdgeSense::Pulse) {
            self.enable_rise_fall_events(EdgeSense::Pulse)?;
        }

        match self.slot().owner.as_ref() {
            Some(Peripheral::Pulse(pulse)) => pulse.arm(),
            _ => Err(PinError::Busy),
        }
    }

    /// Select which pulse [`arm_pulse`](Self::arm_pulse) measures
    pub fn set_pulse_polarity(&mut self, polarity: Level) {
        self.slot_mut().status.prefs.pulse_polarity = polarity;
    }

    /// Pulse polarity preference
    pub fn pulse_polarity(&self) -> Level {
        self.slot().status.prefs.pulse_polarity
    }

    // ── Misc ──────────────────────────────────────────────────

    /// Cancel a pending deep sleep whenever this pin changes
    pub fn set_wake_on_active(&mut self, enabled: bool) {
        self.slot_mut().status.prefs.wake_on_active = enabled;
    }

    /// Wake-on-active preference
    pub fn is_wake_on_active(&self) -> bool {
        self.slot().status.prefs.wake_on_active
    }

    /// Tear down the current owner and drop every transient mode
    pub fn disconnect(&mut self) {
        self.mux.disconnect_index(self.index);
    }

    /// Check if a teardown is in progress
    pub fn is_disconnecting(&self) -> bool {
        self.slot().status.is_disconnecting()
    }
}

impl<P: Platform> embedded_hal::digital::ErrorType for Pin<'_, P> {
    type Error = PinError;
}

impl<P: Platform> embedded_hal::digital::OutputPin for Pin<'_, P> {
    fn set_low(&mut self) -> Result<()> {
        self.set_digital_value(0)
    }

    fn set_high(&mut self) -> Result<()> {
        self.set_digital_value(1)
    }
}

impl<P: Platform> embedded_hal::digital::InputPin for Pin<'_, P> {
    fn is_high(&mut self) -> Result<bool> {
        Ok(self.get_digital_value() == 1)
    }

    fn is_low(&mut self) -> Result<bool> {
        Ok(self.get_digital_value() == 0)
    }
}
