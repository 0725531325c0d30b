//! Simulated platform for host tests
//!
//! Models a two-port register file with level-matching edge latches, a PWM
//! peripheral, an ADC and a touch sensor. Every hardware side effect is
//! recorded so tests can assert on it.

use std::collections::HashMap;

use pinmux_hal::gpio::PINS_PER_PORT;
use pinmux_hal::{
    AdcSampler, EventSink, Notification, PinConfig, PinLocation, PortRegisters, Pull, PwmHardware,
    Sense, TouchSensor,
};

use crate::config::{BoardConfig, Capability};
use crate::mux::{Hardware, PinMux, Platform};
use crate::peripheral::PulseSlots;

const PORTS: usize = 2;

// ── Register file ─────────────────────────────────────────────

/// Two ports of 32 pins
///
/// Line levels resolve in priority order: output driver, external driver,
/// pull resistor, previous level. A pin's latch bit is set whenever its
/// line matches its sense setting, as on hardware with level detection.
pub struct SimPort {
    pub out: [u32; PORTS],
    pub dir: [u32; PORTS],
    pub latch: [u32; PORTS],
    pub configs: [[PinConfig; PINS_PER_PORT as usize]; PORTS],
    pub interrupt_enabled: bool,
    line: [u32; PORTS],
    external: HashMap<u8, bool>,
}

impl Default for SimPort {
    fn default() -> Self {
        Self {
            out: [0; PORTS],
            dir: [0; PORTS],
            latch: [0; PORTS],
            configs: [[PinConfig::default(); PINS_PER_PORT as usize]; PORTS],
            interrupt_enabled: false,
            line: [0; PORTS],
            external: HashMap::new(),
        }
    }
}

impl SimPort {
    /// Drive a pin from outside, or release it with `None`
    pub fn drive(&mut self, pin: u8, level: Option<bool>) {
        match level {
            Some(level) => self.external.insert(pin, level),
            None => self.external.remove(&pin),
        };
        self.settle();
    }

    /// Configuration of a global pin number
    pub fn config(&self, pin: u8) -> PinConfig {
        let loc = PinLocation::of(pin);
        self.configs[loc.port as usize][loc.bit as usize]
    }

    /// Line level of a global pin number
    pub fn line(&self, pin: u8) -> bool {
        let loc = PinLocation::of(pin);
        self.line[loc.port as usize] & loc.mask() != 0
    }

    fn settle(&mut self) {
        for port in 0..PORTS {
            for bit in 0..PINS_PER_PORT {
                let loc = PinLocation { port: port as u8, bit };
                let mask = loc.mask();
                let cfg = self.configs[port][bit as usize];

                let level = if self.dir[port] & mask != 0 {
                    self.out[port] & mask != 0
                } else if let Some(level) = self.external.get(&loc.pin()) {
                    *level
                } else {
                    match cfg.pull {
                        Pull::Up => true,
                        Pull::Down => false,
                        Pull::None => self.line[port] & mask != 0,
                    }
                };

                if level {
                    self.line[port] |= mask;
                } else {
                    self.line[port] &= !mask;
                }

                let detected = matches!(
                    (cfg.sense, level),
                    (Sense::High, true) | (Sense::Low, false)
                );
                if detected {
                    self.latch[port] |= mask;
                }
            }
        }
    }
}

impl PortRegisters for SimPort {
    fn port_count(&self) -> u8 {
        PORTS as u8
    }

    fn input(&self, port: u8) -> u32 {
        self.line[port as usize]
    }

    fn direction(&self, port: u8) -> u32 {
        self.dir[port as usize]
    }

    fn set_output_bits(&mut self, port: u8, mask: u32) {
        self.out[port as usize] |= mask;
        self.settle();
    }

    fn clear_output_bits(&mut self, port: u8, mask: u32) {
        self.out[port as usize] &= !mask;
        self.settle();
    }

    fn set_direction_bits(&mut self, port: u8, mask: u32) {
        self.dir[port as usize] |= mask;
        for bit in 0..PINS_PER_PORT {
            if mask & (1 << bit) != 0 {
                self.configs[port as usize][bit as usize].output = true;
            }
        }
        self.settle();
    }

    fn pin_config(&self, port: u8, bit: u8) -> PinConfig {
        self.configs[port as usize][bit as usize]
    }

    fn set_pin_config(&mut self, port: u8, bit: u8, config: PinConfig) {
        self.configs[port as usize][bit as usize] = config;
        let mask = 1 << bit;
        if config.output {
            self.dir[port as usize] |= mask;
        } else {
            self.dir[port as usize] &= !mask;
        }
        self.settle();
    }

    fn latch(&self, port: u8) -> u32 {
        self.latch[port as usize]
    }

    fn clear_latch(&mut self, port: u8, mask: u32) {
        self.latch[port as usize] &= !mask;
        // Bits whose condition still holds latch again
        self.settle();
    }

    fn enable_port_interrupt(&mut self) {
        self.interrupt_enabled = true;
    }
}

// ── PWM ───────────────────────────────────────────────────────

/// PWM with a 1 MHz counter: the sample range equals the period in µs
#[derive(Default)]
pub struct SimPwm {
    pub period_us: u32,
    pub connects: Vec<(u8, usize)>,
    pub plays: Vec<Vec<u16>>,
}

impl PwmHardware for SimPwm {
    fn connect_pin(&mut self, pin: u8, channel: usize) {
        self.connects.push((pin, channel));
    }

    fn sample_range(&self) -> u16 {
        self.period_us.min(u16::MAX as u32) as u16
    }

    fn period_us(&self) -> u32 {
        self.period_us
    }

    fn set_period_us(&mut self, period_us: u32) {
        self.period_us = period_us;
    }

    fn play(&mut self, duty: &[u16]) {
        self.plays.push(duty.to_vec());
    }
}

// ── ADC / touch ───────────────────────────────────────────────

#[derive(Default)]
pub struct SimAdc {
    pub samples: HashMap<u8, u16>,
}

impl AdcSampler for SimAdc {
    fn has_channel(&self, pin: u8) -> bool {
        self.samples.contains_key(&pin)
    }

    fn sample(&mut self, pin: u8) -> Option<u16> {
        self.samples.get(&pin).copied()
    }
}

#[derive(Default)]
pub struct SimTouch {
    pub readings: HashMap<u8, u16>,
}

impl TouchSensor for SimTouch {
    fn read(&mut self, pin: u8) -> u16 {
        self.readings.get(&pin).copied().unwrap_or(0)
    }
}

// ── Events ────────────────────────────────────────────────────

#[derive(Default)]
pub struct SimEvents {
    pub raised: Vec<Notification>,
    pub sleep_pending: bool,
}

impl SimEvents {
    /// Values raised on one source, in order
    pub fn values(&self, source: u16) -> Vec<u16> {
        self.raised
            .iter()
            .filter(|n| n.source == source)
            .map(|n| n.value)
            .collect()
    }
}

impl EventSink for SimEvents {
    fn raise(&mut self, notification: Notification) {
        self.raised.push(notification);
    }

    fn deep_sleep_pending(&self) -> bool {
        self.sleep_pending
    }
}

// ── Platform ──────────────────────────────────────────────────

pub struct Sim;

impl Platform for Sim {
    type Port = SimPort;
    type Pwm = SimPwm;
    type Adc = SimAdc;
    type Touch = SimTouch;
    type Events = SimEvents;
}

/// Pins used throughout the tests
///
/// 2, 3: everything; 7: digital only; 20: digital + analog;
/// 33: everything, on the second port.
pub fn board() -> BoardConfig {
    let mut config = BoardConfig::new();
    for (pin, cap) in [
        (2, Capability::ALL),
        (3, Capability::ALL),
        (7, Capability::DIGITAL),
        (20, Capability::AD),
        (33, Capability::ALL),
    ] {
        config.add_pin(pin, cap).unwrap();
    }
    config
}

/// Full simulated hardware
pub fn hardware() -> Hardware<Sim> {
    let mut adc = SimAdc::default();
    adc.samples.insert(2, 0x3FFF);
    adc.samples.insert(20, 1600);
    Hardware {
        port: SimPort::default(),
        pwm: Some(SimPwm::default()),
        adc: Some(adc),
        touch: Some(SimTouch::default()),
        events: SimEvents::default(),
    }
}

/// Multiplexer over [`board`] and [`hardware`]
pub fn mux() -> PinMux<Sim> {
    let slots: &'static PulseSlots = Box::leak(Box::new(PulseSlots::new()));
    PinMux::new(board(), hardware(), slots).unwrap()
}
