//! Shared PWM channel pool
//!
//! A handful of hardware channels are shared by every pin in analog-out
//! mode. Pins keep their channel until they are torn down or evicted by
//! round-robin allocation; an evicted pin silently stops being refreshed.
//! All channels share one duty buffer, which is retransmitted whole on
//! every update.

pub mod servo;

use pinmux_hal::PwmHardware;

use crate::config::MAX_OUTPUT;
use crate::error::{PinError, Result};

pub use servo::{pulse_to_level, servo_pulse_us};

/// Number of hardware PWM channels
pub const PWM_CHANNELS: usize = 4;

/// Duty value for an analog level
///
/// Output is active-low: level 0 holds the whole period, level
/// [`MAX_OUTPUT`] holds none of it.
pub fn duty_for_level(sample_range: u16, level: u16) -> u16 {
    let level = level.min(MAX_OUTPUT) as u32;
    (sample_range as u32 * (MAX_OUTPUT as u32 - level) / MAX_OUTPUT as u32) as u16
}

/// Rescale a duty value to a new sample range, preserving the duty cycle
pub fn rescale_duty(duty: u16, old_range: u16, new_range: u16) -> u16 {
    if old_range == 0 {
        return 0;
    }
    (duty as u32 * new_range as u32 / old_range as u32).min(u16::MAX as u32) as u16
}

/// Result of a channel allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Allocation {
    /// Channel now bound to the pin
    pub channel: usize,
    /// Pin that lost the channel, if any
    pub evicted: Option<u8>,
}

/// Channel pool over one PWM peripheral
pub struct PwmPool<H> {
    hw: Option<H>,
    initialised: bool,
    default_period_us: u32,
    owners: [Option<u8>; PWM_CHANNELS],
    duty: [u16; PWM_CHANNELS],
    last_used: usize,
}

impl<H: PwmHardware> PwmPool<H> {
    /// Create a pool; `hw` is `None` on boards without PWM
    ///
    /// The hardware is programmed with `default_period_us` on first use.
    pub fn new(hw: Option<H>, default_period_us: u32) -> Self {
        Self {
            hw,
            initialised: false,
            default_period_us,
            owners: [None; PWM_CHANNELS],
            duty: [0; PWM_CHANNELS],
            last_used: PWM_CHANNELS - 1,
        }
    }

    /// Check if PWM hardware is present
    pub fn is_present(&self) -> bool {
        self.hw.is_some()
    }

    fn hardware(&mut self) -> Result<&mut H> {
        let hw = self.hw.as_mut().ok_or(PinError::NotSupported)?;
        if !self.initialised {
            hw.set_period_us(self.default_period_us);
            self.initialised = true;
            debug!("pwm initialised, period {} us", self.default_period_us);
        }
        Ok(hw)
    }

    /// Underlying PWM peripheral
    pub fn inner(&self) -> Option<&H> {
        self.hw.as_ref()
    }

    /// Channel currently bound to a pin
    pub fn channel_of(&self, pin: u8) -> Option<usize> {
        self.owners.iter().position(|owner| *owner == Some(pin))
    }

    /// Pin currently bound to a channel
    pub fn owner_of(&self, channel: usize) -> Option<u8> {
        self.owners.get(channel).copied().flatten()
    }

    /// Buffered duty values, one per channel
    pub fn duty(&self) -> &[u16; PWM_CHANNELS] {
        &self.duty
    }

    /// Bind a channel to a pin
    ///
    /// Reuses the pin's channel if it has one. Otherwise takes the next
    /// channel round-robin, evicting its holder.
    pub fn allocate(&mut self, pin: u8) -> Result<Allocation> {
        if let Some(channel) = self.channel_of(pin) {
            return Ok(Allocation {
                channel,
                evicted: None,
            });
        }

        let channel = (self.last_used + 1) % PWM_CHANNELS;
        self.hardware()?.connect_pin(pin, channel);

        let evicted = self.owners[channel].replace(pin);
        self.last_used = channel;

        if let Some(old) = evicted {
            debug!("pwm channel {} moved from pin {} to pin {}", channel, old, pin);
        }

        Ok(Allocation { channel, evicted })
    }

    /// Unbind whatever channel a pin holds
    pub fn release(&mut self, pin: u8) {
        for owner in self.owners.iter_mut().filter(|o| **o == Some(pin)) {
            *owner = None;
        }
    }

    /// Set a channel's level and retransmit the buffer
    pub fn set_level(&mut self, channel: usize, level: u16) -> Result<()> {
        if channel >= PWM_CHANNELS {
            return Err(PinError::InvalidParameter);
        }
        let range = self.hardware()?.sample_range();
        self.duty[channel] = duty_for_level(range, level);
        self.play()
    }

    /// Current period
    pub fn period_us(&mut self) -> Result<u32> {
        Ok(self.hardware()?.period_us())
    }

    /// Change the period, rescaling every channel's duty
    pub fn set_period_us(&mut self, period_us: u32) -> Result<()> {
        if period_us == 0 {
            return Err(PinError::InvalidParameter);
        }

        let hw = self.hardware()?;
        let old_range = hw.sample_range();
        hw.set_period_us(period_us);
        let new_range = hw.sample_range();

        for duty in self.duty.iter_mut() {
            *duty = rescale_duty(*duty, old_range, new_range);
        }
        trace!("pwm period {} us, range {} -> {}", period_us, old_range, new_range);

        self.play()
    }

    fn play(&mut self) -> Result<()> {
        let hw = self.hw.as_mut().ok_or(PinError::NotSupported)?;
        hw.play(&self.duty);
        Ok(())
    }
}
