//! PWM peripheral abstraction
//!
//! The PWM peripheral drives a small fixed set of channels from one shared
//! duty buffer. The whole buffer is transmitted on every update.

/// Shared multi-channel PWM peripheral
pub trait PwmHardware {
    /// Route a channel's output to a pin
    fn connect_pin(&mut self, pin: u8, channel: usize);

    /// Number of counter ticks in one PWM period
    ///
    /// Duty values in the buffer are expressed in these ticks.
    fn sample_range(&self) -> u16;

    /// Current PWM period in microseconds
    fn period_us(&self) -> u32;

    /// Change the PWM period; the sample range follows
    fn set_period_us(&mut self, period_us: u32);

    /// Start transmitting the duty buffer (one entry per channel)
    ///
    /// Implementations may return before the transfer completes.
    fn play(&mut self, duty: &[u16]);
}
