//! ADC abstraction

/// Raw analog sampling
pub trait AdcSampler {
    /// Check whether `pin` is wired to an analog channel
    fn has_channel(&self, pin: u8) -> bool;

    /// Take a raw sample from the channel bound to `pin`
    ///
    /// Returns `None` if the pin has no analog channel.
    fn sample(&mut self, pin: u8) -> Option<u16>;
}
