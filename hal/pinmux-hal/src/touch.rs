//! Capacitive touch sensor abstraction

/// Shared capacitive touch sensing peripheral
///
/// Readings grow with the capacitance seen on the pin; a finger on the
/// electrode raises the reading above the untouched baseline.
pub trait TouchSensor {
    /// Take a raw capacitive reading from `pin`
    fn read(&mut self, pin: u8) -> u16;
}
