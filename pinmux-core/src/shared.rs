//! Process-wide multiplexer instance
//!
//! The multiplexer is shared between foreground code and the port
//! interrupt. Every access runs inside a critical section, which keeps the
//! interrupt out while a register read-modify-write is in progress.
//!
//! ```ignore
//! static PINMUX: SharedPinMux<Board> = SharedPinMux::new();
//!
//! #[interrupt]
//! fn GPIOTE() {
//!     PINMUX.on_interrupt();
//! }
//! ```

use core::cell::RefCell;

use critical_section::Mutex;

use crate::error::{PinError, Result};
use crate::mux::{PinMux, Platform};
use crate::pin::Pin;

/// Init-once holder for a [`PinMux`]
pub struct SharedPinMux<P: Platform> {
    inner: Mutex<RefCell<Option<PinMux<P>>>>,
}

impl<P: Platform> Default for SharedPinMux<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Platform> SharedPinMux<P> {
    /// Create an empty holder
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    /// Install the multiplexer
    ///
    /// Only the first call succeeds; later calls hand the value back.
    pub fn init(&self, mux: PinMux<P>) -> core::result::Result<(), PinMux<P>> {
        critical_section::with(|cs| {
            let mut slot = self.inner.borrow_ref_mut(cs);
            if slot.is_some() {
                warn!("pinmux already initialised");
                return Err(mux);
            }
            *slot = Some(mux);
            Ok(())
        })
    }

    /// Check if [`init`](Self::init) has run
    pub fn is_initialised(&self) -> bool {
        critical_section::with(|cs| self.inner.borrow_ref(cs).is_some())
    }

    /// Run `f` with exclusive access to the multiplexer
    ///
    /// Fails with `NotSupported` before initialisation and with `Busy` if
    /// called from inside another access.
    pub fn with<R>(&self, f: impl FnOnce(&mut PinMux<P>) -> R) -> Result<R> {
        critical_section::with(|cs| {
            let mut guard = self
                .inner
                .borrow(cs)
                .try_borrow_mut()
                .map_err(|_| PinError::Busy)?;
            let mux = guard.as_mut().ok_or(PinError::NotSupported)?;
            Ok(f(mux))
        })
    }

    /// Run `f` on one pin
    pub fn with_pin<R>(&self, number: u8, f: impl FnOnce(&mut Pin<'_, P>) -> Result<R>) -> Result<R> {
        self.with(|mux| {
            let mut pin = mux.pin(number)?;
            f(&mut pin)
        })?
    }

    /// Service the port interrupt; returns the number of edges dispatched
    pub fn on_interrupt(&self) -> usize {
        self.with(PinMux::on_port_interrupt).unwrap_or(0)
    }

    /// Measure the next pulse on a pin
    ///
    /// Puts the pin in pulse mode if needed and waits, without holding the
    /// lock, for a pulse of the pin's configured polarity. Returns the width
    /// in microseconds, or `Cancelled` if none completed within
    /// `timeout_us`.
    pub async fn get_pulse_us(&self, number: u8, timeout_us: u32) -> Result<u32> {
        let waiter = self.with_pin(number, |pin| pin.arm_pulse())?;
        waiter.wait(timeout_us).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Level;
    use crate::sim::{self, Sim};
    use crate::state::PinMode;
    use std::thread;
    use std::time::Duration;

    fn shared() -> &'static SharedPinMux<Sim> {
        let shared: &'static SharedPinMux<Sim> = Box::leak(Box::new(SharedPinMux::new()));
        assert!(shared.init(sim::mux()).is_ok());
        shared
    }

    #[test]
    fn test_init_once() {
        let shared = SharedPinMux::<Sim>::new();
        assert!(!shared.is_initialised());
        assert_eq!(
            shared.with(|mux| mux.pins().len()).err(),
            Some(PinError::NotSupported)
        );

        assert!(shared.init(sim::mux()).is_ok());
        assert!(shared.is_initialised());
        assert!(shared.init(sim::mux()).is_err());
        assert_eq!(shared.with(|mux| mux.pins().len()), Ok(5));
    }

    #[test]
    fn test_nested_access_is_busy() {
        let shared = shared();
        let nested = shared.with(|_| shared.with(|_| ()));
        assert_eq!(nested, Ok(Err(PinError::Busy)));
    }

    #[test]
    fn test_with_pin() {
        let shared = shared();
        shared
            .with_pin(7, |pin| pin.set_digital_value(1))
            .unwrap();
        assert_eq!(
            shared.with_pin(7, |pin| Ok(pin.mode())),
            Ok(PinMode::DigitalOut)
        );
        assert_eq!(
            shared.with_pin(9, |pin| Ok(pin.mode())),
            Err(PinError::NotSupported)
        );
    }

    #[test]
    fn test_pulse_timeout_cancelled() {
        let shared = shared();
        let result = embassy_futures::block_on(shared.get_pulse_us(2, 5_000));
        assert_eq!(result, Err(PinError::Cancelled));

        // The capture lock was released
        shared.with_pin(2, |pin| {
            pin.disconnect();
            assert_eq!(pin.owner_kind(), None);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_pulse_measured_from_interrupt() {
        let shared = shared();
        shared
            .with_pin(3, |pin| {
                pin.set_pulse_polarity(Level::High);
                Ok(())
            })
            .unwrap();

        let edges = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            shared.with(|mux| mux.port_mut().drive(3, Some(true))).unwrap();
            shared.on_interrupt();
            thread::sleep(Duration::from_millis(5));
            shared.with(|mux| mux.port_mut().drive(3, Some(false))).unwrap();
            shared.on_interrupt();
        });

        let width = embassy_futures::block_on(shared.get_pulse_us(3, 2_000_000));
        edges.join().unwrap();

        let width = width.unwrap();
        assert!(width >= 4_000, "pulse of {width} us");
    }
}
