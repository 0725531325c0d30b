//! Notification delivery
//!
//! The core raises `(source, value, timestamp)` notifications. Queuing and
//! subscriber fan-out belong to the implementation of [`EventSink`].

/// Source id used for system-level notifications
pub const NOTIFY_SOURCE_ID: u16 = 1023;

/// Value raised on [`NOTIFY_SOURCE_ID`] to cancel a pending deep sleep
pub const POWER_EVT_CANCEL_DEEPSLEEP: u16 = 1;

/// A raised notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Notification {
    /// Component id of the raiser
    pub source: u16,
    /// Event value
    pub value: u16,
    /// Optional timestamp or duration payload (microseconds)
    pub timestamp: Option<u32>,
}

impl Notification {
    /// Notification without a timestamp payload
    pub const fn new(source: u16, value: u16) -> Self {
        Self {
            source,
            value,
            timestamp: None,
        }
    }

    /// Notification carrying a timestamp payload
    pub const fn with_timestamp(source: u16, value: u16, timestamp: u32) -> Self {
        Self {
            source,
            value,
            timestamp: Some(timestamp),
        }
    }
}

/// Receiver of notifications
///
/// Called from both foreground and interrupt context, so implementations
/// must not block.
pub trait EventSink {
    /// Deliver a notification
    fn raise(&mut self, notification: Notification);

    /// Whether a low-power transition is currently pending
    fn deep_sleep_pending(&self) -> bool {
        false
    }
}
