//! Pin mode state machine
//!
//! Each pin is in exactly one exclusive mode at a time. Touch and edge
//! listeners are sub-states of digital input; persistent preferences sit
//! beside the mode and survive teardown.

pub mod events;
pub mod machine;

pub use events::{ButtonEvent, PinEvent};
pub use machine::{EdgeSense, InputMode, ModeRequest, PinMode, PinPrefs, PinStatus};
