//! Configuration types
//!
//! Board pin tables and touch calibration, stored as postcard binary data.

pub mod calibration;
pub mod types;

pub use calibration::*;
pub use types::*;
