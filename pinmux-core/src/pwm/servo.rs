//! Servo angle and pulse width scaling

use crate::config::{MAX_SERVO_ANGLE, SERVO_PERIOD_US};
use crate::error::{PinError, Result};

/// Resolution of the level conversion: one period spans this many steps
const LEVEL_STEPS: u64 = 1024;

/// Pulse width for a servo angle
///
/// `range_us` is the span covered by 0°..180° and `center_us` the pulse at
/// 90°. Angles above 180 are clipped. Fails with `InvalidParameter` if the
/// range or center is zero, or if the range extends below 0 µs.
pub fn servo_pulse_us(angle: u16, range_us: u32, center_us: u32) -> Result<u32> {
    if range_us < 1 || center_us < 1 {
        return Err(PinError::InvalidParameter);
    }

    let angle = angle.min(MAX_SERVO_ANGLE) as i64;
    let lower = (center_us as i64 - (range_us / 2) as i64) * 1000;
    let scaled = lower + range_us as i64 * (angle * 1000 / MAX_SERVO_ANGLE as i64);

    u32::try_from(scaled / 1000).map_err(|_| PinError::InvalidParameter)
}

/// Analog level producing a pulse of `pulse_us` in a 20 ms period
///
/// The result may exceed the highest analog level for pulses close to the
/// whole period; callers range-check it like any other level.
pub fn pulse_to_level(pulse_us: u32) -> u32 {
    (pulse_us as u64 * LEVEL_STEPS / SERVO_PERIOD_US as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_SERVO_CENTER_US, DEFAULT_SERVO_RANGE_US};

    #[test]
    fn test_default_span() {
        let pulse = |angle| servo_pulse_us(angle, DEFAULT_SERVO_RANGE_US, DEFAULT_SERVO_CENTER_US);
        assert_eq!(pulse(0), Ok(500));
        assert_eq!(pulse(90), Ok(1500));
        assert_eq!(pulse(180), Ok(2500));
        // Clipped
        assert_eq!(pulse(400), Ok(2500));
    }

    #[test]
    fn test_rejects_bad_geometry() {
        assert_eq!(servo_pulse_us(0, 0, 1500), Err(PinError::InvalidParameter));
        assert_eq!(servo_pulse_us(0, 2000, 0), Err(PinError::InvalidParameter));
        // Lower bound would be negative
        assert_eq!(servo_pulse_us(0, 4000, 1000), Err(PinError::InvalidParameter));
    }

    #[test]
    fn test_pulse_to_level() {
        assert_eq!(pulse_to_level(0), 0);
        assert_eq!(pulse_to_level(1500), 76);
        assert_eq!(pulse_to_level(2500), 128);
        assert_eq!(pulse_to_level(SERVO_PERIOD_US), 1024);
    }
}
