//! Controller error types
//!
//! Every error carries enough context (position, bound, switch) to be
//! reported to the host on its own. Errors fall into three classes, which
//! name the error in the reply's traceback block.

use core::fmt;

use forcestage_protocol::Side;

use crate::motion::Direction;

/// Reporting class of an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorClass {
    /// Bad parameter (direction code, speed, timing)
    Configuration,
    /// A move would break a travel bound
    Safety,
    /// Hardware did not behave as expected
    Device,
}

impl ErrorClass {
    pub fn name(self) -> &'static str {
        match self {
            ErrorClass::Configuration => "ConfigurationError",
            ErrorClass::Safety => "SafetyViolation",
            ErrorClass::Device => "DeviceError",
        }
    }
}

/// Errors raised by motion, safety and calibration logic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionError {
    /// Direction code other than 0 or 1
    InvalidDirection { code: i32 },
    /// Speed missing from the duty table
    UnsupportedSpeed { speed: u16 },
    /// High phase longer than the low phase
    DutyCycleViolation { speed: u16, on_ns: u32, off_ns: u32 },
    /// Low phase shorter than the driver minimum
    MinOffTimeViolation { speed: u16, off_ns: u32 },
    /// Direction would move further past a travel bound
    UnsafeDirection {
        direction: Direction,
        position: i32,
        bound: i32,
    },
    /// A pulse left the motor outside its travel bounds
    TravelLimitExceeded { position: i32, bound: i32 },
    /// Switch still pressed after moving clear of it
    SwitchStillPressed { side: Side, position: i32 },
    /// Calibration ran its whole budget without the switch closing
    LimitSwitchNotFound { side: Side, position: i32 },
    /// A second switch trip while homing
    RepeatedSwitchTrigger { side: Side, position: i32 },
    /// Host input arrived during a calibration pass
    CalibrationAborted { side: Side, position: i32 },
}

impl MotionError {
    pub fn class(&self) -> ErrorClass {
        match self {
            MotionError::InvalidDirection { .. }
            | MotionError::UnsupportedSpeed { .. }
            | MotionError::DutyCycleViolation { .. }
            | MotionError::MinOffTimeViolation { .. } => ErrorClass::Configuration,
            MotionError::UnsafeDirection { .. } | MotionError::TravelLimitExceeded { .. } => {
                ErrorClass::Safety
            }
            MotionError::SwitchStillPressed { .. }
            | MotionError::LimitSwitchNotFound { .. }
            | MotionError::RepeatedSwitchTrigger { .. }
            | MotionError::CalibrationAborted { .. } => ErrorClass::Device,
        }
    }
}

impl fmt::Display for MotionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MotionError::InvalidDirection { code } => {
                write!(f, "direction code {} is not 0 or 1", code)
            }
            MotionError::UnsupportedSpeed { speed } => {
                write!(f, "speed {} mm/s has no duty cycle entry", speed)
            }
            MotionError::DutyCycleViolation {
                speed,
                on_ns,
                off_ns,
            } => write!(
                f,
                "speed {} mm/s: pulse high {} ns exceeds low {} ns",
                speed, on_ns, off_ns
            ),
            MotionError::MinOffTimeViolation { speed, off_ns } => write!(
                f,
                "speed {} mm/s: pulse low {} ns is below the driver minimum",
                speed, off_ns
            ),
            MotionError::UnsafeDirection {
                direction,
                position,
                bound,
            } => write!(
                f,
                "direction {} refused at position {} (bound {})",
                direction.code(),
                position,
                bound
            ),
            MotionError::TravelLimitExceeded { position, bound } => write!(
                f,
                "travel limit exceeded at position {} (bound {})",
                position, bound
            ),
            MotionError::SwitchStillPressed { side, position } => write!(
                f,
                "{} side switch still pressed at position {}",
                side, position
            ),
            MotionError::LimitSwitchNotFound { side, position } => write!(
                f,
                "{} side limit switch not hit (stopped at position {})",
                side, position
            ),
            MotionError::RepeatedSwitchTrigger { side, position } => write!(
                f,
                "{} side switch pressed again while homing at position {}",
                side, position
            ),
            MotionError::CalibrationAborted { side, position } => write!(
                f,
                "calibration of {} side switch interrupted at position {}",
                side, position
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classes() {
        assert_eq!(
            MotionError::UnsupportedSpeed { speed: 3 }.class(),
            ErrorClass::Configuration
        );
        assert_eq!(
            MotionError::TravelLimitExceeded {
                position: 81,
                bound: 80
            }
            .class(),
            ErrorClass::Safety
        );
        assert_eq!(
            MotionError::SwitchStillPressed {
                side: Side::Left,
                position: 0
            }
            .class(),
            ErrorClass::Device
        );
    }

    #[test]
    fn test_message_names_position_and_bound() {
        let msg = MotionError::TravelLimitExceeded {
            position: -481,
            bound: -480,
        }
        .to_string();
        assert!(msg.contains("-481"));
        assert!(msg.contains("-480"));
    }
}
