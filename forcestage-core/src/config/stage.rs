//! Stage configuration types

use crate::motion::Direction;

/// Stepper motor setup
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorSetup {
    /// Direction of decreasing position
    pub origin_direction: Direction,
    /// Direction written to the driver at startup
    pub start_direction: Direction,
    /// Home position (mm)
    pub home_mm: f32,
    /// Lower travel bound (mm); may be negative to allow overshoot of the origin switch
    pub min_mm: f32,
    /// Upper travel bound guess (mm), refined by calibration
    pub max_mm: f32,
    /// Speed selected at startup (mm/s)
    pub start_speed: u16,
}

impl Default for MotorSetup {
    fn default() -> Self {
        Self {
            origin_direction: Direction::CounterClockwise,
            start_direction: Direction::CounterClockwise,
            home_mm: 100.0,
            min_mm: -6.0,
            max_mm: 1000.0,
            start_speed: 10,
        }
    }
}

/// Limit switch setup
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SwitchSetup {
    /// Where the switch is expected to trigger (mm), refined by calibration
    pub position_mm: f32,
    /// Distance to back off after the switch closes (mm)
    pub clearing_offset_mm: f32,
}

/// Speeds used while calibrating (mm/s)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationSpeeds {
    /// Final approach onto a switch
    pub press_speed: u16,
    /// Fast traverse before the final approach
    pub travel_speed: u16,
}

impl Default for CalibrationSpeeds {
    fn default() -> Self {
        Self {
            press_speed: 6,
            travel_speed: 10,
        }
    }
}

/// Complete stage configuration
///
/// The left switch bounds the origin end of the axis, the right switch the
/// far end.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StageConfig {
    pub motor: MotorSetup,
    pub left: SwitchSetup,
    pub right: SwitchSetup,
    pub calibration: CalibrationSpeeds,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            motor: MotorSetup::default(),
            left: SwitchSetup {
                position_mm: 0.0,
                clearing_offset_mm: 5.0,
            },
            right: SwitchSetup {
                position_mm: 1000.0,
                clearing_offset_mm: 5.0,
            },
            calibration: CalibrationSpeeds::default(),
        }
    }
}
