//! Leadscrew unit conversion
//!
//! The driver runs the motor in half steps, and the leadscrew advances
//! 1 mm every 40 full steps, so one millimetre is 80 step pulses.

/// Full steps per millimetre of carriage travel
pub const FULL_STEPS_PER_MM: i32 = 40;

/// Microsteps (pulses) per full step
pub const MICROSTEPS_PER_FULL_STEP: i32 = 2;

/// Full steps per motor revolution
pub const FULL_STEPS_PER_MOTOR_REV: i32 = 200;

/// Step pulses per millimetre of carriage travel
pub const PULSES_PER_MM: i32 = FULL_STEPS_PER_MM * MICROSTEPS_PER_FULL_STEP;

/// Pulses between position reports when tracing a move (0.1 mm)
pub const TRACE_INTERVAL_PULSES: u32 = (PULSES_PER_MM / 10) as u32;

/// Convert a distance to the nearest whole pulse count
pub fn mm_to_pulses(mm: f32) -> i32 {
    let pulses = mm * PULSES_PER_MM as f32;
    // Round half away from zero; `as` alone would truncate
    if pulses >= 0.0 {
        (pulses + 0.5) as i32
    } else {
        (pulses - 0.5) as i32
    }
}

/// Convert a pulse count to millimetres
pub fn pulses_to_mm(pulses: i32) -> f32 {
    pulses as f32 / PULSES_PER_MM as f32
}
