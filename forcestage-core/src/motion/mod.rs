//! Motion primitives
//!
//! - [`units`]: millimetre / pulse conversion for the leadscrew
//! - [`timing`]: duty table and pulse on/off times per speed
//! - [`direction`]: rotation direction
//! - [`motor`]: the stepper motor's position and travel bounds

pub mod direction;
pub mod motor;
pub mod timing;
pub mod units;

pub use direction::Direction;
pub use motor::StepperMotor;
pub use timing::{PulseTiming, DUTY_TABLE, MIN_OFF_TIME_NS};
pub use units::{mm_to_pulses, pulses_to_mm, PULSES_PER_MM, TRACE_INTERVAL_PULSES};
