//! Safety logic
//!
//! Guards that keep the carriage inside its travel bounds.

pub mod gate;

pub use gate::{check_direction, check_travel};
