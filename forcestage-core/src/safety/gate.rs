//! Directional safety gate and travel limit check
//!
//! A direction is refused when the motor already sits at or past the bound
//! it would move toward. Moving back inside the bounds is always allowed.

use crate::error::MotionError;
use crate::motion::Direction;

/// Validate a requested direction against the travel bounds
pub fn check_direction(
    requested: Direction,
    origin: Direction,
    position: i32,
    min_steps: i32,
    max_steps: i32,
) -> Result<(), MotionError> {
    let toward_origin = requested == origin;
    if toward_origin && position <= min_steps {
        return Err(MotionError::UnsafeDirection {
            direction: requested,
            position,
            bound: min_steps,
        });
    }
    if !toward_origin && position >= max_steps {
        return Err(MotionError::UnsafeDirection {
            direction: requested,
            position,
            bound: max_steps,
        });
    }
    Ok(())
}

/// Fail if a position lies outside the travel bounds
pub fn check_travel(position: i32, min_steps: i32, max_steps: i32) -> Result<(), MotionError> {
    if position > max_steps {
        Err(MotionError::TravelLimitExceeded {
            position,
            bound: max_steps,
        })
    } else if position < min_steps {
        Err(MotionError::TravelLimitExceeded {
            position,
            bound: min_steps,
        })
    } else {
        Ok(())
    }
}
