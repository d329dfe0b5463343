//! Rotation direction

use core::ops::Not;

use crate::error::MotionError;

/// Motor rotation direction
///
/// The discriminants are the wire codes the host uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Counter-clockwise rotation (code 0)
    CounterClockwise = 0,
    /// Clockwise rotation (code 1)
    Clockwise = 1,
}

impl Direction {
    /// Decode a wire code; only 0 and 1 name a direction
    pub fn from_code(code: i32) -> Result<Self, MotionError> {
        match code {
            0 => Ok(Direction::CounterClockwise),
            1 => Ok(Direction::Clockwise),
            _ => Err(MotionError::InvalidDirection { code }),
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Get the opposite direction
    pub fn opposite(self) -> Self {
        match self {
            Direction::Clockwise => Direction::CounterClockwise,
            Direction::CounterClockwise => Direction::Clockwise,
        }
    }

    /// Level of the direction output (high = clockwise)
    pub fn pin_level(self) -> bool {
        self == Direction::Clockwise
    }
}

impl Not for Direction {
    type Output = Self;

    fn not(self) -> Self {
        self.opposite()
    }
}
