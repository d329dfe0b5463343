//! Stepper motor state
//!
//! Tracks position in pulses relative to the origin switch, the travel
//! bounds, the selected direction and the pulse timing. The struct holds no
//! pins; the [`Stage`](crate::stage::Stage) pairs it with hardware.

use crate::config::MotorSetup;
use crate::error::MotionError;
use crate::safety;

use super::direction::Direction;
use super::timing::PulseTiming;
use super::units::mm_to_pulses;

/// Stepper motor position, bounds and timing
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepperMotor {
    origin_direction: Direction,
    direction: Direction,
    position: i32,
    home_position: i32,
    min_steps: i32,
    max_steps: i32,
    speed: u16,
    timing: PulseTiming,
}

impl StepperMotor {
    /// Create a motor from its setup
    ///
    /// Position starts at the upper bound guess so that the first move
    /// toward the origin is always permitted before calibration. Until a
    /// calibration moves the estimate, every move away from the origin is
    /// refused as unsafe.
    pub fn new(setup: &MotorSetup) -> Result<Self, MotionError> {
        let max_steps = mm_to_pulses(setup.max_mm);
        Ok(Self {
            origin_direction: setup.origin_direction,
            direction: setup.start_direction,
            position: max_steps,
            home_position: mm_to_pulses(setup.home_mm),
            min_steps: mm_to_pulses(setup.min_mm),
            max_steps,
            speed: setup.start_speed,
            timing: PulseTiming::for_speed(setup.start_speed)?,
        })
    }

    pub fn origin_direction(&self) -> Direction {
        self.origin_direction
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn home_position(&self) -> i32 {
        self.home_position
    }

    pub fn min_steps(&self) -> i32 {
        self.min_steps
    }

    pub fn max_steps(&self) -> i32 {
        self.max_steps
    }

    pub fn speed(&self) -> u16 {
        self.speed
    }

    pub fn timing(&self) -> PulseTiming {
        self.timing
    }

    /// Direction of increasing position
    pub fn positive_direction(&self) -> Direction {
        !self.origin_direction
    }

    /// Select a speed from the duty table
    ///
    /// On failure the previous speed and timing are kept.
    pub fn set_speed(&mut self, speed: u16) -> Result<PulseTiming, MotionError> {
        let timing = PulseTiming::for_speed(speed)?;
        self.speed = speed;
        self.timing = timing;
        Ok(timing)
    }

    /// Accept a direction if the safety gate allows it
    ///
    /// On failure the previous direction is kept.
    pub fn set_direction(&mut self, direction: Direction) -> Result<(), MotionError> {
        safety::check_direction(
            direction,
            self.origin_direction,
            self.position,
            self.min_steps,
            self.max_steps,
        )?;
        self.direction = direction;
        Ok(())
    }

    /// Account for one completed pulse
    pub fn advance(&mut self) -> i32 {
        if self.direction == self.origin_direction {
            self.position -= 1;
        } else {
            self.position += 1;
        }
        self.position
    }

    /// Check the position against both travel bounds
    pub fn check_travel(&self) -> Result<(), MotionError> {
        safety::check_travel(self.position, self.min_steps, self.max_steps)
    }

    /// Redefine the current position (origin switch calibration)
    pub fn set_position(&mut self, position: i32) {
        self.position = position;
    }

    /// Replace the upper travel bound (far switch calibration)
    pub fn set_max_steps(&mut self, max_steps: i32) {
        self.max_steps = max_steps;
    }
}
