//! Simulated stage for tests
//!
//! The carriage has its own physical coordinate (in pulses) that the motor's
//! position estimate knows nothing about, so calibration can be exercised
//! from a wrong initial guess.

use std::string::{String, ToString};
use std::vec::Vec;

use crate::motion::{Direction, PulseTiming};
use crate::switch::Side;
use crate::traits::{Console, StageHardware};

pub struct SimRig {
    /// Physical carriage position in pulses
    pub carriage: i32,
    pub origin: Direction,
    pub direction: Direction,
    /// Left switch closes at or below this coordinate
    pub left_at: i32,
    /// Right switch closes at or above this coordinate
    pub right_at: i32,
    /// Pulses issued in total
    pub pulses: u32,
    /// Every direction write, in order
    pub direction_writes: Vec<Direction>,
    pub step_held_low: bool,
    /// Force the left switch closed regardless of position
    pub left_stuck: bool,
    /// Report a switch closed only while the pulse count equals this value
    pub spurious_press: Option<(Side, u32)>,
}

impl SimRig {
    pub fn new(carriage: i32, left_at: i32, right_at: i32) -> Self {
        Self {
            carriage,
            origin: Direction::CounterClockwise,
            direction: Direction::CounterClockwise,
            left_at,
            right_at,
            pulses: 0,
            direction_writes: Vec::new(),
            step_held_low: false,
            left_stuck: false,
            spurious_press: None,
        }
    }
}

impl StageHardware for SimRig {
    fn pulse(&mut self, timing: PulseTiming) {
        // Idle timing leaves the step output untouched, like the real driver
        if timing.is_idle() {
            return;
        }
        self.pulses += 1;
        self.step_held_low = false;
        if self.direction == self.origin {
            self.carriage -= 1;
        } else {
            self.carriage += 1;
        }
    }

    fn write_direction(&mut self, direction: Direction) {
        self.direction = direction;
        self.direction_writes.push(direction);
    }

    fn hold_step_low(&mut self) {
        self.step_held_low = true;
    }

    fn switch_pressed(&mut self, side: Side) -> bool {
        if self.spurious_press == Some((side, self.pulses)) {
            return true;
        }
        match side {
            Side::Left => self.left_stuck || self.carriage <= self.left_at,
            Side::Right => self.carriage >= self.right_at,
        }
    }

    fn take_edge_event(&mut self, side: Side) -> bool {
        self.switch_pressed(side)
    }
}

/// Console that records output and reports input after a number of polls
#[derive(Default)]
pub struct SimConsole {
    pub lines: Vec<String>,
    /// Report pending input once this many polls have happened
    pub input_after_polls: Option<u32>,
    pub polls: u32,
}

impl SimConsole {
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }
}

impl Console for SimConsole {
    fn write_line(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    fn input_pending(&mut self) -> bool {
        self.polls += 1;
        matches!(self.input_after_polls, Some(n) if self.polls > n)
    }
}
