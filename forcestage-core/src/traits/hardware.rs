//! Stage hardware trait
//!
//! Abstracts the step/direction outputs and the two limit switch inputs so
//! the motion logic can run against real pins or a simulation.

use crate::motion::{Direction, PulseTiming};
use crate::switch::Side;

/// Pins driven and sampled by the stepping loop
pub trait StageHardware {
    /// Emit one step pulse
    ///
    /// Drives the step output high for `timing.on_ns`, then low for
    /// `timing.off_ns`, blocking for the whole period.
    fn pulse(&mut self, timing: PulseTiming);

    /// Write the direction output
    fn write_direction(&mut self, direction: Direction);

    /// Hold the step output low without pulsing
    fn hold_step_low(&mut self);

    /// Sample a limit switch; true when pressed
    fn switch_pressed(&mut self, side: Side) -> bool;

    /// Read and clear the edge latch for a switch
    ///
    /// Implementations without an edge interrupt return false.
    fn take_edge_event(&mut self, _side: Side) -> bool {
        false
    }
}
