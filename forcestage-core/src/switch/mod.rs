//! Limit switch monitoring
//!
//! Switches are polled between pulses. The polled level is authoritative;
//! the [`EdgeLatch`] set from the edge interrupt is only cross-checked
//! against it.

mod latch;

pub use forcestage_protocol::Side;
pub use latch::EdgeLatch;

use crate::config::SwitchSetup;
use crate::motion::mm_to_pulses;

/// One limit switch and what is known about it
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LimitSwitch {
    side: Side,
    /// Motor position (pulses) where the switch triggers
    position: i32,
    clearing_offset_mm: f32,
    flag: bool,
}

impl LimitSwitch {
    pub fn new(side: Side, setup: &SwitchSetup) -> Self {
        Self {
            side,
            position: mm_to_pulses(setup.position_mm),
            clearing_offset_mm: setup.clearing_offset_mm,
            flag: false,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn set_position(&mut self, position: i32) {
        self.position = position;
    }

    pub fn clearing_offset_mm(&self) -> f32 {
        self.clearing_offset_mm
    }

    /// Back-off distance in pulses
    pub fn clearing_pulses(&self) -> u32 {
        mm_to_pulses(self.clearing_offset_mm).unsigned_abs()
    }

    /// Whether the last sample saw the switch pressed
    pub fn is_flagged(&self) -> bool {
        self.flag
    }

    /// Store a sample; returns true on a new press
    pub fn record(&mut self, pressed: bool) -> bool {
        let newly_pressed = pressed && !self.flag;
        self.flag = pressed;
        newly_pressed
    }

    pub fn reset_flag(&mut self) {
        self.flag = false;
    }
}
