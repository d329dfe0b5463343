//! Normally-closed limit switch
//!
//! The contact ties the input to ground while released; the internal
//! pull-up takes it high when the switch opens. A broken wire therefore
//! reads as pressed.

use embedded_hal::digital::InputPin;

/// Limit switch wired normally closed
pub struct NcSwitch<I> {
    pin: I,
}

impl<I: InputPin> NcSwitch<I> {
    pub fn new(pin: I) -> Self {
        Self { pin }
    }

    /// Whether the switch is pressed; a failed read counts as pressed
    pub fn is_pressed(&mut self) -> bool {
        self.pin.is_high().unwrap_or(true)
    }
}
