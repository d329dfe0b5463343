//! Step/direction pulse driver
//!
//! Bit-bangs one step pulse at a time on a plain GPIO. The driver board
//! advances one microstep per rising edge and samples the direction input
//! on that edge, so direction changes must happen between pulses.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use forcestage_core::motion::{Direction, PulseTiming};

/// Step and direction outputs plus a blocking delay
pub struct PulseStepper<STEP, DIR, D> {
    step: STEP,
    dir: DIR,
    delay: D,
}

impl<STEP, DIR, D> PulseStepper<STEP, DIR, D>
where
    STEP: OutputPin,
    DIR: OutputPin,
    D: DelayNs,
{
    /// Create the driver with the step output held low
    pub fn new(step: STEP, dir: DIR, delay: D) -> Self {
        let mut stepper = Self { step, dir, delay };
        stepper.hold_low();
        stepper
    }

    /// Emit one pulse: high for `on_ns`, then low for `off_ns`
    pub fn pulse(&mut self, timing: PulseTiming) {
        if timing.is_idle() {
            return;
        }
        // GPIO writes on the targets we support cannot fail
        let _ = self.step.set_high();
        self.delay.delay_ns(timing.on_ns);
        let _ = self.step.set_low();
        self.delay.delay_ns(timing.off_ns);
    }

    pub fn set_direction(&mut self, direction: Direction) {
        let _ = if direction.pin_level() {
            self.dir.set_high()
        } else {
            self.dir.set_low()
        };
    }

    pub fn hold_low(&mut self) {
        let _ = self.step.set_low();
    }
}
