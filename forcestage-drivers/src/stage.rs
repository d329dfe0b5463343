//! GPIO stage hardware
//!
//! Bundles the pulse driver and both switch inputs into the
//! [`StageHardware`] the stepping loop runs against. Edge latches are
//! optional; boards without an edge interrupt leave them out and rely on
//! level polling alone.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use forcestage_core::motion::{Direction, PulseTiming};
use forcestage_core::switch::{EdgeLatch, Side};
use forcestage_core::traits::StageHardware;

use crate::stepper::PulseStepper;
use crate::switch::NcSwitch;

/// Step/direction outputs and the two limit switch inputs
pub struct GpioStage<STEP, DIR, D, L, R> {
    stepper: PulseStepper<STEP, DIR, D>,
    left: NcSwitch<L>,
    right: NcSwitch<R>,
    left_edge: Option<&'static EdgeLatch>,
    right_edge: Option<&'static EdgeLatch>,
}

impl<STEP, DIR, D, L, R> GpioStage<STEP, DIR, D, L, R>
where
    STEP: OutputPin,
    DIR: OutputPin,
    D: DelayNs,
    L: InputPin,
    R: InputPin,
{
    pub fn new(stepper: PulseStepper<STEP, DIR, D>, left: NcSwitch<L>, right: NcSwitch<R>) -> Self {
        Self {
            stepper,
            left,
            right,
            left_edge: None,
            right_edge: None,
        }
    }

    /// Attach the latches set by the edge interrupt
    pub fn with_edge_latches(
        mut self,
        left: &'static EdgeLatch,
        right: &'static EdgeLatch,
    ) -> Self {
        self.left_edge = Some(left);
        self.right_edge = Some(right);
        self
    }
}

impl<STEP, DIR, D, L, R> StageHardware for GpioStage<STEP, DIR, D, L, R>
where
    STEP: OutputPin,
    DIR: OutputPin,
    D: DelayNs,
    L: InputPin,
    R: InputPin,
{
    fn pulse(&mut self, timing: PulseTiming) {
        self.stepper.pulse(timing);
    }

    fn write_direction(&mut self, direction: Direction) {
        self.stepper.set_direction(direction);
    }

    fn hold_step_low(&mut self) {
        self.stepper.hold_low();
    }

    fn switch_pressed(&mut self, side: Side) -> bool {
        match side {
            Side::Left => self.left.is_pressed(),
            Side::Right => self.right.is_pressed(),
        }
    }

    fn take_edge_event(&mut self, side: Side) -> bool {
        let latch = match side {
            Side::Left => self.left_edge,
            Side::Right => self.right_edge,
        };
        latch.is_some_and(EdgeLatch::take)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;

    struct MockPin {
        high: bool,
    }

    impl embedded_hal::digital::ErrorType for MockPin {
        type Error = Infallible;
    }

    impl OutputPin for MockPin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.high = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.high = true;
            Ok(())
        }
    }

    impl InputPin for MockPin {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            Ok(self.high)
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            Ok(!self.high)
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    type TestStage = GpioStage<MockPin, MockPin, NoDelay, MockPin, MockPin>;

    fn stage(left_open: bool, right_open: bool) -> TestStage {
        GpioStage::new(
            PulseStepper::new(MockPin { high: false }, MockPin { high: false }, NoDelay),
            NcSwitch::new(MockPin { high: left_open }),
            NcSwitch::new(MockPin { high: right_open }),
        )
    }

    #[test]
    fn test_switch_sides() {
        let mut hw = stage(false, true);
        assert!(!hw.switch_pressed(Side::Left));
        assert!(hw.switch_pressed(Side::Right));
    }

    #[test]
    fn test_no_latches_means_no_edges() {
        let mut hw = stage(true, true);
        assert!(!hw.take_edge_event(Side::Left));
        assert!(!hw.take_edge_event(Side::Right));
    }

    #[test]
    fn test_edge_latch_is_consumed() {
        static LEFT: EdgeLatch = EdgeLatch::new();
        static RIGHT: EdgeLatch = EdgeLatch::new();
        let mut hw = stage(false, false).with_edge_latches(&LEFT, &RIGHT);

        RIGHT.set();
        assert!(!hw.take_edge_event(Side::Left));
        assert!(hw.take_edge_event(Side::Right));
        assert!(!hw.take_edge_event(Side::Right));
    }
}
