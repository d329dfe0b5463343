//! Configuration types
//!
//! Stage geometry and calibration defaults. The firmware compiles these in;
//! the values are in millimetres and converted to pulses when the
//! [`Stage`](crate::stage::Stage) is built.

pub mod stage;

pub use stage::*;
