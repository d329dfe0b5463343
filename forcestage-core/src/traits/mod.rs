//! Hardware abstraction traits
//!
//! These traits define the interface between the controller logic
//! and hardware-specific implementations.

pub mod console;
pub mod hardware;

pub use console::{Console, ConsoleExt};
pub use hardware::StageHardware;
