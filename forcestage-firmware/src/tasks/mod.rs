//! Firmware tasks
//!
//! The switch edge task runs on the interrupt executor; the dispatch loop
//! owns thread mode.

pub mod dispatch;
pub mod switch_edge;

pub use dispatch::run_dispatch_loop;
pub use switch_edge::switch_edge_task;
