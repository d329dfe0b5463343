//! State shared between the edge tasks and the dispatch loop
//!
//! The dispatch loop never awaits, so the edge tasks hand over through
//! atomics instead of embassy-sync channels.

use forcestage_core::switch::EdgeLatch;

/// Edge seen on the origin-end switch
pub static LEFT_EDGE: EdgeLatch = EdgeLatch::new();

/// Edge seen on the far-end switch
pub static RIGHT_EDGE: EdgeLatch = EdgeLatch::new();
