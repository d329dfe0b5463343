//! Limit switch edge task
//!
//! Waits for any edge on one switch input and latches it. The stepping
//! loop reads the latch on its next switch poll, so a press shorter than
//! one pulse period is still seen.

use defmt::*;
use embassy_rp::gpio::Input;

use forcestage_core::switch::{EdgeLatch, Side};

#[embassy_executor::task(pool_size = 2)]
pub async fn switch_edge_task(mut pin: Input<'static>, latch: &'static EdgeLatch, side: Side) {
    info!("Switch edge task started: {}", side);

    loop {
        pin.wait_for_any_edge().await;
        latch.set();
        trace!("{} switch edge, level high={}", side, pin.is_high());
    }
}
