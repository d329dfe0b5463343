//! Request dispatch loop
//!
//! Reads the host link one byte at a time and hands each byte to the
//! [`Dispatcher`]. Requests run to completion on this loop; there is no
//! other mutator of the stage.

use defmt::*;

use forcestage_core::config::CalibrationSpeeds;
use forcestage_core::dispatch::Dispatcher;
use forcestage_core::stage::Stage;
use forcestage_core::traits::StageHardware;
use forcestage_drivers::UartConsole;
use forcestage_hal_rp2040::uart::RpUart;

pub fn run_dispatch_loop<H: StageHardware>(
    mut stage: Stage,
    mut hw: H,
    mut console: UartConsole<RpUart>,
    speeds: CalibrationSpeeds,
) -> ! {
    let mut dispatcher = Dispatcher::new(speeds);
    stage.sync_outputs(&mut hw);
    dispatcher.start(&mut console);
    info!("Dispatch loop started");

    loop {
        let byte = match console.read_byte() {
            Ok(byte) => byte,
            Err(e) => {
                warn!("Host link read error: {:?}", e);
                continue;
            }
        };

        match dispatcher.feed(byte, &mut stage, &mut hw, &mut console) {
            Some(Ok(Some(request))) => {
                debug!(
                    "Request done: {} position={}",
                    request,
                    stage.motor().position()
                );
            }
            Some(Err(e)) => warn!("Request failed: {}", e),
            Some(Ok(None)) | None => {}
        }
    }
}
