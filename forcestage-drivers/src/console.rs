//! Host console over a blocking UART

use forcestage_core::traits::Console;
use forcestage_hal::Uart;

/// Terminator appended to every console line
pub const LINE_END: &[u8] = b"\r\n";

/// [`Console`] backed by a UART
///
/// Also the byte source for the dispatcher, so the same link is both read
/// and peeked.
pub struct UartConsole<U> {
    uart: U,
}

impl<U: Uart> UartConsole<U> {
    pub fn new(uart: U) -> Self {
        Self { uart }
    }

    /// Block until the next request byte arrives
    pub fn read_byte(&mut self) -> Result<u8, <U as forcestage_hal::UartRx>::Error> {
        self.uart.read_byte()
    }
}

impl<U: Uart> Console for UartConsole<U> {
    fn write_line(&mut self, line: &str) {
        let written = self
            .uart
            .write_blocking(line.as_bytes())
            .and_then(|()| self.uart.write_blocking(LINE_END))
            .and_then(|()| self.uart.flush());
        if written.is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("console write failed");
        }
    }

    /// A failed poll reads as no input, so the move carries on
    fn input_pending(&mut self) -> bool {
        match self.uart.poll_readable() {
            Ok(ready) => ready,
            Err(_) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("console poll failed");
                false
            }
        }
    }
}
