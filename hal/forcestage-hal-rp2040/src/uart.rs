//! Blocking host link over the RP2040 buffered UART
//!
//! The interrupt-driven ring buffers keep receiving while the stepping
//! loop is busy, so a request sent mid-move is seen by
//! [`poll_readable`](forcestage_hal::UartRx::poll_readable) and is still
//! there when the dispatcher reads it.

use embassy_rp::uart::{self, BufferedUart};
use embedded_io::{Read, ReadReady, Write};
use forcestage_hal::uart::{DataBits, Parity, StopBits};
use forcestage_hal::{UartConfig, UartRx, UartTx};

/// Convert the shared configuration into the embassy-rp one
pub fn to_rp_config(config: &UartConfig) -> uart::Config {
    let mut cfg = uart::Config::default();
    cfg.baudrate = config.baudrate;
    cfg.data_bits = match config.data_bits {
        DataBits::Seven => uart::DataBits::DataBits7,
        DataBits::Eight => uart::DataBits::DataBits8,
    };
    cfg.parity = match config.parity {
        Parity::None => uart::Parity::ParityNone,
        Parity::Even => uart::Parity::ParityEven,
        Parity::Odd => uart::Parity::ParityOdd,
    };
    cfg.stop_bits = match config.stop_bits {
        StopBits::One => uart::StopBits::STOP1,
        StopBits::Two => uart::StopBits::STOP2,
    };
    cfg
}

/// Host link UART
pub struct RpUart {
    inner: BufferedUart,
}

impl RpUart {
    pub fn new(inner: BufferedUart) -> Self {
        Self { inner }
    }
}

impl UartTx for RpUart {
    type Error = uart::Error;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.inner.write_all(data)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Write::flush(&mut self.inner)
    }
}

impl UartRx for RpUart {
    type Error = uart::Error;

    fn read_blocking(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.inner.read(buf)
    }

    fn poll_readable(&mut self) -> Result<bool, Self::Error> {
        self.inner.read_ready()
    }
}
