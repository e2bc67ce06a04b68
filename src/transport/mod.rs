use std::io::{Read, Write};
#[cfg(feature = "serial")]
use std::time::Duration;
#[cfg(feature = "serial")]
use log::info;

#[cfg(feature = "serial")]
use crate::{config::SerialConfig, metering_mercury::MercuryError};

/// Blocking byte channel to the meter bus.
///
/// Reads are fixed length: `read` only returns once `buf` is completely filled
/// or the underlying channel failed.
pub trait Transport {
    fn write(&mut self, frame: &[u8]) -> std::io::Result<()>;
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<()>;
}

impl<T: Read + Write> Transport for T {
    fn write(&mut self, frame: &[u8]) -> std::io::Result<()> {
        self.write_all(frame)?;
        self.flush()
    }

    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<()> {
        self.read_exact(buf)
    }
}

#[cfg(feature = "serial")]
pub fn open_serial(config: &SerialConfig) -> Result<Box<dyn serialport::SerialPort>, MercuryError> {
    info!("Opening serial port {} with {} baud", config.port, config.baud_rate);

    let port = serialport::new(&config.port, config.baud_rate)
        .data_bits(serialport::DataBits::Eight)
        .parity(serialport::Parity::None)
        .stop_bits(serialport::StopBits::One)
        .timeout(Duration::from_millis(config.timeout_ms))
        .open()?;
    Ok(port)
}
