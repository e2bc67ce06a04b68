use log::{debug, warn};
use thiserror::Error;

use crate::{config::MeterModel, transport::Transport};
use structs::*;

pub mod structs;
pub mod utils;

/// Problems with a response that arrived completely
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResponseError {
    #[error("CRC mismatch: computed 0x{computed:04X}, received 0x{received:04X}")]
    ChecksumMismatch { computed: u16, received: u16 },
    #[error("Meter reported status 0x{0:02X}")]
    DeviceStatus(u8),
    #[error("Response too short: expected {expected} bytes, got {received}")]
    TooShort { expected: usize, received: usize },
}

#[derive(Error, Debug)]
pub enum MercuryError {
    #[error("Transport failure: {0}")]
    Transport(#[from] std::io::Error),
    #[cfg(feature = "serial")]
    #[error("Serial port: {0}")]
    Serial(#[from] serialport::Error),
}

/// Driver surface of a meter on the bus.
///
/// Every call is a single request or a single response step, the sequence
/// (open, request, read, close) is up to the caller. Bad responses are not
/// errors here: they yield `false` or the sentinel values, only a failing
/// transport is reported as `Err`.
pub trait MeterDevice: Send {
    fn start_stop_session(&mut self, address: u8, cmd: u8) -> Result<(), MercuryError>;
    fn check_ready(&mut self) -> Result<bool, MercuryError>;
    fn request_measure(&mut self, address: u8, cmd: u8) -> Result<(), MercuryError>;
    fn read_current_values(&mut self, cmd: u8) -> Result<CurrentValues, MercuryError>;
    fn read_energy(&mut self, cmd: u8) -> Result<u32, MercuryError>;
}

pub struct Mercury230<T: Transport> {
    transport: T,
}

impl<T: Transport> Mercury230<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    fn send(&mut self, frame: &[u8]) -> Result<(), MercuryError> {
        self.transport.write(frame)?;
        debug!("Mercury sent: {}", hex::encode(frame));
        Ok(())
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<(), MercuryError> {
        self.transport.read(buf)?;
        debug!("Mercury received: {}", hex::encode(&buf[..]));
        Ok(())
    }

    /* After a bad frame another one is usually still on the line, throw it away */
    fn drain(&mut self, length: usize) {
        let mut scratch = [0u8; E_RESPONSE_LENGTH];
        let len = length.min(scratch.len());
        match self.transport.read(&mut scratch[..len]) {
            Ok(_) => debug!("Drained: {}", hex::encode(&scratch[..len])),
            Err(e) => debug!("Nothing to drain: {e}"),
        }
    }
}

impl<T: Transport + Send> MeterDevice for Mercury230<T> {
    fn start_stop_session(&mut self, address: u8, cmd: u8) -> Result<(), MercuryError> {
        if cmd == SESSION_OPEN {
            let frame = utils::build_open_session(address);
            self.send(&frame)
        } else {
            let frame = utils::build_session_command(address, cmd);
            self.send(&frame)
        }
    }

    fn check_ready(&mut self) -> Result<bool, MercuryError> {
        let mut response = [0u8; READY_RESPONSE_LENGTH];
        self.receive(&mut response)?;

        match utils::parse_ready(&response) {
            Ok(()) => Ok(true),
            Err(e) => {
                warn!("Invalid response: {e}");
                self.drain(READY_RESPONSE_LENGTH);
                Ok(false)
            }
        }
    }

    fn request_measure(&mut self, address: u8, cmd: u8) -> Result<(), MercuryError> {
        let frame = utils::build_measure_request(address, cmd);
        self.send(&frame)
    }

    fn read_current_values(&mut self, cmd: u8) -> Result<CurrentValues, MercuryError> {
        let length = match Channel::from_command(cmd) {
            Some(channel) => channel.response_layout().0,
            None => CV_RESPONSE_SHORT_LENGTH,
        };

        let mut response = [0u8; CV_RESPONSE_LENGTH];
        self.receive(&mut response[..length])?;

        match utils::parse_current_values(cmd, &response[..length]) {
            Ok(values) => Ok(values),
            Err(e) => {
                warn!("Invalid response: {e}");
                self.drain(length);
                Ok(CurrentValues::invalid())
            }
        }
    }

    fn read_energy(&mut self, _cmd: u8) -> Result<u32, MercuryError> {
        let mut response = [0u8; E_RESPONSE_LENGTH];
        self.receive(&mut response)?;

        match utils::parse_energy(&response) {
            Ok(energy) => {
                debug!("Result: {energy}");
                Ok(energy)
            }
            Err(e) => {
                warn!("Invalid response: {e}");
                self.drain(E_RESPONSE_LENGTH);
                Ok(INVALID_ENERGY)
            }
        }
    }
}

/// Creates the driver for the configured meter model on the given bus
pub fn create_device<'a, T: Transport + Send + 'a>(model: &MeterModel, transport: T) -> Box<dyn MeterDevice + 'a> {
    match model {
        MeterModel::Mercury230 => Box::new(Mercury230::new(transport)),
    }
}
