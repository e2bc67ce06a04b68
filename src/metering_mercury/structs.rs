use serde::{Deserialize, Serialize};

/* Session commands, first byte after the address */
pub const SESSION_TEST_LINK: u8 = 0x00;
pub const SESSION_OPEN: u8 = 0x01;
pub const SESSION_CLOSE: u8 = 0x02;

/* Auxiliary parameter selectors (BWRI) for instantaneous values */
pub const REQ_POWER: u8 = 0x00;
pub const REQ_VOLTAGE: u8 = 0x11;
pub const REQ_CURRENT: u8 = 0x21;

/* Energy is read per tariff, 1..=4 */
pub const ENERGY_TARIFF_FIRST: u8 = 0x01;
pub const ENERGY_TARIFF_LAST: u8 = 0x04;

pub const ACCESS_LEVEL_USER: u8 = 0x01;
pub const DEFAULT_PASSWORD: [u8; 6] = [0x01; 6];

pub const OPEN_FRAME_LENGTH: usize = 11;
pub const SESSION_FRAME_LENGTH: usize = 4;
pub const REQUEST_LENGTH: usize = 6;

pub const READY_RESPONSE_LENGTH: usize = 4;
pub const CV_RESPONSE_LENGTH: usize = 15;
pub const CV_RESPONSE_SHORT_LENGTH: usize = CV_RESPONSE_LENGTH - 3;
pub const E_RESPONSE_LENGTH: usize = 19;

/// Register range for accumulated energy since reset
pub const ENERGY_REGISTERS: (u8, u8) = (0x05, 0x00);
/// Register range for auxiliary parameters (voltage, current, power)
pub const AUX_REGISTERS: (u8, u8) = (0x08, 0x16);

pub const INVALID_VALUE: u16 = 0xFFFF;
pub const INVALID_ENERGY: u32 = 0xFFFF_FFFF;

/* Fixed point scaling of the raw register values */
pub const VOLTAGE_DIVISOR: f64 = 100.0;
pub const CURRENT_DIVISOR: f64 = 1000.0;
pub const ENERGY_DIVISOR: f64 = 1000.0;

/// Per phase values of one measurement channel
pub type PhaseValues = [u16; 3];

/// Result of a current values read. Only the channel that was requested is
/// filled, the other two hold `INVALID_VALUE` on every phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentValues {
    pub voltage: PhaseValues,
    pub current: PhaseValues,
    pub power: PhaseValues,
}

impl CurrentValues {
    pub fn invalid() -> Self {
        CurrentValues {
            voltage: [INVALID_VALUE; 3],
            current: [INVALID_VALUE; 3],
            power: [INVALID_VALUE; 3],
        }
    }

    pub fn is_invalid(&self) -> bool {
        *self == Self::invalid()
    }
}

impl Default for CurrentValues {
    fn default() -> Self {
        Self::invalid()
    }
}

/// Channel selected by an instantaneous values request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channel {
    Voltage,
    Current,
    Power,
}

impl Channel {
    pub fn from_command(cmd: u8) -> Option<Self> {
        match cmd {
            REQ_VOLTAGE => Some(Channel::Voltage),
            REQ_CURRENT => Some(Channel::Current),
            REQ_POWER => Some(Channel::Power),
            _ => None,
        }
    }

    pub fn command(&self) -> u8 {
        match self {
            Channel::Voltage => REQ_VOLTAGE,
            Channel::Current => REQ_CURRENT,
            Channel::Power => REQ_POWER,
        }
    }

    /// Expected response length and the offset of the first phase field
    pub fn response_layout(&self) -> (usize, usize) {
        match self {
            /* Power carries the sum over all phases first, skip it */
            Channel::Power => (CV_RESPONSE_LENGTH, 3),
            _ => (CV_RESPONSE_SHORT_LENGTH, 0),
        }
    }
}
