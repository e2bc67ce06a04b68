use log::debug;

use crate::checksum;
use super::structs::*;
use super::ResponseError;

pub fn build_open_session(address: u8) -> [u8; OPEN_FRAME_LENGTH] {
    let mut frame = [0u8; OPEN_FRAME_LENGTH];
    frame[0] = address;
    frame[1] = SESSION_OPEN;
    frame[2] = ACCESS_LEVEL_USER;
    frame[3..9].copy_from_slice(&DEFAULT_PASSWORD);
    checksum::append(&mut frame);
    frame
}

pub fn build_session_command(address: u8, cmd: u8) -> [u8; SESSION_FRAME_LENGTH] {
    let mut frame = [0u8; SESSION_FRAME_LENGTH];
    frame[0] = address;
    frame[1] = cmd;
    checksum::append(&mut frame);
    frame
}

/// Register range the request has to address for the given command
pub fn request_registers(cmd: u8) -> (u8, u8) {
    if cmd > 0x00 && cmd < 0x05 {
        ENERGY_REGISTERS
    } else {
        AUX_REGISTERS
    }
}

pub fn build_measure_request(address: u8, cmd: u8) -> [u8; REQUEST_LENGTH] {
    let (hi, lo) = request_registers(cmd);
    let mut frame = [0u8; REQUEST_LENGTH];
    frame[0] = address;
    frame[1] = hi;
    frame[2] = lo;
    frame[3] = cmd;
    checksum::append(&mut frame);
    frame
}

fn check_frame(response: &[u8], length: usize) -> Result<(), ResponseError> {
    if response.len() < length {
        return Err(ResponseError::TooShort { expected: length, received: response.len() });
    }

    let frame = &response[..length];
    let computed = checksum::compute(&frame[..length - checksum::CRC_LEN]);
    let received = checksum::trailer(frame);
    debug!("Real CRC: {}", hex::encode(computed.to_le_bytes()));

    if computed != received {
        return Err(ResponseError::ChecksumMismatch { computed, received });
    }
    Ok(())
}

pub fn parse_ready(response: &[u8]) -> Result<(), ResponseError> {
    check_frame(response, READY_RESPONSE_LENGTH)?;
    match response[1] {
        0 => Ok(()),
        status => Err(ResponseError::DeviceStatus(status)),
    }
}

/// Three byte field as the meter sends it: most significant byte, least
/// significant byte, middle byte. `k` is the offset behind the address byte.
pub fn decode_triplet(response: &[u8], k: usize, high_mask: u8) -> u32 {
    let b0 = (response[k + 1] & high_mask) as u32;
    let b1 = response[k + 2] as u32;
    let b2 = response[k + 3] as u32;
    b0 * 0x10000 + b2 * 0x100 + b1
}

pub fn parse_current_values(cmd: u8, response: &[u8]) -> Result<CurrentValues, ResponseError> {
    let channel = Channel::from_command(cmd);
    let (length, shift) = channel
        .map(|c| c.response_layout())
        .unwrap_or((CV_RESPONSE_SHORT_LENGTH, 0));

    check_frame(response, length)?;

    let mut result = CurrentValues::invalid();
    let Some(channel) = channel else {
        debug!("Command 0x{:02X} is not a current values selector", cmd);
        return Ok(result);
    };

    for i in 0..3 {
        let k = i * 3 + shift;
        match channel {
            Channel::Voltage => {
                result.voltage[i] = narrow(decode_triplet(response, k, 0xFF));
            }
            Channel::Current => {
                result.current[i] = narrow(decode_triplet(response, k, 0xFF));
            }
            Channel::Power => {
                /* upper nibble holds the direction bits */
                let power = decode_triplet(response, k, 0x0F);
                debug!("power {}", power);
                result.power[i] = narrow(power / 100);
            }
        }
    }

    Ok(result)
}

fn narrow(value: u32) -> u16 {
    match u16::try_from(value) {
        Ok(v) if v != INVALID_VALUE => v,
        _ => {
            debug!("Value {} does not fit a phase slot", value);
            INVALID_VALUE
        }
    }
}

/// Energy counters are sent as two 16 bit words, high word first, each word
/// little endian.
pub fn decode_energy(response: &[u8]) -> u32 {
    (response[2] as u32) * 0x1000000
        + (response[1] as u32) * 0x10000
        + (response[4] as u32) * 0x100
        + response[3] as u32
}

pub fn parse_energy(response: &[u8]) -> Result<u32, ResponseError> {
    check_frame(response, E_RESPONSE_LENGTH)?;
    Ok(decode_energy(response))
}

#[cfg(test)]
pub(crate) fn with_crc(payload: &[u8]) -> Vec<u8> {
    let mut frame = payload.to_vec();
    frame.extend_from_slice(&checksum::compute(payload).to_le_bytes());
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_session_frame() {
        let frame = build_open_session(0x2A);
        assert_eq!(frame.len(), 11);
        assert_eq!(&frame[..9], &[0x2A, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01]);
        assert_eq!(checksum::compute(&frame[..9]).to_le_bytes(), [frame[9], frame[10]]);
        assert_eq!(&frame[9..], &[0x90, 0xE0]);
    }

    #[test]
    fn test_session_command_frame() {
        assert_eq!(build_session_command(0x2A, SESSION_CLOSE), [0x2A, 0x02, 0x9F, 0x11]);
        assert_eq!(build_session_command(0x2A, SESSION_TEST_LINK), [0x2A, 0x00, 0x1E, 0xD0]);
    }

    #[test]
    fn test_request_register_selection() {
        assert_eq!(request_registers(2), (0x05, 0x00));
        assert_eq!(request_registers(9), (0x08, 0x16));
        assert_eq!(request_registers(0), (0x08, 0x16));
        assert_eq!(request_registers(4), (0x05, 0x00));
        assert_eq!(request_registers(5), (0x08, 0x16));

        assert_eq!(build_measure_request(0x2A, 2), [0x2A, 0x05, 0x00, 0x02, 0x99, 0xFC]);
        assert_eq!(build_measure_request(0x2A, 9), [0x2A, 0x08, 0x16, 0x09, 0x47, 0x98]);
        assert_eq!(build_measure_request(0x2A, REQ_POWER), [0x2A, 0x08, 0x16, 0x00, 0x87, 0x9E]);
    }

    #[test]
    fn test_parse_ready() {
        assert!(parse_ready(&with_crc(&[0x2A, 0x00])).is_ok());

        match parse_ready(&with_crc(&[0x2A, 0x05])) {
            Err(ResponseError::DeviceStatus(5)) => {}
            other => panic!("unexpected result {:?}", other),
        }

        let mut frame = with_crc(&[0x2A, 0x00]);
        frame[3] ^= 0x80;
        assert!(matches!(parse_ready(&frame), Err(ResponseError::ChecksumMismatch { .. })));
    }

    #[test]
    fn test_decode_triplet_byte_order() {
        let response = [0x2A, 0x01, 0x02, 0x03];
        assert_eq!(decode_triplet(&response, 0, 0xFF), 0x010302);
        let response = [0x2A, 0xC1, 0x02, 0x03];
        assert_eq!(decode_triplet(&response, 0, 0x0F), 0x010302);
    }

    #[test]
    fn test_parse_voltage() {
        /* 230.10 V, 229.85 V, 231.00 V */
        let frame = with_crc(&[0x2A, 0x00, 0xE2, 0x59, 0x00, 0xC9, 0x59, 0x00, 0x3C, 0x5A]);
        assert_eq!(frame.len(), 12);

        let cv = parse_current_values(REQ_VOLTAGE, &frame).unwrap();
        assert_eq!(cv.voltage, [23010, 22985, 23100]);
        assert_eq!(cv.current, [INVALID_VALUE; 3]);
        assert_eq!(cv.power, [INVALID_VALUE; 3]);
    }

    #[test]
    fn test_parse_current() {
        let frame = with_crc(&[0x2A, 0x00, 0x10, 0x27, 0x00, 0x00, 0x00, 0x00, 0xE8, 0x03]);
        let cv = parse_current_values(REQ_CURRENT, &frame).unwrap();
        assert_eq!(cv.current, [0x2710, 0, 0x03E8]);
        assert_eq!(cv.voltage, [INVALID_VALUE; 3]);
    }

    #[test]
    fn test_parse_power() {
        let payload = [
            0x2A,
            0x40, 0x00, 0x00, /* sum, skipped */
            0x41, 0x34, 0x12, /* 0x011234 with direction bit */
            0x00, 0x10, 0x27, /* 10000 */
            0x80, 0x00, 0x00, /* zero with direction bit */
        ];
        let frame = with_crc(&payload);
        assert_eq!(frame.len(), 15);

        let cv = parse_current_values(REQ_POWER, &frame).unwrap();
        assert_eq!(cv.power, [(0x011234 / 100) as u16, 100, 0]);
        assert_eq!(cv.voltage, [INVALID_VALUE; 3]);
        assert_eq!(cv.current, [INVALID_VALUE; 3]);
    }

    #[test]
    fn test_parse_current_values_checksum_mismatch() {
        let mut frame = with_crc(&[0x2A, 0x00, 0xE2, 0x59, 0x00, 0xC9, 0x59, 0x00, 0x3C, 0x5A]);
        frame[10] ^= 0x01;
        assert!(matches!(
            parse_current_values(REQ_VOLTAGE, &frame),
            Err(ResponseError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_parse_current_values_too_short() {
        let frame = with_crc(&[0x2A, 0x00, 0xE2, 0x59, 0x00, 0xC9, 0x59, 0x00, 0x3C, 0x5A]);
        assert!(matches!(
            parse_current_values(REQ_POWER, &frame),
            Err(ResponseError::TooShort { expected: 15, received: 12 })
        ));
    }

    #[test]
    fn test_parse_unknown_selector_keeps_sentinels() {
        let frame = with_crc(&[0x2A, 0, 0, 1, 0, 0, 2, 0, 0, 3]);
        let cv = parse_current_values(0x42, &frame).unwrap();
        assert!(cv.is_invalid());
    }

    #[test]
    fn test_out_of_range_value_is_invalid() {
        let frame = with_crc(&[0x2A, 0x01, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0x00, 0x01, 0x00]);
        let cv = parse_current_values(REQ_CURRENT, &frame).unwrap();
        assert_eq!(cv.current, [INVALID_VALUE, INVALID_VALUE, 1]);
    }

    #[test]
    fn test_parse_energy() {
        let mut payload = vec![0x2A, 0x10, 0x20, 0x30, 0x40];
        payload.extend_from_slice(&[0u8; 12]);
        let frame = with_crc(&payload);
        assert_eq!(frame.len(), 19);

        let energy = parse_energy(&frame).unwrap();
        assert_eq!(energy, 0x20 * 0x1000000 + 0x10 * 0x10000 + 0x40 * 0x100 + 0x30);
    }

    #[test]
    fn test_parse_energy_checksum_mismatch() {
        let mut frame = with_crc(&[0u8; 17]);
        frame[17] ^= 0x01;
        assert!(matches!(parse_energy(&frame), Err(ResponseError::ChecksumMismatch { .. })));
    }
}
