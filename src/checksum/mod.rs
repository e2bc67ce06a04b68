/* MODBUS flavoured CRC-16 as used by the Mercury meters on both directions of the wire */

const CRC_INIT: u16 = 0xFFFF;
const CRC_POLY: u16 = 0xA001;

/// Length of the checksum trailer at the end of every frame.
pub const CRC_LEN: usize = 2;

pub fn compute(data: &[u8]) -> u16 {
    let mut crc = CRC_INIT;

    for &byte in data {
        crc ^= byte as u16;
        for _ in 0..8 {
            if crc & 0x0001 != 0 {
                crc = (crc >> 1) ^ CRC_POLY;
            } else {
                crc >>= 1;
            }
        }
    }

    crc
}

/// Writes the checksum of everything but the last two bytes into the last two bytes,
/// low byte first.
pub fn append(frame: &mut [u8]) {
    let end = frame.len() - CRC_LEN;
    let crc = compute(&frame[..end]).to_le_bytes();
    frame[end] = crc[0];
    frame[end + 1] = crc[1];
}

/// Returns the trailer the meter sent, read low byte first.
pub fn trailer(frame: &[u8]) -> u16 {
    let end = frame.len() - CRC_LEN;
    u16::from_le_bytes([frame[end], frame[end + 1]])
}

pub fn verify(frame: &[u8]) -> bool {
    if frame.len() < CRC_LEN {
        return false;
    }
    compute(&frame[..frame.len() - CRC_LEN]) == trailer(frame)
}
