//! CRC-16 used by the BR Code CRC field (tag 63)
//!
//! Parameters match CRC-16/CCITT-FALSE: polynomial `0x1021`, initial value
//! `0xFFFF`, MSB first, no reflection and no final XOR.

const POLY: u16 = 0x1021;
const INIT: u16 = 0xFFFF;

/// Compute the raw 16-bit checksum over `data`.
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc = INIT;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ POLY
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Checksum formatted as the four uppercase hex digits that close a payload.
pub fn crc16_hex(data: &[u8]) -> String {
    format!("{:04X}", crc16(data))
}
