//! Checksum algorithms
//!
//! Three unrelated algorithms, one per device family:
//! - Additive sum-16 (Plantower particulate sensors)
//! - CRC-8, polynomial 0x31 (Sensirion I2C sensors)
//! - CRC-16/MODBUS (Senseair CO2 sensors)

/// CRC-8 polynomial (x^8 + x^5 + x^4 + 1)
const CRC8_POLY: u8 = 0x31;

/// CRC-8 initial value
const CRC8_INIT: u8 = 0xFF;

/// CRC-16/MODBUS reflected polynomial (0x8005 reversed)
const CRC16_MODBUS_POLY: u16 = 0xA001;

/// CRC-16/MODBUS initial value
const CRC16_MODBUS_INIT: u16 = 0xFFFF;

/// Additive 16-bit checksum
///
/// Plain byte sum, truncated to 16 bits. Not a CRC; it only catches the
/// crudest corruption, which is all the sensor promises. Sent big-endian.
pub fn sum16(data: &[u8]) -> u16 {
    let sum = data.iter().fold(0u32, |acc, &byte| acc.wrapping_add(byte as u32));
    (sum & 0xFFFF) as u16
}

/// Sensirion CRC-8 over one 16-bit word
///
/// Polynomial 0x31, init 0xFF, MSB first, no final XOR. Sensirion parts
/// checksum every 2-byte word separately, so the input is exactly one word.
pub fn crc8(word: &[u8; 2]) -> u8 {
    let mut crc = CRC8_INIT;
    for &byte in word {
        crc ^= byte;
        for _ in 0..8 {
            if crc & 0x80 != 0 {
                crc = (crc << 1) ^ CRC8_POLY;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

/// CRC-16/MODBUS
///
/// Polynomial 0xA001 (reflected), init 0xFFFF, LSB first. Goes on the wire
/// low byte first.
pub fn crc16_modbus(data: &[u8]) -> u16 {
    let mut crc = CRC16_MODBUS_INIT;
    for &byte in data {
        crc ^= byte as u16;
        for _ in 0..8 {
            if crc & 0x0001 != 0 {
                crc = (crc >> 1) ^ CRC16_MODBUS_POLY;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}
