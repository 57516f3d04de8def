//! CRC calculation for cooking profiles.
//!
//! Uses CRC-16 with polynomial 0x11021 (0x1021 with the implicit top bit),
//! initial value 0, no reflection and no final XOR. This is the variant
//! commonly known as CRC-16/XMODEM.

/// CRC-16 polynomial (the x^16 term is implicit).
const CRC_POLYNOMIAL: u16 = 0x1021;

/// Initial CRC value
const CRC_INITIAL: u16 = 0x0000;

/// Calculate the CRC-16 of a profile payload.
///
/// # Example
///
/// ```
/// use ricecooker_autopilot::protocol::calculate_crc;
///
/// assert_eq!(calculate_crc(b"123456789"), 0x31C3);
/// ```
pub fn calculate_crc(data: &[u8]) -> u16 {
    let mut crc = CRC_INITIAL;

    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ CRC_POLYNOMIAL;
            } else {
                crc <<= 1;
            }
        }
    }

    crc
}
