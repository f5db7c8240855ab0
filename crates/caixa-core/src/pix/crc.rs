//! CRC16 trailer (field `63`) required by BR Code readers.
//!
//! CRC-16/CCITT-FALSE: polynomial `0x1021`, initial value `0xFFFF`, no
//! reflection, no final XOR. The checksum covers the whole payload including
//! the `6304` header of the CRC field itself.

/// BR Code id of the CRC field.
pub const CRC_ID: &str = "63";

/// Computes CRC-16/CCITT-FALSE over `data`.
pub fn crc16_ccitt(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= u16::from(byte) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Appends `6304XXXX` (uppercase hex) to a payload.
pub fn append_crc(payload: &str) -> String {
    let mut out = format!("{}{}04", payload, CRC_ID);
    let crc = crc16_ccitt(out.as_bytes());
    out.push_str(&format!("{:04X}", crc));
    out
}

/// Checks the trailing CRC of a payload produced by [`append_crc`].
pub fn verify_crc(payload: &str) -> bool {
    let Some(split) = payload.len().checked_sub(4) else {
        return false;
    };
    let (Some(body), Some(expected)) = (payload.get(..split), payload.get(split..)) else {
        return false;
    };
    if !body.ends_with("6304") {
        return false;
    }
    format!("{:04X}", crc16_ccitt(body.as_bytes())) == expected.to_uppercase()
}
