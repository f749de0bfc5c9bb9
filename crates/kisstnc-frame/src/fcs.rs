//! AX.25 frame check sequence.
//!
//! CRC-16-CCITT (x^16 + x^12 + x^5 + 1) computed LSB-first with the mirrored
//! polynomial 0x8408, register preset to 0xFFFF, result inverted. The FCS is sent
//! low byte first. KISS TNCs strip the FCS before handing frames to the host, so
//! this only applies to raw HDLC captures and to frames built for a modem.

use bytes::{BufMut, BytesMut};

const POLY_REFLECTED: u16 = 0x8408;

/// Size of the FCS field.
pub const FCS_LEN: usize = 2;

/// Compute the FCS over `data` (address field through info field).
pub fn compute(data: &[u8]) -> u16 {
    let mut register: u16 = 0xFFFF;
    for &byte in data {
        let mut byte = byte;
        for _ in 0..8 {
            let out_bit = register & 0x0001;
            register >>= 1;
            if out_bit != u16::from(byte & 0x01) {
                register ^= POLY_REFLECTED;
            }
            byte >>= 1;
        }
    }
    register ^ 0xFFFF
}

/// Append `data` followed by its FCS to `dst`.
pub fn append(data: &[u8], dst: &mut BytesMut) {
    dst.reserve(data.len() + FCS_LEN);
    dst.put_slice(data);
    dst.put_u16_le(compute(data));
}

/// Check a frame whose last two bytes are its FCS.
pub fn verify(frame: &[u8]) -> bool {
    if frame.len() < FCS_LEN {
        return false;
    }
    let (data, fcs) = frame.split_at(frame.len() - FCS_LEN);
    compute(data) == u16::from_le_bytes([fcs[0], fcs[1]])
}
