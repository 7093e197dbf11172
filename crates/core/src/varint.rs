//! Unsigned-varint reading and writing.
//!
//! Little-endian base-128 encoding as used by the multiformats family:
//! seven value bits per byte, high bit set on every byte except the last.

use crate::error::{Error, Result};
use bytes::{Buf, BufMut};

/// Read an unsigned varint from the front of `buf`.
///
/// Fails on truncated input and on encodings that do not fit in a `u64`.
pub fn read_uvarint(buf: &mut impl Buf) -> Result<u64> {
    let mut value: u64 = 0;
    for shift in (0..64).step_by(7) {
        if !buf.has_remaining() {
            return Err(Error::InvalidVarint("truncated".to_string()));
        }
        let byte = buf.get_u8();
        let bits = u64::from(byte & 0x7f);
        if shift == 63 && bits > 1 {
            return Err(Error::InvalidVarint("overflows u64".to_string()));
        }
        value |= bits << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(Error::InvalidVarint("longer than 10 bytes".to_string()))
}

/// Append the varint encoding of `value` to `buf`.
pub fn write_uvarint(buf: &mut impl BufMut, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            buf.put_u8(byte);
            return;
        }
        buf.put_u8(byte | 0x80);
    }
}

/// Number of bytes `value` occupies when varint-encoded.
pub fn uvarint_len(value: u64) -> usize {
    let mut buf = Vec::with_capacity(10);
    write_uvarint(&mut buf, value);
    buf.len()
}
