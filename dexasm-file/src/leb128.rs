use crate::error::{Error, Result};

/// Decode an unsigned LEB128 value from `data` starting at `offset`.
/// Returns (value, bytes_consumed).
pub fn decode_uleb128(data: &[u8], offset: usize) -> Result<(u64, usize)> {
    let mut result: u64 = 0;
    let mut shift = 0u32;
    let mut pos = offset;

    loop {
        let Some(&byte) = data.get(pos) else {
            return Err(Error::InvalidLeb128(offset));
        };
        pos += 1;

        // Only bit 0 of the tenth byte still fits in a u64.
        if shift == 63 && (byte & 0x7e) != 0 {
            return Err(Error::InvalidLeb128(offset));
        }
        result |= ((byte & 0x7f) as u64) << shift;
        if byte & 0x80 == 0 {
            return Ok((result, pos - offset));
        }
        shift += 7;
        if shift >= 64 {
            return Err(Error::InvalidLeb128(offset));
        }
    }
}

/// Decode a signed LEB128 value from `data` starting at `offset`.
/// Returns (value, bytes_consumed).
pub fn decode_sleb128(data: &[u8], offset: usize) -> Result<(i64, usize)> {
    let mut result: i64 = 0;
    let mut shift = 0u32;
    let mut pos = offset;
    let mut byte;

    loop {
        let Some(&b) = data.get(pos) else {
            return Err(Error::InvalidLeb128(offset));
        };
        byte = b;
        pos += 1;

        // The tenth byte holds bit 63 only, so it must be a pure sign byte.
        if shift == 63 && !matches!(byte, 0x00 | 0x7f) {
            return Err(Error::InvalidLeb128(offset));
        }
        result |= ((byte & 0x7f) as i64) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            break;
        }
        if shift >= 64 {
            return Err(Error::InvalidLeb128(offset));
        }
    }

    if shift < 64 && (byte & 0x40) != 0 {
        result |= !0i64 << shift;
    }

    Ok((result, pos - offset))
}

/// Append `value` to `out` as unsigned LEB128.
pub fn encode_uleb128(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Append `value` to `out` as signed LEB128.
pub fn encode_sleb128(out: &mut Vec<u8>, mut value: i64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        let done = (value == 0 && byte & 0x40 == 0) || (value == -1 && byte & 0x40 != 0);
        if done {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}
