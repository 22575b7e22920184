use crate::error::{Error, Result};

/// Decode a length-delimited Modified UTF-8 byte sequence.
///
/// `base` is the file offset of `data[0]` and is only used for error
/// reporting. NUL is accepted both as `0xC0 0x80` and as a raw zero byte;
/// supplementary characters arrive as surrogate pairs, each encoded as a
/// three byte sequence.
pub fn decode_mutf8(data: &[u8], base: usize) -> Result<String> {
    let mut result = String::with_capacity(data.len());
    let mut pos = 0;

    while pos < data.len() {
        let b = data[pos];
        let (unit, len) = if b & 0x80 == 0 {
            (b as u32, 1)
        } else if b & 0xe0 == 0xc0 {
            let b2 = continuation(data, pos + 1, base + pos)?;
            (((b as u32 & 0x1f) << 6) | b2, 2)
        } else if b & 0xf0 == 0xe0 {
            let b2 = continuation(data, pos + 1, base + pos)?;
            let b3 = continuation(data, pos + 2, base + pos)?;
            (((b as u32 & 0x0f) << 12) | (b2 << 6) | b3, 3)
        } else {
            return Err(Error::InvalidMutf8(base + pos));
        };
        pos += len;

        if (0xD800..=0xDBFF).contains(&unit) {
            if let Some(low) = low_surrogate(data, pos) {
                let cp = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                result.push(char::from_u32(cp).unwrap_or('\u{FFFD}'));
                pos += 3;
                continue;
            }
        }
        result.push(char::from_u32(unit).unwrap_or('\u{FFFD}'));
    }

    Ok(result)
}

fn continuation(data: &[u8], pos: usize, at: usize) -> Result<u32> {
    match data.get(pos) {
        Some(&b) if b & 0xc0 == 0x80 => Ok((b & 0x3f) as u32),
        _ => Err(Error::InvalidMutf8(at)),
    }
}

fn low_surrogate(data: &[u8], pos: usize) -> Option<u32> {
    let Some(&[b1, b2, b3]) = data.get(pos..pos + 3) else {
        return None;
    };
    if b1 & 0xf0 != 0xe0 || b2 & 0xc0 != 0x80 || b3 & 0xc0 != 0x80 {
        return None;
    }
    let unit = ((b1 as u32 & 0x0f) << 12) | ((b2 as u32 & 0x3f) << 6) | (b3 as u32 & 0x3f);
    (0xDC00..=0xDFFF).contains(&unit).then_some(unit)
}

/// Encode `s` as Modified UTF-8 (no terminator).
pub fn encode_mutf8(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    for unit in s.encode_utf16() {
        match unit {
            0x0001..=0x007f => out.push(unit as u8),
            0x0000 | 0x0080..=0x07ff => {
                out.push(0xc0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3f) as u8);
            }
            _ => {
                out.push(0xe0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3f) as u8);
                out.push(0x80 | (unit & 0x3f) as u8);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nul_uses_two_bytes() {
        assert_eq!(encode_mutf8("\0"), [0xc0, 0x80]);
        assert_eq!(decode_mutf8(&[0xc0, 0x80], 0).unwrap(), "\0");
    }

    #[test]
    fn two_and_three_byte_sequences() {
        assert_eq!(decode_mutf8(&[0xc2, 0xa7, 0x33], 0).unwrap(), "\u{a7}3");
        let s = decode_mutf8(&[0xef, 0xbf, 0x83], 0).unwrap();
        assert_eq!(s.chars().next().unwrap() as u32, 0xffc3);
    }

    #[test]
    fn supplementary_characters_use_surrogates() {
        let bytes = [0xed, 0xa0, 0x81, 0xed, 0xb0, 0xb7];
        assert_eq!(encode_mutf8("\u{10437}"), bytes);
        assert_eq!(decode_mutf8(&bytes, 0).unwrap(), "\u{10437}");
    }

    #[test]
    fn lone_surrogate_becomes_replacement() {
        let s = decode_mutf8(&[0x5b, 0xed, 0xa3, 0x92, 0x5d], 0).unwrap();
        assert_eq!(s, "[\u{FFFD}]");
    }

    #[test]
    fn bad_continuation_reports_offset() {
        assert!(matches!(
            decode_mutf8(&[0x41, 0xc2, 0x41], 0x10),
            Err(Error::InvalidMutf8(0x11))
        ));
        assert!(decode_mutf8(&[0xf0, 0x9f, 0x91, 0xb3], 0).is_err());
    }
}
