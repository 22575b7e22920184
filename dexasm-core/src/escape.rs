//! Java string literal escaping for instruction lines.

use crate::error::EscapeError;

/// Escape `s` for use inside a Java string literal.
///
/// Printable ASCII passes through; `\t \r \n \v \" \\` use short escapes and
/// everything else becomes `\uXXXX` over UTF-16 code units.
pub fn encode_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            '\u{0b}' => out.push_str("\\v"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            ' '..='\u{7f}' => out.push(c),
            _ => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{unit:04X}"));
                }
            }
        }
    }
    out
}

/// Decode a string literal body produced by [`encode_string`].
///
/// Also accepts `\b`, `\f`, `\'` and `\0`. Unpaired surrogates decode to
/// U+FFFD.
pub fn decode_string(s: &str) -> Result<String, EscapeError> {
    let mut out = String::with_capacity(s.len());
    let mut pending: Option<u16> = None;
    let mut chars = s.char_indices().peekable();
    while let Some((at, c)) = chars.next() {
        if c != '\\' {
            flush(&mut out, &mut pending);
            out.push(c);
            continue;
        }
        let (_, e) = chars.next().ok_or(EscapeError::Dangling(at))?;
        let decoded = match e {
            't' => '\t',
            'r' => '\r',
            'n' => '\n',
            'v' => '\u{0b}',
            'b' => '\u{08}',
            'f' => '\u{0c}',
            '0' => '\0',
            '"' | '\'' | '\\' => e,
            'u' => {
                while chars.next_if(|&(_, c)| c == 'u').is_some() {}
                let mut unit = 0u16;
                for _ in 0..4 {
                    let (_, h) = chars.next().ok_or(EscapeError::Unicode(at))?;
                    let digit = h.to_digit(16).ok_or(EscapeError::Unicode(at))?;
                    unit = unit << 4 | digit as u16;
                }
                push_unit(&mut out, &mut pending, unit);
                continue;
            }
            other => return Err(EscapeError::Unknown(other, at)),
        };
        flush(&mut out, &mut pending);
        out.push(decoded);
    }
    flush(&mut out, &mut pending);
    Ok(out)
}

fn push_unit(out: &mut String, pending: &mut Option<u16>, unit: u16) {
    match (pending.take(), unit) {
        (Some(high), 0xDC00..=0xDFFF) => {
            let c = char::decode_utf16([high, unit])
                .next()
                .and_then(Result::ok)
                .unwrap_or(char::REPLACEMENT_CHARACTER);
            out.push(c);
        }
        (high, 0xD800..=0xDBFF) => {
            if high.is_some() {
                out.push(char::REPLACEMENT_CHARACTER);
            }
            *pending = Some(unit);
        }
        (high, _) => {
            if high.is_some() {
                out.push(char::REPLACEMENT_CHARACTER);
            }
            out.push(char::from_u32(unit.into()).unwrap_or(char::REPLACEMENT_CHARACTER));
        }
    }
}

fn flush(out: &mut String, pending: &mut Option<u16>) {
    if pending.take().is_some() {
        out.push(char::REPLACEMENT_CHARACTER);
    }
}
