//! Reversible mapping of binary names onto legal Java identifiers.
//!
//! A name that is not a legal identifier gets the `_dexasm` marker, an
//! optional decoration token and `_` prepended; [`desanitize_identifier`]
//! strips everything up to that `_`. Class descriptors are handled segment by
//! segment, and classes without a package are moved into
//! [`DEFAULT_PACKAGE`].

use std::collections::HashSet;

use crate::rules::is_identifier;

pub const MARKER: &str = "_dexasm";

/// Package that holds classes whose descriptor has no package.
pub const DEFAULT_PACKAGE: &str = "dexasm_default";

const DEFAULT_PREFIX: &str = "Ldexasm_default/";

/// Sanitize a member name. Legal identifiers come back unchanged.
pub fn sanitize_identifier(id: &str) -> String {
    sanitize_identifier_as(id, -1)
}

/// Sanitize with a decoration token.
///
/// `-1` means no token. A non-negative token is written as is and only used
/// when `id` needs sanitizing; a token below `-1` forces decoration as
/// `x<n>` with `n = -token - 2`, which is how collisions are broken.
pub fn sanitize_identifier_as(id: &str, token: i32) -> String {
    if token < -1 || needs_sanitizing(id) {
        decorate(id, token)
    } else {
        id.to_string()
    }
}

fn needs_sanitizing(id: &str) -> bool {
    !is_identifier(id) || id.starts_with(MARKER)
}

fn decorate(id: &str, token: i32) -> String {
    match token {
        -1 => format!("{MARKER}_{id}"),
        t if t < 0 => format!("{MARKER}x{}_{id}", -t - 2),
        t => format!("{MARKER}{t}_{id}"),
    }
}

/// Inverse of [`sanitize_identifier`] and [`sanitize_identifier_as`].
pub fn desanitize_identifier(id: &str) -> &str {
    if !id.starts_with(MARKER) {
        return id;
    }
    match id[MARKER.len()..].find('_') {
        Some(pos) => &id[MARKER.len() + pos + 1..],
        None => id,
    }
}

/// Sanitize every segment of a class descriptor.
///
/// Segments are split at `/`, `$` and `;`. Each is decorated with its end
/// position when it is not a legal identifier, and segments that would repeat
/// an earlier one within the same descriptor are decorated again until
/// unique.
pub fn sanitize_type(desc: &str) -> String {
    let Some(body) = desc.strip_prefix('L') else {
        return desc.to_string();
    };
    let mut out = String::with_capacity(desc.len() + 8);
    out.push('L');
    let mut seen = HashSet::new();
    let mut start = 0;
    for (i, sep) in body.char_indices() {
        if !matches!(sep, '/' | '$' | ';') {
            continue;
        }
        let seg = &body[start..i];
        let token = (out.len() + seg.len()) as i32;
        let mut tok = if out.len() == 1 && sep == '/' && seg == DEFAULT_PACKAGE {
            decorate(seg, token)
        } else {
            sanitize_identifier_as(seg, token)
        };
        let mut retry = -2;
        while !seen.insert(tok.clone()) {
            tok = sanitize_identifier_as(seg, retry);
            retry -= 1;
        }
        out.push_str(&tok);
        out.push(sep);
        start = i + 1;
    }
    out.push_str(&body[start..]);

    if !out.contains('/') {
        out = format!("{DEFAULT_PREFIX}{}", &out[1..]);
    }
    out
}

/// Inverse of [`sanitize_type`].
pub fn desanitize_type(desc: &str) -> String {
    let body = match desc.strip_prefix(DEFAULT_PREFIX) {
        Some(rest) => rest,
        None => match desc.strip_prefix('L') {
            Some(rest) => rest,
            None => return desc.to_string(),
        },
    };
    let mut out = String::with_capacity(desc.len());
    out.push('L');
    let mut start = 0;
    for (i, sep) in body.char_indices() {
        if matches!(sep, '/' | '$' | ';') {
            out.push_str(desanitize_identifier(&body[start..i]));
            out.push(sep);
            start = i + 1;
        }
    }
    out.push_str(&body[start..]);
    out
}
