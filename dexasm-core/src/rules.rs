//! Java identifier and keyword rules used to decide which names need
//! sanitizing.

/// Reserved words, sorted for binary search.
const KEYWORDS: [&str; 48] = [
    "abstract",
    "boolean",
    "break",
    "byte",
    "case",
    "catch",
    "char",
    "class",
    "const",
    "continue",
    "default",
    "do",
    "double",
    "else",
    "extends",
    "final",
    "finally",
    "float",
    "for",
    "goto",
    "if",
    "implements",
    "import",
    "instanceof",
    "int",
    "interface",
    "long",
    "native",
    "new",
    "package",
    "private",
    "protected",
    "public",
    "return",
    "short",
    "static",
    "strictfp",
    "super",
    "switch",
    "synchronized",
    "this",
    "throw",
    "throws",
    "transient",
    "try",
    "void",
    "volatile",
    "while",
];

pub fn is_keyword(s: &str) -> bool {
    KEYWORDS.binary_search(&s).is_ok()
}

/// ASCII letters and `_`. `$` is excluded so synthetic names get sanitized;
/// anything outside ASCII is accepted.
pub fn is_identifier_start(c: char) -> bool {
    let cp = c as u32;
    match cp {
        0..64 => false,
        64..128 => 0x7FF_FFFE_87FF_FFFEu64 & (1 << (cp - 64)) != 0,
        _ => true,
    }
}

pub fn is_identifier_part(c: char) -> bool {
    is_identifier_start(c) || c.is_ascii_digit()
}

/// Whether `s` can be used verbatim as a Java identifier.
pub fn is_identifier(s: &str) -> bool {
    if is_keyword(s) {
        return false;
    }
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if is_identifier_start(c) => chars.all(is_identifier_part),
        _ => false,
    }
}
