use std::fmt;

use thiserror::Error;

/// Inconsistency found while disassembling a container.
///
/// The reader only produces structurally valid containers, so these point at
/// a broken input or a bug rather than at anything a user can fix.
#[derive(Debug, Error, PartialEq)]
pub enum DisasmError {
    #[error("{method}: branch at {offset:#x} points to {target:#x}, which starts no instruction")]
    UnmappedTarget {
        method: String,
        offset: u32,
        target: i64,
    },

    #[error("{method}: {opcode} at {offset:#x} expects a {expected} payload")]
    PayloadMismatch {
        method: String,
        opcode: &'static str,
        offset: u32,
        expected: &'static str,
    },

    #[error("{method}: no alias for {reference}")]
    MissingAlias { method: String, reference: String },
}

/// Malformed or mistyped element of a schema annotation.
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("{annotation} has no element {element}")]
    Missing {
        annotation: String,
        element: &'static str,
    },

    #[error("{annotation}.{element} is not {expected}")]
    Mistyped {
        annotation: String,
        element: &'static str,
        expected: &'static str,
    },
}

/// Java string literal that cannot be decoded.
#[derive(Debug, Error, PartialEq)]
pub enum EscapeError {
    #[error("dangling backslash at {0}")]
    Dangling(usize),

    #[error("unknown escape \\{0} at {1}")]
    Unknown(char, usize),

    #[error("malformed \\u escape at {0}")]
    Unicode(usize),
}

/// What went wrong while reassembling one method or class.
#[derive(Debug, Error, PartialEq)]
pub enum ReasmErrorKind {
    #[error("Unknown mnemonic {0}")]
    UnknownMnemonic(String),

    #[error("Failed to find register {0}")]
    MissingRegister(usize),

    #[error("Range registers must be consecutive")]
    NonConsecutive,

    #[error("Couldn't encode register v{reg:X} in slot {slot}")]
    RegisterEncoding { reg: u16, slot: usize },

    #[error("Expected numeric literal")]
    ExpectedLiteral,

    #[error("Literal {value} does not fit in {bits} bits")]
    LiteralRange { value: i64, bits: u32 },

    #[error("Expected {0}")]
    ExpectedOperand(&'static str),

    #[error("Unexpected text after operand: {0}")]
    TrailingText(String),

    #[error("Branch offset {offset} does not fit in {bits} bits")]
    BranchRange { offset: i64, bits: u32 },

    #[error("Couldn't find label {0}")]
    UnknownLabel(String),

    #[error("Couldn't find table {0}")]
    UnknownTable(String),

    #[error("Couldn't find field alias {0}")]
    UnknownFieldAlias(String),

    #[error("Couldn't find method alias {0}")]
    UnknownMethodAlias(String),

    #[error("Keys and targets of different length")]
    SparseLength,

    #[error("Expected positive insnLength")]
    TryLength,

    #[error("insnLength {0} runs past the last instruction")]
    TryOverrun(i32),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Where inside a class a reassembly error was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// Class-level annotations.
    Class,
    /// Method-level annotations.
    Method,
    /// Instruction line, by index.
    Insn(usize),
    /// Try block, by index.
    Try(usize),
    /// Handler `1` of try block `0`.
    Handler(usize, usize),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Class | Location::Method => Ok(()),
            Location::Insn(i) => write!(f, "{i}"),
            Location::Try(i) => write!(f, "try:{i}"),
            Location::Handler(i, j) => write!(f, "try:{i};handler:{j}"),
        }
    }
}

/// A [`ReasmErrorKind`] with its position inside one method.
#[derive(Debug, Error, PartialEq)]
#[error("{location} {kind}")]
pub struct LocatedError {
    pub location: Location,
    pub kind: ReasmErrorKind,
}

impl LocatedError {
    pub fn new(location: Location, kind: impl Into<ReasmErrorKind>) -> Self {
        Self {
            location,
            kind: kind.into(),
        }
    }
}

/// Fatal reassembly error with class, method and instruction coordinates.
///
/// Displays as `Class.method:idx message`, `Class.method:try:i message`, or
/// `Class: message` for class-level annotations.
#[derive(Debug, PartialEq)]
pub struct ReasmError {
    pub class: String,
    pub method: Option<String>,
    pub location: Location,
    pub kind: ReasmErrorKind,
}

impl ReasmError {
    pub fn class(class: &str, kind: impl Into<ReasmErrorKind>) -> Self {
        Self {
            class: class.to_string(),
            method: None,
            location: Location::Class,
            kind: kind.into(),
        }
    }

    pub fn method(class: &str, method: &str, err: LocatedError) -> Self {
        Self {
            class: class.to_string(),
            method: Some(method.to_string()),
            location: err.location,
            kind: err.kind,
        }
    }
}

impl fmt::Display for ReasmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.class)?;
        if let Some(method) = &self.method {
            write!(f, ".{method}")?;
        }
        match self.location {
            Location::Class | Location::Method => write!(f, ": {}", self.kind),
            loc => write!(f, ":{loc} {}", self.kind),
        }
    }
}

impl std::error::Error for ReasmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_in_messages() {
        let err = ReasmError::method(
            "LFoo;",
            "run",
            LocatedError::new(Location::Insn(3), ReasmErrorKind::UnknownMnemonic("mov".into())),
        );
        assert_eq!(err.to_string(), "LFoo;.run:3 Unknown mnemonic mov");

        let err = ReasmError::method(
            "LFoo;",
            "run",
            LocatedError::new(Location::Handler(0, 2), ReasmErrorKind::UnknownLabel("L09".into())),
        );
        assert_eq!(err.to_string(), "LFoo;.run:try:0;handler:2 Couldn't find label L09");

        let err = ReasmError::class(
            "LFoo;",
            SchemaError::Missing {
                annotation: "DexasmAliases".into(),
                element: "fieldAliases",
            },
        );
        assert_eq!(err.to_string(), "LFoo;: DexasmAliases has no element fieldAliases");
    }
}
