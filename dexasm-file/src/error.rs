use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("File too small: {0} bytes")]
    FileTooSmall(usize),

    #[error("Invalid magic: expected \"dexasm\\n\\0\"")]
    InvalidMagic,

    #[error("Unsupported version: {0}")]
    UnsupportedVersion(u32),

    #[error("Unexpected end of data at offset {0:#x}")]
    Truncated(usize),

    #[error("Invalid LEB128 encoding at offset {0:#x}")]
    InvalidLeb128(usize),

    #[error("Invalid MUTF-8 encoding at offset {0:#x}")]
    InvalidMutf8(usize),

    #[error("Invalid tag {0:#x} at offset {1:#x}")]
    InvalidTag(u8, usize),

    #[error("Unknown opcode {0:#04x} at offset {1:#x}")]
    UnknownOpcode(u8, usize),

    #[error("Malformed instruction at offset {offset:#x}: {reason}")]
    MalformedInstruction { offset: usize, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
