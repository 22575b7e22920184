use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegisterError {
    #[error("register v{reg:X} does not fit slot {slot} ({bits} bits)")]
    SlotOverflow { reg: u16, slot: usize, bits: u8 },

    #[error("too many registers: format allows at most {max}")]
    TooMany { max: usize },

    #[error("range registers must be consecutive: expected v{expected:X}, found v{found:X}")]
    NonConsecutive { expected: u16, found: u16 },

    #[error("opcode {0:#04x} is not defined")]
    UnknownOpcode(u8),
}
