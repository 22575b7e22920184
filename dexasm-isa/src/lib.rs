//! Dalvik instruction set definitions, generated from `isa.yaml`.
//!
//! This crate provides the opcode table, instruction formats, and mnemonic
//! lookup used by both the disassembler and the reassembler. The tables are
//! immutable and shared process-wide.

mod format;

pub use format::{Format, MAX_RANGE_REGISTERS, MAX_VARIABLE_REGISTERS};

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

bitflags::bitflags! {
    /// Behavioural properties of an opcode.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct OpcodeFlags: u32 {
        /// Execution may fall through to the next instruction.
        const CONTINUE = 0x01;
        /// May raise an exception.
        const THROW = 0x02;
        /// Conditional or unconditional branch to a label.
        const BRANCH = 0x04;
        /// Multi-way dispatch through a switch payload.
        const SWITCH = 0x08;
        /// Method invocation.
        const INVOKE = 0x10;
        /// Returns from the method.
        const RETURN = 0x20;
        /// The branch operand points at a payload record rather than code.
        const PAYLOAD = 0x40;
    }
}

/// Kind of the single non-register operand an opcode carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpecialKind {
    None,
    Constant,
    Target,
    String,
    Type,
    Field,
    Method,
}

/// Static description of one opcode.
#[derive(Clone, Copy, Debug)]
pub struct OpcodeInfo {
    mnemonic: &'static str,
    format: Format,
    special: SpecialKind,
    flags: OpcodeFlags,
}

impl OpcodeInfo {
    #[inline]
    pub const fn mnemonic(&self) -> &'static str {
        self.mnemonic
    }

    #[inline]
    pub const fn format(&self) -> Format {
        self.format
    }

    #[inline]
    pub const fn special(&self) -> SpecialKind {
        self.special
    }

    #[inline]
    pub const fn flags(&self) -> OpcodeFlags {
        self.flags
    }
}

/// A Dalvik opcode byte.
///
/// Named constants (e.g. [`Opcode::PACKED_SWITCH`]) are generated from
/// `isa.yaml`. Values without an entry in the table are unused and have no
/// [`OpcodeInfo`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Opcode(pub u8);

include!(concat!(env!("OUT_DIR"), "/generated.rs"));

static MNEMONICS: LazyLock<HashMap<&'static str, Opcode>> = LazyLock::new(|| {
    opcodes()
        .map(|(op, info)| (info.mnemonic(), op))
        .collect()
});

impl Opcode {
    /// Table entry for this opcode, or `None` if the value is unused.
    #[inline]
    pub fn info(self) -> Option<&'static OpcodeInfo> {
        OPCODE_TABLE[self.0 as usize].as_ref()
    }

    /// Resolve an assembler mnemonic such as `"invoke-virtual/range"`.
    pub fn from_mnemonic(name: &str) -> Option<Self> {
        MNEMONICS.get(name).copied()
    }

    /// The mnemonic, or `"unused"` for values outside the table.
    pub fn mnemonic(self) -> &'static str {
        self.info().map_or("unused", |i| i.mnemonic())
    }

    /// True for the three opcodes whose branch operand addresses a payload
    /// record (`fill-array-data`, `packed-switch`, `sparse-switch`).
    pub fn targets_payload(self) -> bool {
        self.info()
            .is_some_and(|i| i.flags().contains(OpcodeFlags::PAYLOAD))
    }
}

impl fmt::Debug for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Opcode({:#04x} {})", self.0, self.mnemonic())
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Iterate over every defined opcode in value order.
pub fn opcodes() -> impl Iterator<Item = (Opcode, &'static OpcodeInfo)> {
    OPCODE_TABLE
        .iter()
        .enumerate()
        .filter_map(|(value, info)| info.as_ref().map(|i| (Opcode(value as u8), i)))
}
