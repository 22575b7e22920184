//! In-memory records for Dalvik method bodies.
//!
//! An [`Instruction`] is either a real instruction or a payload record
//! (packed switch, sparse switch, fill-array-data) that lives inline in the
//! instruction stream. Offsets are counted in 16-bit code units.

mod error;
mod instruction;
mod reference;

pub use error::RegisterError;
pub use instruction::{
    FillArrayData, Instruction, PackedSwitch, PayloadKind, Special, SparseSwitch, code_offsets,
};
pub use reference::{FieldRef, MethodRef, Prototype};

/// Exception handler for one catch type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handler {
    /// Type descriptor of the caught exception.
    pub catch_type: String,
    /// Handler address in code units.
    pub addr: u32,
}

/// A protected code range and its handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TryBlock {
    pub start_addr: u32,
    /// Length of the protected range in code units.
    pub insn_count: u32,
    pub handlers: Vec<Handler>,
    pub catch_all: Option<u32>,
}
