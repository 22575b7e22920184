//! The textual form of one method body.
//!
//! A [`Listing`] is what the disassembler produces and what the reassembler
//! consumes. Instruction lines follow
//! `[label ":"] mnemonic (" " register)* (" " operand)?`; switch and data
//! payloads and try blocks live in side tables referenced by index or label.

/// Label of the `index`-th real instruction.
pub fn label(index: usize) -> String {
    format!("L{index:02}")
}

/// A method body as text plus side tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub registers: u16,
    pub outs_size: u16,
    pub insns: Vec<String>,
    pub packed_switches: Vec<PackedTable>,
    pub sparse_switches: Vec<SparseTable>,
    pub data_arrays: Vec<DataTable>,
    pub try_blocks: Vec<TryTable>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedTable {
    pub first_key: i32,
    pub targets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparseTable {
    pub keys: Vec<i32>,
    pub targets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataTable {
    pub element_width: u8,
    pub data: Vec<u64>,
}

impl DataTable {
    /// Elements truncated to `element_width` bytes.
    pub fn truncated(&self) -> Vec<u64> {
        let mask = match self.element_width {
            w @ 1..=7 => (1u64 << (8 * u32::from(w))) - 1,
            _ => u64::MAX,
        };
        self.data.iter().map(|&v| v & mask).collect()
    }

    /// Java literal for element `value`.
    ///
    /// Anything past `i32::MAX` gets an `L` suffix, otherwise the compiler
    /// would read it as a negative int and sign-extend it into the `long[]`.
    pub fn literal(value: u64) -> String {
        if value > i32::MAX as u64 {
            format!("0x{value:X}L")
        } else {
            format!("0x{value:X}")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TryTable {
    /// Label of the first covered instruction.
    pub start_insn: String,
    /// Number of covered instructions.
    pub insn_length: i32,
    pub handlers: Vec<HandlerEntry>,
    /// Label of the catch-all handler, empty when there is none.
    pub catch_all_target: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerEntry {
    /// Type descriptor of the caught exception.
    pub catch_type: String,
    pub target: String,
}
