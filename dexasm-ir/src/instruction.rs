use dexasm_isa::{Opcode, SpecialKind};

use crate::error::RegisterError;
use crate::reference::{FieldRef, MethodRef};

/// Sub-tag that marks a `nop` record as a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PayloadKind {
    PackedSwitch = 0x01,
    SparseSwitch = 0x02,
    FillArrayData = 0x03,
}

impl PayloadKind {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x01 => Some(Self::PackedSwitch),
            0x02 => Some(Self::SparseSwitch),
            0x03 => Some(Self::FillArrayData),
            _ => None,
        }
    }

    #[inline]
    pub fn tag(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedSwitch {
    pub first_key: i32,
    /// Targets relative to the owning switch instruction.
    pub targets: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparseSwitch {
    pub keys: Vec<i32>,
    /// Targets relative to the owning switch instruction.
    pub targets: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillArrayData {
    /// Element width in bytes: 1, 2, 4 or 8.
    pub element_width: u8,
    pub data: Vec<u64>,
}

/// The single non-register operand of an instruction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Special {
    #[default]
    None,
    Constant(i64),
    /// Relative branch offset in code units.
    Target(i32),
    String(String),
    Type(String),
    Field(FieldRef),
    Method(MethodRef),
    PackedSwitch(PackedSwitch),
    SparseSwitch(SparseSwitch),
    FillArrayData(FillArrayData),
}

impl Special {
    /// Whether this operand is what an opcode with `kind` carries.
    pub fn matches(&self, kind: SpecialKind) -> bool {
        matches!(
            (self, kind),
            (Special::None, SpecialKind::None)
                | (Special::Constant(_), SpecialKind::Constant)
                | (Special::Target(_), SpecialKind::Target)
                | (Special::String(_), SpecialKind::String)
                | (Special::Type(_), SpecialKind::Type)
                | (Special::Field(_), SpecialKind::Field)
                | (Special::Method(_), SpecialKind::Method)
        )
    }
}

/// One record of a method's instruction stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub registers: Vec<u16>,
    pub special: Special,
}

impl Instruction {
    pub fn new(opcode: Opcode, registers: Vec<u16>, special: Special) -> Self {
        Self {
            opcode,
            registers,
            special,
        }
    }

    /// A real instruction with no operands filled in yet.
    pub fn empty(opcode: Opcode) -> Self {
        Self::new(opcode, Vec::new(), Special::None)
    }

    /// A payload record carrying `special`.
    pub fn payload(special: Special) -> Self {
        Self::new(Opcode::NOP, Vec::new(), special)
    }

    pub fn payload_kind(&self) -> Option<PayloadKind> {
        if self.opcode != Opcode::NOP {
            return None;
        }
        match self.special {
            Special::PackedSwitch(_) => Some(PayloadKind::PackedSwitch),
            Special::SparseSwitch(_) => Some(PayloadKind::SparseSwitch),
            Special::FillArrayData(_) => Some(PayloadKind::FillArrayData),
            _ => None,
        }
    }

    #[inline]
    pub fn is_payload(&self) -> bool {
        self.payload_kind().is_some()
    }

    /// Width in code units.
    pub fn width(&self) -> u32 {
        match &self.special {
            Special::PackedSwitch(p) if self.opcode == Opcode::NOP => 4 + 2 * p.targets.len() as u32,
            Special::SparseSwitch(s) if self.opcode == Opcode::NOP => 2 + 4 * s.keys.len() as u32,
            Special::FillArrayData(d) if self.opcode == Opcode::NOP => {
                let bytes = d.data.len() as u32 * d.element_width as u32;
                4 + bytes.div_ceil(2)
            }
            _ => self.opcode.info().map_or(1, |i| i.format().units()),
        }
    }

    /// Append a register, checking it against the next slot of the format.
    pub fn push_register(&mut self, reg: u16) -> Result<(), RegisterError> {
        let info = self
            .opcode
            .info()
            .ok_or(RegisterError::UnknownOpcode(self.opcode.0))?;
        let format = info.format();
        let slot = self.registers.len();
        if slot >= format.max_registers() {
            return Err(RegisterError::TooMany {
                max: format.max_registers(),
            });
        }
        if format.is_range() && slot > 0 {
            let expected = self.registers[0].wrapping_add(slot as u16);
            if reg != expected {
                return Err(RegisterError::NonConsecutive {
                    expected,
                    found: reg,
                });
            }
        }
        let bits = format.slot_bits(slot).unwrap_or(0);
        if bits < 16 && u32::from(reg) >= 1u32 << bits {
            return Err(RegisterError::SlotOverflow { reg, slot, bits });
        }
        self.registers.push(reg);
        Ok(())
    }
}

/// Starting code-unit offset of each record.
pub fn code_offsets(insns: &[Instruction]) -> Vec<u32> {
    let mut pos = 0;
    insns
        .iter()
        .map(|insn| {
            let at = pos;
            pos += insn.width();
            at
        })
        .collect()
}
