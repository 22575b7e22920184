use std::fmt;

/// Dalvik instruction formats.
///
/// The name follows the usual `<units><registers><kind>` convention: `35c`
/// is three code units, up to five registers, a constant-pool reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    F10x,
    F12x,
    F11n,
    F11x,
    F10t,
    F20t,
    F22x,
    F21t,
    F21s,
    F21h,
    F21c,
    F23x,
    F22b,
    F22t,
    F22s,
    F22c,
    F30t,
    F32x,
    F31i,
    F31t,
    F31c,
    F35c,
    F3rc,
    F51l,
}

/// Largest register count a `35c` instruction can carry.
pub const MAX_VARIABLE_REGISTERS: usize = 5;

/// Largest register count a `3rc` instruction can carry.
pub const MAX_RANGE_REGISTERS: usize = 255;

impl Format {
    /// Width of an instruction in this format, in 16-bit code units.
    pub const fn units(self) -> u32 {
        use Format::*;
        match self {
            F10x | F12x | F11n | F11x | F10t => 1,
            F20t | F22x | F21t | F21s | F21h | F21c | F23x | F22b | F22t | F22s | F22c => 2,
            F30t | F32x | F31i | F31t | F31c | F35c | F3rc => 3,
            F51l => 5,
        }
    }

    /// Bit widths of the fixed register slots, in operand order.
    ///
    /// Range and variable formats return their per-register width once;
    /// the actual count comes from the instruction.
    pub const fn register_bits(self) -> &'static [u8] {
        use Format::*;
        match self {
            F10x | F10t | F20t | F30t => &[],
            F12x | F22t | F22s | F22c => &[4, 4],
            F11n => &[4],
            F11x | F21t | F21s | F21h | F21c | F31i | F31t | F31c | F51l => &[8],
            F22x => &[8, 16],
            F23x => &[8, 8, 8],
            F22b => &[8, 8],
            F32x => &[16, 16],
            F35c => &[4],
            F3rc => &[16],
        }
    }

    /// `3rc`: a run of consecutive registers.
    pub const fn is_range(self) -> bool {
        matches!(self, Format::F3rc)
    }

    /// `35c`: up to five arbitrary registers.
    pub const fn is_variable(self) -> bool {
        matches!(self, Format::F35c)
    }

    /// Bit width of register slot `index`.
    pub fn slot_bits(self, index: usize) -> Option<u8> {
        if self.is_range() || self.is_variable() {
            return Some(self.register_bits()[0]);
        }
        self.register_bits().get(index).copied()
    }

    /// Maximum register count for this format.
    pub const fn max_registers(self) -> usize {
        if self.is_range() {
            MAX_RANGE_REGISTERS
        } else if self.is_variable() {
            MAX_VARIABLE_REGISTERS
        } else {
            self.register_bits().len()
        }
    }

    /// Bit width of the literal field, for formats that carry one.
    pub const fn constant_bits(self) -> Option<u32> {
        use Format::*;
        match self {
            F11n => Some(4),
            F22b => Some(8),
            F21s | F21h | F22s => Some(16),
            F31i => Some(32),
            F51l => Some(64),
            _ => None,
        }
    }

    /// Bit width of the relative branch field, for formats that carry one.
    pub const fn target_bits(self) -> Option<u32> {
        use Format::*;
        match self {
            F10t => Some(8),
            F20t | F21t | F22t => Some(16),
            F30t | F31t => Some(32),
            _ => None,
        }
    }

    pub const fn id(self) -> &'static str {
        use Format::*;
        match self {
            F10x => "10x",
            F12x => "12x",
            F11n => "11n",
            F11x => "11x",
            F10t => "10t",
            F20t => "20t",
            F22x => "22x",
            F21t => "21t",
            F21s => "21s",
            F21h => "21h",
            F21c => "21c",
            F23x => "23x",
            F22b => "22b",
            F22t => "22t",
            F22s => "22s",
            F22c => "22c",
            F30t => "30t",
            F32x => "32x",
            F31i => "31i",
            F31t => "31t",
            F31c => "31c",
            F35c => "35c",
            F3rc => "3rc",
            F51l => "51l",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_follows_name() {
        for f in [Format::F10x, Format::F22c, Format::F35c, Format::F51l] {
            let first = f.id().as_bytes()[0] - b'0';
            assert_eq!(f.units(), first as u32);
        }
    }

    #[test]
    fn slot_bits_for_variable_formats() {
        assert_eq!(Format::F35c.slot_bits(4), Some(4));
        assert_eq!(Format::F3rc.slot_bits(100), Some(16));
        assert_eq!(Format::F12x.slot_bits(2), None);
        assert_eq!(Format::F22x.slot_bits(1), Some(16));
    }

    #[test]
    fn literal_field_widths() {
        assert_eq!(Format::F11n.constant_bits(), Some(4));
        assert_eq!(Format::F51l.constant_bits(), Some(64));
        assert_eq!(Format::F21c.constant_bits(), None);
        assert_eq!(Format::F10t.target_bits(), Some(8));
        assert_eq!(Format::F31t.target_bits(), Some(32));
    }
}
