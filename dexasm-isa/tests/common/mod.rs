use dexasm_isa::*;

/// Look up a mnemonic, panicking with a readable message when it is missing.
pub fn op(name: &str) -> Opcode {
    Opcode::from_mnemonic(name).unwrap_or_else(|| panic!("no opcode named {name}"))
}

pub fn info(name: &str) -> &'static OpcodeInfo {
    op(name).info().unwrap()
}
