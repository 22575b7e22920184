mod common;

use common::{info, op};
use dexasm_isa::*;

#[test]
fn classic_opcode_values() {
    assert_eq!(op("nop"), Opcode::NOP);
    assert_eq!(op("move").0, 0x01);
    assert_eq!(op("return-void").0, 0x0e);
    assert_eq!(op("const/4").0, 0x12);
    assert_eq!(op("packed-switch").0, 0x2b);
    assert_eq!(op("invoke-virtual").0, 0x6e);
    assert_eq!(op("invoke-virtual/range").0, 0x74);
    assert_eq!(op("rsub-int/lit8").0, 0xd9);
}

#[test]
fn named_constants_follow_mnemonics() {
    assert_eq!(Opcode::CONST_4.mnemonic(), "const/4");
    assert_eq!(Opcode::INVOKE_STATIC_RANGE.mnemonic(), "invoke-static/range");
    assert_eq!(Opcode::ADD_INT_LIT8.mnemonic(), "add-int/lit8");
}

#[test]
fn unknown_mnemonic_is_rejected() {
    assert_eq!(Opcode::from_mnemonic("mov"), None);
    assert_eq!(Opcode::from_mnemonic(""), None);
    assert_eq!(Opcode::from_mnemonic("MOVE"), None);
}

#[test]
fn special_kind_is_fixed_by_opcode() {
    assert_eq!(info("const-string").special(), SpecialKind::String);
    assert_eq!(info("const-string/jumbo").format(), Format::F31c);
    assert_eq!(info("new-instance").special(), SpecialKind::Type);
    assert_eq!(info("iget").special(), SpecialKind::Field);
    assert_eq!(info("sget-object").format(), Format::F21c);
    assert_eq!(info("invoke-direct").special(), SpecialKind::Method);
    assert_eq!(info("goto/32").special(), SpecialKind::Target);
    assert_eq!(info("const-wide").special(), SpecialKind::Constant);
    assert_eq!(info("move").special(), SpecialKind::None);
}

#[test]
fn range_and_variable_formats() {
    assert!(info("invoke-static/range").format().is_range());
    assert!(info("filled-new-array").format().is_variable());
    assert!(!info("move/16").format().is_range());
    assert_eq!(info("invoke-super").format().max_registers(), 5);
}

#[test]
fn instruction_widths() {
    assert_eq!(info("move").format().units(), 1);
    assert_eq!(info("if-eq").format().units(), 2);
    assert_eq!(info("fill-array-data").format().units(), 3);
    assert_eq!(info("const-wide").format().units(), 5);
}

#[test]
fn control_flow_flags() {
    assert!(info("goto").flags().contains(OpcodeFlags::BRANCH));
    assert!(!info("goto").flags().contains(OpcodeFlags::CONTINUE));
    assert!(info("return-object").flags().contains(OpcodeFlags::RETURN));
    assert!(info("sparse-switch").flags().contains(OpcodeFlags::SWITCH));
    assert!(info("throw").flags().contains(OpcodeFlags::THROW));
}

#[test]
fn table_has_no_gaps_in_defined_ranges() {
    let defined: Vec<u8> = opcodes().map(|(op, _)| op.0).collect();
    for v in 0x00..=0x3d {
        assert!(defined.contains(&v), "{v:#04x} missing");
    }
    for v in 0x44..=0x72 {
        assert!(defined.contains(&v), "{v:#04x} missing");
    }
    assert!(!defined.contains(&0xe3));
}
