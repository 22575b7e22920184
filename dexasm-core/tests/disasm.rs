mod common;

use std::collections::HashSet;
use std::path::Path;

use common::*;
use dexasm_core::disasm::source_path;
use dexasm_core::listing::{DataTable, PackedTable, SparseTable, TryTable};
use dexasm_core::{AliasTable, DisasmError, disassemble, disassemble_method};
use dexasm_core::{naming, schema};
use dexasm_ir::{Instruction, PackedSwitch, Special};
use dexasm_isa::Opcode;

#[test]
fn move_and_return() {
    let code = code(
        2,
        vec![
            insn(Opcode::MOVE, &[0, 1], Special::None),
            insn(Opcode::RETURN, &[0], Special::None),
        ],
    );
    let listing = disassemble_method("f", &code, &AliasTable::default()).unwrap();
    assert_eq!(listing.insns, ["L00: move v0 v1", "L01: return v0"]);
    assert_eq!(listing.registers, 2);
    assert!(listing.packed_switches.is_empty());
    assert!(listing.sparse_switches.is_empty());
    assert!(listing.data_arrays.is_empty());
    assert!(listing.try_blocks.is_empty());
}

#[test]
fn branch_targets_become_labels() {
    let code = code(
        2,
        vec![
            insn(Opcode::IF_EQ, &[0, 1], Special::Target(4)),
            insn(Opcode::CONST_4, &[0], Special::Constant(1)),
            insn(Opcode::CONST_4, &[1], Special::Constant(2)),
            insn(Opcode::RETURN_VOID, &[], Special::None),
        ],
    );
    let listing = disassemble_method("f", &code, &AliasTable::default()).unwrap();
    assert_eq!(
        listing.insns,
        [
            "L00: if-eq v0 v1 insn@L03",
            "L01: const/4 v0 #1",
            "L02: const/4 v1 #2",
            "L03: return-void",
        ]
    );
}

#[test]
fn packed_switch_table() {
    let code = code(
        1,
        vec![
            insn(Opcode::PACKED_SWITCH, &[0], Special::Target(7)),
            insn(Opcode::CONST_4, &[0], Special::Constant(1)),
            insn(Opcode::CONST_4, &[0], Special::Constant(2)),
            insn(Opcode::CONST_4, &[0], Special::Constant(3)),
            insn(Opcode::RETURN_VOID, &[], Special::None),
            Instruction::payload(Special::PackedSwitch(PackedSwitch {
                first_key: 5,
                targets: vec![3, 4, 6],
            })),
        ],
    );
    let listing = disassemble_method("f", &code, &AliasTable::default()).unwrap();
    assert_eq!(listing.insns[0], "L00: packed-switch v0 packed@0");
    assert_eq!(listing.insns.len(), 5);
    assert_eq!(
        listing.packed_switches,
        [PackedTable {
            first_key: 5,
            targets: vec!["L01".into(), "L02".into(), "L04".into()],
        }]
    );
}

#[test]
fn full_method_listing() {
    let file = sample_file();
    let main = &file.classes[0];
    let aliases = AliasTable::build(main);
    let listing = disassemble_method("run", &run_code(), &aliases).unwrap();

    assert_eq!(
        listing.insns,
        [
            "L00: const/4 v0 #-1",
            "L01: const-string v1 string@tab\\t\\\"q\\\" caf\\u00E9 \\uD83D\\uDE00\\\\",
            "L02: iget-object v2 v3 field@Main.if",
            "L03: if-eqz v4 insn@L11",
            "L04: packed-switch v4 packed@0",
            "L05: fill-array-data v2 data@0",
            "L06: invoke-static v1 method@Bare.do",
            "L07: invoke-virtual/range v3 v4 method@Main.run",
            "L08: sparse-switch v4 sparse@0",
            "L09: const-wide v0 #20015998343868",
            "L10: new-instance v2 type@com.example.Main$Node",
            "L11: return-void",
        ]
    );
    assert_eq!((listing.registers, listing.outs_size), (5, 2));
    assert_eq!(
        listing.packed_switches,
        [PackedTable {
            first_key: 5,
            targets: vec!["L06".into(), "L11".into()],
        }]
    );
    assert_eq!(
        listing.sparse_switches,
        [SparseTable {
            keys: vec![-3, 100],
            targets: vec!["L09".into(), "L03".into()],
        }]
    );
    assert_eq!(
        listing.data_arrays,
        [DataTable {
            element_width: 4,
            data: vec![1, 2, 0xFFFF_FFFF],
        }]
    );
    assert_eq!(listing.try_blocks.len(), 1);
    let TryTable {
        start_insn,
        insn_length,
        handlers,
        catch_all_target,
    } = &listing.try_blocks[0];
    assert_eq!(start_insn, "L06");
    assert_eq!(*insn_length, 2);
    assert_eq!(handlers[0].catch_type, "Ljava/lang/Exception;");
    assert_eq!(handlers[0].target, "L11");
    assert_eq!(catch_all_target, "L10");
}

#[test]
fn shared_data_payload_keeps_one_index() {
    let code = code(
        1,
        vec![
            insn(Opcode::FILL_ARRAY_DATA, &[0], Special::Target(7)),
            insn(Opcode::FILL_ARRAY_DATA, &[0], Special::Target(4)),
            insn(Opcode::RETURN_VOID, &[], Special::None),
            Instruction::payload(Special::FillArrayData(dexasm_ir::FillArrayData {
                element_width: 1,
                data: vec![7],
            })),
        ],
    );
    let listing = disassemble_method("f", &code, &AliasTable::default()).unwrap();
    assert_eq!(listing.insns[0], "L00: fill-array-data v0 data@0");
    assert_eq!(listing.insns[1], "L01: fill-array-data v0 data@0");
    assert_eq!(listing.data_arrays.len(), 1);
}

#[test]
fn labels_are_unique() {
    let listing = disassemble_method("run", &run_code(), &AliasTable::build(&sample_file().classes[0]))
        .unwrap();
    let labels: HashSet<_> = listing
        .insns
        .iter()
        .map(|l| l.split(':').next().unwrap())
        .collect();
    assert_eq!(labels.len(), listing.insns.len());
}

#[test]
fn inconsistent_input_is_an_internal_fault() {
    let into_middle = code(
        1,
        vec![
            insn(Opcode::GOTO_16, &[], Special::Target(1)),
            insn(Opcode::RETURN_VOID, &[], Special::None),
        ],
    );
    assert_eq!(
        disassemble_method("f", &into_middle, &AliasTable::default()),
        Err(DisasmError::UnmappedTarget {
            method: "f".into(),
            offset: 0,
            target: 1,
        })
    );

    let wrong_payload = code(
        1,
        vec![
            insn(Opcode::SPARSE_SWITCH, &[0], Special::Target(3)),
            Instruction::payload(Special::PackedSwitch(PackedSwitch {
                first_key: 0,
                targets: vec![],
            })),
        ],
    );
    assert!(matches!(
        disassemble_method("f", &wrong_payload, &AliasTable::default()),
        Err(DisasmError::PayloadMismatch {
            expected: "sparse-switch",
            ..
        })
    ));

    let type_only = code(
        1,
        vec![insn(
            Opcode::NEW_INSTANCE,
            &[0],
            Special::Type("La/B;".into()),
        )],
    );
    assert!(disassemble_method("f", &type_only, &AliasTable::default()).is_ok());
    let sample = sample_file();
    assert!(matches!(
        disassemble_method("run", &run_code(), &AliasTable::build(&sample.classes[2])),
        Err(DisasmError::MissingAlias { .. })
    ));
}

#[test]
fn aliases_are_injective() {
    let mut file = sample_file();
    schema::add_schema_classes(&mut file);
    let tree = naming::prepare(&mut file);
    for node in &tree.nodes {
        let methods: HashSet<_> = node.aliases.methods.values().collect();
        let fields: HashSet<_> = node.aliases.fields.values().collect();
        assert_eq!(methods.len(), node.aliases.methods.len());
        assert_eq!(fields.len(), node.aliases.fields.len());
    }
}

#[test]
fn output_paths_follow_packages() {
    assert_eq!(source_path("Lcom/example/Main;"), Path::new("com/example/Main.java"));
    assert_eq!(source_path("Ldexasm_default/Bare;"), Path::new("dexasm_default/Bare.java"));
}

#[test]
fn one_source_per_top_level_class() {
    let sources = disassemble(sample_file()).unwrap();
    let paths: Vec<_> = sources.iter().map(|s| s.path.clone()).collect();
    assert!(paths.contains(&Path::new("com/example/Main.java").to_path_buf()));
    assert!(paths.contains(&Path::new("dexasm_default/Bare.java").to_path_buf()));
    assert!(paths.contains(&Path::new("org/dexasm/schema/DexasmCode.java").to_path_buf()));
    assert!(!paths.iter().any(|p| p.to_string_lossy().contains("Node")));
    assert_eq!(sources.len(), 2 + schema::schema_classes().len());
}

fn main_source() -> String {
    let mut file = sample_file();
    schema::add_schema_classes(&mut file);
    let tree = naming::prepare(&mut file);
    dexasm_core::render_class(&file, &tree, 0).unwrap()
}

#[test]
fn class_header() {
    let text = main_source();
    assert!(text.starts_with(
        "package com.example;\n\n\
         import com.example.Main.Node;\n\
         import com.example.Main;\n\
         import java.lang.Object;\n\
         import org.dexasm.schema.DexasmCode;\n\n"
    ));
    assert!(text.contains("\npublic class Main {\n"));
    assert!(text.contains("@org.dexasm.schema.DexasmAliases(\n"));
    assert!(text.contains("      alias = \"Bare._dexasm_do\",\n"));
    assert!(text.contains("      clazz = dexasm_default.Bare.class,\n"));
    assert!(text.contains("      prototype = { void.class, java.lang.String.class }\n"));
    assert!(text.ends_with("  }\n}\n"));
}

#[test]
fn fields_and_static_values() {
    let text = main_source();
    assert!(text.contains("  public static final int COUNT = 3;\n  static final long LIMIT;\n\n"));
    assert!(text.contains("  private Node _dexasm_if;\n"));
}

#[test]
fn method_stubs() {
    let text = main_source();
    assert!(text.contains(
        "  static void dexasm_static() {\n  }\n  static {\n    // Edit me!\n    LIMIT = 0L;\n  }\n"
    ));
    assert!(text.contains("  public Main() {\n    super();\n  }\n"));
    assert!(text.contains("  public void run(int arg1) {\n  }\n"));
    assert!(text.contains("  public native int size() throws java.io.IOException;\n"));
}

#[test]
fn code_annotation() {
    let text = main_source();
    assert!(text.contains("  @DexasmCode(\n    registers = 5,\n    outsSize = 2,\n    insns = {\n"));
    assert!(text.contains("      \"L04: packed-switch v4 packed@0\",\n"));
    assert!(text.contains("      \"L11: return-void\"\n    },\n"));
    assert!(text.contains(
        "      @org.dexasm.schema.DexasmPacked(\n        firstKey = 5,\n        targets = { \"L06\", \"L11\" }\n      )\n"
    ));
    assert!(text.contains("        data = { 0x1, 0x2, 0xFFFFFFFFL }\n"));
    assert!(text.contains("        keys = { -3, 100 },\n"));
    assert!(text.contains("        startInsn = \"L06\",\n        insnLength = 2,\n"));
    assert!(text.contains(
        "handlers = { @org.dexasm.schema.DexasmHandler( catchType = java.lang.Exception.class, target = \"L11\" ) },"
    ));
    assert!(text.contains("        catchAllTarget = \"L10\"\n"));
    assert!(text.contains("    tryBlocks = {}\n"));
}

#[test]
fn nested_classes_render_inline() {
    let text = main_source();
    assert!(text.contains("\n  public static class Node {\n    public Node next;\n  }\n"));
}

#[test]
fn interfaces_and_default_package() {
    let mut file = sample_file();
    schema::add_schema_classes(&mut file);
    let tree = naming::prepare(&mut file);
    let bare = file
        .classes
        .iter()
        .position(|c| c.name == "Ldexasm_default/Bare;")
        .unwrap();
    let text = dexasm_core::render_class(&file, &tree, bare).unwrap();
    assert!(text.starts_with("package dexasm_default;\n\n"));
    assert!(text.contains("public final class Bare implements Runnable {\n"));
    assert!(text.contains("  public static void _dexasm_do(String arg1) {\n"));

    let code_index = file
        .classes
        .iter()
        .position(|c| c.name == schema::CODE)
        .unwrap();
    assert!(tree.node(code_index).outer.is_none());
    let text = dexasm_core::render_class(&file, &tree, code_index).unwrap();
    assert!(text.contains("public @interface DexasmCode {\n"));
    assert!(text.contains("  public abstract int registers();\n"));
}
