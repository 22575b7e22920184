#![allow(dead_code)]

use dexasm_core::Listing;
use dexasm_file::*;
use dexasm_ir::{
    FieldRef, FillArrayData, Handler, Instruction, MethodRef, PackedSwitch, Prototype, Special,
    SparseSwitch, TryBlock,
};
use dexasm_isa::Opcode;

pub fn proto(ret: &str, params: &[&str]) -> Prototype {
    Prototype::new(ret, params.iter().map(|p| p.to_string()).collect())
}

pub fn insn(opcode: Opcode, registers: &[u16], special: Special) -> Instruction {
    Instruction::new(opcode, registers.to_vec(), special)
}

pub fn code(registers_size: u16, insns: Vec<Instruction>) -> Code {
    Code {
        registers_size,
        insns,
        ..Code::default()
    }
}

pub fn listing(registers: u16, lines: &[&str]) -> Listing {
    Listing {
        registers,
        insns: lines.iter().map(|l| l.to_string()).collect(),
        ..Listing::default()
    }
}

const MAIN: &str = "Lcom/example/Main;";
const NODE: &str = "Lcom/example/Main$Node;";
const BARE: &str = "LBare;";

/// Body of `Main.run(I)V`, payloads placed after the code in reference order.
///
/// ```text
///  0 const/4          11 return-void
///  1 const-string     30 packed payload
///  3 iget-object      38 fill payload
///  5 if-eqz           48 sparse payload
///  7 packed-switch
/// 10 fill-array-data
/// 13 invoke-static    (try start)
/// 16 invoke-virtual/range
/// 19 sparse-switch
/// 22 const-wide
/// 27 new-instance
/// 29 return-void
/// ```
pub fn run_code() -> Code {
    Code {
        registers_size: 5,
        ins_size: 2,
        outs_size: 2,
        insns: vec![
            insn(Opcode::CONST_4, &[0], Special::Constant(-1)),
            insn(
                Opcode::CONST_STRING,
                &[1],
                Special::String("tab\t\"q\" caf\u{e9} \u{1F600}\\".into()),
            ),
            insn(
                Opcode::IGET_OBJECT,
                &[2, 3],
                Special::Field(FieldRef::new(MAIN, "if", NODE)),
            ),
            insn(Opcode::IF_EQZ, &[4], Special::Target(24)),
            insn(Opcode::PACKED_SWITCH, &[4], Special::Target(23)),
            insn(Opcode::FILL_ARRAY_DATA, &[2], Special::Target(28)),
            insn(
                Opcode::INVOKE_STATIC,
                &[1],
                Special::Method(MethodRef::new(BARE, "do", proto("V", &["Ljava/lang/String;"]))),
            ),
            insn(
                Opcode::INVOKE_VIRTUAL_RANGE,
                &[3, 4],
                Special::Method(MethodRef::new(MAIN, "run", proto("V", &["I"]))),
            ),
            insn(Opcode::SPARSE_SWITCH, &[4], Special::Target(29)),
            insn(Opcode::CONST_WIDE, &[0], Special::Constant(0x1234_5678_9ABC)),
            insn(Opcode::NEW_INSTANCE, &[2], Special::Type(NODE.into())),
            insn(Opcode::RETURN_VOID, &[], Special::None),
            Instruction::payload(Special::PackedSwitch(PackedSwitch {
                first_key: 5,
                targets: vec![6, 22],
            })),
            Instruction::payload(Special::FillArrayData(FillArrayData {
                element_width: 4,
                data: vec![1, 2, 0xFFFF_FFFF],
            })),
            Instruction::payload(Special::SparseSwitch(SparseSwitch {
                keys: vec![-3, 100],
                targets: vec![3, -14],
            })),
        ],
        tries: vec![TryBlock {
            start_addr: 13,
            insn_count: 6,
            handlers: vec![Handler {
                catch_type: "Ljava/lang/Exception;".into(),
                addr: 29,
            }],
            catch_all: Some(27),
        }],
    }
}

/// A small application: a class with a nested class, a class without a
/// package, illegal member names, static values and initializers.
pub fn sample_file() -> DexFile {
    let mut main = Class::new(MAIN);
    main.access = AccessFlags::PUBLIC;
    main.superclass = Some("Ljava/lang/Object;".into());
    main.annotations.push(Annotation::new(
        Visibility::Runtime,
        EncodedAnnotation::new("Lcom/example/Marker;").with("value", Value::Type(NODE.into())),
    ));
    main.static_fields.push(Field::new(
        "COUNT",
        "I",
        AccessFlags::PUBLIC | AccessFlags::STATIC | AccessFlags::FINAL,
    ));
    main.static_fields.push(Field::new(
        "LIMIT",
        "J",
        AccessFlags::STATIC | AccessFlags::FINAL,
    ));
    main.static_values = vec![Value::Int(3)];
    main.instance_fields
        .push(Field::new("if", NODE, AccessFlags::PRIVATE));

    let mut clinit = Method::new(
        "<clinit>",
        proto("V", &[]),
        AccessFlags::STATIC | AccessFlags::CONSTRUCTOR,
    );
    clinit.code = Some(code(
        2,
        vec![
            insn(Opcode::CONST_WIDE, &[0], Special::Constant(-1)),
            insn(
                Opcode::SPUT_WIDE,
                &[0],
                Special::Field(FieldRef::new(MAIN, "LIMIT", "J")),
            ),
            insn(Opcode::RETURN_VOID, &[], Special::None),
        ],
    ));
    let mut init = Method::new(
        "<init>",
        proto("V", &[]),
        AccessFlags::PUBLIC | AccessFlags::CONSTRUCTOR,
    );
    init.code = Some(Code {
        registers_size: 1,
        ins_size: 1,
        outs_size: 1,
        insns: vec![
            insn(
                Opcode::INVOKE_DIRECT,
                &[0],
                Special::Method(MethodRef::new("Ljava/lang/Object;", "<init>", proto("V", &[]))),
            ),
            insn(Opcode::RETURN_VOID, &[], Special::None),
        ],
        tries: Vec::new(),
    });
    main.direct_methods = vec![clinit, init];

    let mut run = Method::new("run", proto("V", &["I"]), AccessFlags::PUBLIC);
    run.code = Some(run_code());
    let mut size = Method::new(
        "size",
        proto("I", &[]),
        AccessFlags::PUBLIC | AccessFlags::NATIVE,
    );
    size.annotations.push(Annotation::new(
        Visibility::System,
        EncodedAnnotation::new("Ldalvik/annotation/Throws;").with(
            "value",
            Value::Array(vec![Value::Type("Ljava/io/IOException;".into())]),
        ),
    ));
    main.virtual_methods = vec![run, size];

    let mut node = Class::new(NODE);
    node.access = AccessFlags::STATIC;
    node.superclass = Some("Ljava/lang/Object;".into());
    node.annotations.push(Annotation::new(
        Visibility::System,
        EncodedAnnotation::new("Ldalvik/annotation/InnerClass;")
            .with("accessFlags", Value::Int(AccessFlags::STATIC.bits() as i32))
            .with("name", Value::String("Node".into())),
    ));
    node.instance_fields
        .push(Field::new("next", NODE, AccessFlags::PUBLIC));

    let mut bare = Class::new(BARE);
    bare.access = AccessFlags::PUBLIC | AccessFlags::FINAL;
    bare.superclass = Some("Ljava/lang/Object;".into());
    bare.interfaces.push("Ljava/lang/Runnable;".into());
    let mut do_ = Method::new(
        "do",
        proto("V", &["Ljava/lang/String;"]),
        AccessFlags::PUBLIC | AccessFlags::STATIC,
    );
    do_.code = Some(Code {
        registers_size: 1,
        ins_size: 1,
        ..code(1, vec![insn(Opcode::RETURN_VOID, &[], Special::None)])
    });
    bare.direct_methods.push(do_);

    DexFile {
        classes: vec![main, node, bare],
    }
}
