#![allow(dead_code)]

use dexasm_file::*;
use dexasm_ir::{
    FieldRef, FillArrayData, Handler, Instruction, MethodRef, PackedSwitch, Prototype, Special,
    TryBlock,
};
use dexasm_isa::Opcode;

pub fn proto(ret: &str, params: &[&str]) -> Prototype {
    Prototype::new(ret, params.iter().map(|p| p.to_string()).collect())
}

/// A container exercising every record kind the codec knows about.
pub fn sample_file() -> DexFile {
    let mut class = Class::new("Lcom/example/Sample;");
    class.source_file = Some("Sample.java".into());
    class.interfaces.push("Ljava/lang/Runnable;".into());
    class.annotations.push(Annotation::new(
        Visibility::Build,
        EncodedAnnotation::new("Lcom/example/Marker;")
            .with("n", Value::Int(-7))
            .with("tags", Value::Array(vec![Value::String("a\0b".into()), Value::Null]))
            .with("k", Value::Type("[J".into()))
            .with("on", Value::Boolean(true)),
    ));

    class.static_fields.push(Field::new(
        "LIMIT",
        "J",
        AccessFlags::PUBLIC | AccessFlags::STATIC | AccessFlags::FINAL,
    ));
    class.static_fields.push(Field::new(
        "NAME",
        "Ljava/lang/String;",
        AccessFlags::STATIC | AccessFlags::FINAL,
    ));
    class.static_values = vec![Value::Long(i64::MIN), Value::String("caf\u{e9} \u{1F600}".into())];
    class
        .instance_fields
        .push(Field::new("count", "I", AccessFlags::PRIVATE));

    let mut run = Method::new("run", proto("V", &[]), AccessFlags::PUBLIC);
    run.code = Some(Code {
        registers_size: 3,
        ins_size: 1,
        outs_size: 1,
        insns: vec![
            Instruction::new(Opcode::CONST_4, vec![0], Special::Constant(-8)),
            Instruction::new(
                Opcode::IGET,
                vec![1, 2],
                Special::Field(FieldRef::new("Lcom/example/Sample;", "count", "I")),
            ),
            Instruction::new(Opcode::PACKED_SWITCH, vec![1], Special::Target(7)),
            Instruction::new(
                Opcode::CONST_STRING,
                vec![0],
                Special::String("hi".into()),
            ),
            Instruction::new(
                Opcode::INVOKE_STATIC,
                vec![0],
                Special::Method(MethodRef::new(
                    "Lcom/example/Sample;",
                    "log",
                    proto("V", &["Ljava/lang/String;"]),
                )),
            ),
            Instruction::new(Opcode::RETURN_VOID, vec![], Special::None),
            Instruction::empty(Opcode::NOP),
            Instruction::payload(Special::PackedSwitch(PackedSwitch {
                first_key: -1,
                targets: vec![3, 5],
            })),
            Instruction::payload(Special::FillArrayData(FillArrayData {
                element_width: 8,
                data: vec![u64::MAX, 0],
            })),
        ],
        tries: vec![TryBlock {
            start_addr: 3,
            insn_count: 5,
            handlers: vec![Handler {
                catch_type: "Ljava/lang/Exception;".into(),
                addr: 8,
            }],
            catch_all: Some(8),
        }],
    });
    class.virtual_methods.push(run);

    let mut log = Method::new(
        "log",
        proto("V", &["Ljava/lang/String;"]),
        AccessFlags::PRIVATE | AccessFlags::STATIC | AccessFlags::NATIVE,
    );
    log.annotations.push(Annotation::new(
        Visibility::System,
        EncodedAnnotation::new("Ldalvik/annotation/Throws;").with(
            "value",
            Value::Array(vec![Value::Type("Ljava/io/IOException;".into())]),
        ),
    ));
    class.direct_methods.push(log);

    let mut empty = Class::new("LEmpty;");
    empty.superclass = None;
    empty.access = AccessFlags::PUBLIC | AccessFlags::INTERFACE | AccessFlags::ABSTRACT;

    DexFile {
        classes: vec![class, empty],
    }
}

/// Header bytes for an image holding `count` classes (count < 128).
pub fn header(count: u8) -> Vec<u8> {
    let mut out = MAGIC.to_vec();
    out.extend_from_slice(&VERSION.to_le_bytes());
    out.push(count);
    out
}
