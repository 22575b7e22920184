mod common;

use common::{proto, sample_file};
use dexasm_file::*;
use dexasm_ir::{FieldRef, MethodRef, Special};

#[test]
fn class_rename_reaches_every_reference() {
    let mut file = sample_file();
    let mut r = Renamer::new();
    r.rename_class("Lcom/example/Sample;", "Lcom/example/Renamed;");
    r.rename_class("Ljava/lang/Exception;", "Lx/Oops;");
    r.rename_class("Ljava/lang/String;", "Lx/Str;");
    r.apply(&mut file);

    let class = &file.classes[0];
    assert_eq!(class.name, "Lcom/example/Renamed;");
    assert_eq!(class.static_fields[1].type_, "Lx/Str;");
    let code = class.virtual_methods[0].code.as_ref().unwrap();
    let Special::Field(f) = &code.insns[1].special else {
        panic!("expected field operand");
    };
    assert_eq!(f.class, "Lcom/example/Renamed;");
    let Special::Method(m) = &code.insns[4].special else {
        panic!("expected method operand");
    };
    assert_eq!(m.proto.parameters, ["Lx/Str;"]);
    assert_eq!(code.tries[0].handlers[0].catch_type, "Lx/Oops;");
    assert_eq!(class.direct_methods[0].proto.parameters, ["Lx/Str;"]);
}

#[test]
fn member_renames_follow_references() {
    let mut file = sample_file();
    let mut r = Renamer::new();
    r.rename_field(FieldRef::new("Lcom/example/Sample;", "count", "I"), "total");
    r.rename_method(
        MethodRef::new(
            "Lcom/example/Sample;",
            "log",
            proto("V", &["Ljava/lang/String;"]),
        ),
        "trace",
    );
    r.apply(&mut file);

    let class = &file.classes[0];
    assert_eq!(class.instance_fields[0].name, "total");
    assert_eq!(class.direct_methods[0].name, "trace");
    let code = class.virtual_methods[0].code.as_ref().unwrap();
    assert!(matches!(&code.insns[1].special, Special::Field(f) if f.name == "total"));
    assert!(matches!(&code.insns[4].special, Special::Method(m) if m.name == "trace"));
}

#[test]
fn annotation_types_are_renamed() {
    let mut file = sample_file();
    let mut r = Renamer::new();
    r.rename_class("Lcom/example/Marker;", "LM;");
    r.rename_class("J", "I");
    r.apply(&mut file);
    let a = &file.classes[0].annotations[0];
    assert_eq!(a.type_(), "LM;");
    assert_eq!(a.body.get("k"), Some(&Value::Type("[I".into())));
}

#[test]
fn empty_renamer_is_a_no_op() {
    let mut file = sample_file();
    Renamer::new().apply(&mut file);
    assert_eq!(file, sample_file());
}
