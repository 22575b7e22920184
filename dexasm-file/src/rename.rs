//! Container-wide renaming of classes, fields and methods.
//!
//! Member renames are keyed on the reference as it looks *before* any class
//! rename is applied; [`Renamer::apply`] renames members first and classes
//! second, so both kinds can be queued against the original names.

use std::collections::HashMap;

use dexasm_ir::{FieldRef, MethodRef, Prototype, Special};

use crate::DexFile;
use crate::annotation::{Annotation, EncodedAnnotation, Value};

#[derive(Debug, Default)]
pub struct Renamer {
    classes: HashMap<String, String>,
    fields: HashMap<FieldRef, String>,
    methods: HashMap<MethodRef, String>,
}

impl Renamer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.fields.is_empty() && self.methods.is_empty()
    }

    /// Rename class descriptor `from` to `to`, including array element uses.
    pub fn rename_class(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.classes.insert(from.into(), to.into());
    }

    pub fn rename_field(&mut self, field: FieldRef, to: impl Into<String>) {
        self.fields.insert(field, to.into());
    }

    pub fn rename_method(&mut self, method: MethodRef, to: impl Into<String>) {
        self.methods.insert(method, to.into());
    }

    /// Rewrite every definition and reference in `file`.
    pub fn apply(&self, file: &mut DexFile) {
        if self.is_empty() {
            return;
        }
        log::debug!(
            "renaming {} classes, {} fields, {} methods",
            self.classes.len(),
            self.fields.len(),
            self.methods.len()
        );
        if !self.fields.is_empty() || !self.methods.is_empty() {
            self.apply_members(file);
        }
        if !self.classes.is_empty() {
            self.apply_classes(file);
        }
    }

    fn apply_members(&self, file: &mut DexFile) {
        for class in &mut file.classes {
            let owner = class.name.clone();
            for field in class.fields_mut() {
                if let Some(to) = self.fields.get(&field.reference(&owner)) {
                    field.name = to.clone();
                }
                annotations_members(self, &mut field.annotations);
            }
            for method in class.methods_mut() {
                if let Some(to) = self.methods.get(&method.reference(&owner)) {
                    method.name = to.clone();
                }
                annotations_members(self, &mut method.annotations);
                let Some(code) = &mut method.code else { continue };
                for insn in &mut code.insns {
                    match &mut insn.special {
                        Special::Field(f) => self.field_member(f),
                        Special::Method(m) => self.method_member(m),
                        _ => {}
                    }
                }
            }
            annotations_members(self, &mut class.annotations);
            for v in &mut class.static_values {
                value_members(self, v);
            }
        }
    }

    fn field_member(&self, f: &mut FieldRef) {
        if let Some(to) = self.fields.get(f) {
            f.name = to.clone();
        }
    }

    fn method_member(&self, m: &mut MethodRef) {
        if let Some(to) = self.methods.get(m) {
            m.name = to.clone();
        }
    }

    fn apply_classes(&self, file: &mut DexFile) {
        for class in &mut file.classes {
            self.ty(&mut class.name);
            if let Some(s) = &mut class.superclass {
                self.ty(s);
            }
            for i in &mut class.interfaces {
                self.ty(i);
            }
            self.annotations(&mut class.annotations);
            for v in &mut class.static_values {
                self.value(v);
            }
            for field in class.fields_mut() {
                self.ty(&mut field.type_);
                self.annotations(&mut field.annotations);
            }
            for method in class.methods_mut() {
                self.proto(&mut method.proto);
                self.annotations(&mut method.annotations);
                let Some(code) = &mut method.code else { continue };
                for insn in &mut code.insns {
                    match &mut insn.special {
                        Special::Type(t) => self.ty(t),
                        Special::Field(f) => self.field_ref(f),
                        Special::Method(m) => self.method_ref(m),
                        _ => {}
                    }
                }
                for t in &mut code.tries {
                    for h in &mut t.handlers {
                        self.ty(&mut h.catch_type);
                    }
                }
            }
        }
    }

    /// Rename a descriptor in place, looking through array dimensions.
    fn ty(&self, desc: &mut String) {
        let dims = desc.len() - desc.trim_start_matches('[').len();
        if let Some(to) = self.classes.get(&desc[dims..]) {
            *desc = format!("{}{to}", &desc[..dims]);
        }
    }

    fn proto(&self, proto: &mut Prototype) {
        self.ty(&mut proto.return_type);
        for p in &mut proto.parameters {
            self.ty(p);
        }
    }

    fn field_ref(&self, f: &mut FieldRef) {
        self.ty(&mut f.class);
        self.ty(&mut f.type_);
    }

    fn method_ref(&self, m: &mut MethodRef) {
        self.ty(&mut m.class);
        self.proto(&mut m.proto);
    }

    fn annotations(&self, list: &mut [Annotation]) {
        for a in list {
            self.encoded(&mut a.body);
        }
    }

    fn encoded(&self, a: &mut EncodedAnnotation) {
        self.ty(&mut a.type_);
        for e in &mut a.elements {
            self.value(&mut e.value);
        }
    }

    fn value(&self, v: &mut Value) {
        match v {
            Value::Type(t) => self.ty(t),
            Value::Field(f) | Value::Enum(f) => self.field_ref(f),
            Value::Method(m) => self.method_ref(m),
            Value::Array(items) => {
                for item in items {
                    self.value(item);
                }
            }
            Value::Annotation(a) => self.encoded(a),
            _ => {}
        }
    }
}

fn annotations_members(r: &Renamer, list: &mut [Annotation]) {
    for a in list {
        for e in &mut a.body.elements {
            value_members(r, &mut e.value);
        }
    }
}

fn value_members(r: &Renamer, v: &mut Value) {
    match v {
        Value::Field(f) | Value::Enum(f) => r.field_member(f),
        Value::Method(m) => r.method_member(m),
        Value::Array(items) => {
            for item in items {
                value_members(r, item);
            }
        }
        Value::Annotation(a) => {
            for e in &mut a.elements {
                value_members(r, &mut e.value);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::{Class, Code, Method};
    use crate::modifiers::AccessFlags;
    use dexasm_ir::Instruction;
    use dexasm_isa::Opcode;

    fn sample() -> DexFile {
        let mut class = Class::new("LFoo;");
        let mut method = Method::new(
            "run",
            Prototype::new("V", vec!["[LFoo;".into()]),
            AccessFlags::PUBLIC,
        );
        method.code = Some(Code {
            registers_size: 2,
            ins_size: 2,
            insns: vec![Instruction::new(
                Opcode::INVOKE_VIRTUAL,
                vec![0, 1],
                Special::Method(MethodRef::new(
                    "LFoo;",
                    "run",
                    Prototype::new("V", vec!["[LFoo;".into()]),
                )),
            )],
            ..Code::default()
        });
        class.virtual_methods.push(method);
        DexFile {
            classes: vec![class],
        }
    }

    #[test]
    fn members_are_keyed_on_original_class() {
        let mut file = sample();
        let mut r = Renamer::new();
        r.rename_class("LFoo;", "Lpkg/Bar;");
        r.rename_method(
            MethodRef::new("LFoo;", "run", Prototype::new("V", vec!["[LFoo;".into()])),
            "go",
        );
        r.apply(&mut file);

        let class = &file.classes[0];
        assert_eq!(class.name, "Lpkg/Bar;");
        let method = &class.virtual_methods[0];
        assert_eq!(method.name, "go");
        assert_eq!(method.proto.parameters, ["[Lpkg/Bar;"]);
        let Special::Method(m) = &method.code.as_ref().unwrap().insns[0].special else {
            panic!("expected method operand");
        };
        assert_eq!(m.class, "Lpkg/Bar;");
        assert_eq!(m.name, "go");
    }
}
