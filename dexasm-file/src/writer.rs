//! Record-image encoder, the inverse of [`crate::reader`].

use dexasm_ir::{FieldRef, Instruction, MethodRef, Prototype, Special, TryBlock};
use dexasm_isa::Opcode;

use crate::annotation::{Annotation, EncodedAnnotation, Value};
use crate::class::{Class, Code, Field, Method};
use crate::leb128::{encode_sleb128, encode_uleb128};
use crate::util::mutf8::encode_mutf8;
use crate::{DexFile, MAGIC, VERSION};

/// Serialize `file` into a container image.
pub fn write(file: &DexFile) -> Vec<u8> {
    let mut w = Writer::default();
    w.out.extend_from_slice(MAGIC);
    w.out.extend_from_slice(&VERSION.to_le_bytes());
    w.uleb(file.classes.len() as u64);
    for class in &file.classes {
        w.class(class);
    }
    log::debug!("wrote {} classes, {} bytes", file.classes.len(), w.out.len());
    w.out
}

#[derive(Default)]
struct Writer {
    out: Vec<u8>,
}

impl Writer {
    fn u8(&mut self, v: u8) {
        self.out.push(v);
    }

    fn uleb(&mut self, v: u64) {
        encode_uleb128(&mut self.out, v);
    }

    fn sleb(&mut self, v: i64) {
        encode_sleb128(&mut self.out, v);
    }

    fn string(&mut self, s: &str) {
        let bytes = encode_mutf8(s);
        self.uleb(bytes.len() as u64);
        self.out.extend_from_slice(&bytes);
    }

    fn opt_string(&mut self, s: Option<&str>) {
        match s {
            Some(s) => {
                self.u8(1);
                self.string(s);
            }
            None => self.u8(0),
        }
    }

    fn strings(&mut self, list: &[String]) {
        self.uleb(list.len() as u64);
        for s in list {
            self.string(s);
        }
    }

    fn proto(&mut self, proto: &Prototype) {
        self.string(&proto.return_type);
        self.strings(&proto.parameters);
    }

    fn field_ref(&mut self, r: &FieldRef) {
        self.string(&r.class);
        self.string(&r.name);
        self.string(&r.type_);
    }

    fn method_ref(&mut self, r: &MethodRef) {
        self.string(&r.class);
        self.string(&r.name);
        self.proto(&r.proto);
    }

    fn class(&mut self, class: &Class) {
        self.string(&class.name);
        self.uleb(class.access.bits().into());
        self.opt_string(class.superclass.as_deref());
        self.strings(&class.interfaces);
        self.opt_string(class.source_file.as_deref());
        self.annotations(&class.annotations);
        self.fields(&class.static_fields);
        self.fields(&class.instance_fields);
        self.methods(&class.direct_methods);
        self.methods(&class.virtual_methods);
        self.uleb(class.static_values.len() as u64);
        for v in &class.static_values {
            self.value(v);
        }
    }

    fn fields(&mut self, fields: &[Field]) {
        self.uleb(fields.len() as u64);
        for f in fields {
            self.string(&f.name);
            self.string(&f.type_);
            self.uleb(f.access.bits().into());
            self.annotations(&f.annotations);
        }
    }

    fn methods(&mut self, methods: &[Method]) {
        self.uleb(methods.len() as u64);
        for m in methods {
            self.string(&m.name);
            self.proto(&m.proto);
            self.uleb(m.access.bits().into());
            self.annotations(&m.annotations);
            match &m.code {
                Some(code) => {
                    self.u8(1);
                    self.code(code);
                }
                None => self.u8(0),
            }
        }
    }

    fn code(&mut self, code: &Code) {
        self.uleb(code.registers_size.into());
        self.uleb(code.ins_size.into());
        self.uleb(code.outs_size.into());
        self.uleb(code.insns.len() as u64);
        for insn in &code.insns {
            self.instruction(insn);
        }
        self.uleb(code.tries.len() as u64);
        for t in &code.tries {
            self.try_block(t);
        }
    }

    fn instruction(&mut self, insn: &Instruction) {
        self.u8(insn.opcode.0);
        if let Some(kind) = insn.payload_kind() {
            self.u8(kind.tag());
            match &insn.special {
                Special::PackedSwitch(p) => {
                    self.sleb(p.first_key.into());
                    self.uleb(p.targets.len() as u64);
                    for &t in &p.targets {
                        self.sleb(t.into());
                    }
                }
                Special::SparseSwitch(s) => {
                    self.uleb(s.keys.len() as u64);
                    for &k in &s.keys {
                        self.sleb(k.into());
                    }
                    for &t in &s.targets {
                        self.sleb(t.into());
                    }
                }
                Special::FillArrayData(d) => {
                    self.u8(d.element_width);
                    self.uleb(d.data.len() as u64);
                    for &v in &d.data {
                        self.uleb(v);
                    }
                }
                _ => {}
            }
            return;
        }
        if insn.opcode == Opcode::NOP {
            self.u8(0);
        }

        self.uleb(insn.registers.len() as u64);
        for &r in &insn.registers {
            self.uleb(r.into());
        }
        match &insn.special {
            Special::Constant(v) => self.sleb(*v),
            Special::Target(t) => self.sleb((*t).into()),
            Special::String(s) | Special::Type(s) => self.string(s),
            Special::Field(f) => self.field_ref(f),
            Special::Method(m) => self.method_ref(m),
            _ => {}
        }
    }

    fn try_block(&mut self, t: &TryBlock) {
        self.uleb(t.start_addr.into());
        self.uleb(t.insn_count.into());
        self.uleb(t.handlers.len() as u64);
        for h in &t.handlers {
            self.string(&h.catch_type);
            self.uleb(h.addr.into());
        }
        match t.catch_all {
            Some(addr) => {
                self.u8(1);
                self.uleb(addr.into());
            }
            None => self.u8(0),
        }
    }

    fn annotations(&mut self, list: &[Annotation]) {
        self.uleb(list.len() as u64);
        for a in list {
            self.u8(a.visibility as u8);
            self.encoded_annotation(&a.body);
        }
    }

    fn encoded_annotation(&mut self, a: &EncodedAnnotation) {
        self.string(&a.type_);
        self.uleb(a.elements.len() as u64);
        for e in &a.elements {
            self.string(&e.name);
            self.value(&e.value);
        }
    }

    fn value(&mut self, v: &Value) {
        self.u8(v.tag());
        match v {
            Value::Byte(b) => self.sleb((*b).into()),
            Value::Short(s) => self.sleb((*s).into()),
            Value::Char(c) => self.uleb((*c).into()),
            Value::Int(i) => self.sleb((*i).into()),
            Value::Long(l) => self.sleb(*l),
            Value::Float(f) => self.uleb(f.to_bits().into()),
            Value::Double(d) => self.uleb(d.to_bits()),
            Value::String(s) | Value::Type(s) => self.string(s),
            Value::Field(f) | Value::Enum(f) => self.field_ref(f),
            Value::Method(m) => self.method_ref(m),
            Value::Array(items) => {
                self.uleb(items.len() as u64);
                for item in items {
                    self.value(item);
                }
            }
            Value::Annotation(a) => self.encoded_annotation(a),
            Value::Null => {}
            Value::Boolean(b) => self.u8(u8::from(*b)),
        }
    }
}
