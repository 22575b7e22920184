//! Record-image decoder.

use dexasm_ir::{
    FieldRef, FillArrayData, Handler, Instruction, MethodRef, PackedSwitch, PayloadKind,
    Prototype, Special, SparseSwitch, TryBlock,
};
use dexasm_isa::{Opcode, SpecialKind};

use crate::annotation::{Annotation, Element, EncodedAnnotation, Value, Visibility};
use crate::class::{Class, Code, Field, Method};
use crate::error::{Error, Result};
use crate::leb128::{decode_sleb128, decode_uleb128};
use crate::modifiers::AccessFlags;
use crate::util::mutf8::decode_mutf8;
use crate::{DexFile, HEADER_SIZE, MAGIC, VERSION};

/// Parse a complete container image.
pub fn read(data: &[u8]) -> Result<DexFile> {
    if data.len() < HEADER_SIZE {
        return Err(Error::FileTooSmall(data.len()));
    }
    if &data[..MAGIC.len()] != MAGIC {
        return Err(Error::InvalidMagic);
    }
    let mut r = Reader::new(data, MAGIC.len());
    let version = r.u32_le()?;
    if version != VERSION {
        return Err(Error::UnsupportedVersion(version));
    }

    let count = r.count()?;
    let mut classes = Vec::with_capacity(count);
    for _ in 0..count {
        classes.push(r.class()?);
    }
    if r.pos != data.len() {
        log::warn!("{} trailing bytes after last class", data.len() - r.pos);
    }
    log::debug!("read {} classes", classes.len());
    Ok(DexFile { classes })
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    fn u8(&mut self) -> Result<u8> {
        let b = *self.data.get(self.pos).ok_or(Error::Truncated(self.pos))?;
        self.pos += 1;
        Ok(b)
    }

    fn u32_le(&mut self) -> Result<u32> {
        let bytes = self
            .data
            .get(self.pos..self.pos + 4)
            .ok_or(Error::Truncated(self.pos))?;
        self.pos += 4;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn uleb(&mut self) -> Result<u64> {
        let (v, n) = decode_uleb128(self.data, self.pos)?;
        self.pos += n;
        Ok(v)
    }

    fn sleb(&mut self) -> Result<i64> {
        let (v, n) = decode_sleb128(self.data, self.pos)?;
        self.pos += n;
        Ok(v)
    }

    fn uleb_as<T: TryFrom<u64>>(&mut self) -> Result<T> {
        let at = self.pos;
        T::try_from(self.uleb()?).map_err(|_| Error::InvalidLeb128(at))
    }

    fn sleb_i32(&mut self) -> Result<i32> {
        let at = self.pos;
        i32::try_from(self.sleb()?).map_err(|_| Error::InvalidLeb128(at))
    }

    /// Element count; every element takes at least one byte.
    fn count(&mut self) -> Result<usize> {
        let at = self.pos;
        let n: usize = self.uleb_as()?;
        if n > self.data.len() - self.pos {
            return Err(Error::Truncated(at));
        }
        Ok(n)
    }

    fn flag(&mut self) -> Result<bool> {
        let at = self.pos;
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            t => Err(Error::InvalidTag(t, at)),
        }
    }

    fn string(&mut self) -> Result<String> {
        let len = self.count()?;
        let start = self.pos;
        let bytes = &self.data[start..start + len];
        self.pos += len;
        decode_mutf8(bytes, start)
    }

    fn opt_string(&mut self) -> Result<Option<String>> {
        if self.flag()? {
            Ok(Some(self.string()?))
        } else {
            Ok(None)
        }
    }

    fn strings(&mut self) -> Result<Vec<String>> {
        let n = self.count()?;
        (0..n).map(|_| self.string()).collect()
    }

    fn access(&mut self) -> Result<AccessFlags> {
        Ok(AccessFlags::from_bits_retain(self.uleb_as()?))
    }

    fn proto(&mut self) -> Result<Prototype> {
        let return_type = self.string()?;
        let parameters = self.strings()?;
        Ok(Prototype::new(return_type, parameters))
    }

    fn field_ref(&mut self) -> Result<FieldRef> {
        let class = self.string()?;
        let name = self.string()?;
        let type_ = self.string()?;
        Ok(FieldRef::new(class, name, type_))
    }

    fn method_ref(&mut self) -> Result<MethodRef> {
        let class = self.string()?;
        let name = self.string()?;
        let proto = self.proto()?;
        Ok(MethodRef::new(class, name, proto))
    }

    fn class(&mut self) -> Result<Class> {
        let name = self.string()?;
        let access = self.access()?;
        let superclass = self.opt_string()?;
        let interfaces = self.strings()?;
        let source_file = self.opt_string()?;
        let annotations = self.annotations()?;
        let static_fields = self.fields()?;
        let instance_fields = self.fields()?;
        let direct_methods = self.methods()?;
        let virtual_methods = self.methods()?;
        let n = self.count()?;
        let static_values: Vec<Value> = (0..n).map(|_| self.value()).collect::<Result<_>>()?;
        log::trace!("class {name}: {} methods", direct_methods.len() + virtual_methods.len());
        Ok(Class {
            name,
            access,
            superclass,
            interfaces,
            source_file,
            annotations,
            static_fields,
            instance_fields,
            direct_methods,
            virtual_methods,
            static_values,
        })
    }

    fn fields(&mut self) -> Result<Vec<Field>> {
        let n = self.count()?;
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            let name = self.string()?;
            let type_ = self.string()?;
            let access = self.access()?;
            let annotations = self.annotations()?;
            out.push(Field {
                name,
                type_,
                access,
                annotations,
            });
        }
        Ok(out)
    }

    fn methods(&mut self) -> Result<Vec<Method>> {
        let n = self.count()?;
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            let name = self.string()?;
            let proto = self.proto()?;
            let access = self.access()?;
            let annotations = self.annotations()?;
            let code = if self.flag()? { Some(self.code()?) } else { None };
            out.push(Method {
                name,
                proto,
                access,
                annotations,
                code,
            });
        }
        Ok(out)
    }

    fn code(&mut self) -> Result<Code> {
        let registers_size = self.uleb_as()?;
        let ins_size = self.uleb_as()?;
        let outs_size = self.uleb_as()?;
        let n = self.count()?;
        let insns: Vec<Instruction> = (0..n).map(|_| self.instruction()).collect::<Result<_>>()?;
        let n = self.count()?;
        let tries: Vec<TryBlock> = (0..n).map(|_| self.try_block()).collect::<Result<_>>()?;
        Ok(Code {
            registers_size,
            ins_size,
            outs_size,
            insns,
            tries,
        })
    }

    fn instruction(&mut self) -> Result<Instruction> {
        let at = self.pos;
        let opcode = Opcode(self.u8()?);
        let info = opcode.info().ok_or(Error::UnknownOpcode(opcode.0, at))?;
        if opcode == Opcode::NOP {
            let tag_at = self.pos;
            let tag = self.u8()?;
            if tag != 0 {
                let kind = PayloadKind::from_tag(tag).ok_or(Error::InvalidTag(tag, tag_at))?;
                return Ok(Instruction::payload(self.payload(kind, at)?));
            }
        }

        let malformed = |reason: String| Error::MalformedInstruction { offset: at, reason };
        let mut insn = Instruction::empty(opcode);
        let n = self.count()?;
        for _ in 0..n {
            let reg = self.uleb_as()?;
            insn.push_register(reg)
                .map_err(|e| malformed(format!("{opcode}: {e}")))?;
        }
        let format = info.format();
        if !format.is_range() && !format.is_variable() && n != format.register_bits().len() {
            return Err(malformed(format!(
                "{opcode} takes {} registers, found {n}",
                format.register_bits().len()
            )));
        }

        insn.special = match info.special() {
            SpecialKind::None => Special::None,
            SpecialKind::Constant => {
                let v = self.sleb()?;
                if let Some(bits) = format.constant_bits() {
                    if bits < 64 && !fits_signed(v, bits) {
                        return Err(malformed(format!("{opcode}: literal {v} exceeds {bits} bits")));
                    }
                }
                Special::Constant(v)
            }
            SpecialKind::Target => Special::Target(self.sleb_i32()?),
            SpecialKind::String => Special::String(self.string()?),
            SpecialKind::Type => Special::Type(self.string()?),
            SpecialKind::Field => Special::Field(self.field_ref()?),
            SpecialKind::Method => Special::Method(self.method_ref()?),
        };
        Ok(insn)
    }

    fn payload(&mut self, kind: PayloadKind, at: usize) -> Result<Special> {
        Ok(match kind {
            PayloadKind::PackedSwitch => {
                let first_key = self.sleb_i32()?;
                let n = self.count()?;
                let targets: Vec<i32> = (0..n).map(|_| self.sleb_i32()).collect::<Result<_>>()?;
                Special::PackedSwitch(PackedSwitch { first_key, targets })
            }
            PayloadKind::SparseSwitch => {
                let n = self.count()?;
                let keys: Vec<i32> = (0..n).map(|_| self.sleb_i32()).collect::<Result<_>>()?;
                let targets: Vec<i32> = (0..n).map(|_| self.sleb_i32()).collect::<Result<_>>()?;
                Special::SparseSwitch(SparseSwitch { keys, targets })
            }
            PayloadKind::FillArrayData => {
                let element_width = self.u8()?;
                if !matches!(element_width, 1 | 2 | 4 | 8) {
                    return Err(Error::MalformedInstruction {
                        offset: at,
                        reason: format!("fill-array-data element width {element_width}"),
                    });
                }
                let n = self.count()?;
                let data: Vec<u64> = (0..n).map(|_| self.uleb()).collect::<Result<_>>()?;
                Special::FillArrayData(FillArrayData {
                    element_width,
                    data,
                })
            }
        })
    }

    fn try_block(&mut self) -> Result<TryBlock> {
        let start_addr = self.uleb_as()?;
        let insn_count = self.uleb_as()?;
        let n = self.count()?;
        let mut handlers = Vec::with_capacity(n);
        for _ in 0..n {
            let catch_type = self.string()?;
            let addr = self.uleb_as()?;
            handlers.push(Handler { catch_type, addr });
        }
        let catch_all = if self.flag()? { Some(self.uleb_as()?) } else { None };
        Ok(TryBlock {
            start_addr,
            insn_count,
            handlers,
            catch_all,
        })
    }

    fn annotations(&mut self) -> Result<Vec<Annotation>> {
        let n = self.count()?;
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            let at = self.pos;
            let v = self.u8()?;
            let visibility = Visibility::from_u8(v).ok_or(Error::InvalidTag(v, at))?;
            out.push(Annotation::new(visibility, self.encoded_annotation()?));
        }
        Ok(out)
    }

    fn encoded_annotation(&mut self) -> Result<EncodedAnnotation> {
        let type_ = self.string()?;
        let n = self.count()?;
        let mut elements = Vec::with_capacity(n);
        for _ in 0..n {
            let name = self.string()?;
            let value = self.value()?;
            elements.push(Element { name, value });
        }
        Ok(EncodedAnnotation { type_, elements })
    }

    fn value(&mut self) -> Result<Value> {
        let at = self.pos;
        let tag = self.u8()?;
        let bad = || Error::InvalidLeb128(at + 1);
        Ok(match tag {
            0x00 => Value::Byte(i8::try_from(self.sleb()?).map_err(|_| bad())?),
            0x02 => Value::Short(i16::try_from(self.sleb()?).map_err(|_| bad())?),
            0x03 => Value::Char(self.uleb_as()?),
            0x04 => Value::Int(self.sleb_i32()?),
            0x06 => Value::Long(self.sleb()?),
            0x10 => Value::Float(f32::from_bits(self.uleb_as()?)),
            0x11 => Value::Double(f64::from_bits(self.uleb()?)),
            0x17 => Value::String(self.string()?),
            0x18 => Value::Type(self.string()?),
            0x19 => Value::Field(self.field_ref()?),
            0x1a => Value::Method(self.method_ref()?),
            0x1b => Value::Enum(self.field_ref()?),
            0x1c => {
                let n = self.count()?;
                Value::Array((0..n).map(|_| self.value()).collect::<Result<Vec<_>>>()?)
            }
            0x1d => Value::Annotation(self.encoded_annotation()?),
            0x1e => Value::Null,
            0x1f => Value::Boolean(self.flag()?),
            t => return Err(Error::InvalidTag(t, at)),
        })
    }
}

fn fits_signed(v: i64, bits: u32) -> bool {
    let min = -(1i64 << (bits - 1));
    let max = (1i64 << (bits - 1)) - 1;
    (min..=max).contains(&v)
}
