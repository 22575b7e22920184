//! Two-pass reassembler: listings back to method bodies.
//!
//! Pass one strips labels, resolves mnemonics and lays out the declared
//! instructions. Pass two parses operands and appends synthesized switch and
//! data payloads after the declared code, so label offsets from pass one stay
//! valid throughout.

use std::collections::HashMap;

use dexasm_file::annotation::{self, Annotation, Value};
use dexasm_file::descriptor::type_name;
use dexasm_file::{AccessFlags, Class, Code, DexFile};
use dexasm_ir::{
    FieldRef, FillArrayData, Handler, Instruction, MethodRef, PackedSwitch, RegisterError,
    Special, SparseSwitch, TryBlock,
};
use dexasm_isa::{Opcode, SpecialKind};

use crate::error::{LocatedError, Location, ReasmError, ReasmErrorKind, SchemaError};
use crate::listing::Listing;
use crate::naming;
use crate::schema::{self, AliasBlock};

const INNER_CLASS: &str = "Ldalvik/annotation/InnerClass;";

/// Alias lookup recovered from a class's alias block.
#[derive(Debug, Clone, Default)]
pub struct Aliases {
    methods: HashMap<String, MethodRef>,
    fields: HashMap<String, FieldRef>,
}

impl From<AliasBlock> for Aliases {
    fn from(block: AliasBlock) -> Self {
        Self {
            methods: block.methods.into_iter().collect(),
            fields: block.fields.into_iter().collect(),
        }
    }
}

impl Aliases {
    pub fn method(&self, alias: &str) -> Option<&MethodRef> {
        self.methods.get(alias)
    }

    pub fn field(&self, alias: &str) -> Option<&FieldRef> {
        self.fields.get(alias)
    }
}

/// Split off the first whitespace-delimited token.
fn token(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(pos) => (&s[..pos], s[pos..].trim_start()),
        None => (s, ""),
    }
}

/// The single token of an operand, rejecting anything after it.
fn sole(s: &str) -> Result<&str, ReasmErrorKind> {
    match token(s) {
        (tok, "") => Ok(tok),
        (_, rest) => Err(ReasmErrorKind::TrailingText(rest.to_string())),
    }
}

/// `-?[0-9]+` as an `i64`.
fn literal(s: &str) -> Option<i64> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn fits(value: i64, bits: u32) -> bool {
    bits >= 64 || (-(1i64 << (bits - 1))..(1i64 << (bits - 1))).contains(&value)
}

/// One declared instruction after pass one.
struct Decl<'a> {
    opcode: Opcode,
    operands: &'a str,
    pos: u32,
}

struct Assembler<'a> {
    listing: &'a Listing,
    aliases: &'a Aliases,
    labels: HashMap<&'a str, u32>,
    /// Code offset of a declared instruction to its index.
    indices: HashMap<u32, usize>,
    decls: Vec<Decl<'a>>,
    /// End of the emitted stream, where the next payload goes.
    end: u32,
    payloads: Vec<Instruction>,
    /// `data@N` to the offset of its payload.
    data_at: HashMap<usize, u32>,
}

impl<'a> Assembler<'a> {
    fn layout(listing: &'a Listing, aliases: &'a Aliases) -> Result<Self, LocatedError> {
        let mut labels = HashMap::new();
        let mut indices = HashMap::new();
        let mut decls = Vec::with_capacity(listing.insns.len());
        let mut pos = 0;
        for (i, line) in listing.insns.iter().enumerate() {
            let mut text = line.as_str();
            let at = text.find('@');
            if let Some(colon) = text.find(':').filter(|&c| at.is_none_or(|a| c < a)) {
                labels.insert(text[..colon].trim(), pos);
                text = &text[colon + 1..];
            }
            indices.insert(pos, i);

            let (mnemonic, operands) = token(text);
            let opcode = Opcode::from_mnemonic(mnemonic).ok_or_else(|| {
                LocatedError::new(
                    Location::Insn(i),
                    ReasmErrorKind::UnknownMnemonic(mnemonic.to_string()),
                )
            })?;
            decls.push(Decl {
                opcode,
                operands,
                pos,
            });
            pos += Instruction::empty(opcode).width();
        }
        Ok(Self {
            listing,
            aliases,
            labels,
            indices,
            decls,
            end: pos,
            payloads: Vec::new(),
            data_at: HashMap::new(),
        })
    }

    fn label(&self, name: &str) -> Result<u32, ReasmErrorKind> {
        self.labels
            .get(name)
            .copied()
            .ok_or_else(|| ReasmErrorKind::UnknownLabel(name.to_string()))
    }

    fn emit_payload(&mut self, special: Special) -> u32 {
        let payload = Instruction::payload(special);
        let at = self.end;
        self.end += payload.width();
        self.payloads.push(payload);
        at
    }

    fn instruction(&mut self, i: usize) -> Result<Instruction, ReasmErrorKind> {
        let listing = self.listing;
        let decl = &self.decls[i];
        let (opcode, cur) = (decl.opcode, decl.pos);
        let info = opcode
            .info()
            .ok_or_else(|| ReasmErrorKind::UnknownMnemonic(opcode.mnemonic().to_string()))?;
        let format = info.format();
        let open = format.is_range() || format.is_variable();
        let fixed = if open { 0 } else { format.register_bits().len() };

        let mut insn = Instruction::empty(opcode);
        let mut rest = decl.operands;
        let mut j = 0;
        while (open && rest.starts_with('v')) || j < fixed {
            let (tok, tail) = token(rest);
            let reg = tok
                .strip_prefix('v')
                .filter(|h| !h.is_empty() && h.chars().all(|c| c.is_ascii_hexdigit()))
                .and_then(|h| u16::from_str_radix(h, 16).ok())
                .ok_or(ReasmErrorKind::MissingRegister(j))?;
            insn.push_register(reg).map_err(|e| match e {
                RegisterError::NonConsecutive { .. } => ReasmErrorKind::NonConsecutive,
                _ => ReasmErrorKind::RegisterEncoding { reg, slot: j },
            })?;
            rest = tail;
            j += 1;
        }

        let operand = |prefix: &'static str| {
            rest.strip_prefix(prefix)
                .ok_or(ReasmErrorKind::ExpectedOperand(prefix))
        };
        let relative = |target: u32| i64::from(target) - i64::from(cur);
        let branch = |offset: i64| {
            let bits = format.target_bits().unwrap_or(32);
            if fits(offset, bits) {
                Ok(Special::Target(offset as i32))
            } else {
                Err(ReasmErrorKind::BranchRange { offset, bits })
            }
        };

        insn.special = match info.special() {
            SpecialKind::None if !rest.is_empty() => {
                return Err(ReasmErrorKind::TrailingText(rest.to_string()));
            }
            SpecialKind::None => Special::None,
            SpecialKind::Constant => {
                let digits = operand("#").map_err(|_| ReasmErrorKind::ExpectedLiteral)?;
                let value = literal(digits.trim_end()).ok_or(ReasmErrorKind::ExpectedLiteral)?;
                let bits = format.constant_bits().unwrap_or(64);
                if !fits(value, bits) {
                    return Err(ReasmErrorKind::LiteralRange { value, bits });
                }
                Special::Constant(value)
            }
            SpecialKind::Target if opcode == Opcode::FILL_ARRAY_DATA => {
                let n = table_index(operand("data@")?)?;
                let table = listing
                    .data_arrays
                    .get(n)
                    .ok_or_else(|| ReasmErrorKind::UnknownTable(format!("data@{n}")))?;
                let at = match self.data_at.get(&n) {
                    Some(&at) => at,
                    None => {
                        let at = self.emit_payload(Special::FillArrayData(FillArrayData {
                            element_width: table.element_width,
                            data: table.truncated(),
                        }));
                        self.data_at.insert(n, at);
                        at
                    }
                };
                branch(relative(at))?
            }
            SpecialKind::Target if opcode == Opcode::PACKED_SWITCH => {
                let n = table_index(operand("packed@")?)?;
                let table = listing
                    .packed_switches
                    .get(n)
                    .ok_or_else(|| ReasmErrorKind::UnknownTable(format!("packed@{n}")))?;
                let targets = table
                    .targets
                    .iter()
                    .map(|t| self.label(t).map(|p| relative(p) as i32))
                    .collect::<Result<_, _>>()?;
                let at = self.emit_payload(Special::PackedSwitch(PackedSwitch {
                    first_key: table.first_key,
                    targets,
                }));
                branch(relative(at))?
            }
            SpecialKind::Target if opcode == Opcode::SPARSE_SWITCH => {
                let n = table_index(operand("sparse@")?)?;
                let table = listing
                    .sparse_switches
                    .get(n)
                    .ok_or_else(|| ReasmErrorKind::UnknownTable(format!("sparse@{n}")))?;
                if table.keys.len() != table.targets.len() {
                    return Err(ReasmErrorKind::SparseLength);
                }
                let targets = table
                    .targets
                    .iter()
                    .map(|t| self.label(t).map(|p| relative(p) as i32))
                    .collect::<Result<_, _>>()?;
                let at = self.emit_payload(Special::SparseSwitch(SparseSwitch {
                    keys: table.keys.clone(),
                    targets,
                }));
                branch(relative(at))?
            }
            SpecialKind::Target => {
                let name = sole(operand("insn@")?)?;
                branch(relative(self.label(name)?))?
            }
            SpecialKind::String => Special::String(operand("string@")?.to_string()),
            SpecialKind::Type => Special::Type(type_name(sole(operand("type@")?)?)),
            SpecialKind::Field => {
                let alias = sole(operand("field@")?)?;
                let f = self
                    .aliases
                    .field(alias)
                    .ok_or_else(|| ReasmErrorKind::UnknownFieldAlias(alias.to_string()))?;
                Special::Field(f.clone())
            }
            SpecialKind::Method => {
                let alias = sole(operand("method@")?)?;
                let m = self
                    .aliases
                    .method(alias)
                    .ok_or_else(|| ReasmErrorKind::UnknownMethodAlias(alias.to_string()))?;
                Special::Method(m.clone())
            }
        };
        Ok(insn)
    }

    fn try_block(&self, i: usize) -> Result<TryBlock, LocatedError> {
        let t = &self.listing.try_blocks[i];
        let at = |kind: ReasmErrorKind| LocatedError::new(Location::Try(i), kind);
        let start = self.label(&t.start_insn).map_err(at)?;
        if t.insn_length <= 0 {
            return Err(at(ReasmErrorKind::TryLength));
        }
        let first = *self
            .indices
            .get(&start)
            .ok_or_else(|| at(ReasmErrorKind::UnknownLabel(t.start_insn.clone())))?;
        let last = first + t.insn_length as usize - 1;
        let Some(decl) = self.decls.get(last) else {
            return Err(at(ReasmErrorKind::TryOverrun(t.insn_length)));
        };
        let insn_count = decl.pos + Instruction::empty(decl.opcode).width() - start;

        let handlers = t
            .handlers
            .iter()
            .enumerate()
            .map(|(j, h)| {
                let addr = self
                    .label(&h.target)
                    .map_err(|e| LocatedError::new(Location::Handler(i, j), e))?;
                Ok(Handler {
                    catch_type: h.catch_type.clone(),
                    addr,
                })
            })
            .collect::<Result<_, LocatedError>>()?;
        let catch_all = if t.catch_all_target.is_empty() {
            None
        } else {
            Some(self.label(&t.catch_all_target).map_err(at)?)
        };
        Ok(TryBlock {
            start_addr: start,
            insn_count,
            handlers,
            catch_all,
        })
    }
}

/// `N` of a `table@N` operand.
fn table_index(digits: &str) -> Result<usize, ReasmErrorKind> {
    let digits = sole(digits)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ReasmErrorKind::UnknownTable(digits.to_string()));
    }
    digits
        .parse()
        .map_err(|_| ReasmErrorKind::UnknownTable(digits.to_string()))
}

/// Assemble one listing into a method body with `ins_size` argument words.
pub fn assemble(listing: &Listing, ins_size: u16, aliases: &Aliases) -> Result<Code, LocatedError> {
    let mut asm = Assembler::layout(listing, aliases)?;
    let mut insns = Vec::with_capacity(asm.decls.len());
    for i in 0..asm.decls.len() {
        let insn = asm
            .instruction(i)
            .map_err(|kind| LocatedError::new(Location::Insn(i), kind))?;
        insns.push(insn);
    }
    let tries = (0..listing.try_blocks.len())
        .map(|i| asm.try_block(i))
        .collect::<Result<_, _>>()?;
    insns.append(&mut asm.payloads);
    Ok(Code {
        registers_size: listing.registers,
        ins_size,
        outs_size: listing.outs_size,
        insns,
        tries,
    })
}

fn access_override(list: &mut Vec<Annotation>) -> Result<Option<AccessFlags>, SchemaError> {
    let Some(a) = annotation::take(list, schema::ACCESS) else {
        return Ok(None);
    };
    match a.body.get("accessFlags") {
        Some(Value::Int(bits)) => Ok(Some(AccessFlags::from_bits_retain(*bits as u32))),
        Some(_) => Err(SchemaError::Mistyped {
            annotation: schema::ACCESS.to_string(),
            element: "accessFlags",
            expected: "an int",
        }),
        None => Err(SchemaError::Missing {
            annotation: schema::ACCESS.to_string(),
            element: "accessFlags",
        }),
    }
}

/// Replace every annotated method body of `class` and consume the schema
/// annotations.
pub fn reassemble_class(class: &mut Class) -> Result<(), ReasmError> {
    let name = class.name.clone();
    let aliases = schema::take_alias_block(class)
        .map_err(|e| ReasmError::class(&name, e))?
        .map(Aliases::from)
        .unwrap_or_default();

    if let Some(access) =
        access_override(&mut class.annotations).map_err(|e| ReasmError::class(&name, e))?
    {
        class.access = access;
    }
    let access = class.access;
    let inner = class
        .annotations
        .iter_mut()
        .find(|a| a.type_() == INNER_CLASS)
        .and_then(|a| a.body.get_mut("accessFlags"));
    if let Some(flags) = inner {
        *flags = Value::Int(access.bits() as i32);
    }

    let methods = class.direct_methods.iter_mut().chain(&mut class.virtual_methods);
    for method in methods {
        let located = |kind: SchemaError| {
            ReasmError::method(&name, &method.name, LocatedError::new(Location::Method, kind))
        };
        if let Some(a) = annotation::take(&mut method.annotations, schema::CODE) {
            let listing = Listing::from_annotation(&a.body).map_err(located)?;
            let ins_size = method
                .code
                .as_ref()
                .map_or_else(|| method.ins_size(), |c| c.ins_size);
            let code = assemble(&listing, ins_size, &aliases)
                .map_err(|e| ReasmError::method(&name, &method.name, e))?;
            log::debug!("{name}.{}: {} records", method.name, code.insns.len());
            method.code = Some(code);
        }
        if let Some(access) = access_override(&mut method.annotations).map_err(located)? {
            method.access = access;
        }
    }
    for field in class.fields_mut() {
        if let Some(access) = access_override(&mut field.annotations)
            .map_err(|e| ReasmError::class(&name, e))?
        {
            field.access = access;
        }
    }
    Ok(())
}

/// Reassemble every class of a compiled disassembly and restore the original
/// names.
pub fn reassemble(file: &mut DexFile) -> Result<(), ReasmError> {
    for class in &mut file.classes {
        reassemble_class(class)?;
    }
    naming::restore(file);
    log::info!("reassembled {} classes", file.classes.len());
    Ok(())
}
