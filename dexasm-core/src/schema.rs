//! The annotation schema shared by the disassembler and the reassembler.
//!
//! Disassembled text carries each method body as a `DexasmCode` annotation
//! and each class's alias table as a `DexasmAliases` annotation. Once the text
//! is compiled those annotations come back as annotation records, which the
//! reassembler reads. This module defines the schema classes themselves and
//! converts between [`Listing`]/[`AliasTable`] and annotation records, so the
//! whole cycle can also run in process through [`annotate`].

use dexasm_file::annotation::{self, Annotation, EncodedAnnotation, Value, Visibility};
use dexasm_file::descriptor::package;
use dexasm_file::{AccessFlags, Class, Code, DexFile, Method};
use dexasm_ir::{FieldRef, MethodRef, Prototype};

use crate::disasm::disassemble_method;
use crate::error::{DisasmError, EscapeError, SchemaError};
use crate::escape::decode_string;
use crate::listing::{DataTable, HandlerEntry, Listing, PackedTable, SparseTable, TryTable};
use crate::symbols::{AliasTable, ClassTree};

pub const PACKAGE: &str = "org/dexasm/schema";

pub const CODE: &str = "Lorg/dexasm/schema/DexasmCode;";
pub const ACCESS: &str = "Lorg/dexasm/schema/DexasmAccess;";
pub const PACKED: &str = "Lorg/dexasm/schema/DexasmPacked;";
pub const SPARSE: &str = "Lorg/dexasm/schema/DexasmSparse;";
pub const DATA: &str = "Lorg/dexasm/schema/DexasmData;";
pub const TRY: &str = "Lorg/dexasm/schema/DexasmTry;";
pub const HANDLER: &str = "Lorg/dexasm/schema/DexasmHandler;";
pub const ALIASES: &str = "Lorg/dexasm/schema/DexasmAliases;";
pub const METHOD_ALIAS: &str = "Lorg/dexasm/schema/DexasmMethodAlias;";
pub const FIELD_ALIAS: &str = "Lorg/dexasm/schema/DexasmFieldAlias;";
/// Stand-in superclass for enums, which Java source cannot extend directly.
pub const ENUM: &str = "Lorg/dexasm/schema/DexasmEnum;";

const STRING: &str = "Ljava/lang/String;";
const CLASS: &str = "Ljava/lang/Class;";

pub fn is_schema_class(desc: &str) -> bool {
    package(desc) == Some(PACKAGE)
}

fn annotation_type(name: &str, elements: &[(&str, &str)]) -> Class {
    let mut class = Class::new(name);
    class.access =
        AccessFlags::PUBLIC | AccessFlags::INTERFACE | AccessFlags::ABSTRACT | AccessFlags::ANNOTATION;
    class.virtual_methods = elements
        .iter()
        .map(|&(element, ty)| {
            Method::new(
                element,
                Prototype::new(ty, Vec::new()),
                AccessFlags::PUBLIC | AccessFlags::ABSTRACT,
            )
        })
        .collect();
    class
}

/// Definitions of every schema class.
pub fn schema_classes() -> Vec<Class> {
    let mut enum_base = Class::new(ENUM);
    enum_base.access = AccessFlags::PUBLIC | AccessFlags::ABSTRACT;
    let mut init = Method::new(
        "<init>",
        Prototype::new("V", vec![STRING.into(), "I".into()]),
        AccessFlags::PUBLIC | AccessFlags::CONSTRUCTOR,
    );
    init.code = Some(Code {
        registers_size: 16,
        ins_size: 2,
        ..Code::default()
    });
    enum_base.direct_methods.push(init);

    vec![
        annotation_type(
            CODE,
            &[
                ("registers", "I"),
                ("outsSize", "I"),
                ("insns", "[Ljava/lang/String;"),
                ("packedSwitches", "[Lorg/dexasm/schema/DexasmPacked;"),
                ("sparseSwitches", "[Lorg/dexasm/schema/DexasmSparse;"),
                ("dataArrays", "[Lorg/dexasm/schema/DexasmData;"),
                ("tryBlocks", "[Lorg/dexasm/schema/DexasmTry;"),
            ],
        ),
        annotation_type(ACCESS, &[("accessFlags", "I")]),
        enum_base,
        annotation_type(PACKED, &[("firstKey", "I"), ("targets", "[Ljava/lang/String;")]),
        annotation_type(SPARSE, &[("keys", "[I"), ("targets", "[Ljava/lang/String;")]),
        annotation_type(DATA, &[("elementWidth", "I"), ("data", "[J")]),
        annotation_type(
            TRY,
            &[
                ("startInsn", STRING),
                ("insnLength", "I"),
                ("handlers", "[Lorg/dexasm/schema/DexasmHandler;"),
                ("catchAllTarget", STRING),
            ],
        ),
        annotation_type(HANDLER, &[("catchType", CLASS), ("target", STRING)]),
        annotation_type(
            ALIASES,
            &[
                ("methodAliases", "[Lorg/dexasm/schema/DexasmMethodAlias;"),
                ("fieldAliases", "[Lorg/dexasm/schema/DexasmFieldAlias;"),
            ],
        ),
        annotation_type(
            METHOD_ALIAS,
            &[
                ("alias", STRING),
                ("clazz", CLASS),
                ("name", STRING),
                ("prototype", "[Ljava/lang/Class;"),
            ],
        ),
        annotation_type(
            FIELD_ALIAS,
            &[("alias", STRING), ("clazz", CLASS), ("name", STRING), ("type", CLASS)],
        ),
    ]
}

/// Append the schema classes the container does not define yet.
pub fn add_schema_classes(file: &mut DexFile) {
    for class in schema_classes() {
        if file.class(&class.name).is_none() {
            file.classes.push(class);
        }
    }
}

fn strings(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::String).collect())
}

fn ints(items: &[i32]) -> Value {
    Value::Array(items.iter().copied().map(Value::Int).collect())
}

fn nested(items: impl IntoIterator<Item = EncodedAnnotation>) -> Value {
    Value::Array(items.into_iter().map(Value::Annotation).collect())
}

impl Listing {
    /// The `DexasmCode` annotation a compiler produces from this listing.
    ///
    /// Instruction lines are written into source as string literals, so they
    /// are decoded here the way the compiler would.
    pub fn to_annotation(&self) -> Result<EncodedAnnotation, EscapeError> {
        let insns = self
            .insns
            .iter()
            .map(|line| decode_string(line).map(Value::String))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(EncodedAnnotation::new(CODE)
            .with("registers", Value::Int(self.registers.into()))
            .with("outsSize", Value::Int(self.outs_size.into()))
            .with("insns", Value::Array(insns))
            .with(
                "packedSwitches",
                nested(self.packed_switches.iter().map(|p| {
                    EncodedAnnotation::new(PACKED)
                        .with("firstKey", Value::Int(p.first_key))
                        .with("targets", strings(&p.targets))
                })),
            )
            .with(
                "sparseSwitches",
                nested(self.sparse_switches.iter().map(|s| {
                    EncodedAnnotation::new(SPARSE)
                        .with("keys", ints(&s.keys))
                        .with("targets", strings(&s.targets))
                })),
            )
            .with(
                "dataArrays",
                nested(self.data_arrays.iter().map(|d| {
                    EncodedAnnotation::new(DATA)
                        .with("elementWidth", Value::Int(d.element_width.into()))
                        .with(
                            "data",
                            Value::Array(d.data.iter().map(|&v| Value::Long(v as i64)).collect()),
                        )
                })),
            )
            .with(
                "tryBlocks",
                nested(self.try_blocks.iter().map(|t| {
                    EncodedAnnotation::new(TRY)
                        .with("startInsn", Value::String(t.start_insn.clone()))
                        .with("insnLength", Value::Int(t.insn_length))
                        .with(
                            "handlers",
                            nested(t.handlers.iter().map(|h| {
                                EncodedAnnotation::new(HANDLER)
                                    .with("catchType", Value::Type(h.catch_type.clone()))
                                    .with("target", Value::String(h.target.clone()))
                            })),
                        )
                        .with("catchAllTarget", Value::String(t.catch_all_target.clone()))
                })),
            ))
    }

    /// Read a listing back out of a compiled `DexasmCode` annotation.
    pub fn from_annotation(a: &EncodedAnnotation) -> Result<Self, SchemaError> {
        let r = Elements(a);
        Ok(Self {
            registers: r.u16("registers")?,
            outs_size: r.u16("outsSize")?,
            insns: r.strings("insns")?,
            packed_switches: r.map("packedSwitches", |p| {
                Ok(PackedTable {
                    first_key: p.int("firstKey")?,
                    targets: p.strings("targets")?,
                })
            })?,
            sparse_switches: r.map("sparseSwitches", |s| {
                Ok(SparseTable {
                    keys: s.ints("keys")?,
                    targets: s.strings("targets")?,
                })
            })?,
            data_arrays: r.map("dataArrays", |d| {
                let width = d.int("elementWidth")?;
                let element_width = u8::try_from(width)
                    .ok()
                    .filter(|w| matches!(w, 1 | 2 | 4 | 8))
                    .ok_or_else(|| d.mistyped("elementWidth", "1, 2, 4 or 8"))?;
                let data = d
                    .array("data")?
                    .iter()
                    .map(|v| v.as_i64().map(|x| x as u64))
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| d.mistyped("data", "an array of longs"))?;
                Ok(DataTable { element_width, data })
            })?,
            try_blocks: r.map("tryBlocks", |t| {
                Ok(TryTable {
                    start_insn: t.string("startInsn")?,
                    insn_length: t.int("insnLength")?,
                    handlers: t.map("handlers", |h| {
                        Ok(HandlerEntry {
                            catch_type: h.type_("catchType")?,
                            target: h.string("target")?,
                        })
                    })?,
                    catch_all_target: t.string("catchAllTarget")?,
                })
            })?,
        })
    }
}

/// A class's alias table as it travels through the schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasBlock {
    pub methods: Vec<(String, MethodRef)>,
    pub fields: Vec<(String, FieldRef)>,
}

impl From<&AliasTable> for AliasBlock {
    fn from(table: &AliasTable) -> Self {
        Self {
            methods: table
                .methods
                .iter()
                .map(|(r, alias)| (alias.clone(), r.clone()))
                .collect(),
            fields: table
                .fields
                .iter()
                .map(|(r, alias)| (alias.clone(), r.clone()))
                .collect(),
        }
    }
}

impl AliasBlock {
    pub fn to_annotation(&self) -> EncodedAnnotation {
        EncodedAnnotation::new(ALIASES)
            .with(
                "methodAliases",
                nested(self.methods.iter().map(|(alias, m)| {
                    EncodedAnnotation::new(METHOD_ALIAS)
                        .with("alias", Value::String(alias.clone()))
                        .with("clazz", Value::Type(m.class.clone()))
                        .with("name", Value::String(m.name.clone()))
                        .with(
                            "prototype",
                            Value::Array(m.proto.to_list().into_iter().map(Value::Type).collect()),
                        )
                })),
            )
            .with(
                "fieldAliases",
                nested(self.fields.iter().map(|(alias, f)| {
                    EncodedAnnotation::new(FIELD_ALIAS)
                        .with("alias", Value::String(alias.clone()))
                        .with("clazz", Value::Type(f.class.clone()))
                        .with("name", Value::String(f.name.clone()))
                        .with("type", Value::Type(f.type_.clone()))
                })),
            )
    }

    /// Missing alias arrays read as empty.
    pub fn from_annotation(a: &EncodedAnnotation) -> Result<Self, SchemaError> {
        let r = Elements(a);
        let methods = r.map_opt("methodAliases", |m| {
            let proto = m.types("prototype")?;
            let proto = Prototype::from_list(&proto)
                .ok_or_else(|| m.mistyped("prototype", "a non-empty class array"))?;
            Ok((
                m.string("alias")?,
                MethodRef::new(m.type_("clazz")?, m.string("name")?, proto),
            ))
        })?;
        let fields = r.map_opt("fieldAliases", |f| {
            Ok((
                f.string("alias")?,
                FieldRef::new(f.type_("clazz")?, f.string("name")?, f.type_("type")?),
            ))
        })?;
        Ok(Self { methods, fields })
    }
}

/// Typed access to annotation elements, reporting schema errors.
struct Elements<'a>(&'a EncodedAnnotation);

impl<'a> Elements<'a> {
    fn missing(&self, element: &'static str) -> SchemaError {
        SchemaError::Missing {
            annotation: self.0.type_.clone(),
            element,
        }
    }

    fn mistyped(&self, element: &'static str, expected: &'static str) -> SchemaError {
        SchemaError::Mistyped {
            annotation: self.0.type_.clone(),
            element,
            expected,
        }
    }

    fn get(&self, element: &'static str) -> Result<&'a Value, SchemaError> {
        self.0.get(element).ok_or_else(|| self.missing(element))
    }

    fn int(&self, element: &'static str) -> Result<i32, SchemaError> {
        match self.get(element)? {
            Value::Int(v) => Ok(*v),
            _ => Err(self.mistyped(element, "an int")),
        }
    }

    fn u16(&self, element: &'static str) -> Result<u16, SchemaError> {
        u16::try_from(self.int(element)?).map_err(|_| self.mistyped(element, "a 16-bit count"))
    }

    fn string(&self, element: &'static str) -> Result<String, SchemaError> {
        self.get(element)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.mistyped(element, "a string"))
    }

    fn type_(&self, element: &'static str) -> Result<String, SchemaError> {
        self.get(element)?
            .as_type()
            .map(str::to_string)
            .ok_or_else(|| self.mistyped(element, "a class"))
    }

    fn array(&self, element: &'static str) -> Result<&'a [Value], SchemaError> {
        self.get(element)?
            .as_array()
            .ok_or_else(|| self.mistyped(element, "an array"))
    }

    fn strings(&self, element: &'static str) -> Result<Vec<String>, SchemaError> {
        self.array(element)?
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect::<Option<_>>()
            .ok_or_else(|| self.mistyped(element, "an array of strings"))
    }

    fn types(&self, element: &'static str) -> Result<Vec<String>, SchemaError> {
        self.array(element)?
            .iter()
            .map(|v| v.as_type().map(str::to_string))
            .collect::<Option<_>>()
            .ok_or_else(|| self.mistyped(element, "an array of classes"))
    }

    fn ints(&self, element: &'static str) -> Result<Vec<i32>, SchemaError> {
        self.array(element)?
            .iter()
            .map(|v| match v {
                Value::Int(i) => Some(*i),
                _ => None,
            })
            .collect::<Option<_>>()
            .ok_or_else(|| self.mistyped(element, "an array of ints"))
    }

    fn map<T>(
        &self,
        element: &'static str,
        f: impl Fn(&Elements<'a>) -> Result<T, SchemaError>,
    ) -> Result<Vec<T>, SchemaError> {
        self.array(element)?
            .iter()
            .map(|v| match v.as_annotation() {
                Some(a) => f(&Elements(a)),
                None => Err(self.mistyped(element, "an array of annotations")),
            })
            .collect()
    }

    fn map_opt<T>(
        &self,
        element: &'static str,
        f: impl Fn(&Elements<'a>) -> Result<T, SchemaError>,
    ) -> Result<Vec<T>, SchemaError> {
        if self.0.get(element).is_none() {
            return Ok(Vec::new());
        }
        self.map(element, f)
    }
}

/// Failure while attaching schema annotations in process.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AnnotateError {
    #[error(transparent)]
    Disasm(#[from] DisasmError),

    #[error("{class}.{method}: {source}")]
    Escape {
        class: String,
        method: String,
        source: EscapeError,
    },
}

/// Attach the annotations a compiled disassembly would carry.
///
/// Every class gets its `DexasmAliases` block and every method with code a
/// `DexasmCode` annotation built from its listing. `tree` must have been built
/// from `file` in its current state.
pub fn annotate(file: &mut DexFile, tree: &ClassTree) -> Result<(), AnnotateError> {
    for (index, class) in file.classes.iter_mut().enumerate() {
        let aliases = &tree.node(index).aliases;
        let mut code_annotations = Vec::new();
        for method in class.methods() {
            let Some(code) = &method.code else {
                code_annotations.push(None);
                continue;
            };
            let listing = disassemble_method(&method.name, code, aliases)?;
            let body = listing.to_annotation().map_err(|source| AnnotateError::Escape {
                class: class.name.clone(),
                method: method.name.clone(),
                source,
            })?;
            code_annotations.push(Some(body));
        }
        for (method, body) in class.methods_mut().zip(code_annotations) {
            if let Some(body) = body {
                method.annotations.push(Annotation::new(Visibility::Build, body));
            }
        }
        class.annotations.push(Annotation::new(
            Visibility::Build,
            AliasBlock::from(aliases).to_annotation(),
        ));
    }
    Ok(())
}

/// Remove and return a class's `DexasmAliases` block, if present.
pub fn take_alias_block(class: &mut Class) -> Result<Option<AliasBlock>, SchemaError> {
    annotation::take(&mut class.annotations, ALIASES)
        .map(|a| AliasBlock::from_annotation(&a.body))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::label;

    fn sample_listing() -> Listing {
        Listing {
            registers: 3,
            outs_size: 1,
            insns: vec![
                "L00: const-string v0 string@tab\\there".into(),
                "L01: packed-switch v1 packed@0".into(),
                "L02: return-void".into(),
            ],
            packed_switches: vec![PackedTable {
                first_key: 5,
                targets: vec![label(0), label(2)],
            }],
            sparse_switches: vec![SparseTable {
                keys: vec![-1, 100],
                targets: vec![label(1), label(2)],
            }],
            data_arrays: vec![DataTable {
                element_width: 8,
                data: vec![u64::MAX, 1],
            }],
            try_blocks: vec![TryTable {
                start_insn: label(0),
                insn_length: 2,
                handlers: vec![HandlerEntry {
                    catch_type: "Ljava/lang/Exception;".into(),
                    target: label(2),
                }],
                catch_all_target: String::new(),
            }],
        }
    }

    #[test]
    fn listing_survives_the_annotation_form() {
        let listing = sample_listing();
        let back = Listing::from_annotation(&listing.to_annotation().unwrap()).unwrap();
        assert_eq!(back.insns[0], "L00: const-string v0 string@tab\there");
        assert_eq!(back.insns[1..], listing.insns[1..]);
        assert_eq!(back.packed_switches, listing.packed_switches);
        assert_eq!(back.sparse_switches, listing.sparse_switches);
        assert_eq!(back.data_arrays, listing.data_arrays);
        assert_eq!(back.try_blocks, listing.try_blocks);
        assert_eq!((back.registers, back.outs_size), (3, 1));
    }

    #[test]
    fn missing_elements_are_reported() {
        let mut a = sample_listing().to_annotation().unwrap();
        a.elements.retain(|e| e.name != "outsSize");
        assert_eq!(
            Listing::from_annotation(&a),
            Err(SchemaError::Missing {
                annotation: CODE.into(),
                element: "outsSize",
            })
        );
    }

    #[test]
    fn mistyped_elements_are_reported() {
        let mut a = sample_listing().to_annotation().unwrap();
        if let Some(v) = a.get_mut("registers") {
            *v = Value::String("3".into());
        }
        assert!(matches!(
            Listing::from_annotation(&a),
            Err(SchemaError::Mistyped { element: "registers", .. })
        ));
    }

    #[test]
    fn alias_block_round_trip() {
        let block = AliasBlock {
            methods: vec![(
                "Util.log".into(),
                MethodRef::new("La/Util;", "log", Prototype::new("V", vec!["I".into()])),
            )],
            fields: vec![("Main.count".into(), FieldRef::new("La/Main;", "count", "I"))],
        };
        assert_eq!(AliasBlock::from_annotation(&block.to_annotation()), Ok(block));
        assert_eq!(
            AliasBlock::from_annotation(&EncodedAnnotation::new(ALIASES)),
            Ok(AliasBlock::default())
        );
    }

    #[test]
    fn schema_package() {
        let classes = schema_classes();
        assert_eq!(classes.len(), 11);
        assert!(classes.iter().all(|c| is_schema_class(&c.name)));
        assert!(!is_schema_class("Lorg/dexasm/schema/sub/X;"));
        assert!(!is_schema_class("LDexasmCode;"));

        let mut file = DexFile::default();
        add_schema_classes(&mut file);
        add_schema_classes(&mut file);
        assert_eq!(file.classes.len(), 11);
    }
}
