//! Java-like source text for one top-level class and its nested classes.

use std::collections::HashSet;
use std::fmt::Write;

use dexasm_file::descriptor::{brief, package, type_nice};
use dexasm_file::{AccessFlags, Class, DexFile, Method, Value, annotation};
use dexasm_ir::Special;
use dexasm_isa::{OpcodeFlags, SpecialKind};

use super::code::disassemble_method;
use crate::error::DisasmError;
use crate::escape::encode_string;
use crate::listing::{DataTable, Listing};
use crate::naming::STATIC_INIT;
use crate::schema;
use crate::symbols::{AliasTable, ClassTree, ImportTable};

const OBJECT: &str = "Ljava/lang/Object;";
const THROWS: &str = "Ldalvik/annotation/Throws;";

fn indent_str(depth: usize) -> String {
    "  ".repeat(depth)
}

/// Render class `index` of `file`, which must be a root of `tree`.
pub fn render_class(file: &DexFile, tree: &ClassTree, index: usize) -> Result<String, DisasmError> {
    let class = &file.classes[index];
    let imports = &tree.node(index).imports;
    let mut out = String::new();

    if let Some(pkg) = package(&class.name) {
        let _ = writeln!(out, "package {};\n", pkg.replace('/', "."));
    }
    for desc in imports.iter() {
        let _ = writeln!(out, "import {};", type_nice(desc).replace('$', "."));
    }
    if !imports.is_empty() {
        out.push('\n');
    }

    let mut emitter = Emitter {
        file,
        tree,
        imports,
        out,
    };
    emitter.class(index, 0)?;
    Ok(emitter.out)
}

struct Emitter<'a> {
    file: &'a DexFile,
    tree: &'a ClassTree,
    imports: &'a ImportTable,
    out: String,
}

impl Emitter<'_> {
    fn name(&self, desc: &str) -> String {
        self.imports.name(desc)
    }

    fn class(&mut self, index: usize, depth: usize) -> Result<(), DisasmError> {
        let file = self.file;
        let class = &file.classes[index];
        let tree = self.tree;
        let node = tree.node(index);
        let pad = indent_str(depth);

        self.aliases(&node.aliases, &pad);

        let mut flags = class.access | AccessFlags::PUBLIC;
        if depth > 0 {
            flags |= AccessFlags::STATIC;
        }
        let keyword = if class.access.contains(AccessFlags::ANNOTATION) {
            "@interface "
        } else if class.access.contains(AccessFlags::INTERFACE) {
            "interface "
        } else {
            "class "
        };
        let _ = write!(
            self.out,
            "{pad}{} {keyword}{} ",
            flags.class_modifiers().join(" "),
            brief(&class.name)
        );
        if let Some(sup) = class.superclass.as_deref().filter(|s| *s != OBJECT) {
            let sup = self.name(sup);
            let _ = write!(self.out, "extends {sup} ");
        }
        if !class.interfaces.is_empty() {
            let list: Vec<_> = class.interfaces.iter().map(|i| self.name(i)).collect();
            let word = if class.access.contains(AccessFlags::INTERFACE) {
                "extends"
            } else {
                "implements"
            };
            let _ = write!(self.out, "{word} {} ", list.join(", "));
        }
        self.out.push_str("{\n");

        let mut with_value = HashSet::new();
        let mut feed = false;
        for (i, field) in class.static_fields.iter().enumerate() {
            feed = true;
            let head = self.field_head(field.access, &field.type_, &field.name, &pad);
            match class.static_value(i) {
                Some(v) => {
                    let value = self.literal(v);
                    let _ = writeln!(self.out, "{head} = {value};");
                    with_value.insert(field.name.as_str());
                }
                None => {
                    let _ = writeln!(self.out, "{head};");
                }
            }
        }
        if feed && !class.instance_fields.is_empty() {
            self.out.push('\n');
        }
        for field in &class.instance_fields {
            feed = true;
            let head = self.field_head(field.access, &field.type_, &field.name, &pad);
            let _ = writeln!(self.out, "{head};");
        }

        for method in class.virtual_methods.iter().chain(&class.direct_methods) {
            if feed {
                self.out.push('\n');
            }
            feed = true;
            self.method(class, method, &node.aliases, &with_value, &pad)?;
        }

        for &inner in &node.inner {
            if feed {
                self.out.push('\n');
            }
            feed = true;
            self.class(inner, depth + 1)?;
        }
        let _ = writeln!(self.out, "{pad}}}");
        Ok(())
    }

    fn field_head(&self, access: AccessFlags, ty: &str, name: &str, pad: &str) -> String {
        let modifiers = access.field_modifiers();
        let ty = self.name(ty);
        if modifiers.is_empty() {
            format!("{pad}  {ty} {name}")
        } else {
            format!("{pad}  {} {ty} {name}", modifiers.join(" "))
        }
    }

    fn literal(&self, v: &Value) -> String {
        match v {
            Value::Byte(b) => format!("(byte){b}"),
            Value::Short(s) => format!("(short){s}"),
            Value::Char(c) => format!("(char){c}"),
            Value::Int(i) => i.to_string(),
            Value::Long(l) => format!("{l}L"),
            Value::Float(f) if f.is_nan() => "Float.NaN".into(),
            Value::Float(f) if f.is_infinite() => {
                format!("Float.{}_INFINITY", if *f > 0.0 { "POSITIVE" } else { "NEGATIVE" })
            }
            Value::Float(f) => format!("{f:?}f"),
            Value::Double(d) if d.is_nan() => "Double.NaN".into(),
            Value::Double(d) if d.is_infinite() => {
                format!("Double.{}_INFINITY", if *d > 0.0 { "POSITIVE" } else { "NEGATIVE" })
            }
            Value::Double(d) => format!("{d:?}"),
            Value::Boolean(b) => b.to_string(),
            Value::String(s) => format!("\"{}\"", encode_string(s)),
            Value::Type(t) => format!("{}.class", self.name(t)),
            Value::Enum(f) => format!("{}.{}", self.name(&f.class), f.name),
            Value::Null
            | Value::Field(_)
            | Value::Method(_)
            | Value::Array(_)
            | Value::Annotation(_) => "null".into(),
        }
    }

    fn aliases(&mut self, aliases: &AliasTable, pad: &str) {
        let methods: Vec<String> = aliases
            .methods
            .iter()
            .map(|(m, alias)| {
                let proto: Vec<_> = m
                    .proto
                    .to_list()
                    .iter()
                    .map(|t| format!("{}.class", self.name(t)))
                    .collect();
                format!(
                    "{pad}    @{}(\n\
                     {pad}      alias = \"{alias}\",\n\
                     {pad}      clazz = {}.class,\n\
                     {pad}      name = \"{}\",\n\
                     {pad}      prototype = {{ {} }}\n\
                     {pad}    )",
                    self.name(schema::METHOD_ALIAS),
                    self.name(&m.class),
                    encode_string(&m.name),
                    proto.join(", ")
                )
            })
            .collect();
        let fields: Vec<String> = aliases
            .fields
            .iter()
            .map(|(f, alias)| {
                format!(
                    "{pad}    @{}(\n\
                     {pad}      alias = \"{alias}\",\n\
                     {pad}      clazz = {}.class,\n\
                     {pad}      name = \"{}\",\n\
                     {pad}      type = {}.class\n\
                     {pad}    )",
                    self.name(schema::FIELD_ALIAS),
                    self.name(&f.class),
                    encode_string(&f.name),
                    self.name(&f.type_)
                )
            })
            .collect();

        let block = self.name(schema::ALIASES);
        let _ = writeln!(self.out, "{pad}@{block}(");
        let inner = format!("{pad}  ");
        array(&mut self.out, &inner, "methodAliases", &methods, ",");
        array(&mut self.out, &inner, "fieldAliases", &fields, "");
        let _ = writeln!(self.out, "{pad})");
    }

    fn code(&mut self, listing: &Listing, pad: &str) {
        let p = format!("{pad}    ");
        let q = format!("{pad}      ");
        let insns: Vec<String> = listing.insns.iter().map(|l| format!("{q}\"{l}\"")).collect();
        let quote = |targets: &[String]| {
            targets
                .iter()
                .map(|t| format!("\"{t}\""))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let packed: Vec<String> = listing
            .packed_switches
            .iter()
            .map(|s| {
                format!(
                    "{q}@{}(\n{q}  firstKey = {},\n{q}  targets = {{ {} }}\n{q})",
                    self.name(schema::PACKED),
                    s.first_key,
                    quote(&s.targets)
                )
            })
            .collect();
        let sparse: Vec<String> = listing
            .sparse_switches
            .iter()
            .map(|s| {
                let keys: Vec<_> = s.keys.iter().map(i32::to_string).collect();
                format!(
                    "{q}@{}(\n{q}  keys = {{ {} }},\n{q}  targets = {{ {} }}\n{q})",
                    self.name(schema::SPARSE),
                    keys.join(", "),
                    quote(&s.targets)
                )
            })
            .collect();
        let data: Vec<String> = listing
            .data_arrays
            .iter()
            .map(|d| {
                let values: Vec<_> = d.data.iter().map(|&v| DataTable::literal(v)).collect();
                format!(
                    "{q}@{}(\n{q}  elementWidth = {},\n{q}  data = {{ {} }}\n{q})",
                    self.name(schema::DATA),
                    d.element_width,
                    values.join(", ")
                )
            })
            .collect();
        let tries: Vec<String> = listing
            .try_blocks
            .iter()
            .map(|t| {
                let handlers: Vec<_> = t
                    .handlers
                    .iter()
                    .map(|h| {
                        format!(
                            "@{}( catchType = {}.class, target = \"{}\" )",
                            self.name(schema::HANDLER),
                            self.name(&h.catch_type),
                            h.target
                        )
                    })
                    .collect();
                let catch_all = if t.catch_all_target.is_empty() {
                    "\"\" // No catch all handler.".to_string()
                } else {
                    format!("\"{}\"", t.catch_all_target)
                };
                format!(
                    "{q}@{}(\n{q}  startInsn = \"{}\",\n{q}  insnLength = {},\n\
                     {q}  handlers = {{ {} }},\n{q}  catchAllTarget = {catch_all}\n{q})",
                    self.name(schema::TRY),
                    t.start_insn,
                    t.insn_length,
                    handlers.join(", ")
                )
            })
            .collect();

        let annotation = self.name(schema::CODE);
        let _ = writeln!(self.out, "{pad}  @{annotation}(");
        let _ = writeln!(self.out, "{p}registers = {},", listing.registers);
        let _ = writeln!(self.out, "{p}outsSize = {},", listing.outs_size);
        array(&mut self.out, &p, "insns", &insns, ",");
        array(&mut self.out, &p, "packedSwitches", &packed, ",");
        array(&mut self.out, &p, "sparseSwitches", &sparse, ",");
        array(&mut self.out, &p, "dataArrays", &data, ",");
        array(&mut self.out, &p, "tryBlocks", &tries, "");
        let _ = writeln!(self.out, "{pad}  )");
    }

    fn method(
        &mut self,
        class: &Class,
        method: &Method,
        aliases: &AliasTable,
        with_value: &HashSet<&str>,
        pad: &str,
    ) -> Result<(), DisasmError> {
        if let Some(code) = &method.code {
            let listing = disassemble_method(&method.name, code, aliases)?;
            self.code(&listing, pad);
        }

        let throws: Vec<String> = annotation::find(&method.annotations, THROWS)
            .and_then(|a| a.body.get("value"))
            .and_then(Value::as_array)
            .unwrap_or_default()
            .iter()
            .filter_map(Value::as_type)
            .map(|t| self.name(t))
            .collect();
        let throws_clause = if throws.is_empty() {
            String::new()
        } else {
            format!(" throws {}", throws.join(", "))
        };

        let access = method.access;
        let is_clinit = access.contains(AccessFlags::CONSTRUCTOR) && method.is_static();
        let modifiers = access.method_modifiers().join(" ");
        let lead = if modifiers.is_empty() {
            String::new()
        } else {
            format!("{modifiers} ")
        };
        let head = if is_clinit {
            format!("static void {STATIC_INIT}")
        } else if access.contains(AccessFlags::CONSTRUCTOR) {
            format!("{lead}{}", brief(&class.name))
        } else {
            format!(
                "{lead}{} {}",
                self.name(&method.proto.return_type),
                method.name
            )
        };

        let params = &method.proto.parameters;
        let args: Vec<String> = params
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let varargs = i + 1 == params.len()
                    && access.contains(AccessFlags::VARARGS)
                    && p.starts_with('[');
                let ty = if varargs {
                    format!("{}...", self.name(&p[1..]))
                } else {
                    self.name(p)
                };
                format!("{ty} arg{}", i + 1)
            })
            .collect();

        let Some(code) = &method.code else {
            let _ = writeln!(self.out, "{pad}  {head}({}){throws_clause};", args.join(", "));
            return Ok(());
        };
        let _ = writeln!(self.out, "{pad}  {head}({}){throws_clause} {{", args.join(", "));

        let mut calls_this = false;
        let is_init = access.contains(AccessFlags::CONSTRUCTOR) && !method.is_static();
        if let Some(sup) = class.superclass.as_deref().filter(|_| is_init) {
            let mut found = false;
            for insn in &code.insns {
                let Some(info) = insn.opcode.info() else {
                    continue;
                };
                if !info.flags().contains(OpcodeFlags::INVOKE) {
                    continue;
                }
                if info.special() != SpecialKind::Method {
                    break;
                }
                let Special::Method(m) = &insn.special else {
                    break;
                };
                if m.name != "<init>" {
                    continue;
                }
                let call = if m.class == class.name {
                    calls_this = true;
                    "this"
                } else if m.class == sup {
                    "super"
                } else {
                    continue;
                };
                let zeros: Vec<String> = m
                    .proto
                    .parameters
                    .iter()
                    .map(|p| {
                        if p.starts_with(['L', '[']) {
                            format!("({}){}", self.name(p), zero(p))
                        } else {
                            zero(p).to_string()
                        }
                    })
                    .collect();
                let _ = writeln!(self.out, "{pad}    {call}({});", zeros.join(", "));
                found = true;
                break;
            }
            if !found {
                let _ = writeln!(self.out, "{pad}    // Couldn't find super call.");
            }
        }

        if is_clinit {
            let _ = writeln!(self.out, "{pad}  }}");
            let _ = writeln!(self.out, "{pad}  static {{");
            let _ = writeln!(self.out, "{pad}    // Edit me!");
        }
        if access.contains(AccessFlags::CONSTRUCTOR) && !calls_this {
            let fields = if method.is_static() {
                &class.static_fields
            } else {
                &class.instance_fields
            };
            for f in fields {
                if f.access.contains(AccessFlags::FINAL) && !with_value.contains(f.name.as_str()) {
                    let _ = writeln!(self.out, "{pad}    {} = {};", f.name, zero(&f.type_));
                }
            }
        }
        for t in &throws {
            let _ = writeln!(self.out, "{pad}    if(0==0) throw ({t})null;");
        }
        if method.proto.return_type != "V" {
            let _ = writeln!(self.out, "{pad}    return {};", zero(&method.proto.return_type));
        }
        let _ = writeln!(self.out, "{pad}  }}");
        Ok(())
    }
}

/// Write `name = { items }` with one pre-indented item per line.
fn array(out: &mut String, pad: &str, name: &str, items: &[String], trailer: &str) {
    if items.is_empty() {
        let _ = writeln!(out, "{pad}{name} = {{}}{trailer}");
        return;
    }
    let _ = writeln!(out, "{pad}{name} = {{");
    for (i, item) in items.iter().enumerate() {
        let sep = if i + 1 < items.len() { "," } else { "" };
        let _ = writeln!(out, "{item}{sep}");
    }
    let _ = writeln!(out, "{pad}}}{trailer}");
}

/// Zero value of a type, as a Java literal.
fn zero(desc: &str) -> &'static str {
    match desc.as_bytes().first() {
        Some(b'Z') => "false",
        Some(b'B') => "(byte)0",
        Some(b'C') => "(char)0",
        Some(b'S') => "(short)0",
        Some(b'I') => "0",
        Some(b'F') => "0f",
        Some(b'J') => "0L",
        Some(b'D') => "0.0",
        _ => "null",
    }
}
