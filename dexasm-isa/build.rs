use std::collections::HashSet;
use std::env;
use std::fmt::Write as _;
use std::path::PathBuf;

use serde::Deserialize;

#[derive(Deserialize)]
struct Isa {
    opcodes: Vec<OpcodeDef>,
}

#[derive(Deserialize)]
struct OpcodeDef {
    value: String,
    name: String,
    format: String,
    #[serde(default)]
    special: Option<String>,
    #[serde(default)]
    flags: Vec<String>,
}

const FORMATS: &[&str] = &[
    "10x", "12x", "11n", "11x", "10t", "20t", "22x", "21t", "21s", "21h", "21c", "23x", "22b",
    "22t", "22s", "22c", "30t", "32x", "31i", "31t", "31c", "35c", "3rc", "51l",
];

fn main() {
    let manifest = env::var("CARGO_MANIFEST_DIR").unwrap();
    let out_dir = env::var("OUT_DIR").unwrap();
    let isa_yaml = format!("{manifest}/isa.yaml");
    println!("cargo:rerun-if-changed={isa_yaml}");

    let text = std::fs::read_to_string(&isa_yaml)
        .unwrap_or_else(|e| panic!("failed to read {isa_yaml}: {e}"));
    let isa: Isa = serde_yaml::from_str(&text).expect("isa.yaml is malformed");

    let mut table: Vec<Option<String>> = vec![None; 256];
    let mut consts = String::new();
    let mut seen_names = HashSet::new();
    let mut seen_consts = HashSet::new();

    for op in &isa.opcodes {
        let value = u8::from_str_radix(op.value.trim_start_matches("0x"), 16)
            .unwrap_or_else(|e| panic!("bad opcode value {}: {e}", op.value));
        assert!(
            table[value as usize].is_none(),
            "duplicate opcode value {:#04x}",
            value
        );
        assert!(seen_names.insert(op.name.clone()), "duplicate mnemonic {}", op.name);
        assert!(
            FORMATS.contains(&op.format.as_str()),
            "unknown format {} for {}",
            op.format,
            op.name
        );

        let special = match op.special.as_deref() {
            None => "None",
            Some("constant") => "Constant",
            Some("target") => "Target",
            Some("string") => "String",
            Some("type") => "Type",
            Some("field") => "Field",
            Some("method") => "Method",
            Some(other) => panic!("unknown special kind {other} for {}", op.name),
        };

        let mut flags = Vec::new();
        for flag in &op.flags {
            let name = match flag.as_str() {
                "continue" => "CONTINUE",
                "throw" => "THROW",
                "branch" => "BRANCH",
                "switch" => "SWITCH",
                "invoke" => "INVOKE",
                "return" => "RETURN",
                "payload" => "PAYLOAD",
                other => panic!("unknown flag {other} for {}", op.name),
            };
            flags.push(format!("OpcodeFlags::{name}.bits()"));
        }
        let flags = if flags.is_empty() {
            "0".to_string()
        } else {
            flags.join(" | ")
        };

        table[value as usize] = Some(format!(
            "Some(OpcodeInfo {{ mnemonic: {:?}, format: Format::F{}, special: SpecialKind::{special}, flags: OpcodeFlags::from_bits_retain({flags}) }})",
            op.name, op.format
        ));

        let const_name = op.name.to_uppercase().replace(['-', '/'], "_");
        assert!(
            seen_consts.insert(const_name.clone()),
            "opcode constant {const_name} is ambiguous"
        );
        writeln!(consts, "    /// `{}`", op.name).unwrap();
        writeln!(consts, "    pub const {const_name}: Opcode = Opcode({value:#04x});").unwrap();
    }

    let mut out = String::new();
    out.push_str("// @generated by build.rs from isa.yaml. Do not edit.\n\n");
    out.push_str("impl Opcode {\n");
    out.push_str(&consts);
    out.push_str("}\n\n");
    out.push_str("static OPCODE_TABLE: [Option<OpcodeInfo>; 256] = [\n");
    for entry in &table {
        match entry {
            Some(e) => writeln!(out, "    {e},").unwrap(),
            None => out.push_str("    None,\n"),
        }
    }
    out.push_str("];\n");

    let out_path = PathBuf::from(&out_dir).join("generated.rs");
    std::fs::write(&out_path, out).expect("failed to write generated.rs");
}
