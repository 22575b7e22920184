use std::path::PathBuf;

use clap::Parser;
use dexasm_cli::{fail, parse_args};
use dexasm_file::DexFile;

#[derive(Parser)]
#[command(
    name = "dexreasm",
    version,
    about = "Rebuild method bodies of a compiled disassembly from its code annotations"
)]
struct Cli {
    /// Container compiled from dexdasm output
    input: PathBuf,
    /// Where the rebuilt container is written
    output: PathBuf,
}

fn main() {
    env_logger::init();
    let cli: Cli = parse_args();

    let mut file = DexFile::open(&cli.input).unwrap_or_else(|e| fail(e));
    dexasm_core::reassemble(&mut file).unwrap_or_else(|e| fail(e));
    file.write(&cli.output).unwrap_or_else(|e| fail(e));
}
