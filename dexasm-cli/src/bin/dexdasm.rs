use std::fs;
use std::path::PathBuf;

use clap::Parser;
use dexasm_cli::{fail, parse_args};
use dexasm_file::DexFile;

#[derive(Parser)]
#[command(
    name = "dexdasm",
    version,
    about = "Disassemble a Dalvik class container into compilable Java sources"
)]
struct Cli {
    /// Path to the container
    input: PathBuf,
    /// Directory the source tree is written under
    #[arg(default_value = "out")]
    output: PathBuf,
}

fn main() {
    env_logger::init();
    let cli: Cli = parse_args();

    let file = DexFile::open(&cli.input).unwrap_or_else(|e| fail(e));
    let sources = dexasm_core::disassemble(file).unwrap_or_else(|e| fail(e));

    for source in &sources {
        let path = cli.output.join(&source.path);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .unwrap_or_else(|e| fail(format!("creating {}: {e}", dir.display())));
        }
        fs::write(&path, &source.text)
            .unwrap_or_else(|e| fail(format!("writing {}: {e}", path.display())));
        log::debug!("wrote {}", path.display());
    }
    log::info!(
        "wrote {} source files under {}",
        sources.len(),
        cli.output.display()
    );
}
