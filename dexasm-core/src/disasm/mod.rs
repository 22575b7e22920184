//! Container to Java-like source files.

mod code;
mod java;

use std::path::PathBuf;

use dexasm_file::DexFile;
use dexasm_file::descriptor::type_nice;

pub use code::disassemble_method;
pub use java::render_class;

use crate::error::DisasmError;
use crate::naming;
use crate::schema;

/// One rendered top-level class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Relative path, one directory per package segment.
    pub path: PathBuf,
    pub text: String,
}

/// Relative output path of a top-level class: `a.b.C` becomes `a/b/C.java`.
pub fn source_path(desc: &str) -> PathBuf {
    let nice = type_nice(desc);
    let mut path: PathBuf = nice.split('.').collect();
    path.set_extension("java");
    path
}

/// Disassemble every class of `file`.
///
/// The schema classes are added and all names sanitized first, so the
/// returned sources compile against each other. Nested classes are rendered
/// inside their outer class.
pub fn disassemble(mut file: DexFile) -> Result<Vec<SourceFile>, DisasmError> {
    schema::add_schema_classes(&mut file);
    let tree = naming::prepare(&mut file);

    let mut sources = Vec::new();
    for index in tree.roots() {
        let class = &file.classes[index];
        log::debug!("disassembling {}", class.name);
        sources.push(SourceFile {
            path: source_path(&class.name),
            text: render_class(&file, &tree, index)?,
        });
    }
    log::info!("disassembled {} top-level classes", sources.len());
    Ok(sources)
}
