//! Round-trip engine between Dalvik class containers and annotated source.
//!
//! [`disassemble`] turns a container into Java-like source files where every
//! method body is an annotation holding a textual instruction listing.
//! [`reassemble`] takes a container compiled from those files and rebuilds
//! the method bodies from the annotations.

pub mod disasm;
pub mod error;
pub mod escape;
pub mod listing;
pub mod naming;
pub mod reasm;
pub mod rules;
pub mod sanitize;
pub mod schema;
pub mod symbols;

pub use disasm::{SourceFile, disassemble, disassemble_method, render_class};
pub use error::{DisasmError, LocatedError, Location, ReasmError, ReasmErrorKind, SchemaError};
pub use listing::Listing;
pub use reasm::{Aliases, assemble, reassemble, reassemble_class};
pub use symbols::{AliasTable, ClassTree, ImportTable};
