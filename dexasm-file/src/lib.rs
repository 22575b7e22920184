//! Dalvik class container model plus its record-image codec.
//!
//! A container is a flat list of [`Class`] definitions. On disk it is stored
//! as a compact record image: an 8-byte magic, a little-endian format
//! version, then the classes encoded with LEB128 integers and MUTF-8
//! strings. [`reader`] and [`writer`] are exact inverses of each other.

pub mod annotation;
pub mod class;
pub mod descriptor;
pub mod error;
pub mod leb128;
pub mod modifiers;
pub mod reader;
pub mod rename;
pub mod util;
pub mod writer;

use std::path::Path;

pub use annotation::{Annotation, Element, EncodedAnnotation, Value, Visibility};
pub use class::{Class, Code, Field, Method};
pub use error::{Error, Result};
pub use modifiers::AccessFlags;
pub use rename::Renamer;

/// Container magic.
pub const MAGIC: &[u8; 8] = b"dexasm\n\0";

/// Record-image format version.
pub const VERSION: u32 = 1;

/// Smallest possible image: magic, version and a one-byte class count.
pub const HEADER_SIZE: usize = MAGIC.len() + 4 + 1;

/// An in-memory class container.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DexFile {
    pub classes: Vec<Class>,
}

impl DexFile {
    /// Decode a container image.
    pub fn parse(data: &[u8]) -> Result<Self> {
        reader::read(data)
    }

    /// Map and decode the container at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::info!("opening {}", path.display());
        let file = std::fs::File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Err(Error::FileTooSmall(0));
        }
        // SAFETY: the mapping is read-only and dropped before this returns;
        // the image is fully decoded into owned records first.
        let mmap = unsafe { memmap2::Mmap::map(&file)? };
        Self::parse(&mmap)
    }

    /// Encode this container into an image.
    pub fn to_bytes(&self) -> Vec<u8> {
        writer::write(self)
    }

    /// Encode and write the container to `path`.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes();
        std::fs::write(path, &bytes)?;
        log::info!("wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    pub fn class(&self, name: &str) -> Option<&Class> {
        self.classes.iter().find(|c| c.name == name)
    }

    pub fn class_mut(&mut self, name: &str) -> Option<&mut Class> {
        self.classes.iter_mut().find(|c| c.name == name)
    }
}
