//! Container-wide sanitize and restore passes.
//!
//! [`prepare`] runs before disassembly and makes every class, field and
//! method name a legal Java token; [`restore`] runs after reassembly and
//! undoes it, also dropping the schema classes the compiled text pulled in.

use std::collections::{HashMap, HashSet};

use dexasm_file::{AccessFlags, DexFile, Method, Renamer};
use dexasm_ir::MethodRef;

use crate::sanitize::{
    desanitize_identifier, desanitize_type, sanitize_identifier, sanitize_identifier_as,
    sanitize_type,
};
use crate::schema;
use crate::symbols::ClassTree;

const JAVA_ENUM: &str = "Ljava/lang/Enum;";

/// Name the disassembled static initializer is given.
pub const STATIC_INIT: &str = "dexasm_static";

fn is_initializer(name: &str) -> bool {
    name == "<init>" || name == "<clinit>"
}

/// Sanitize every name in `file` and build its symbol tables.
pub fn prepare(file: &mut DexFile) -> ClassTree {
    let mut renamer = Renamer::new();
    renamer.rename_class(JAVA_ENUM, schema::ENUM);

    for class in &file.classes {
        let name = sanitize_type(&class.name);
        if name != class.name {
            renamer.rename_class(class.name.clone(), name);
        }
        for field in class.fields() {
            let name = sanitize_identifier(&field.name);
            if name != field.name {
                renamer.rename_field(field.reference(&class.name), name);
            }
        }

        // Varargs overloads differing only in parameter kinds would collide
        // once compiled; give each a distinct name.
        let mut varargs = HashSet::new();
        for method in class.virtual_methods.iter().chain(&class.direct_methods) {
            let mut name = sanitize_identifier(&method.name);
            if method.proto.parameters.last().is_some_and(|p| p.starts_with('[')) {
                let kinds: String = method
                    .proto
                    .parameters
                    .iter()
                    .filter_map(|p| p.chars().next())
                    .collect();
                let mut token = -2;
                while !varargs.insert(format!("{name}{kinds}")) {
                    name = sanitize_identifier_as(&method.name, token);
                    token -= 1;
                }
            }
            if name != method.name && !is_initializer(&method.name) {
                renamer.rename_method(method.reference(&class.name), name);
            }
        }
    }

    renamer.apply(file);
    ClassTree::build(file)
}

/// Undo [`prepare`] on a reassembled container.
pub fn restore(file: &mut DexFile) {
    let before = file.classes.len();
    file.classes.retain(|c| !schema::is_schema_class(&c.name));
    log::debug!("dropped {} schema classes", before - file.classes.len());

    let mut renamer = Renamer::new();
    renamer.rename_class(schema::ENUM, JAVA_ENUM);

    for class in &mut file.classes {
        let name = desanitize_type(&class.name);
        if name != class.name {
            renamer.rename_class(class.name.clone(), name);
        }
        for field in class.fields() {
            let name = desanitize_identifier(&field.name);
            if name != field.name {
                renamer.rename_field(field.reference(&class.name), name);
            }
        }

        let owner = class.name.clone();
        let mut slots: HashMap<MethodRef, (bool, usize)> = HashMap::new();
        let mut kept: [Vec<Method>; 2] = [Vec::new(), Vec::new()];
        let lists = [
            std::mem::take(&mut class.virtual_methods),
            std::mem::take(&mut class.direct_methods),
        ];
        for (direct, list) in lists.into_iter().enumerate() {
            for mut method in list {
                let mut target = desanitize_identifier(&method.name).to_string();
                if method.name == STATIC_INIT {
                    target = "<clinit>".to_string();
                    method.access |= AccessFlags::CONSTRUCTOR;
                }
                let renamed = target != method.name && method.name != "<init>";
                let key = if renamed {
                    MethodRef::new(&owner, target.as_str(), method.proto.clone())
                } else {
                    method.reference(&owner)
                };

                // The compiler may add methods that already exist under a
                // sanitized name; keep the non-synthetic one.
                if let Some(&(in_direct, at)) = slots.get(&key) {
                    if method.name == "<clinit>"
                        || (target != "<clinit>" && method.access.contains(AccessFlags::SYNTHETIC))
                    {
                        log::debug!("dropping duplicate {}.{}", owner, method.name);
                        continue;
                    }
                    if renamed {
                        renamer.rename_method(method.reference(&owner), target);
                    }
                    kept[usize::from(in_direct)][at] = method;
                } else {
                    if renamed {
                        renamer.rename_method(method.reference(&owner), target);
                    }
                    slots.insert(key, (direct == 1, kept[direct].len()));
                    kept[direct].push(method);
                }
            }
        }
        let [virtual_methods, direct_methods] = kept;
        class.virtual_methods = virtual_methods;
        class.direct_methods = direct_methods;
    }

    renamer.apply(file);
}
