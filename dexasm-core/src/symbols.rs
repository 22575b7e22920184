//! Per-class import and alias tables.
//!
//! Classes form a tree through their `$`-nested names. The tree is kept as an
//! arena parallel to `DexFile::classes`: node `i` describes class `i`, and
//! outer/inner links are indices into the same arena.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use dexasm_file::descriptor::{brief, strip_array, type_nice};
use dexasm_file::{Class, DexFile};
use dexasm_ir::{FieldRef, MethodRef, Special};

use crate::schema;

/// Fully qualified types a class may refer to by short name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportTable {
    descriptors: BTreeSet<String>,
}

impl ImportTable {
    /// Build the table for `class`, merging the tables of its nested
    /// classes.
    ///
    /// Only class descriptors are kept, with array markers stripped. When two
    /// types share a short name the longer descriptor wins; the class itself
    /// always owns its short name.
    pub fn build<'a>(class: &Class, nested: impl IntoIterator<Item = &'a ImportTable>) -> Self {
        let mut refs: Vec<&str> = vec![schema::CODE];
        for table in nested {
            refs.extend(table.descriptors.iter().map(String::as_str));
        }
        refs.extend(class.superclass.as_deref());
        refs.extend(class.interfaces.iter().map(String::as_str));
        refs.extend(class.fields().map(|f| strip_array(&f.type_)));
        for method in class.methods() {
            refs.push(strip_array(&method.proto.return_type));
            refs.extend(method.proto.parameters.iter().map(|p| strip_array(p)));
        }
        refs.sort_unstable();
        refs.dedup();

        let mut by_brief: BTreeMap<String, &str> = BTreeMap::new();
        for desc in refs.into_iter().filter(|d| d.starts_with('L')) {
            let slot = by_brief.entry(brief(desc)).or_insert(desc);
            if slot.len() < desc.len() {
                *slot = desc;
            }
        }
        by_brief.insert(brief(&class.name), &class.name);

        Self {
            descriptors: by_brief.into_values().map(str::to_string).collect(),
        }
    }

    pub fn contains(&self, desc: &str) -> bool {
        self.descriptors.contains(desc)
    }

    /// Sorted descriptors.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.descriptors.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// How source text names `desc`: the short name when imported, the dotted
    /// name with `$` turned into `.` otherwise. Arrays keep their brackets.
    pub fn name(&self, desc: &str) -> String {
        if self.contains(strip_array(desc)) {
            brief(desc)
        } else {
            type_nice(desc).replace('$', ".")
        }
    }
}

/// Injective short names for the field and method references a class uses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    pub methods: BTreeMap<MethodRef, String>,
    pub fields: BTreeMap<FieldRef, String>,
}

impl AliasTable {
    /// Scan virtual methods then direct methods of `class` and alias every
    /// referenced field and method in first-encounter order.
    pub fn build(class: &Class) -> Self {
        let mut table = Self::default();
        let mut method_names = HashSet::new();
        let mut field_names = HashSet::new();
        let methods = class.virtual_methods.iter().chain(&class.direct_methods);
        for code in methods.filter_map(|m| m.code.as_ref()) {
            for insn in &code.insns {
                match &insn.special {
                    Special::Method(m) if !table.methods.contains_key(m) => {
                        let alias = unique_alias(&mut method_names, &m.class, &m.name);
                        table.methods.insert(m.clone(), alias);
                    }
                    Special::Field(f) if !table.fields.contains_key(f) => {
                        let alias = unique_alias(&mut field_names, &f.class, &f.name);
                        table.fields.insert(f.clone(), alias);
                    }
                    _ => {}
                }
            }
        }
        table
    }

    pub fn method(&self, m: &MethodRef) -> Option<&str> {
        self.methods.get(m).map(String::as_str)
    }

    pub fn field(&self, f: &FieldRef) -> Option<&str> {
        self.fields.get(f).map(String::as_str)
    }
}

/// `Brief.name`, then `Brief.name_1`, `Brief.name_2`, ... until unused.
fn unique_alias(taken: &mut HashSet<String>, class: &str, name: &str) -> String {
    let base = format!("{}.{name}", brief(class));
    let mut alias = base.clone();
    let mut n = 0;
    while !taken.insert(alias.clone()) {
        n += 1;
        alias = format!("{base}_{n}");
    }
    alias
}

/// One class in the tree.
#[derive(Debug, Clone, Default)]
pub struct ClassNode {
    pub outer: Option<usize>,
    pub inner: Vec<usize>,
    /// Inherited from the top-level class for nested classes.
    pub imports: ImportTable,
    pub aliases: AliasTable,
}

/// Arena of [`ClassNode`]s, index-aligned with the container's classes.
#[derive(Debug, Clone, Default)]
pub struct ClassTree {
    pub nodes: Vec<ClassNode>,
}

impl ClassTree {
    pub fn build(file: &DexFile) -> Self {
        let index: HashMap<&str, usize> = file
            .classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.as_str(), i))
            .collect();
        let mut nodes = vec![ClassNode::default(); file.classes.len()];

        for (i, class) in file.classes.iter().enumerate() {
            let Some(pos) = class.name.rfind('$') else {
                continue;
            };
            let outer_name = format!("{};", &class.name[..pos]);
            match index.get(outer_name.as_str()) {
                Some(&outer) => {
                    nodes[i].outer = Some(outer);
                    nodes[outer].inner.push(i);
                }
                None => log::warn!("Failed to find outer class definition for {}", class.name),
            }
        }

        let mut tree = Self { nodes };
        for root in tree.roots().collect::<Vec<_>>() {
            let imports = tree.build_imports(file, root);
            tree.inherit_imports(root, &imports);
            tree.build_aliases(file, root);
        }
        log::debug!("built symbol tables for {} classes", tree.nodes.len());
        tree
    }

    /// Classes with no outer class, in container order.
    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.outer.is_none())
            .map(|(i, _)| i)
    }

    pub fn node(&self, index: usize) -> &ClassNode {
        &self.nodes[index]
    }

    fn build_imports(&self, file: &DexFile, index: usize) -> ImportTable {
        let nested: Vec<ImportTable> = self.nodes[index]
            .inner
            .iter()
            .map(|&i| self.build_imports(file, i))
            .collect();
        ImportTable::build(&file.classes[index], &nested)
    }

    fn inherit_imports(&mut self, index: usize, imports: &ImportTable) {
        self.nodes[index].imports = imports.clone();
        for i in self.nodes[index].inner.clone() {
            self.inherit_imports(i, imports);
        }
    }

    fn build_aliases(&mut self, file: &DexFile, index: usize) {
        self.nodes[index].aliases = AliasTable::build(&file.classes[index]);
        for i in self.nodes[index].inner.clone() {
            self.build_aliases(file, i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dexasm_file::{AccessFlags, Code, Field, Method};
    use dexasm_ir::{Instruction, Prototype};
    use dexasm_isa::Opcode;

    fn call(class: &str, name: &str) -> Instruction {
        Instruction::new(
            Opcode::INVOKE_STATIC,
            vec![],
            Special::Method(MethodRef::new(class, name, Prototype::new("V", vec![]))),
        )
    }

    #[test]
    fn longer_descriptor_wins_brief_collisions() {
        let mut class = Class::new("Lp/Main;");
        class
            .instance_fields
            .push(Field::new("a", "La/List;", AccessFlags::PUBLIC));
        class
            .instance_fields
            .push(Field::new("b", "[Ljava/util/List;", AccessFlags::PUBLIC));
        let table = ImportTable::build(&class, []);
        assert!(table.contains("Ljava/util/List;"));
        assert!(!table.contains("La/List;"));
        assert_eq!(table.name("[Ljava/util/List;"), "List[]");
        assert_eq!(table.name("La/List;"), "a.List");
        assert!(table.contains("Lp/Main;"));
        assert!(table.contains(schema::CODE));
    }

    #[test]
    fn self_name_beats_longer_imports() {
        let mut class = Class::new("La/Node;");
        class
            .instance_fields
            .push(Field::new("n", "Lorg/w3c/dom/Node;", AccessFlags::PUBLIC));
        let table = ImportTable::build(&class, []);
        assert!(table.contains("La/Node;"));
        assert!(!table.contains("Lorg/w3c/dom/Node;"));
    }

    #[test]
    fn unimported_nested_names_use_dots() {
        let table = ImportTable::default();
        assert_eq!(table.name("Ljava/util/Map$Entry;"), "java.util.Map.Entry");
        assert_eq!(table.name("I"), "int");
    }

    #[test]
    fn alias_collisions_get_suffixes() {
        let mut class = Class::new("La/Main;");
        let mut m = Method::new("run", Prototype::new("V", vec![]), AccessFlags::PUBLIC);
        let mut other = MethodRef::new("Lb/Util;", "log", Prototype::new("V", vec![]));
        other.proto.parameters.push("I".into());
        m.code = Some(Code {
            insns: vec![
                call("La/Util;", "log"),
                call("Lb/Util;", "log"),
                Instruction::new(Opcode::INVOKE_STATIC, vec![0], Special::Method(other.clone())),
                call("La/Util;", "log"),
            ],
            ..Code::default()
        });
        class.virtual_methods.push(m);

        let table = AliasTable::build(&class);
        assert_eq!(table.methods.len(), 3);
        let a = MethodRef::new("La/Util;", "log", Prototype::new("V", vec![]));
        let b = MethodRef::new("Lb/Util;", "log", Prototype::new("V", vec![]));
        assert_eq!(table.method(&a), Some("Util.log"));
        assert_eq!(table.method(&b), Some("Util.log_1"));
        assert_eq!(table.method(&other), Some("Util.log_2"));
    }

    #[test]
    fn tree_links_nested_classes() {
        let file = DexFile {
            classes: vec![
                Class::new("La/Outer$Inner;"),
                Class::new("La/Outer;"),
                Class::new("La/Lost$Child;"),
            ],
        };
        let tree = ClassTree::build(&file);
        assert_eq!(tree.node(0).outer, Some(1));
        assert_eq!(tree.node(1).inner, vec![0]);
        assert_eq!(tree.roots().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(tree.node(0).imports, tree.node(1).imports);
        assert!(tree.node(1).imports.contains("La/Outer$Inner;"));
    }
}
