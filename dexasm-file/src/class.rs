use dexasm_ir::{FieldRef, Instruction, MethodRef, Prototype, TryBlock};

use crate::annotation::{Annotation, Value};
use crate::modifiers::AccessFlags;

/// A class definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    /// Type descriptor, e.g. `Lcom/example/Foo;`.
    pub name: String,
    pub access: AccessFlags,
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub source_file: Option<String>,
    pub annotations: Vec<Annotation>,
    pub static_fields: Vec<Field>,
    pub instance_fields: Vec<Field>,
    pub direct_methods: Vec<Method>,
    pub virtual_methods: Vec<Method>,
    /// Initial values of the leading static fields.
    pub static_values: Vec<Value>,
}

impl Class {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            access: AccessFlags::PUBLIC,
            superclass: Some("Ljava/lang/Object;".to_string()),
            interfaces: Vec::new(),
            source_file: None,
            annotations: Vec::new(),
            static_fields: Vec::new(),
            instance_fields: Vec::new(),
            direct_methods: Vec::new(),
            virtual_methods: Vec::new(),
            static_values: Vec::new(),
        }
    }

    /// Direct methods followed by virtual methods.
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.direct_methods.iter().chain(&self.virtual_methods)
    }

    pub fn methods_mut(&mut self) -> impl Iterator<Item = &mut Method> {
        self.direct_methods
            .iter_mut()
            .chain(self.virtual_methods.iter_mut())
    }

    /// Static fields followed by instance fields.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.static_fields.iter().chain(&self.instance_fields)
    }

    pub fn fields_mut(&mut self) -> impl Iterator<Item = &mut Field> {
        self.static_fields
            .iter_mut()
            .chain(self.instance_fields.iter_mut())
    }

    /// Initial value of static field `index`, if one was recorded.
    pub fn static_value(&self, index: usize) -> Option<&Value> {
        self.static_values.get(index)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub type_: String,
    pub access: AccessFlags,
    pub annotations: Vec<Annotation>,
}

impl Field {
    pub fn new(name: impl Into<String>, type_: impl Into<String>, access: AccessFlags) -> Self {
        Self {
            name: name.into(),
            type_: type_.into(),
            access,
            annotations: Vec::new(),
        }
    }

    pub fn reference(&self, class: &str) -> FieldRef {
        FieldRef::new(class, self.name.clone(), self.type_.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub name: String,
    pub proto: Prototype,
    pub access: AccessFlags,
    pub annotations: Vec<Annotation>,
    pub code: Option<Code>,
}

impl Method {
    pub fn new(name: impl Into<String>, proto: Prototype, access: AccessFlags) -> Self {
        Self {
            name: name.into(),
            proto,
            access,
            annotations: Vec::new(),
            code: None,
        }
    }

    pub fn reference(&self, class: &str) -> MethodRef {
        MethodRef::new(class, self.name.clone(), self.proto.clone())
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.access.contains(AccessFlags::STATIC)
    }

    /// Registers taken by the incoming arguments, including `this`.
    pub fn ins_size(&self) -> u16 {
        self.proto.parameter_words() + u16::from(!self.is_static())
    }
}

/// A method body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Code {
    pub registers_size: u16,
    pub ins_size: u16,
    pub outs_size: u16,
    pub insns: Vec<Instruction>,
    pub tries: Vec<TryBlock>,
}
