use dexasm_ir::{FieldRef, MethodRef};

/// Retention of an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Visibility {
    Build = 0x00,
    Runtime = 0x01,
    System = 0x02,
}

impl Visibility {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0x00 => Some(Self::Build),
            0x01 => Some(Self::Runtime),
            0x02 => Some(Self::System),
            _ => None,
        }
    }
}

/// An encoded constant, as stored in annotations and static initial values.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Byte(i8),
    Short(i16),
    Char(u16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Type(String),
    Field(FieldRef),
    Method(MethodRef),
    Enum(FieldRef),
    Array(Vec<Value>),
    Annotation(EncodedAnnotation),
    Null,
    Boolean(bool),
}

impl Value {
    /// Tag byte used by the container codec.
    pub fn tag(&self) -> u8 {
        match self {
            Value::Byte(_) => 0x00,
            Value::Short(_) => 0x02,
            Value::Char(_) => 0x03,
            Value::Int(_) => 0x04,
            Value::Long(_) => 0x06,
            Value::Float(_) => 0x10,
            Value::Double(_) => 0x11,
            Value::String(_) => 0x17,
            Value::Type(_) => 0x18,
            Value::Field(_) => 0x19,
            Value::Method(_) => 0x1a,
            Value::Enum(_) => 0x1b,
            Value::Array(_) => 0x1c,
            Value::Annotation(_) => 0x1d,
            Value::Null => 0x1e,
            Value::Boolean(_) => 0x1f,
        }
    }

    /// Any integral value widened to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Byte(v) => Some(v.into()),
            Value::Short(v) => Some(v.into()),
            Value::Char(v) => Some(v.into()),
            Value::Int(v) => Some(v.into()),
            Value::Long(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&str> {
        match self {
            Value::Type(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_annotation(&self) -> Option<&EncodedAnnotation> {
        match self {
            Value::Annotation(a) => Some(a),
            _ => None,
        }
    }
}

/// A named annotation element.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub value: Value,
}

/// Annotation type plus its elements, without retention.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedAnnotation {
    pub type_: String,
    pub elements: Vec<Element>,
}

impl EncodedAnnotation {
    pub fn new(type_: impl Into<String>) -> Self {
        Self {
            type_: type_.into(),
            elements: Vec::new(),
        }
    }

    /// Builder-style element append.
    pub fn with(mut self, name: &str, value: Value) -> Self {
        self.elements.push(Element {
            name: name.to_string(),
            value,
        });
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.elements
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.value)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.elements
            .iter_mut()
            .find(|e| e.name == name)
            .map(|e| &mut e.value)
    }
}

/// An annotation attached to a class, field or method.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub visibility: Visibility,
    pub body: EncodedAnnotation,
}

impl Annotation {
    pub fn new(visibility: Visibility, body: EncodedAnnotation) -> Self {
        Self { visibility, body }
    }

    #[inline]
    pub fn type_(&self) -> &str {
        &self.body.type_
    }
}

/// Find the annotation of `type_` in `list`.
pub fn find<'a>(list: &'a [Annotation], type_: &str) -> Option<&'a Annotation> {
    list.iter().find(|a| a.type_() == type_)
}

/// Remove and return the first annotation of `type_` in `list`.
pub fn take(list: &mut Vec<Annotation>, type_: &str) -> Option<Annotation> {
    let idx = list.iter().position(|a| a.type_() == type_)?;
    Some(list.remove(idx))
}
