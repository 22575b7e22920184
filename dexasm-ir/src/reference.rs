use std::fmt;

/// Method signature: return type plus ordered parameter descriptors.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Prototype {
    pub return_type: String,
    pub parameters: Vec<String>,
}

impl Prototype {
    pub fn new(return_type: impl Into<String>, parameters: Vec<String>) -> Self {
        Self {
            return_type: return_type.into(),
            parameters,
        }
    }

    /// Build from a flat list whose first entry is the return type.
    pub fn from_list(list: &[String]) -> Option<Self> {
        let (ret, params) = list.split_first()?;
        Some(Self::new(ret.clone(), params.to_vec()))
    }

    /// Flatten to `[return, params...]`.
    pub fn to_list(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.parameters.len() + 1);
        out.push(self.return_type.clone());
        out.extend(self.parameters.iter().cloned());
        out
    }

    /// Register words taken by the parameters (`J` and `D` take two).
    pub fn parameter_words(&self) -> u16 {
        self.parameters
            .iter()
            .map(|p| if p == "J" || p == "D" { 2 } else { 1 })
            .sum()
    }

    /// `(params)return` descriptor form.
    pub fn descriptor(&self) -> String {
        let mut s = String::from("(");
        for p in &self.parameters {
            s.push_str(p);
        }
        s.push(')');
        s.push_str(&self.return_type);
        s
    }
}

impl fmt::Display for Prototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descriptor())
    }
}

/// Reference to a field. Ordered by name, then defining class, then type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldRef {
    pub name: String,
    pub class: String,
    pub type_: String,
}

impl FieldRef {
    pub fn new(class: impl Into<String>, name: impl Into<String>, type_: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class: class.into(),
            type_: type_.into(),
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}:{}", self.class, self.name, self.type_)
    }
}

/// Reference to a method. Ordered by name, then defining class, then
/// prototype.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MethodRef {
    pub name: String,
    pub class: String,
    pub proto: Prototype,
}

impl MethodRef {
    pub fn new(class: impl Into<String>, name: impl Into<String>, proto: Prototype) -> Self {
        Self {
            name: name.into(),
            class: class.into(),
            proto,
        }
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}{}", self.class, self.name, self.proto)
    }
}
