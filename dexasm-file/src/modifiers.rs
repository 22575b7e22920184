//! Access flags for classes, fields and methods.

bitflags::bitflags! {
    /// Dalvik `access_flags`. Some bits mean different things on fields and
    /// methods (`VOLATILE`/`BRIDGE`, `TRANSIENT`/`VARARGS`).
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct AccessFlags: u32 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SYNCHRONIZED = 0x0020;
        const VOLATILE = 0x0040;
        const BRIDGE = 0x0040;
        const TRANSIENT = 0x0080;
        const VARARGS = 0x0080;
        const NATIVE = 0x0100;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const STRICT = 0x0800;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
        /// Method is `<init>` or `<clinit>`.
        const CONSTRUCTOR = 0x1_0000;
        const DECLARED_SYNCHRONIZED = 0x2_0000;
    }
}

impl AccessFlags {
    /// Java source modifiers for a class declaration.
    pub fn class_modifiers(self) -> Vec<&'static str> {
        let mut out = Vec::new();
        self.push_visibility(&mut out);
        if self.contains(Self::STATIC) {
            out.push("static");
        }
        if self.contains(Self::ABSTRACT) && !self.contains(Self::INTERFACE) {
            out.push("abstract");
        }
        if self.contains(Self::FINAL) {
            out.push("final");
        }
        out
    }

    /// Java source modifiers for a field declaration.
    pub fn field_modifiers(self) -> Vec<&'static str> {
        let mut out = Vec::new();
        self.push_visibility(&mut out);
        for (flag, word) in [
            (Self::STATIC, "static"),
            (Self::FINAL, "final"),
            (Self::VOLATILE, "volatile"),
            (Self::TRANSIENT, "transient"),
        ] {
            if self.contains(flag) {
                out.push(word);
            }
        }
        out
    }

    /// Java source modifiers for a method declaration.
    pub fn method_modifiers(self) -> Vec<&'static str> {
        let mut out = Vec::new();
        self.push_visibility(&mut out);
        for (flag, word) in [
            (Self::STATIC, "static"),
            (Self::FINAL, "final"),
            (Self::SYNCHRONIZED, "synchronized"),
            (Self::NATIVE, "native"),
            (Self::ABSTRACT, "abstract"),
            (Self::STRICT, "strictfp"),
        ] {
            if self.contains(flag) {
                out.push(word);
            }
        }
        out
    }

    fn push_visibility(self, out: &mut Vec<&'static str>) {
        if self.contains(Self::PUBLIC) {
            out.push("public");
        } else if self.contains(Self::PROTECTED) {
            out.push("protected");
        } else if self.contains(Self::PRIVATE) {
            out.push("private");
        }
    }
}
