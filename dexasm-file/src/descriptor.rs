//! Type descriptor helpers.
//!
//! Descriptors use the JVM form (`I`, `[J`, `Ljava/lang/String;`); the
//! "nice" form is the Java source spelling (`int`, `long[]`,
//! `java.lang.String`). Nested classes keep their `$` in both forms.

const PRIMITIVES: &[(char, &str)] = &[
    ('V', "void"),
    ('Z', "boolean"),
    ('B', "byte"),
    ('S', "short"),
    ('C', "char"),
    ('I', "int"),
    ('J', "long"),
    ('F', "float"),
    ('D', "double"),
];

/// Descriptor to Java spelling: `[Ljava/lang/String;` -> `java.lang.String[]`.
pub fn type_nice(desc: &str) -> String {
    let base = desc.trim_start_matches('[');
    let dims = desc.len() - base.len();
    let mut out = if let Some(class) = base.strip_prefix('L').and_then(|s| s.strip_suffix(';')) {
        class.replace('/', ".")
    } else {
        let mut chars = base.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => PRIMITIVES
                .iter()
                .find(|(d, _)| *d == c)
                .map_or_else(|| base.to_string(), |(_, n)| n.to_string()),
            _ => base.to_string(),
        }
    };
    for _ in 0..dims {
        out.push_str("[]");
    }
    out
}

/// Java spelling to descriptor: `int[]` -> `[I`, `a.b.C` -> `La/b/C;`.
pub fn type_name(nice: &str) -> String {
    let mut base = nice.trim();
    let mut dims = 0;
    while let Some(rest) = base.strip_suffix("[]") {
        base = rest;
        dims += 1;
    }
    let mut out = "[".repeat(dims);
    match PRIMITIVES.iter().find(|(_, n)| *n == base) {
        Some((d, _)) => out.push(*d),
        None => {
            out.push('L');
            out.push_str(&base.replace('.', "/"));
            out.push(';');
        }
    }
    out
}

/// Element type of an array descriptor (the descriptor itself otherwise).
pub fn strip_array(desc: &str) -> &str {
    desc.trim_start_matches('[')
}

/// Whether `desc` names a class type.
pub fn is_class(desc: &str) -> bool {
    desc.starts_with('L') && desc.ends_with(';')
}

/// Package path of a class descriptor, `Lcom/a/B;` -> `com/a`.
pub fn package(desc: &str) -> Option<&str> {
    let inner = desc.strip_prefix('L')?.strip_suffix(';')?;
    inner.rfind('/').map(|pos| &inner[..pos])
}

/// Short name used in source text: the part after the last `.` or `$` of
/// the Java spelling, array brackets kept.
pub fn brief(desc: &str) -> String {
    let nice = type_nice(desc);
    match nice.rfind(['.', '$']) {
        Some(pos) => nice[pos + 1..].to_string(),
        None => nice,
    }
}
