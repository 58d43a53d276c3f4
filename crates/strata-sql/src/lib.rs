//! Structured DDL and rendering.
//!
//! Schema changes are built as typed [`DdlStmt`] values, then rendered to
//! text by a [`Dialect`]. Keeping the two apart lets callers inspect a plan
//! without parsing SQL, and lets a different dialect reuse the same plan.

use std::fmt;

mod stmt;
pub use stmt::*;

mod render;
pub use render::*;

/// A PostgreSQL identifier wrapper.
///
/// Display always writes the value escaped and quoted with double quotes.
///
/// # Example
/// ```
/// use strata_sql::Ident;
/// assert_eq!(format!("{}", Ident("user")), "\"user\"");
/// assert_eq!(format!("{}", Ident("bla\"h")), "\"bla\"\"h\"");
/// ```
pub struct Ident<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> fmt::Display for Ident<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"")?;
        for c in self.0.as_ref().chars() {
            if c == '"' {
                write!(f, "\"\"")?;
            } else {
                write!(f, "{}", c)?;
            }
        }
        write!(f, "\"")
    }
}

/// An identifier that is only quoted when Postgres would otherwise fold or
/// reject it.
///
/// # Example
/// ```
/// use strata_sql::MaybeQuoted;
/// assert_eq!(format!("{}", MaybeQuoted("users")), "users");
/// assert_eq!(format!("{}", MaybeQuoted("Users")), "\"Users\"");
/// assert_eq!(format!("{}", MaybeQuoted("order")), "\"order\"");
/// ```
pub struct MaybeQuoted<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> fmt::Display for MaybeQuoted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.0.as_ref();
        if needs_quoting(s) {
            write!(f, "{}", Ident(s))
        } else {
            f.write_str(s)
        }
    }
}

/// Words that cannot appear as bare table or constraint names.
const RESERVED: &[&str] = &[
    "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "both", "case", "cast",
    "check", "collate", "column", "constraint", "create", "default", "desc", "distinct", "do",
    "else", "end", "except", "false", "for", "foreign", "from", "grant", "group", "having", "in",
    "into", "leading", "limit", "not", "null", "offset", "on", "only", "or", "order", "primary",
    "references", "select", "table", "then", "to", "true", "union", "unique", "user", "using",
    "when", "where", "with",
];

/// Returns true if `ident` must be double-quoted to survive as written.
pub fn needs_quoting(ident: &str) -> bool {
    let mut chars = ident.chars();
    let Some(first) = chars.next() else {
        return true;
    };
    if !(first.is_ascii_lowercase() || first == '_') {
        return true;
    }
    if !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '$') {
        return true;
    }
    RESERVED.contains(&ident)
}

/// A schema-qualified relation name, e.g. `public.users`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    pub schema: String,
    pub name: String,
}

impl QualifiedName {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", MaybeQuoted(&self.schema), MaybeQuoted(&self.name))
    }
}

/// Length or precision/scale attached to a column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeModifier {
    /// `(length)`, used for character types.
    Length(i32),
    /// `(precision,scale)`, used for the numeric family.
    Precision { precision: i32, scale: i32 },
}

impl fmt::Display for TypeModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeModifier::Length(len) => write!(f, "({len})"),
            TypeModifier::Precision { precision, scale } => write!(f, "({precision},{scale})"),
        }
    }
}

/// A column type as it appears in DDL: name, optional modifier, array marker.
///
/// The name is written verbatim; enum types arrive already schema-qualified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlType {
    pub name: String,
    pub modifier: Option<TypeModifier>,
    pub array: bool,
}

impl SqlType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modifier: None,
            array: false,
        }
    }

    pub fn with_modifier(mut self, modifier: Option<TypeModifier>) -> Self {
        self.modifier = modifier;
        self
    }

    pub fn array(mut self, array: bool) -> Self {
        self.array = array;
        self
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(modifier) = &self.modifier {
            write!(f, "{modifier}")?;
        }
        if self.array {
            f.write_str("[]")?;
        }
        Ok(())
    }
}
