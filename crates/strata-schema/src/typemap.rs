//! Translation between PostgreSQL type names and Rust type names.
//!
//! Everything here is driven by [`TYPE_MAPPINGS`]. The mapping is many to
//! one in the database-to-Rust direction (`text`, `bpchar` and `varchar`
//! all read as `String`), so each Rust type has exactly one canonical
//! database type it maps back to.

use crate::{EnumTypeInfo, SchemaError};

/// Rust type used for database types with no mapping.
pub const OBJECT_HOST_TYPE: &str = "Value";

/// Character width that is not written out as a type modifier.
pub const DEFAULT_CHARACTER_WIDTH: i32 = 255;

/// Groups of types that share length semantics and nullability policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeFamily {
    Integer,
    Float,
    Numeric,
    Boolean,
    Character,
    Temporal,
    Uuid,
    Binary,
    Document,
    Network,
    Xml,
    Bit,
    Object,
}

impl TypeFamily {
    /// Value types have a natural non-null value and default to NOT NULL.
    pub fn is_value(self) -> bool {
        matches!(
            self,
            TypeFamily::Integer
                | TypeFamily::Float
                | TypeFamily::Numeric
                | TypeFamily::Boolean
                | TypeFamily::Temporal
                | TypeFamily::Uuid
                | TypeFamily::Network
        )
    }

    /// Families whose Rust declaration is always `Option<_>` in generated code.
    pub fn always_optional(self) -> bool {
        matches!(
            self,
            TypeFamily::Binary
                | TypeFamily::Document
                | TypeFamily::Network
                | TypeFamily::Xml
                | TypeFamily::Bit
                | TypeFamily::Object
        )
    }
}

/// One row of the mapping table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeMapping {
    /// Catalog type name (`pg_type.typname`)
    pub db_type: &'static str,
    pub host_type: &'static str,
    pub family: TypeFamily,
    /// Whether `host_type` maps back to this `db_type`.
    pub canonical: bool,
}

const fn canonical(db_type: &'static str, host_type: &'static str, family: TypeFamily) -> TypeMapping {
    TypeMapping {
        db_type,
        host_type,
        family,
        canonical: true,
    }
}

const fn alias(db_type: &'static str, host_type: &'static str, family: TypeFamily) -> TypeMapping {
    TypeMapping {
        db_type,
        host_type,
        family,
        canonical: false,
    }
}

pub static TYPE_MAPPINGS: &[TypeMapping] = &[
    canonical("int2", "i16", TypeFamily::Integer),
    canonical("int4", "i32", TypeFamily::Integer),
    canonical("int8", "i64", TypeFamily::Integer),
    canonical("float4", "f32", TypeFamily::Float),
    canonical("float8", "f64", TypeFamily::Float),
    canonical("numeric", "Decimal", TypeFamily::Numeric),
    alias("money", "Decimal", TypeFamily::Numeric),
    canonical("bool", "bool", TypeFamily::Boolean),
    canonical("varchar", "String", TypeFamily::Character),
    alias("text", "String", TypeFamily::Character),
    alias("bpchar", "String", TypeFamily::Character),
    alias("name", "String", TypeFamily::Character),
    canonical("date", "Date", TypeFamily::Temporal),
    canonical("time", "Time", TypeFamily::Temporal),
    alias("timetz", "Time", TypeFamily::Temporal),
    canonical("timestamp", "DateTime", TypeFamily::Temporal),
    canonical("timestamptz", "Timestamp", TypeFamily::Temporal),
    canonical("interval", "Span", TypeFamily::Temporal),
    canonical("uuid", "Uuid", TypeFamily::Uuid),
    canonical("bytea", "Vec<u8>", TypeFamily::Binary),
    canonical("jsonb", "JsonValue", TypeFamily::Document),
    alias("json", "JsonValue", TypeFamily::Document),
    canonical("inet", "IpAddr", TypeFamily::Network),
    alias("cidr", "IpAddr", TypeFamily::Network),
    canonical("macaddr", "MacAddress", TypeFamily::Network),
    alias("macaddr8", "MacAddress", TypeFamily::Network),
    canonical("xml", "XmlDocument", TypeFamily::Xml),
    canonical("bit", "BitVec", TypeFamily::Bit),
    alias("varbit", "BitVec", TypeFamily::Bit),
];

/// Rust types that read naturally as an existing database type but are
/// never produced by [`db_to_host`].
static HOST_ALIASES: &[(&str, &str)] = &[
    ("i8", "int2"),
    ("u8", "int2"),
    ("u16", "int4"),
    ("u32", "int8"),
    ("u64", "int8"),
    ("usize", "int8"),
    ("isize", "int8"),
    ("&str", "varchar"),
    ("str", "varchar"),
    ("Cow<str>", "varchar"),
    ("NaiveDate", "date"),
    ("NaiveTime", "time"),
    ("NaiveDateTime", "timestamp"),
    ("DateTime<Utc>", "timestamptz"),
    ("DateTime<Local>", "timestamptz"),
    ("Zoned", "timestamptz"),
    ("Ipv4Addr", "inet"),
    ("Ipv6Addr", "inet"),
];

/// SQL spellings that the catalog reports under a different name.
static DB_ALIASES: &[(&str, &str)] = &[
    ("smallint", "int2"),
    ("integer", "int4"),
    ("int", "int4"),
    ("bigint", "int8"),
    ("real", "float4"),
    ("double precision", "float8"),
    ("float", "float8"),
    ("decimal", "numeric"),
    ("boolean", "bool"),
    ("character varying", "varchar"),
    ("character", "bpchar"),
    ("char", "bpchar"),
    ("time without time zone", "time"),
    ("time with time zone", "timetz"),
    ("timestamp without time zone", "timestamp"),
    ("timestamp with time zone", "timestamptz"),
    ("bit varying", "varbit"),
];

/// Lowercases a database type name and rewrites SQL-standard spellings to
/// the catalog name, so `"Integer"` and `int4` compare equal.
pub fn normalize_db_type(db_type: &str) -> String {
    let lowered = db_type.trim().to_ascii_lowercase();
    let collapsed = lowered.split_whitespace().collect::<Vec<_>>().join(" ");
    DB_ALIASES
        .iter()
        .find(|(spelling, _)| *spelling == collapsed)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or(collapsed)
}

/// The mapping entry for a database type, if any.
pub fn lookup_db(db_type: &str) -> Option<&'static TypeMapping> {
    let normalized = normalize_db_type(db_type);
    TYPE_MAPPINGS.iter().find(|m| m.db_type == normalized)
}

/// Rust type for a database type. Unmapped types read as [`OBJECT_HOST_TYPE`].
pub fn db_to_host(db_type: &str) -> &'static str {
    lookup_db(db_type).map_or(OBJECT_HOST_TYPE, |m| m.host_type)
}

/// Canonical database type for a Rust type, including host-only aliases.
pub fn host_to_db(host_type: &str) -> Option<&'static str> {
    let host_type = host_type.trim();
    if let Some(m) = TYPE_MAPPINGS
        .iter()
        .find(|m| m.canonical && m.host_type == host_type)
    {
        return Some(m.db_type);
    }
    HOST_ALIASES
        .iter()
        .find(|(host, _)| *host == host_type)
        .map(|(_, db)| *db)
}

/// Splits `Vec<T>` into `(T, true)`. `Vec<u8>` is a blob, not an array.
///
/// ```
/// use strata_schema::typemap::split_array_host;
/// assert_eq!(split_array_host("Vec<i32>"), ("i32", true));
/// assert_eq!(split_array_host("Vec<u8>"), ("Vec<u8>", false));
/// assert_eq!(split_array_host("String"), ("String", false));
/// ```
pub fn split_array_host(host_type: &str) -> (&str, bool) {
    let trimmed = host_type.trim();
    match trimmed
        .strip_prefix("Vec<")
        .and_then(|rest| rest.strip_suffix('>'))
    {
        Some(inner) if inner.trim() != "u8" => (inner.trim(), true),
        _ => (trimmed, false),
    }
}

pub fn family_of_db(db_type: &str) -> Option<TypeFamily> {
    lookup_db(db_type).map(|m| m.family)
}

pub fn family_of_host(host_type: &str) -> Option<TypeFamily> {
    if host_type == OBJECT_HOST_TYPE {
        return Some(TypeFamily::Object);
    }
    host_to_db(host_type).and_then(family_of_db)
}

/// Whether a Rust type is implicitly non-null when not wrapped in `Option`.
///
/// Types the mapper doesn't know (user enums, newtypes with an explicit
/// database type) are treated as values.
pub fn is_value_type(host_type: &str) -> bool {
    if split_array_host(host_type).1 {
        return false;
    }
    family_of_host(host_type).is_none_or(TypeFamily::is_value)
}

pub fn always_optional(host_type: &str) -> bool {
    family_of_host(host_type).is_some_and(TypeFamily::always_optional)
}

pub fn is_character_host(host_type: &str) -> bool {
    family_of_host(host_type) == Some(TypeFamily::Character)
}

/// The type mapper, extended with the enum types of one catalog.
#[derive(Debug, Clone, Default)]
pub struct TypeMapper {
    enums: Vec<EnumTypeInfo>,
}

impl TypeMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enums(enums: impl IntoIterator<Item = EnumTypeInfo>) -> Self {
        Self {
            enums: enums.into_iter().collect(),
        }
    }

    /// Rust type for a database type; known enums read as their type name.
    pub fn db_to_host(&self, db_type: &str) -> String {
        if let Some(e) = self.enums.iter().find(|e| e.qualified_name() == db_type) {
            return e.type_name.clone();
        }
        db_to_host(db_type).to_string()
    }

    /// Database type for a Rust type, or `None` when nothing matches.
    ///
    /// Enum types match on their type name, ignoring case and underscores,
    /// so a Rust `OrderStatus` finds a database `order_status`.
    pub fn resolve_host(&self, host_type: &str) -> Option<String> {
        if let Some(db) = host_to_db(host_type) {
            return Some(db.to_string());
        }
        self.enums
            .iter()
            .find(|e| enum_name_matches(&e.type_name, host_type))
            .map(EnumTypeInfo::qualified_name)
    }

    /// Like [`TypeMapper::resolve_host`], but an unmapped type is an error
    /// naming the field it came from.
    pub fn host_to_db(&self, table: &str, field: &str, host_type: &str) -> Result<String, SchemaError> {
        self.resolve_host(host_type)
            .ok_or_else(|| SchemaError::UnmappedHostType {
                table: table.to_string(),
                field: field.to_string(),
                host_type: host_type.to_string(),
            })
    }
}

fn enum_name_matches(type_name: &str, host_type: &str) -> bool {
    let strip = |s: &str| s.chars().filter(|c| *c != '_').collect::<String>();
    type_name == host_type || strip(type_name).eq_ignore_ascii_case(&strip(host_type))
}
