//! Schema model types for strata.
//!
//! Both sides of a reconciliation use the same shapes: the catalog
//! introspector in `strata` fills them from a live database, and the
//! [`descriptor`] extractor fills them from annotated Rust types.

use indexmap::IndexMap;
use std::fmt;
use strata_sql::{QualifiedName, SqlType, TypeModifier};

pub mod descriptor;
mod error;
mod reflect;
pub mod typemap;

pub use descriptor::{
    DbTypeOverride, PropertyDescriptor, StaticTable, TableDescriptor, TableMapping,
    extract_table, extract_tables,
};
pub use error::SchemaError;
pub use reflect::{TableDef, collect_descriptors};
pub use typemap::{TypeFamily, TypeMapper, TypeMapping};

// Define the strata attribute grammar using facet's macro.
// This generates:
// - `Attr` enum with all attribute variants
// - `__attr!` macro for parsing attributes
// - Re-exports for use as `strata::table`, `strata::key`, etc.
facet::define_attr_grammar! {
    ns "strata";
    crate_path ::strata;

    /// Strata schema attribute types.
    pub enum Attr {
        /// Marks a struct as a table model.
        ///
        /// Usage: `#[facet(strata::table = "users")]`
        Table(&'static str),

        /// Schema the table lives in (default: `public`).
        ///
        /// Usage: `#[facet(strata::schema = "billing")]`
        Schema(&'static str),

        /// Marks a field as (part of) the primary key.
        ///
        /// Usage: `#[facet(strata::key)]`
        Key,

        /// Marks a field as not null even if its type would allow null.
        ///
        /// Usage: `#[facet(strata::required)]`
        Required,

        /// Explicit database type, mandatory for types the mapper doesn't know.
        ///
        /// Usage: `#[facet(strata::db_type = "citext")]`
        DbType(&'static str),

        /// Declared length, or precision and scale.
        ///
        /// Usage: `#[facet(strata::length = "50")]` or `#[facet(strata::length = "10,2")]`
        Length(&'static str),

        /// Overrides the column name (default: the field name).
        ///
        /// Usage: `#[facet(strata::column = "column_name")]`
        Column(&'static str),
    }
}

/// Whether a relation is a base table or a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableKind {
    #[default]
    Table,
    View,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKind::Table => write!(f, "Table"),
            TableKind::View => write!(f, "View"),
        }
    }
}

/// Kinds of constraints strata tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    PrimaryKey,
}

/// A constraint on a single column.
///
/// Composite keys show up as several constraints sharing one name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub name: String,
    /// Name of the constrained field.
    pub field: String,
    pub kind: ConstraintKind,
}

/// A column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Field {
    /// Column name
    pub name: String,
    /// Database type name, schema-qualified for enum types (e.g. `public.mood`)
    pub db_type: String,
    /// Rust type name; the element type for arrays
    pub host_type: String,
    /// Whether the column rejects NULL
    pub not_null: bool,
    /// Whether the column is an array of `db_type`
    pub is_array: bool,
    /// Character length, numeric precision or datetime precision, depending
    /// on the type family. Zero when unknown.
    pub length: i32,
    /// Numeric scale, only ever non-zero for `numeric`
    pub numeric_scale: i32,
    /// Whether the column is (part of) the primary key
    pub identity: bool,
    /// Column comment / doc comment
    pub comment: Option<String>,
    /// Catalog oid of the owning relation (existing state only)
    pub oid: Option<u32>,
}

impl Field {
    /// Create a nullable, non-array field.
    pub fn new(
        name: impl Into<String>,
        db_type: impl Into<String>,
        host_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            db_type: db_type.into(),
            host_type: host_type.into(),
            ..Default::default()
        }
    }

    pub fn not_null(mut self, not_null: bool) -> Self {
        self.not_null = not_null;
        self
    }

    pub fn identity(mut self) -> Self {
        self.identity = true;
        self.not_null = true;
        self
    }

    pub fn length(mut self, length: i32) -> Self {
        self.length = length;
        self
    }

    pub fn scale(mut self, scale: i32) -> Self {
        self.numeric_scale = scale;
        self
    }

    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    /// The `(length)` / `(precision,scale)` clause this field renders with.
    ///
    /// Character types only show a length that differs from the default
    /// width; everything else only shows precision when a scale is declared.
    pub fn type_modifier(&self) -> Option<TypeModifier> {
        if self.length <= 0 {
            return None;
        }
        if typemap::is_character_host(&self.host_type) {
            (self.length != typemap::DEFAULT_CHARACTER_WIDTH)
                .then_some(TypeModifier::Length(self.length))
        } else if self.numeric_scale > 0 {
            Some(TypeModifier::Precision {
                precision: self.length,
                scale: self.numeric_scale,
            })
        } else {
            None
        }
    }

    /// The column type as written in DDL.
    pub fn sql_type(&self) -> SqlType {
        SqlType::new(&self.db_type)
            .with_modifier(self.type_modifier())
            .array(self.is_array)
    }

    /// Whether generated Rust code declares this column as `Option<_>`.
    ///
    /// Nullable columns always are. So are arrays and the host types with no
    /// natural non-null value (blobs, documents, network and XML types, bit
    /// strings, the untyped fallback), even when the column is `NOT NULL`.
    pub fn host_optional(&self) -> bool {
        !self.not_null || self.is_array || typemap::always_optional(&self.host_type)
    }

    /// The Rust declaration for this column, e.g. `Option<Vec<i32>>`.
    pub fn host_decl(&self) -> String {
        let base = if self.is_array {
            format!("Vec<{}>", self.host_type)
        } else {
            self.host_type.clone()
        };
        if self.host_optional() {
            format!("Option<{base}>")
        } else {
            base
        }
    }
}

/// A table or view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableInfo {
    pub schema: String,
    pub name: String,
    pub kind: TableKind,
    /// Columns in catalog attribute order
    pub fields: Vec<Field>,
    pub constraints: Vec<Constraint>,
}

impl TableInfo {
    pub fn new(schema: impl Into<String>, name: impl Into<String>, kind: TableKind) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            kind,
            fields: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn qualified_name(&self) -> QualifiedName {
        QualifiedName::new(&self.schema, &self.name)
    }

    /// Append a field, keeping field names unique.
    pub fn push_field(&mut self, field: Field) -> Result<(), SchemaError> {
        if self.field(&field.name).is_some() {
            return Err(SchemaError::DuplicateField {
                table: self.qualified_name().to_string(),
                field: field.name,
            });
        }
        self.fields.push(field);
        Ok(())
    }

    /// Builder-style [`TableInfo::push_field`] over several fields.
    pub fn with_fields(
        mut self,
        fields: impl IntoIterator<Item = Field>,
    ) -> Result<Self, SchemaError> {
        for field in fields {
            self.push_field(field)?;
        }
        Ok(self)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Record a primary-key constraint and mark its field as identity.
    pub fn add_primary_key(
        &mut self,
        constraint: impl Into<String>,
        field: &str,
    ) -> Result<(), SchemaError> {
        let constraint = constraint.into();
        let Some(target) = self.fields.iter_mut().find(|f| f.name == field) else {
            return Err(SchemaError::UnknownConstraintField {
                table: self.qualified_name().to_string(),
                constraint,
                field: field.to_string(),
            });
        };
        target.identity = true;

        let exists = self
            .constraints
            .iter()
            .any(|c| c.name == constraint && c.field == field);
        if !exists {
            self.constraints.push(Constraint {
                name: constraint,
                field: field.to_string(),
                kind: ConstraintKind::PrimaryKey,
            });
        }
        Ok(())
    }

    pub fn identity_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.identity)
    }

    pub fn primary_keys(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints
            .iter()
            .filter(|c| c.kind == ConstraintKind::PrimaryKey)
    }

    /// Whether a primary-key constraint covers the given field.
    pub fn has_primary_key_on(&self, field: &str) -> bool {
        self.primary_keys().any(|c| c.field == field)
    }
}

/// A database enum type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumTypeInfo {
    pub oid: u32,
    pub type_name: String,
    /// Namespace (schema) the type is defined in
    pub namespace: String,
    /// Labels in declaration order
    pub labels: Vec<String>,
}

impl EnumTypeInfo {
    /// `namespace.type_name`, the form columns refer to the type by.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.namespace, self.type_name)
    }
}

/// Everything the introspector found in a database.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// Non-excluded schema names, sorted
    pub schemas: Vec<String>,
    /// Tables and views, in discovery order
    pub tables: IndexMap<QualifiedName, TableInfo>,
    pub enums: Vec<EnumTypeInfo>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_table(&mut self, table: TableInfo) {
        self.tables.insert(table.qualified_name(), table);
    }

    pub fn find_table(&self, schema: &str, name: &str) -> Option<&TableInfo> {
        self.tables.get(&QualifiedName::new(schema, name))
    }

    pub fn iter_tables(&self) -> impl Iterator<Item = &TableInfo> {
        self.tables.values()
    }

    /// A type mapper that knows this catalog's enum types.
    pub fn type_mapper(&self) -> TypeMapper {
        TypeMapper::with_enums(self.enums.iter().cloned())
    }
}

#[cfg(test)]
mod tests;
