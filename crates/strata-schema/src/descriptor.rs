//! Building the desired schema from table descriptors.
//!
//! A [`TableDescriptor`] is anything that can say which table it maps to
//! and list its persisted properties. [`crate::TableDef`] reads that from
//! facet reflection; [`StaticTable`] is plain data.

use tracing::debug;

use crate::typemap::{self, TypeMapper};
use crate::{Field, SchemaError, TableInfo, TableKind};

/// The table a descriptor maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMapping {
    pub schema: String,
    pub name: String,
}

impl TableMapping {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }
}

/// What a property says about its database type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DbTypeOverride {
    /// No override: the type mapper decides.
    #[default]
    Absent,
    /// The override marker is there but carries no type.
    Empty,
    Explicit(String),
}

/// One persisted property of a table model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    /// Column name
    pub name: String,
    /// Rust type with any `Option` removed, e.g. `Vec<String>`
    pub host_type: String,
    /// Declared as `Option<_>`
    pub optional: bool,
    pub required: bool,
    pub key: bool,
    pub db_type: DbTypeOverride,
    /// Raw length annotation, `"50"` or `"10,2"`
    pub length: Option<String>,
    pub comment: Option<String>,
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>, host_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host_type: host_type.into(),
            optional: false,
            required: false,
            key: false,
            db_type: DbTypeOverride::Absent,
            length: None,
            comment: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn key(mut self) -> Self {
        self.key = true;
        self
    }

    pub fn db_type(mut self, db_type: impl Into<String>) -> Self {
        let db_type = db_type.into();
        self.db_type = if db_type.trim().is_empty() {
            DbTypeOverride::Empty
        } else {
            DbTypeOverride::Explicit(db_type)
        };
        self
    }

    pub fn length(mut self, length: impl Into<String>) -> Self {
        self.length = Some(length.into());
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// A source of table metadata.
pub trait TableDescriptor {
    /// The table this maps to, or `None` if it isn't a table model.
    fn mapping(&self) -> Option<TableMapping>;

    /// Persisted properties in declaration order.
    fn properties(&self) -> Result<Vec<PropertyDescriptor>, SchemaError>;
}

/// A table descriptor built by hand.
#[derive(Debug, Clone)]
pub struct StaticTable {
    mapping: TableMapping,
    properties: Vec<PropertyDescriptor>,
}

impl StaticTable {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            mapping: TableMapping::new(schema, name),
            properties: Vec::new(),
        }
    }

    pub fn property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }
}

impl TableDescriptor for StaticTable {
    fn mapping(&self) -> Option<TableMapping> {
        Some(self.mapping.clone())
    }

    fn properties(&self) -> Result<Vec<PropertyDescriptor>, SchemaError> {
        Ok(self.properties.clone())
    }
}

/// Build the desired [`TableInfo`] for one descriptor.
///
/// Returns `Ok(None)` for descriptors that are not table models.
pub fn extract_table(
    descriptor: &dyn TableDescriptor,
    mapper: &TypeMapper,
) -> Result<Option<TableInfo>, SchemaError> {
    let Some(mapping) = descriptor.mapping() else {
        return Ok(None);
    };
    let mut table = TableInfo::new(mapping.schema, mapping.name, TableKind::Table);
    let table_name = table.qualified_name().to_string();

    for prop in descriptor.properties()? {
        let field = extract_field(&table_name, &prop, mapper)?;
        table.push_field(field)?;
    }

    debug!(table = %table_name, fields = table.fields.len(), "extracted table model");
    Ok(Some(table))
}

/// Build every table model among `descriptors`, stopping at the first error.
pub fn extract_tables<'a>(
    descriptors: impl IntoIterator<Item = &'a dyn TableDescriptor>,
    mapper: &TypeMapper,
) -> Result<Vec<TableInfo>, SchemaError> {
    let mut tables = Vec::new();
    for descriptor in descriptors {
        if let Some(table) = extract_table(descriptor, mapper)? {
            tables.push(table);
        }
    }
    Ok(tables)
}

fn extract_field(
    table: &str,
    prop: &PropertyDescriptor,
    mapper: &TypeMapper,
) -> Result<Field, SchemaError> {
    let (element, is_array) = typemap::split_array_host(&prop.host_type);

    // Keys can never be NULL, whatever the declaration says.
    let not_null = if prop.key {
        true
    } else if prop.optional {
        false
    } else if prop.required {
        true
    } else {
        !is_array && typemap::is_value_type(element)
    };

    let db_type = match &prop.db_type {
        DbTypeOverride::Explicit(db) if !db.trim().is_empty() => typemap::normalize_db_type(db),
        DbTypeOverride::Explicit(_) | DbTypeOverride::Empty => {
            return Err(SchemaError::MissingDbType {
                table: table.to_string(),
                field: prop.name.clone(),
            });
        }
        DbTypeOverride::Absent => mapper.host_to_db(table, &prop.name, element)?,
    };

    let (length, numeric_scale) = match &prop.length {
        Some(raw) => parse_length(raw).ok_or_else(|| SchemaError::InvalidLength {
            table: table.to_string(),
            field: prop.name.clone(),
            value: raw.clone(),
        })?,
        None => (0, 0),
    };

    Ok(Field {
        name: prop.name.clone(),
        db_type,
        host_type: element.to_string(),
        not_null,
        is_array,
        length,
        numeric_scale,
        identity: prop.key,
        comment: prop.comment.clone(),
        oid: None,
    })
}

/// Parses `"n"` or `"n,s"` with non-negative integers.
fn parse_length(raw: &str) -> Option<(i32, i32)> {
    let mut parts = raw.split(',');
    let length = parts.next()?.trim().parse::<i32>().ok()?;
    let scale = match parts.next() {
        Some(s) => s.trim().parse::<i32>().ok()?,
        None => 0,
    };
    if parts.next().is_some() || length < 0 || scale < 0 {
        return None;
    }
    Some((length, scale))
}
