//! Table descriptors read from facet reflection.

use facet::{Facet, Shape, Type, UserType};

use crate::SchemaError;
use crate::descriptor::{DbTypeOverride, PropertyDescriptor, TableDescriptor, TableMapping};

/// A registered table model.
///
/// Submitted to inventory next to a struct marked with `#[facet(strata::table)]`:
///
/// ```ignore
/// #[derive(Facet)]
/// #[facet(strata::table = "users")]
/// struct User {
///     #[facet(strata::key)]
///     id: i32,
///     #[facet(strata::length = "50")]
///     name: String,
/// }
///
/// inventory::submit!(strata::TableDef::new::<User>());
/// ```
pub struct TableDef {
    /// The facet shape of the table struct.
    pub shape: &'static Shape,
}

inventory::collect!(TableDef);

impl TableDef {
    pub const fn new<T: Facet<'static>>() -> Self {
        Self { shape: T::SHAPE }
    }

    /// Get the table name from the `strata::table` attribute.
    pub fn table_name(&self) -> Option<&'static str> {
        shape_get_attr_str(self.shape, "table")
    }

    /// Get the schema from the `strata::schema` attribute, `public` if unset.
    pub fn schema_name(&self) -> &'static str {
        shape_get_attr_str(self.shape, "schema").unwrap_or("public")
    }
}

impl std::fmt::Debug for TableDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableDef")
            .field("shape", &format_args!("{}", self.shape))
            .finish()
    }
}

impl TableDescriptor for TableDef {
    fn mapping(&self) -> Option<TableMapping> {
        let name = self.table_name()?;
        Some(TableMapping::new(self.schema_name(), name))
    }

    fn properties(&self) -> Result<Vec<PropertyDescriptor>, SchemaError> {
        let struct_type = match &self.shape.ty {
            Type::User(UserType::Struct(s)) => s,
            _ => return Ok(Vec::new()),
        };

        let mut properties = Vec::with_capacity(struct_type.fields.len());
        for field in struct_type.fields {
            let (inner_shape, optional) = unwrap_option(field.shape.get());
            let name = field_get_attr_str(field, "column").unwrap_or(field.name);

            let db_type = if field_has_attr(field, "db_type") {
                match field_get_attr_str(field, "db_type") {
                    Some(db) if !db.trim().is_empty() => DbTypeOverride::Explicit(db.to_string()),
                    _ => DbTypeOverride::Empty,
                }
            } else {
                DbTypeOverride::Absent
            };

            let comment = if field.doc.is_empty() {
                None
            } else {
                Some(
                    field
                        .doc
                        .iter()
                        .map(|line| line.trim())
                        .collect::<Vec<_>>()
                        .join("\n"),
                )
            };

            properties.push(PropertyDescriptor {
                name: name.to_string(),
                host_type: shape_host_type(inner_shape),
                optional,
                required: field_has_attr(field, "required"),
                key: field_has_attr(field, "key"),
                db_type,
                length: field_get_attr_str(field, "length").map(str::to_string),
                comment,
            });
        }
        Ok(properties)
    }
}

/// Every table model registered through inventory.
pub fn collect_descriptors() -> Vec<&'static TableDef> {
    inventory::iter::<TableDef>.into_iter().collect()
}

/// Unwrap Option<T> to get the inner type and nullability.
fn unwrap_option(shape: &'static Shape) -> (&'static Shape, bool) {
    if shape.decl_id == Option::<()>::SHAPE.decl_id
        && let Some(inner) = shape.inner
    {
        return (inner, true);
    }
    (shape, false)
}

/// The Rust type name the type mapper knows a shape by.
fn shape_host_type(shape: &Shape) -> String {
    if matches!(&shape.def, facet::Def::List(_))
        && let Some(inner) = shape.inner
    {
        return format!("Vec<{}>", shape_host_type(inner));
    }

    let name = if shape == i8::SHAPE {
        "i8"
    } else if shape == u8::SHAPE {
        "u8"
    } else if shape == i16::SHAPE {
        "i16"
    } else if shape == u16::SHAPE {
        "u16"
    } else if shape == i32::SHAPE {
        "i32"
    } else if shape == u32::SHAPE {
        "u32"
    } else if shape == i64::SHAPE {
        "i64"
    } else if shape == u64::SHAPE {
        "u64"
    } else if shape == isize::SHAPE {
        "isize"
    } else if shape == usize::SHAPE {
        "usize"
    } else if shape == f32::SHAPE {
        "f32"
    } else if shape == f64::SHAPE {
        "f64"
    } else if shape == bool::SHAPE {
        "bool"
    } else if shape == String::SHAPE {
        "String"
    } else if shape == rust_decimal::Decimal::SHAPE {
        "Decimal"
    } else if shape == jiff::Timestamp::SHAPE {
        "Timestamp"
    } else if shape == jiff::Zoned::SHAPE {
        "Zoned"
    } else if shape == jiff::civil::Date::SHAPE {
        "Date"
    } else if shape == jiff::civil::Time::SHAPE {
        "Time"
    } else if shape == chrono::DateTime::<chrono::Utc>::SHAPE {
        "DateTime<Utc>"
    } else if shape == chrono::DateTime::<chrono::Local>::SHAPE {
        "DateTime<Local>"
    } else if shape == chrono::NaiveDateTime::SHAPE {
        "NaiveDateTime"
    } else if shape == chrono::NaiveDate::SHAPE {
        "NaiveDate"
    } else if shape == chrono::NaiveTime::SHAPE {
        "NaiveTime"
    } else if shape == uuid::Uuid::SHAPE {
        "Uuid"
    } else {
        // User enums and newtypes go by their own name.
        return shape.to_string();
    };
    name.to_string()
}

fn shape_get_attr_str(shape: &Shape, key: &str) -> Option<&'static str> {
    shape.attributes.iter().find_map(|attr| {
        if attr.ns() == Some("strata") && attr.key() == key {
            attr.get_as::<&str>().copied()
        } else {
            None
        }
    })
}

fn field_has_attr(field: &facet::Field, key: &str) -> bool {
    field
        .attributes
        .iter()
        .any(|attr| attr.ns() == Some("strata") && attr.key() == key)
}

fn field_get_attr_str(field: &facet::Field, key: &str) -> Option<&'static str> {
    field.attributes.iter().find_map(|attr| {
        if attr.ns() == Some("strata") && attr.key() == key {
            attr.get_as::<&str>().copied()
        } else {
            None
        }
    })
}
