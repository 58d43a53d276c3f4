//! Reading the existing schema from the PostgreSQL system catalog.
//!
//! Queries run one at a time through [`TracedConn`]. Everything that can be
//! decided without a database (type resolution, length selection, key
//! bookkeeping) lives in plain functions over row structs so it can be
//! tested directly.

use strata_schema::typemap::{self, OBJECT_HOST_TYPE, TypeFamily};
use strata_schema::{Catalog, EnumTypeInfo, Field, TableInfo, TableKind, TypeMapper};
use tokio_postgres::Row;
use tracing::{debug, info};

use crate::options::IntrospectOptions;
use crate::traced::{Connection, ConnectionExt, TracedConn};
use crate::Result;

const SCHEMAS_SQL: &str = r#"
    SELECT schema_name::text
    FROM information_schema.schemata
    WHERE schema_name::text <> ALL($1::text[])
    ORDER BY schema_name
"#;

const TABLES_SQL: &str = r#"
    SELECT table_name::text
    FROM information_schema.tables
    WHERE table_schema = $1::text AND table_type = 'BASE TABLE'
    ORDER BY table_name
"#;

const VIEWS_SQL: &str = r#"
    SELECT table_name::text
    FROM information_schema.views
    WHERE table_schema = $1::text
    ORDER BY table_name
"#;

// Array columns are resolved through `typelem`, one level deep.
const COLUMNS_SQL: &str = r#"
    SELECT
        rel.oid AS rel_oid,
        att.attname::text AS name,
        att.attnotnull AS not_null,
        att.atttypmod AS type_modifier,
        des.description AS comment,
        typ.typname::text AS type_name,
        typ.typcategory::text AS category,
        elem.typname::text AS element_type,
        elem.typcategory::text AS element_category,
        col.udt_schema::text AS udt_schema,
        col.character_maximum_length::int4 AS character_maximum_length,
        col.numeric_precision::int4 AS numeric_precision,
        col.numeric_scale::int4 AS numeric_scale,
        col.datetime_precision::int4 AS datetime_precision
    FROM pg_catalog.pg_class rel
    JOIN pg_catalog.pg_namespace ns ON ns.oid = rel.relnamespace
    JOIN pg_catalog.pg_attribute att ON att.attrelid = rel.oid
    JOIN pg_catalog.pg_type typ ON typ.oid = att.atttypid
    LEFT JOIN pg_catalog.pg_type elem ON elem.oid = typ.typelem AND typ.typcategory = 'A'
    LEFT JOIN pg_catalog.pg_description des
        ON des.objoid = att.attrelid AND des.objsubid = att.attnum
    JOIN information_schema.columns col
        ON col.table_schema = ns.nspname
        AND col.table_name = rel.relname
        AND col.column_name = att.attname
    WHERE ns.nspname = $1::text
      AND rel.relname = $2::text
      AND att.attnum > 0
      AND NOT att.attisdropped
    ORDER BY att.attnum
"#;

const PRIMARY_KEYS_SQL: &str = r#"
    SELECT tc.constraint_name::text, kcu.column_name::text
    FROM information_schema.table_constraints tc
    JOIN information_schema.key_column_usage kcu
        ON kcu.constraint_schema = tc.constraint_schema
        AND kcu.constraint_name = tc.constraint_name
        AND kcu.table_schema = tc.table_schema
        AND kcu.table_name = tc.table_name
    WHERE tc.table_schema = $1::text
      AND tc.table_name = $2::text
      AND tc.constraint_type = 'PRIMARY KEY'
    ORDER BY tc.constraint_name, kcu.ordinal_position
"#;

const ENUMS_SQL: &str = r#"
    SELECT t.oid, t.typname::text, n.nspname::text
    FROM pg_catalog.pg_type t
    JOIN pg_catalog.pg_namespace n ON n.oid = t.typnamespace
    WHERE t.typtype = 'e'
      AND n.nspname::text <> ALL($1::text[])
    ORDER BY t.oid
"#;

const ENUM_LABELS_SQL: &str = r#"
    SELECT enumlabel::text
    FROM pg_catalog.pg_enum
    WHERE enumtypid = $1
    ORDER BY enumsortorder
"#;

/// One row of the column query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnRow {
    /// Oid of the owning relation
    pub rel_oid: u32,
    pub name: String,
    pub not_null: bool,
    pub comment: Option<String>,
    /// `typname` of the column's own type (`_int4` for `int4[]`)
    pub type_name: String,
    /// `typcategory` of the column's own type
    pub category: String,
    /// Element type, only for array columns
    pub element_type: Option<String>,
    pub element_category: Option<String>,
    /// Schema of the column's type, as reported by `information_schema`
    pub udt_schema: String,
    /// `atttypmod`; -1 when the type has no modifier
    pub type_modifier: i32,
    pub character_maximum_length: Option<i32>,
    pub numeric_precision: Option<i32>,
    pub numeric_scale: Option<i32>,
    pub datetime_precision: Option<i32>,
}

impl ColumnRow {
    fn from_row(row: &Row) -> Self {
        Self {
            rel_oid: row.get("rel_oid"),
            name: row.get("name"),
            not_null: row.get("not_null"),
            comment: row.get("comment"),
            type_name: row.get("type_name"),
            category: row.get("category"),
            element_type: row.get("element_type"),
            element_category: row.get("element_category"),
            udt_schema: row.get("udt_schema"),
            type_modifier: row.get("type_modifier"),
            character_maximum_length: row.get("character_maximum_length"),
            numeric_precision: row.get("numeric_precision"),
            numeric_scale: row.get("numeric_scale"),
            datetime_precision: row.get("datetime_precision"),
        }
    }

    pub fn is_array(&self) -> bool {
        self.category == "A"
    }

    /// The type the column holds, looking through one level of array.
    fn resolved_type(&self) -> (&str, &str) {
        match (&self.element_type, &self.element_category) {
            (Some(elem), Some(category)) if self.is_array() => (elem, category),
            _ => (&self.type_name, &self.category),
        }
    }
}

/// One row of the primary-key query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryKeyRow {
    pub constraint_name: String,
    pub column_name: String,
}

/// Turn a catalog column row into a [`Field`].
pub fn resolve_column(row: &ColumnRow, mapper: &TypeMapper) -> Field {
    let (type_name, category) = row.resolved_type();
    let is_enum = category == "E";

    let db_type = if is_enum {
        format!("{}.{}", row.udt_schema, type_name)
    } else {
        type_name.to_string()
    };

    let host_type = if is_enum {
        type_name.to_string()
    } else {
        let host = mapper.db_to_host(&db_type);
        if host == OBJECT_HOST_TYPE {
            debug!(column = %row.name, db_type = %db_type, "no host type mapping, using {OBJECT_HOST_TYPE}");
        }
        host
    };

    // information_schema reports no dimensions for array columns.
    let (length, numeric_scale) = if row.is_array() {
        typmod_dimensions(type_name, row.type_modifier)
    } else {
        let scale = if type_name == "numeric" {
            row.numeric_scale.unwrap_or(0)
        } else {
            0
        };
        (column_length(type_name, row), scale)
    };

    Field {
        name: row.name.clone(),
        length,
        numeric_scale,
        db_type,
        host_type,
        not_null: row.not_null,
        is_array: row.is_array(),
        identity: false,
        comment: row.comment.clone().filter(|c| !c.is_empty()),
        oid: Some(row.rel_oid),
    }
}

/// Length whose meaning depends on the type family: numeric precision for
/// numbers, datetime precision for temporal types, character length otherwise.
fn column_length(type_name: &str, row: &ColumnRow) -> i32 {
    let length = match typemap::family_of_db(type_name) {
        Some(TypeFamily::Integer | TypeFamily::Float) => row.numeric_precision,
        Some(TypeFamily::Numeric) if type_name == "numeric" => row.numeric_precision,
        Some(TypeFamily::Temporal) => row.datetime_precision,
        _ => row.character_maximum_length,
    };
    length.unwrap_or(0)
}

/// Size of the varlena header folded into character and numeric typmods.
const VARHDRSZ: i32 = 4;

/// Length and scale decoded from `atttypmod` for the element type.
///
/// `varchar(n)` / `bpchar(n)` store `n + 4`; `numeric(p,s)` stores
/// `((p << 16) | s) + 4`. Anything else reads as `(0, 0)`.
fn typmod_dimensions(type_name: &str, typmod: i32) -> (i32, i32) {
    if typmod < VARHDRSZ {
        return (0, 0);
    }
    let packed = typmod - VARHDRSZ;
    match type_name {
        "varchar" | "bpchar" => (packed, 0),
        "numeric" => ((packed >> 16) & 0xffff, packed & 0xffff),
        _ => (0, 0),
    }
}

/// Build a table from its column rows, then mark its primary keys.
pub fn build_table(
    schema: &str,
    name: &str,
    kind: TableKind,
    columns: &[ColumnRow],
    keys: &[PrimaryKeyRow],
    mapper: &TypeMapper,
) -> Result<TableInfo> {
    let mut table = TableInfo::new(schema, name, kind);
    for row in columns {
        table.push_field(resolve_column(row, mapper))?;
    }
    for key in keys {
        table.add_primary_key(&key.constraint_name, &key.column_name)?;
    }
    Ok(table)
}

/// Read schemas, tables, views, columns, primary keys and enum types.
pub async fn introspect<C: Connection>(conn: &C, options: &IntrospectOptions) -> Result<Catalog> {
    let conn = conn.traced();
    let mut catalog = Catalog::new();

    catalog.enums = load_enums(&conn, options).await?;
    let mapper = catalog.type_mapper();

    catalog.schemas = load_schemas(&conn, options).await?;
    for schema in catalog.schemas.clone() {
        for (name, kind) in load_relations(&conn, &schema).await? {
            let columns = load_columns(&conn, &schema, &name).await?;
            let keys = match kind {
                TableKind::Table => load_primary_keys(&conn, &schema, &name).await?,
                TableKind::View => Vec::new(),
            };
            let table = build_table(&schema, &name, kind, &columns, &keys, &mapper)?;
            debug!(
                table = %table.qualified_name(),
                kind = %kind,
                fields = table.fields.len(),
                "introspected relation"
            );
            catalog.insert_table(table);
        }
    }

    info!(
        schemas = catalog.schemas.len(),
        tables = catalog.tables.len(),
        enums = catalog.enums.len(),
        "introspection complete"
    );
    Ok(catalog)
}

async fn load_schemas<C: Connection>(
    conn: &TracedConn<'_, C>,
    options: &IntrospectOptions,
) -> Result<Vec<String>> {
    let excluded = options.excluded_schemas();
    let rows = conn.query(SCHEMAS_SQL, &[&excluded]).await?;
    Ok(rows.iter().map(|row| row.get(0)).collect())
}

/// Base tables first, then views, each sorted by name.
async fn load_relations<C: Connection>(
    conn: &TracedConn<'_, C>,
    schema: &str,
) -> Result<Vec<(String, TableKind)>> {
    let mut relations = Vec::new();
    for row in conn.query(TABLES_SQL, &[&schema]).await? {
        relations.push((row.get(0), TableKind::Table));
    }
    for row in conn.query(VIEWS_SQL, &[&schema]).await? {
        relations.push((row.get(0), TableKind::View));
    }
    Ok(relations)
}

async fn load_columns<C: Connection>(
    conn: &TracedConn<'_, C>,
    schema: &str,
    table: &str,
) -> Result<Vec<ColumnRow>> {
    let rows = conn.query(COLUMNS_SQL, &[&schema, &table]).await?;
    Ok(rows.iter().map(ColumnRow::from_row).collect())
}

async fn load_primary_keys<C: Connection>(
    conn: &TracedConn<'_, C>,
    schema: &str,
    table: &str,
) -> Result<Vec<PrimaryKeyRow>> {
    let rows = conn.query(PRIMARY_KEYS_SQL, &[&schema, &table]).await?;
    Ok(rows
        .iter()
        .map(|row| PrimaryKeyRow {
            constraint_name: row.get(0),
            column_name: row.get(1),
        })
        .collect())
}

async fn load_enums<C: Connection>(
    conn: &TracedConn<'_, C>,
    options: &IntrospectOptions,
) -> Result<Vec<EnumTypeInfo>> {
    let excluded = options.excluded_schemas();
    let mut enums = Vec::new();
    for row in conn.query(ENUMS_SQL, &[&excluded]).await? {
        let oid: u32 = row.get(0);
        let labels = conn
            .query(ENUM_LABELS_SQL, &[&oid])
            .await?
            .iter()
            .map(|label| label.get(0))
            .collect();
        enums.push(EnumTypeInfo {
            oid,
            type_name: row.get(1),
            namespace: row.get(2),
            labels,
        });
    }
    Ok(enums)
}
