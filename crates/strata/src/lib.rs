//! Postgres schema synchronization for Rust, powered by facet reflection.
//!
//! strata works in two directions:
//!
//! - **db-first**: read the live catalog into a [`Catalog`] of tables, views
//!   and enum types, with each column mapped to a Rust type.
//! - **code-first**: describe tables as annotated Rust structs, then compute
//!   and run the DDL that brings the database in line with them.
//!
//! # Table models
//!
//! ```ignore
//! use facet::Facet;
//!
//! #[derive(Facet)]
//! #[facet(strata::table = "users")]
//! pub struct User {
//!     #[facet(strata::key)]
//!     pub id: i64,
//!
//!     /// Shown on the profile page
//!     #[facet(strata::length = "50")]
//!     pub name: String,
//!
//!     pub bio: Option<String>,
//! }
//!
//! strata::inventory::submit!(strata::TableDef::new::<User>());
//! ```
//!
//! # Reconciling
//!
//! ```ignore
//! let options = strata::IntrospectOptions::default();
//! let plan = strata::code_first(&client, &options, strata::table_descriptors()).await?;
//! println!("{plan}");
//! strata::apply(&client, &plan, &strata::sql::Postgres::default()).await?;
//! ```
//!
//! Reconciliation only adds: columns that exist in the database but not in
//! the model are reported and left alone.

mod diff;
mod emit;
mod error;
mod introspect;
mod options;
mod traced;

pub use diff::{Plan, TablePlan, plan, reconcile, reconcile_table};
pub use emit::create_table;
pub use error::Error;
pub use introspect::{ColumnRow, PrimaryKeyRow, build_table, introspect, resolve_column};
pub use options::{DEFAULT_EXCLUDED_SCHEMAS, IntrospectOptions};
pub use traced::{Connection, ConnectionExt, TracedConn};

pub use strata_schema::{
    Catalog, Constraint, ConstraintKind, DbTypeOverride, EnumTypeInfo, Field, PropertyDescriptor,
    SchemaError, StaticTable, TableDef, TableDescriptor, TableInfo, TableKind, TableMapping,
    TypeMapper, collect_descriptors, extract_table, extract_tables, typemap,
};

// Re-export attr grammar
pub use strata_schema::{__attr, __parse_attr, Attr};

/// Structured DDL and dialects.
pub use strata_sql as sql;

// Re-export inventory so models can register without depending on it
pub use inventory;

// Re-export facet so model crates derive against the same version
pub use facet;

/// Result type for strata operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Every table model registered through inventory, as descriptors.
pub fn table_descriptors() -> Vec<&'static dyn TableDescriptor> {
    collect_descriptors()
        .into_iter()
        .map(|def| def as &dyn TableDescriptor)
        .collect()
}

/// Read the existing schema.
pub async fn db_first<C: Connection>(conn: &C, options: &IntrospectOptions) -> Result<Catalog> {
    introspect(conn, options).await
}

/// Introspect the database, build the desired tables from `descriptors`
/// and plan the changes between them.
///
/// Enum types found in the catalog are available to the models, so a field
/// typed as a Rust enum maps onto the database enum of the same name.
pub async fn code_first<'a, C, I>(
    conn: &C,
    options: &IntrospectOptions,
    descriptors: I,
) -> Result<Plan>
where
    C: Connection,
    I: IntoIterator<Item = &'a dyn TableDescriptor>,
{
    let catalog = introspect(conn, options).await?;
    let desired = extract_tables(descriptors, &catalog.type_mapper())?;
    Ok(plan(&desired, &catalog))
}

/// Execute a plan as one batch. Returns `false` if there was nothing to run.
///
/// There is no surrounding transaction; pass a `tokio_postgres::Transaction`
/// as the connection to get one.
pub async fn apply<C: Connection>(
    conn: &C,
    plan: &Plan,
    dialect: &dyn sql::Dialect,
) -> Result<bool> {
    if plan.is_empty() {
        tracing::info!("no changes to apply");
        return Ok(false);
    }
    let batch = plan.to_sql(dialect);
    conn.traced().batch_execute(&batch).await?;
    tracing::info!(statements = plan.statement_count(), "applied schema changes");
    Ok(true)
}
