//! Schema diffing: compare desired tables against the catalog.
//!
//! Reconciliation is additive. Missing tables are created and missing
//! columns added; existing columns get their type and nullability brought in
//! line, and the primary key is replaced when its column set changes. Columns
//! that only exist in the database are never dropped. They are reported as
//! orphaned so a human can decide what to do with them.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use strata_schema::{Catalog, Field, TableInfo};
use strata_sql::{DdlStmt, Dialect, QualifiedName, render_batch};
use tracing::{info, warn};

use crate::emit::create_table;

/// The statements that bring one table in line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePlan {
    pub table: QualifiedName,
    pub statements: Vec<DdlStmt>,
    /// Columns that exist in the database but not in the desired model.
    pub orphaned: Vec<String>,
}

impl TablePlan {
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty() && self.orphaned.is_empty()
    }
}

/// A reconciliation plan over many tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    /// Tables that need statements or have orphaned columns, in input order.
    pub tables: Vec<TablePlan>,
}

impl Plan {
    /// Returns true if there is nothing to execute.
    pub fn is_empty(&self) -> bool {
        self.tables.iter().all(|t| t.statements.is_empty())
    }

    pub fn statement_count(&self) -> usize {
        self.tables.iter().map(|t| t.statements.len()).sum()
    }

    pub fn statements(&self) -> impl Iterator<Item = &DdlStmt> {
        self.tables.iter().flat_map(|t| t.statements.iter())
    }

    /// Render every statement as one batch.
    pub fn to_sql(&self, dialect: &dyn Dialect) -> String {
        let statements: Vec<DdlStmt> = self.statements().cloned().collect();
        render_batch(dialect, &statements)
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tables.iter().all(TablePlan::is_empty) {
            return writeln!(f, "No changes detected.");
        }
        writeln!(f, "Changes detected:\n")?;
        for table in &self.tables {
            writeln!(f, "  {}:", table.table)?;
            for stmt in &table.statements {
                writeln!(f, "    {}", Summary(stmt))?;
            }
            for column in &table.orphaned {
                writeln!(f, "    ! {column} (not in model, kept)")?;
            }
        }
        Ok(())
    }
}

/// One-line description of a statement for plan summaries.
struct Summary<'a>(&'a DdlStmt);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            DdlStmt::CreateTable(create) => {
                write!(f, "+ table ({} columns)", create.columns.len())
            }
            DdlStmt::AddColumn { column, ty, .. } => write!(f, "+ {column}: {ty}"),
            DdlStmt::AlterColumnType { column, ty, .. } => write!(f, "~ {column}: {ty}"),
            DdlStmt::SetNullability {
                column, nullable, ..
            } => {
                let to = if *nullable { "nullable" } else { "not null" };
                write!(f, "~ {column}: {to}")
            }
            DdlStmt::AddConstraint { name, columns, .. } => {
                write!(f, "+ PRIMARY KEY {name} ({})", columns.join(", "))
            }
            DdlStmt::DropConstraint { name, .. } => write!(f, "- CONSTRAINT {name}"),
        }
    }
}

/// Statements that turn `existing` into `desired`.
///
/// With no existing table this is a single CREATE TABLE.
pub fn reconcile(desired: &TableInfo, existing: Option<&TableInfo>) -> Vec<DdlStmt> {
    reconcile_table(desired, existing).statements
}

/// [`reconcile`], also reporting orphaned columns.
pub fn reconcile_table(desired: &TableInfo, existing: Option<&TableInfo>) -> TablePlan {
    let table = desired.qualified_name();
    let Some(existing) = existing else {
        return TablePlan {
            table,
            statements: vec![create_table(desired)],
            orphaned: Vec::new(),
        };
    };

    let mut statements = Vec::new();

    for field in &desired.fields {
        match existing.field(&field.name) {
            None => {
                // Added nullable first so existing rows don't block it.
                statements.push(DdlStmt::AddColumn {
                    table: table.clone(),
                    column: field.name.clone(),
                    ty: field.sql_type(),
                });
                statements.push(DdlStmt::SetNullability {
                    table: table.clone(),
                    column: field.name.clone(),
                    nullable: !field.not_null,
                });
            }
            Some(current) => {
                if type_changed(field, current) {
                    statements.push(DdlStmt::AlterColumnType {
                        table: table.clone(),
                        column: field.name.clone(),
                        ty: field.sql_type(),
                    });
                }
                if field.not_null != current.not_null {
                    statements.push(DdlStmt::SetNullability {
                        table: table.clone(),
                        column: field.name.clone(),
                        nullable: !field.not_null,
                    });
                }
            }
        }
    }

    // Postgres allows one primary key per table, so a key whose column set
    // changes is dropped before the new one is added.
    let identity: Vec<String> = desired.identity_fields().map(|f| f.name.clone()).collect();
    let current_key: BTreeSet<&str> = existing.primary_keys().map(|c| c.field.as_str()).collect();
    let key_changed = !identity.is_empty()
        && identity.iter().map(String::as_str).collect::<BTreeSet<_>>() != current_key;

    let mut dropped = HashSet::new();
    for constraint in existing.primary_keys() {
        let stale = key_changed || desired.field(&constraint.field).is_none();
        if stale && dropped.insert(constraint.name.as_str()) {
            statements.push(DdlStmt::DropConstraint {
                table: table.clone(),
                name: constraint.name.clone(),
            });
        }
    }

    if key_changed {
        statements.push(DdlStmt::AddConstraint {
            table: table.clone(),
            name: format!("pk_{}", desired.name),
            columns: identity,
        });
    }

    let orphaned: Vec<String> = existing
        .fields
        .iter()
        .filter(|f| desired.field(&f.name).is_none())
        .map(|f| f.name.clone())
        .collect();
    for column in &orphaned {
        warn!(table = %table, column = %column, "column exists in database but not in model; not dropping it");
    }

    TablePlan {
        table,
        statements,
        orphaned,
    }
}

/// Whether the column type must be altered. Length and scale only count
/// when the desired type actually renders a modifier.
fn type_changed(desired: &Field, current: &Field) -> bool {
    if desired.db_type != current.db_type || desired.is_array != current.is_array {
        return true;
    }
    let dims_differ =
        desired.length != current.length || desired.numeric_scale != current.numeric_scale;
    dims_differ && desired.type_modifier().is_some()
}

/// Reconcile every desired table against the table of the same
/// `schema.name` in the catalog.
pub fn plan(desired: &[TableInfo], catalog: &Catalog) -> Plan {
    let mut tables = Vec::new();
    for table in desired {
        let existing = catalog.find_table(&table.schema, &table.name);
        let table_plan = reconcile_table(table, existing);
        info!(
            table = %table_plan.table,
            exists = existing.is_some(),
            statements = table_plan.statements.len(),
            "planned table"
        );
        if !table_plan.is_empty() {
            tables.push(table_plan);
        }
    }
    Plan { tables }
}
