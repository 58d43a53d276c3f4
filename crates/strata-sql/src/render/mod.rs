//! Render DDL statements to SQL text.

use std::fmt;

use crate::stmt::*;
use crate::{Ident, MaybeQuoted};

/// A SQL flavour that knows how to write [`DdlStmt`]s.
///
/// Rendering is the last step of a plan, so swapping the dialect never
/// changes which statements are produced, only how they are spelled.
pub trait Dialect {
    fn write_stmt(&self, stmt: &DdlStmt, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

/// Wrapper for rendering a statement via `Display`.
pub struct Fmt<'a>(
    /// The dialect doing the writing.
    pub &'a dyn Dialect,
    /// The statement to render.
    pub &'a DdlStmt,
);

impl fmt::Display for Fmt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.write_stmt(self.1, f)
    }
}

/// Render a single statement.
pub fn render(dialect: &dyn Dialect, stmt: &DdlStmt) -> String {
    Fmt(dialect, stmt).to_string()
}

/// Render statements as one batch, one statement per line group.
pub fn render_batch(dialect: &dyn Dialect, stmts: &[DdlStmt]) -> String {
    let mut sql = String::new();
    for stmt in stmts {
        sql.push_str(&render(dialect, stmt));
        sql.push('\n');
    }
    sql
}

/// PostgreSQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Postgres {
    /// Append `WITH (OIDS=FALSE)` to CREATE TABLE. Still accepted by current
    /// servers, kept on by default for compatibility with older ones.
    pub oids_clause: bool,
}

impl Default for Postgres {
    fn default() -> Self {
        Self { oids_clause: true }
    }
}

impl Postgres {
    fn write_create_table(&self, create: &CreateTable, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CREATE TABLE {}", create.table)?;
        writeln!(f, "(")?;

        let mut clauses: Vec<String> = create
            .columns
            .iter()
            .map(|col| {
                let mut clause = format!("  {} {}", Ident(&col.name), col.ty);
                if col.primary_key {
                    clause.push_str(" PRIMARY KEY");
                }
                clause.push_str(if col.primary_key || col.not_null {
                    " NOT NULL"
                } else {
                    " NULL"
                });
                clause
            })
            .collect();

        if !create.primary_key.is_empty() {
            let cols: Vec<String> = create.primary_key.iter().map(|c| Ident(c).to_string()).collect();
            clauses.push(format!("  PRIMARY KEY ({})", cols.join(", ")));
        }

        for clause in &clauses[..clauses.len().saturating_sub(1)] {
            writeln!(f, "{clause},")?;
        }
        if let Some(last) = clauses.last() {
            writeln!(f, "{last}")?;
        }

        if self.oids_clause {
            writeln!(f, ")")?;
            write!(f, "WITH (OIDS=FALSE);")
        } else {
            write!(f, ");")
        }
    }
}

impl Dialect for Postgres {
    fn write_stmt(&self, stmt: &DdlStmt, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match stmt {
            DdlStmt::CreateTable(create) => self.write_create_table(create, f),
            DdlStmt::AddColumn { table, column, ty } => {
                write!(f, "ALTER TABLE {table} ADD COLUMN {} {ty};", Ident(column))
            }
            DdlStmt::AlterColumnType { table, column, ty } => {
                write!(f, "ALTER TABLE {table} ALTER COLUMN {} TYPE {ty};", Ident(column))
            }
            DdlStmt::SetNullability {
                table,
                column,
                nullable,
            } => {
                let action = if *nullable { "DROP NOT NULL" } else { "SET NOT NULL" };
                write!(f, "ALTER TABLE {table} ALTER COLUMN {} {action};", Ident(column))
            }
            DdlStmt::AddConstraint {
                table,
                name,
                columns,
            } => {
                let cols: Vec<String> = columns.iter().map(|c| Ident(c).to_string()).collect();
                write!(
                    f,
                    "ALTER TABLE {table} ADD CONSTRAINT {} PRIMARY KEY ({});",
                    MaybeQuoted(name),
                    cols.join(", ")
                )
            }
            DdlStmt::DropConstraint { table, name } => {
                write!(f, "ALTER TABLE {table} DROP CONSTRAINT {};", MaybeQuoted(name))
            }
        }
    }
}
