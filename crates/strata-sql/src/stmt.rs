//! DDL statements.

use crate::{QualifiedName, SqlType};

/// A schema-changing statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DdlStmt {
    CreateTable(CreateTable),

    /// `ALTER TABLE .. ADD COLUMN`. Columns are always added nullable; the
    /// desired nullability follows as a separate [`DdlStmt::SetNullability`].
    AddColumn {
        table: QualifiedName,
        column: String,
        ty: SqlType,
    },

    AlterColumnType {
        table: QualifiedName,
        column: String,
        ty: SqlType,
    },

    SetNullability {
        table: QualifiedName,
        column: String,
        nullable: bool,
    },

    /// `ADD CONSTRAINT .. PRIMARY KEY (..)`.
    AddConstraint {
        table: QualifiedName,
        name: String,
        columns: Vec<String>,
    },

    DropConstraint {
        table: QualifiedName,
        name: String,
    },
}

/// A CREATE TABLE statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTable {
    pub table: QualifiedName,
    pub columns: Vec<ColumnDef>,
    /// Table-level primary key, used when more than one column is part of
    /// the key. Single-column keys are inlined on the column instead.
    pub primary_key: Vec<String>,
}

impl CreateTable {
    pub fn new(table: QualifiedName) -> Self {
        Self {
            table,
            columns: Vec::new(),
            primary_key: Vec::new(),
        }
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }
}

/// A column clause inside CREATE TABLE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub ty: SqlType,
    /// Inline `PRIMARY KEY`.
    pub primary_key: bool,
    pub not_null: bool,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, ty: SqlType) -> Self {
        Self {
            name: name.into(),
            ty,
            primary_key: false,
            not_null: false,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.not_null = true;
        self
    }

    pub fn not_null(mut self, not_null: bool) -> Self {
        self.not_null = not_null;
        self
    }
}
