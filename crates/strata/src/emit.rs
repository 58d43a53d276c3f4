//! CREATE TABLE generation.

use strata_schema::TableInfo;
use strata_sql::{ColumnDef, CreateTable, DdlStmt};

/// Build the CREATE TABLE statement for a table.
///
/// A single identity column carries an inline `PRIMARY KEY`. Several
/// identity columns become one table-level key instead.
pub fn create_table(table: &TableInfo) -> DdlStmt {
    let identity: Vec<String> = table.identity_fields().map(|f| f.name.clone()).collect();
    let composite = identity.len() > 1;

    let mut create = CreateTable::new(table.qualified_name());
    for field in &table.fields {
        let column = ColumnDef::new(&field.name, field.sql_type())
            .not_null(field.not_null || field.identity);
        create = create.column(if field.identity && !composite {
            column.primary_key()
        } else {
            column
        });
    }
    if composite {
        create.primary_key = identity;
    }

    DdlStmt::CreateTable(create)
}
