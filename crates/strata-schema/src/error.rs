use thiserror::Error;

/// Errors raised while building a schema model.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("{table}.{field}: `strata::db_type` is present but empty")]
    MissingDbType { table: String, field: String },

    #[error(
        "{table}.{field}: no database type is known for `{host_type}`; set `strata::db_type` on the field"
    )]
    UnmappedHostType {
        table: String,
        field: String,
        host_type: String,
    },

    #[error("{table}.{field}: invalid length `{value}`, expected `length` or `length,scale`")]
    InvalidLength {
        table: String,
        field: String,
        value: String,
    },

    #[error("duplicate field `{field}` in {table}")]
    DuplicateField { table: String, field: String },

    #[error("constraint `{constraint}` on {table} references unknown field `{field}`")]
    UnknownConstraintField {
        table: String,
        constraint: String,
        field: String,
    },
}
