//! Introspection options.

/// Schemas skipped by default: PostGIS and TIGER geocoder schemas, plus the
/// system catalogs and toast/temp namespaces.
pub const DEFAULT_EXCLUDED_SCHEMAS: &[&str] = &[
    "geometry_columns",
    "raster_columns",
    "spatial_ref_sys",
    "raster_overviews",
    "us_gaz",
    "topology",
    "zip_lookup_all",
    "pg_toast",
    "pg_temp_1",
    "pg_toast_temp_1",
    "pg_catalog",
    "information_schema",
    "tiger",
    "tiger_data",
];

/// What the catalog introspector looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntrospectOptions {
    excluded_schemas: Vec<String>,
}

impl Default for IntrospectOptions {
    fn default() -> Self {
        Self {
            excluded_schemas: DEFAULT_EXCLUDED_SCHEMAS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl IntrospectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the deny-list entirely.
    pub fn with_excluded_schemas<I, S>(schemas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded_schemas: schemas.into_iter().map(Into::into).collect(),
        }
    }

    /// Add one schema to the deny-list.
    pub fn exclude(mut self, schema: impl Into<String>) -> Self {
        let schema = schema.into();
        if !self.is_excluded(&schema) {
            self.excluded_schemas.push(schema);
        }
        self
    }

    pub fn excluded_schemas(&self) -> &[String] {
        &self.excluded_schemas
    }

    pub fn is_excluded(&self, schema: &str) -> bool {
        self.excluded_schemas.iter().any(|s| s == schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_skip_system_and_gis_schemas() {
        let options = IntrospectOptions::default();
        for schema in ["pg_catalog", "information_schema", "tiger", "topology", "pg_toast"] {
            assert!(options.is_excluded(schema), "{schema}");
        }
        assert!(!options.is_excluded("public"));
    }

    #[test]
    fn test_replace_and_extend() {
        let options = IntrospectOptions::with_excluded_schemas(["audit"]).exclude("audit");
        assert_eq!(options.excluded_schemas(), ["audit"]);
        assert!(!options.is_excluded("pg_catalog"));
    }
}
