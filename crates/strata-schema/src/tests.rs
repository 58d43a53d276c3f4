use super::*;

#[test]
fn test_type_modifier_character_default_width_hidden() {
    let f = Field::new("name", "varchar", "String").length(255);
    assert_eq!(f.type_modifier(), None);

    let f = Field::new("name", "varchar", "String").length(50);
    assert_eq!(f.type_modifier(), Some(TypeModifier::Length(50)));
}

#[test]
fn test_type_modifier_numeric_needs_scale() {
    let f = Field::new("total", "numeric", "Decimal").length(10);
    assert_eq!(f.type_modifier(), None);

    let f = Field::new("total", "numeric", "Decimal").length(10).scale(2);
    assert_eq!(
        f.type_modifier(),
        Some(TypeModifier::Precision {
            precision: 10,
            scale: 2
        })
    );
}

#[test]
fn test_type_modifier_zero_length() {
    let f = Field::new("name", "varchar", "String").scale(3);
    assert_eq!(f.type_modifier(), None);
}

#[test]
fn test_sql_type() {
    let f = Field::new("tags", "varchar", "String").length(40).array();
    assert_eq!(f.sql_type().to_string(), "varchar(40)[]");
}

#[test]
fn test_host_decl() {
    assert_eq!(Field::new("id", "int4", "i32").not_null(true).host_decl(), "i32");
    assert_eq!(Field::new("id", "int4", "i32").host_decl(), "Option<i32>");
    assert_eq!(
        Field::new("ids", "int4", "i32").not_null(true).array().host_decl(),
        "Option<Vec<i32>>"
    );
    assert_eq!(
        Field::new("doc", "jsonb", "JsonValue").not_null(true).host_decl(),
        "Option<JsonValue>"
    );
    assert_eq!(
        Field::new("name", "text", "String").not_null(true).host_decl(),
        "String"
    );
}

#[test]
fn test_push_field_rejects_duplicates() {
    let mut table = TableInfo::new("public", "users", TableKind::Table);
    table.push_field(Field::new("id", "int4", "i32")).unwrap();
    let err = table.push_field(Field::new("id", "int8", "i64")).unwrap_err();
    assert!(matches!(err, SchemaError::DuplicateField { ref field, .. } if field == "id"));
    assert_eq!(table.fields.len(), 1);
}

#[test]
fn test_add_primary_key() {
    let mut table = TableInfo::new("public", "post_tag", TableKind::Table)
        .with_fields([
            Field::new("post_id", "int8", "i64").not_null(true),
            Field::new("tag_id", "int8", "i64").not_null(true),
        ])
        .unwrap();

    table.add_primary_key("post_tag_pkey", "post_id").unwrap();
    table.add_primary_key("post_tag_pkey", "tag_id").unwrap();
    table.add_primary_key("post_tag_pkey", "tag_id").unwrap();

    assert_eq!(table.identity_fields().count(), 2);
    assert_eq!(table.constraints.len(), 2);
    assert!(table.has_primary_key_on("tag_id"));

    let err = table.add_primary_key("post_tag_pkey", "missing").unwrap_err();
    assert!(matches!(err, SchemaError::UnknownConstraintField { .. }));
}

#[test]
fn test_catalog_find_table() {
    let mut catalog = Catalog::new();
    catalog.insert_table(TableInfo::new("public", "users", TableKind::Table));
    catalog.insert_table(TableInfo::new("audit", "users", TableKind::View));

    assert_eq!(
        catalog.find_table("audit", "users").map(|t| t.kind),
        Some(TableKind::View)
    );
    assert!(catalog.find_table("public", "posts").is_none());
    let names: Vec<String> = catalog
        .iter_tables()
        .map(|t| t.qualified_name().to_string())
        .collect();
    assert_eq!(names, ["public.users", "audit.users"]);
}

fn users() -> StaticTable {
    StaticTable::new("public", "users")
        .property(PropertyDescriptor::new("id", "i32").key())
        .property(PropertyDescriptor::new("name", "String").length("50").required())
        .property(PropertyDescriptor::new("bio", "String"))
        .property(PropertyDescriptor::new("age", "i16").optional())
        .property(PropertyDescriptor::new("score", "f64"))
        .property(PropertyDescriptor::new("tags", "Vec<String>"))
        .property(PropertyDescriptor::new("avatar", "Vec<u8>"))
        .property(PropertyDescriptor::new("balance", "Decimal").length("12,2"))
        .property(PropertyDescriptor::new("email", "String").db_type("citext"))
        .property(PropertyDescriptor::new("joined", "Integer").db_type("Integer"))
}

#[test]
fn test_extract_table() {
    let table = extract_table(&users(), &TypeMapper::new()).unwrap().unwrap();
    assert_eq!(table.qualified_name().to_string(), "public.users");

    let summary: Vec<String> = table
        .fields
        .iter()
        .map(|f| {
            format!(
                "{} {} not_null={} array={} identity={}",
                f.name,
                f.sql_type(),
                f.not_null,
                f.is_array,
                f.identity
            )
        })
        .collect();
    insta::assert_snapshot!(summary.join("\n"), @r"
    id int4 not_null=true array=false identity=true
    name varchar(50) not_null=true array=false identity=false
    bio varchar not_null=false array=false identity=false
    age int2 not_null=false array=false identity=false
    score float8 not_null=true array=false identity=false
    tags varchar[] not_null=false array=true identity=false
    avatar bytea not_null=false array=false identity=false
    balance numeric(12,2) not_null=true array=false identity=false
    email citext not_null=false array=false identity=false
    joined int4 not_null=true array=false identity=false
    ");
}

#[test]
fn test_optional_key_is_still_not_null() {
    let table = StaticTable::new("public", "t")
        .property(PropertyDescriptor::new("id", "i64").key().optional());
    let table = extract_table(&table, &TypeMapper::new()).unwrap().unwrap();
    assert!(table.fields[0].not_null);
    assert!(table.fields[0].identity);
}

#[test]
fn test_extract_empty_db_type_override() {
    let table = StaticTable::new("public", "t")
        .property(PropertyDescriptor::new("x", "String").db_type("  "));
    let err = extract_table(&table, &TypeMapper::new()).unwrap_err();
    assert!(matches!(err, SchemaError::MissingDbType { ref field, .. } if field == "x"));
}

#[test]
fn test_extract_unmapped_host_type() {
    let table = StaticTable::new("public", "t").property(PropertyDescriptor::new("x", "Widget"));
    let err = extract_table(&table, &TypeMapper::new()).unwrap_err();
    assert!(
        matches!(err, SchemaError::UnmappedHostType { ref host_type, .. } if host_type == "Widget")
    );
}

#[test]
fn test_extract_invalid_length() {
    let table = StaticTable::new("public", "t")
        .property(PropertyDescriptor::new("x", "String").length("wide"));
    let err = extract_table(&table, &TypeMapper::new()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "public.t.x: invalid length `wide`, expected `length` or `length,scale`"
    );
}

#[test]
fn test_extract_duplicate_column() {
    let table = StaticTable::new("public", "t")
        .property(PropertyDescriptor::new("x", "i32"))
        .property(PropertyDescriptor::new("x", "i64"));
    let err = extract_table(&table, &TypeMapper::new()).unwrap_err();
    assert!(matches!(err, SchemaError::DuplicateField { .. }));
}

#[test]
fn test_extract_enum_column() {
    let mapper = TypeMapper::with_enums([EnumTypeInfo {
        oid: 16_400,
        type_name: "mood".to_string(),
        namespace: "public".to_string(),
        labels: vec!["sad".to_string(), "happy".to_string()],
    }]);
    let table = StaticTable::new("public", "people")
        .property(PropertyDescriptor::new("mood", "Mood"))
        .property(PropertyDescriptor::new("history", "Vec<Mood>"));
    let table = extract_table(&table, &mapper).unwrap().unwrap();

    assert_eq!(table.fields[0].db_type, "public.mood");
    assert!(table.fields[0].not_null);
    assert_eq!(table.fields[1].sql_type().to_string(), "public.mood[]");
    assert!(!table.fields[1].not_null);
}

struct NotATable;

impl TableDescriptor for NotATable {
    fn mapping(&self) -> Option<TableMapping> {
        None
    }

    fn properties(&self) -> Result<Vec<PropertyDescriptor>, SchemaError> {
        Ok(vec![PropertyDescriptor::new("x", "Widget")])
    }
}

#[test]
fn test_extract_tables_skips_non_models() {
    let users = users();
    let descriptors: Vec<&dyn TableDescriptor> = vec![&NotATable, &users];
    let tables = extract_tables(descriptors, &TypeMapper::new()).unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].name, "users");
}
