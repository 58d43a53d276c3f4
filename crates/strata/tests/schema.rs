use strata::facet::Facet;
use rust_decimal::Decimal;
use strata::sql::{Postgres, render};
use strata::{TableDef, TableDescriptor, TypeMapper, create_table, extract_table};

#[derive(Facet)]
#[facet(strata::table = "users")]
struct User {
    #[facet(strata::key)]
    id: i64,

    /// Display name
    #[facet(strata::length = "50")]
    name: String,

    bio: Option<String>,

    #[facet(strata::column = "email_address", strata::db_type = "citext")]
    email: String,

    tags: Vec<String>,

    #[facet(strata::length = "12,2")]
    balance: Decimal,

    created_at: jiff::Timestamp,

    avatar: Option<Vec<u8>>,
}

#[derive(Facet)]
#[facet(strata::table = "audit_log", strata::schema = "audit")]
struct AuditEntry {
    #[facet(strata::key)]
    id: i64,

    #[facet(strata::required)]
    message: String,

    level: Option<i16>,
}

#[derive(Facet)]
struct Scratch {
    value: i32,
}

strata::inventory::submit!(TableDef::new::<User>());
strata::inventory::submit!(TableDef::new::<AuditEntry>());

#[test]
fn test_registered_models() {
    let mut names: Vec<String> = strata::table_descriptors()
        .into_iter()
        .filter_map(|d| d.mapping())
        .map(|m| format!("{}.{}", m.schema, m.name))
        .collect();
    names.sort();
    assert_eq!(names, ["audit.audit_log", "public.users"]);
}

#[test]
fn test_untagged_struct_is_not_a_model() {
    let def = TableDef::new::<Scratch>();
    assert!(def.mapping().is_none());
    assert!(
        extract_table(&def, &TypeMapper::new())
            .unwrap()
            .is_none()
    );
}

#[test]
fn test_user_properties() {
    let props = TableDef::new::<User>().properties().unwrap();
    let summary: Vec<String> = props
        .iter()
        .map(|p| {
            format!(
                "{} {} optional={} key={} length={:?} db_type={:?}",
                p.name, p.host_type, p.optional, p.key, p.length, p.db_type
            )
        })
        .collect();

    insta::assert_snapshot!(summary.join("\n"), @r#"
id i64 optional=false key=true length=None db_type=Absent
name String optional=false key=false length=Some("50") db_type=Absent
bio String optional=true key=false length=None db_type=Absent
email_address String optional=false key=false length=None db_type=Explicit("citext")
tags Vec<String> optional=false key=false length=None db_type=Absent
balance Decimal optional=false key=false length=Some("12,2") db_type=Absent
created_at Timestamp optional=false key=false length=None db_type=Absent
avatar Vec<u8> optional=true key=false length=None db_type=Absent
"#);
    assert_eq!(props[1].comment.as_deref(), Some("Display name"));
}

#[test]
fn test_user_create_table() {
    let table = extract_table(&TableDef::new::<User>(), &TypeMapper::new())
        .unwrap()
        .unwrap();

    insta::assert_snapshot!(render(&Postgres::default(), &create_table(&table)), @r#"
CREATE TABLE public.users
(
  "id" int8 PRIMARY KEY NOT NULL,
  "name" varchar(50) NULL,
  "bio" varchar NULL,
  "email_address" citext NULL,
  "tags" varchar[] NULL,
  "balance" numeric(12,2) NOT NULL,
  "created_at" timestamptz NOT NULL,
  "avatar" bytea NULL
)
WITH (OIDS=FALSE);
"#);
}

#[test]
fn test_audit_schema_and_required() {
    let table = extract_table(&TableDef::new::<AuditEntry>(), &TypeMapper::new())
        .unwrap()
        .unwrap();

    assert_eq!(table.qualified_name().to_string(), "audit.audit_log");
    assert!(table.field("message").unwrap().not_null);
    assert!(!table.field("level").unwrap().not_null);
    assert_eq!(table.field("level").unwrap().db_type, "int2");
}
