//! Unit tests for the schema module.

use sql_seeder::encoder::CsvFormat;
use sql_seeder::schema::{copy_statement, quote_ident, SeedSchema};

#[test]
fn test_default_names() {
    let schema = SeedSchema::default();
    assert_eq!(schema.parent_table, "activities");
    assert_eq!(schema.child_table, "activities_consumptions");
    assert_eq!(schema.parent_key_column, "activity_id");
    assert_eq!(schema.value_column, "consumption");
}

#[test]
fn test_ddl_drops_child_before_parent() {
    let ddl = SeedSchema::default().ddl();
    let drop_child = ddl
        .find("DROP TABLE IF EXISTS \"activities_consumptions\"")
        .unwrap();
    let drop_parent = ddl.find("DROP TABLE IF EXISTS \"activities\"").unwrap();
    let create_parent = ddl.find("CREATE TABLE \"activities\"").unwrap();
    let create_child = ddl.find("CREATE TABLE \"activities_consumptions\"").unwrap();

    assert!(drop_child < drop_parent);
    assert!(drop_parent < create_parent);
    assert!(create_parent < create_child);
}

#[test]
fn test_ddl_column_types_and_keys() {
    let ddl = SeedSchema::default().ddl();
    assert!(ddl.contains("\"id\" uuid PRIMARY KEY DEFAULT gen_random_uuid()"));
    assert!(ddl.contains("\"name\" text NOT NULL"));
    assert!(ddl.contains(
        "\"activity_id\" uuid NOT NULL REFERENCES \"activities\" (\"id\") DEFERRABLE INITIALLY DEFERRED"
    ));
    assert!(ddl.contains("\"consumption\" double precision NOT NULL"));
}

#[test]
fn test_ddl_is_deterministic() {
    let schema = SeedSchema::default();
    assert_eq!(schema.ddl(), schema.ddl());
}

#[test]
fn test_quote_ident() {
    assert_eq!(quote_ident("users"), "\"users\"");
    assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
}

#[test]
fn test_copy_statements() {
    let schema = SeedSchema::default();
    let format = CsvFormat::default();

    let parent = schema.parent_copy(format);
    assert_eq!(parent.table, "activities");
    assert_eq!(
        parent.statement,
        "COPY \"activities\" (\"id\", \"name\") FROM STDIN WITH (FORMAT csv, DELIMITER ',', QUOTE '\"')"
    );

    let child = schema.child_copy(format);
    assert_eq!(child.table, "activities_consumptions");
    assert_eq!(
        child.statement,
        "COPY \"activities_consumptions\" (\"activity_id\", \"consumption\") FROM STDIN WITH (FORMAT csv, DELIMITER ',', QUOTE '\"')"
    );
}

#[test]
fn test_copy_statement_escapes_single_quote() {
    let format = CsvFormat::new(b'|', b'\'').unwrap();
    let sql = copy_statement("t", &["a"], format);
    assert!(sql.ends_with("DELIMITER '|', QUOTE '''')"));
}

#[test]
fn test_validate_rejects_bad_names() {
    let mut schema = SeedSchema::default();
    assert!(schema.validate().is_ok());

    schema.child_table = schema.parent_table.clone();
    assert!(schema.validate().is_err());

    let mut schema = SeedSchema::default();
    schema.value_column = " ".to_string();
    assert!(schema.validate().is_err());

    let mut schema = SeedSchema::default();
    schema.parent_key_column = "id".to_string();
    assert!(schema.validate().is_err());
}
