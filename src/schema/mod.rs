//! Target schema for the seeded dataset.
//!
//! Two tables: a parent keyed by UUID and a child whose foreign key points at
//! it. [`initialize`] drops and recreates both, so it can be run any number of
//! times.

use crate::encoder::CsvFormat;
use crate::error::SeedError;
use serde::{Deserialize, Serialize};
use tokio_postgres::Client;

/// Table and column names of the seeded dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedSchema {
    pub parent_table: String,
    pub child_table: String,
    /// Foreign-key column in the child table
    pub parent_key_column: String,
    /// Measurement column in the child table
    pub value_column: String,
}

impl Default for SeedSchema {
    fn default() -> Self {
        Self {
            parent_table: "activities".to_string(),
            child_table: "activities_consumptions".to_string(),
            parent_key_column: "activity_id".to_string(),
            value_column: "consumption".to_string(),
        }
    }
}

/// Destination of one bulk copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyTarget {
    pub table: String,
    pub statement: String,
}

impl SeedSchema {
    /// Drop-and-create script. The child table goes first so the FK never dangles.
    pub fn ddl(&self) -> String {
        let parent = quote_ident(&self.parent_table);
        let child = quote_ident(&self.child_table);
        let fk = quote_ident(&self.parent_key_column);
        let value = quote_ident(&self.value_column);

        format!(
            "DROP TABLE IF EXISTS {child};\n\
             DROP TABLE IF EXISTS {parent};\n\
             CREATE TABLE {parent} (\n    \
                 \"id\" uuid PRIMARY KEY DEFAULT gen_random_uuid(),\n    \
                 \"name\" text NOT NULL\n\
             );\n\
             CREATE TABLE {child} (\n    \
                 \"id\" uuid PRIMARY KEY DEFAULT gen_random_uuid(),\n    \
                 {fk} uuid NOT NULL REFERENCES {parent} (\"id\") DEFERRABLE INITIALLY DEFERRED,\n    \
                 {value} double precision NOT NULL\n\
             );"
        )
    }

    pub fn parent_copy(&self, format: CsvFormat) -> CopyTarget {
        CopyTarget {
            table: self.parent_table.clone(),
            statement: copy_statement(&self.parent_table, &["id", "name"], format),
        }
    }

    pub fn child_copy(&self, format: CsvFormat) -> CopyTarget {
        CopyTarget {
            table: self.child_table.clone(),
            statement: copy_statement(
                &self.child_table,
                &[self.parent_key_column.as_str(), self.value_column.as_str()],
                format,
            ),
        }
    }

    pub fn validate(&self) -> Result<(), SeedError> {
        let names = [
            &self.parent_table,
            &self.child_table,
            &self.parent_key_column,
            &self.value_column,
        ];
        if names.iter().any(|n| n.trim().is_empty()) {
            return Err(SeedError::Config(
                "table and column names must not be empty".to_string(),
            ));
        }
        if self.parent_table == self.child_table {
            return Err(SeedError::Config(format!(
                "parent and child table are both {}",
                self.parent_table
            )));
        }
        if self.parent_key_column == self.value_column || self.parent_key_column == "id" {
            return Err(SeedError::Config(format!(
                "child columns must be distinct from each other and from \"id\" (got {}, {})",
                self.parent_key_column, self.value_column
            )));
        }
        Ok(())
    }
}

/// Quote a PostgreSQL identifier, doubling embedded quotes
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn quote_literal(c: char) -> String {
    if c == '\'' {
        "''''".to_string()
    } else {
        format!("'{}'", c)
    }
}

/// `COPY ... FROM STDIN` for a CSV stream without header
pub fn copy_statement(table: &str, columns: &[&str], format: CsvFormat) -> String {
    let columns: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
    format!(
        "COPY {} ({}) FROM STDIN WITH (FORMAT csv, DELIMITER {}, QUOTE {})",
        quote_ident(table),
        columns.join(", "),
        quote_literal(format.delimiter() as char),
        quote_literal(format.quote() as char),
    )
}

/// Drop and recreate both tables
pub async fn initialize(client: &Client, schema: &SeedSchema) -> Result<(), SeedError> {
    schema.validate()?;
    client
        .batch_execute(&schema.ddl())
        .await
        .map_err(|e| SeedError::Schema(Box::new(e)))
}
