//! Error taxonomy for the seeding pipeline.

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A generated record could not be serialized into the bulk-import format
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("column {column}: non-finite value {value} cannot be encoded")]
    NonFinite { column: &'static str, value: f64 },

    #[error("column {column}: text contains a NUL byte")]
    NulByte { column: &'static str },
}

/// Any failure that aborts a seeding run
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("encoding failed: {0}")]
    Encoding(#[from] EncodeError),

    #[error("bulk import into {table} rejected: {source}")]
    Import {
        table: String,
        #[source]
        source: BoxError,
    },

    #[error("connection to the store failed: {0}")]
    Connection(#[source] BoxError),

    #[error("schema setup failed: {0}")]
    Schema(#[source] BoxError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SeedError {
    /// Classify a driver error raised while working on `table`.
    ///
    /// Errors carrying a SQLSTATE came from the server rejecting data or a
    /// constraint; everything else is a transport failure. When the server
    /// names the offending relation (a deferred foreign key rejected at
    /// commit, for one) that name replaces `table`.
    pub fn from_postgres(table: &str, err: tokio_postgres::Error) -> Self {
        if err.code().is_none() {
            return SeedError::Connection(Box::new(err));
        }
        let table = err
            .as_db_error()
            .and_then(|db| db.table())
            .unwrap_or(table)
            .to_string();
        SeedError::Import {
            table,
            source: Box::new(err),
        }
    }

    /// Table named by an `Import` error
    pub fn table(&self) -> Option<&str> {
        match self {
            SeedError::Import { table, .. } => Some(table),
            _ => None,
        }
    }

    pub fn is_import(&self) -> bool {
        matches!(self, SeedError::Import { .. })
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, SeedError::Connection(_))
    }
}
