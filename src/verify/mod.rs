//! Post-load consistency checks.
//!
//! Counts committed rows in both tables and looks for broken parent/child
//! relationships:
//! - children whose key matches no parent (orphans)
//! - parents whose child count differs from the expected fan-out

use crate::error::SeedError;
use crate::schema::{quote_ident, SeedSchema};
use serde::Serialize;
use std::fmt;
use tokio_postgres::Client;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifySummary {
    pub parent_table: String,
    pub child_table: String,
    pub parents: u64,
    pub children: u64,
    pub orphans: u64,
    /// Only checked when an expected fan-out was given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uneven_parents: Option<u64>,
}

impl VerifySummary {
    pub fn is_consistent(&self) -> bool {
        self.orphans == 0 && self.uneven_parents.unwrap_or(0) == 0
    }
}

impl fmt::Display for VerifySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  {}: {} rows", self.parent_table, self.parents)?;
        writeln!(f, "  {}: {} rows", self.child_table, self.children)?;
        writeln!(f, "  Orphaned children: {}", self.orphans)?;
        if let Some(uneven) = self.uneven_parents {
            writeln!(f, "  Parents with unexpected child count: {}", uneven)?;
        }
        Ok(())
    }
}

/// Inspect the seeded tables. `children_per_parent` enables the fan-out check.
pub async fn verify(
    client: &Client,
    schema: &SeedSchema,
    children_per_parent: Option<usize>,
) -> Result<VerifySummary, SeedError> {
    let parent = quote_ident(&schema.parent_table);
    let child = quote_ident(&schema.child_table);
    let fk = quote_ident(&schema.parent_key_column);

    let parents = count(client, &schema.parent_table, &format!("SELECT count(*) FROM {}", parent)).await?;
    let children = count(client, &schema.child_table, &format!("SELECT count(*) FROM {}", child)).await?;
    let orphans = count(
        client,
        &schema.child_table,
        &format!(
            "SELECT count(*) FROM {child} c LEFT JOIN {parent} p ON p.\"id\" = c.{fk} WHERE p.\"id\" IS NULL"
        ),
    )
    .await?;

    let uneven_parents = match children_per_parent {
        Some(expected) => Some(
            count(
                client,
                &schema.parent_table,
                &format!(
                    "SELECT count(*) FROM {parent} p \
                     LEFT JOIN (SELECT {fk} AS pid, count(*) AS n FROM {child} GROUP BY {fk}) c \
                     ON c.pid = p.\"id\" \
                     WHERE coalesce(c.n, 0) <> {expected}"
                ),
            )
            .await?,
        ),
        None => None,
    };

    Ok(VerifySummary {
        parent_table: schema.parent_table.clone(),
        child_table: schema.child_table.clone(),
        parents,
        children,
        orphans,
        uneven_parents,
    })
}

async fn count(client: &Client, table: &str, sql: &str) -> Result<u64, SeedError> {
    let row = client
        .query_one(sql, &[])
        .await
        .map_err(|e| SeedError::from_postgres(table, e))?;
    let n: i64 = row
        .try_get(0)
        .map_err(|e| SeedError::from_postgres(table, e))?;
    Ok(n.max(0) as u64)
}
