//! Init command CLI handler.

use super::runtime;
use crate::config::SeederYamlConfig;
use crate::loader;
use crate::schema;
use anyhow::Context;

pub fn run(config: SeederYamlConfig) -> anyhow::Result<()> {
    let pg_config = config.database.to_pg_config()?;

    let rt = runtime()?;
    rt.block_on(async {
        let client = loader::connect(&pg_config).await?;
        schema::initialize(&client, &config.schema).await
    })
    .context("schema initialization failed")?;

    eprintln!(
        "Recreated tables {} and {}",
        config.schema.parent_table, config.schema.child_table
    );
    Ok(())
}
