//! Verify command CLI handler.

use super::runtime;
use crate::config::SeederYamlConfig;
use crate::loader;
use crate::verify;
use anyhow::Context;

pub fn run(config: SeederYamlConfig, children: Option<usize>, json: bool) -> anyhow::Result<()> {
    let pg_config = config.database.to_pg_config()?;

    let rt = runtime()?;
    let summary = rt
        .block_on(async {
            let client = loader::connect(&pg_config).await?;
            verify::verify(&client, &config.schema, children).await
        })
        .context("verification query failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        eprintln!("Verification summary:");
        eprint!("{}", summary);
        eprintln!();
        if summary.is_consistent() {
            eprintln!("Result: PASSED");
        } else {
            eprintln!("Result: FAILED");
        }
    }

    if !summary.is_consistent() {
        std::process::exit(1);
    }

    Ok(())
}
