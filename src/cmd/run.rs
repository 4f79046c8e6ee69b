//! Run command CLI handler.

use super::runtime;
use crate::config::SeederYamlConfig;
use crate::error::SeedError;
use crate::generator::Generator;
use crate::loader;
use crate::pipeline::{self, RunSummary, SeedPlan};
use crate::progress::LoadProgress;
use anyhow::Context;

pub fn run(config: SeederYamlConfig, progress: bool, json: bool) -> anyhow::Result<()> {
    let pg_config = config.database.to_pg_config()?;
    let format = config.load.csv_format()?;
    config.schema.validate()?;

    // Generate random seed if not provided
    let seed = config.load.seed.unwrap_or_else(rand::random);
    let generator = Generator::new(config.load.parents, config.load.children_per_parent, seed);

    let plan = SeedPlan {
        schema: config.schema.clone(),
        generator,
        format,
        chunk_size: config.load.chunk_size,
        prefetch_depth: config.load.prefetch,
    };

    if !json {
        eprintln!(
            "Seeding {} × {} rows into {} / {} (seed: {})",
            generator.parents(),
            generator.children_per_parent(),
            plan.schema.parent_table,
            plan.schema.child_table,
            seed
        );
    }

    let (load_progress, bars) = if progress && !json {
        let (p, multi) =
            LoadProgress::spinners(&plan.schema.parent_table, &plan.schema.child_table);
        (p, Some(multi))
    } else {
        (LoadProgress::none(), None)
    };

    let rt = runtime()?;
    let result: Result<RunSummary, SeedError> = rt.block_on(async {
        let mut client = loader::connect(&pg_config).await?;
        pipeline::run(&mut client, &plan, load_progress).await
    });

    if let Some(bars) = bars {
        let _ = bars.clear();
    }

    let summary = result.context("seeding run failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        eprintln!();
        eprintln!("Seed Statistics:");
        eprintln!(
            "  {}: {} rows",
            summary.parent_table, summary.loaded.parent_rows
        );
        eprintln!("  {}: {} rows", summary.child_table, summary.loaded.child_rows);
        eprintln!("  Time: {:.3}s", summary.duration_secs);
    }

    Ok(())
}
