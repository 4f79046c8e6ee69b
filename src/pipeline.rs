//! End-to-end seeding run: schema setup, generation, encoding, load.

use crate::encoder::{CsvFormat, DualStreamEncoder};
use crate::error::SeedError;
use crate::generator::Generator;
use crate::loader::{self, LoadOptions, LoadStats};
use crate::progress::LoadProgress;
use crate::schema::{self, SeedSchema};
use serde::Serialize;
use std::time::Instant;
use tokio_postgres::Client;

/// Everything a run needs besides the connection
#[derive(Debug, Clone)]
pub struct SeedPlan {
    pub schema: SeedSchema,
    pub generator: Generator,
    pub format: CsvFormat,
    pub chunk_size: usize,
    pub prefetch_depth: usize,
}

/// Outcome of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub parent_table: String,
    pub child_table: String,
    pub seed: u64,
    pub parents: usize,
    pub children_per_parent: usize,
    #[serde(flatten)]
    pub loaded: LoadStats,
    pub duration_secs: f64,
}

/// Recreate the tables and load the generated dataset in one transaction.
///
/// Returns the first fatal error of any stage. A failure during the load
/// leaves both tables empty.
pub async fn run(
    client: &mut Client,
    plan: &SeedPlan,
    progress: LoadProgress,
) -> Result<RunSummary, SeedError> {
    let start = Instant::now();

    schema::initialize(client, &plan.schema).await?;

    let encoder = DualStreamEncoder::new(plan.format).with_chunk_size(plan.chunk_size);
    let streams = encoder.encode(&plan.generator);

    let options = LoadOptions::new(
        plan.schema.parent_copy(plan.format),
        plan.schema.child_copy(plan.format),
    )
    .with_prefetch_depth(plan.prefetch_depth)
    .with_progress(progress);

    let loaded = loader::load_postgres(client, streams, &options).await?;

    Ok(RunSummary {
        parent_table: plan.schema.parent_table.clone(),
        child_table: plan.schema.child_table.clone(),
        seed: plan.generator.seed(),
        parents: plan.generator.parents(),
        children_per_parent: plan.generator.children_per_parent(),
        loaded,
        duration_secs: start.elapsed().as_secs_f64(),
    })
}
