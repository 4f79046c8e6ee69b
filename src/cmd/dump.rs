//! Dump command CLI handler.

use super::runtime;
use crate::config::SeederYamlConfig;
use crate::encoder::DualStreamEncoder;
use crate::generator::Generator;
use crate::writer::{dump_path, CsvFileWriter};
use std::path::PathBuf;

pub fn run(config: SeederYamlConfig, output: PathBuf) -> anyhow::Result<()> {
    let format = config.load.csv_format()?;
    config.schema.validate()?;

    let seed = config.load.seed.unwrap_or_else(rand::random);
    let generator = Generator::new(config.load.parents, config.load.children_per_parent, seed);
    let encoder = DualStreamEncoder::new(format).with_chunk_size(config.load.chunk_size);

    std::fs::create_dir_all(&output)?;
    let parent_path = dump_path(&output, &config.schema.parent_table);
    let child_path = dump_path(&output, &config.schema.child_table);

    let rt = runtime()?;
    let (parent_bytes, child_bytes) = rt.block_on(async {
        let streams = encoder.encode(&generator);
        let parents = CsvFileWriter::create(&parent_path).await?;
        let children = CsvFileWriter::create(&child_path).await?;

        // Each file drains its own stream; neither waits for the other.
        tokio::try_join!(
            parents.write_stream(streams.parents),
            children.write_stream(streams.children)
        )
    })?;

    eprintln!(
        "Wrote {} parents ({} bytes) to {}",
        generator.parents(),
        parent_bytes,
        parent_path.display()
    );
    eprintln!(
        "Wrote {} children ({} bytes) to {}",
        generator.total_children(),
        child_bytes,
        child_path.display()
    );
    eprintln!("Seed: {}", seed);

    Ok(())
}
