//! Writes encoded streams to CSV files.

use crate::encoder::RowStream;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

pub const WRITER_BUFFER_SIZE: usize = 256 * 1024;

pub struct CsvFileWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    bytes_written: u64,
}

impl CsvFileWriter {
    pub async fn create(path: &Path) -> std::io::Result<Self> {
        let file = File::create(path).await?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::with_capacity(WRITER_BUFFER_SIZE, file),
            bytes_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drain `stream` into the file and flush. Returns the bytes written.
    pub async fn write_stream(mut self, mut stream: RowStream) -> anyhow::Result<u64> {
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            self.writer.write_all(&chunk).await?;
            self.bytes_written += chunk.len() as u64;
        }
        self.writer.flush().await?;
        Ok(self.bytes_written)
    }
}

/// File name used for a table's dump
pub fn dump_path(dir: &Path, table: &str) -> PathBuf {
    dir.join(format!("{}.csv", table))
}
