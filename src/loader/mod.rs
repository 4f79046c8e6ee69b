//! Transactional bulk loader.
//!
//! Both encoded streams are copied into their tables inside one transaction.
//! The transaction commits only when both copies succeed; any failure rolls
//! it back before the error is returned, so a failed load leaves nothing
//! behind.

mod postgres;

pub use postgres::{connect, load_postgres};

use crate::encoder::{self, EncodedStreams, RowStream};
use crate::error::SeedError;
use crate::progress::LoadProgress;
use crate::schema::CopyTarget;
use async_trait::async_trait;
use serde::Serialize;

/// Chunks of the child stream encoded ahead while the parent copy runs
pub const DEFAULT_PREFETCH_DEPTH: usize = 16;

/// One open transaction on the store, able to run bulk copies.
///
/// Copies run one at a time; the session is owned exclusively by the loader
/// until it is committed or rolled back.
#[async_trait]
pub trait BulkSession: Send {
    /// Stream `rows` into `target`, returning the number of rows the store accepted
    async fn copy_rows(&mut self, target: &CopyTarget, rows: RowStream) -> Result<u64, SeedError>;

    async fn commit(self) -> Result<(), SeedError>;

    async fn rollback(self) -> Result<(), SeedError>;
}

/// Where and how to copy the two streams
#[derive(Clone)]
pub struct LoadOptions {
    pub parent_target: CopyTarget,
    pub child_target: CopyTarget,
    /// Read-ahead depth for the child stream; 0 disables it
    pub prefetch_depth: usize,
    pub progress: LoadProgress,
}

impl LoadOptions {
    pub fn new(parent_target: CopyTarget, child_target: CopyTarget) -> Self {
        Self {
            parent_target,
            child_target,
            prefetch_depth: DEFAULT_PREFETCH_DEPTH,
            progress: LoadProgress::none(),
        }
    }

    pub fn with_prefetch_depth(mut self, depth: usize) -> Self {
        self.prefetch_depth = depth;
        self
    }

    pub fn with_progress(mut self, progress: LoadProgress) -> Self {
        self.progress = progress;
        self
    }
}

/// Rows committed by a successful load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    pub parent_rows: u64,
    pub child_rows: u64,
}

/// Copy both streams through `session` and commit, or roll back on any failure.
pub async fn load<S: BulkSession>(
    mut session: S,
    streams: EncodedStreams,
    options: &LoadOptions,
) -> Result<LoadStats, SeedError> {
    match copy_both(&mut session, streams, options).await {
        Ok(stats) => {
            session.commit().await?;
            Ok(stats)
        }
        Err(err) => {
            if let Err(rollback_err) = session.rollback().await {
                eprintln!("Warning: rollback after failed load also failed: {}", rollback_err);
            }
            Err(err)
        }
    }
}

async fn copy_both<S: BulkSession>(
    session: &mut S,
    streams: EncodedStreams,
    options: &LoadOptions,
) -> Result<LoadStats, SeedError> {
    let EncodedStreams { parents, children } = streams;

    // A single connection carries one COPY at a time, so parents go first.
    // The child stream is read ahead meanwhile so its encoding overlaps the parent copy.
    let children = encoder::prefetch(children, options.prefetch_depth);

    let parents = options.progress.wrap_parents(parents);
    let parent_rows = session.copy_rows(&options.parent_target, parents).await?;

    let children = options.progress.wrap_children(children);
    let child_rows = session.copy_rows(&options.child_target, children).await?;

    Ok(LoadStats {
        parent_rows,
        child_rows,
    })
}
