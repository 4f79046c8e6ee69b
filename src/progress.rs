//! Shared progress tracking utilities.
//!
//! [`track`] wraps an encoded stream and reports the running byte count to a
//! callback, so the CLI can drive one spinner per table while a load runs.

use crate::encoder::RowStream;
use futures::StreamExt;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

/// Callback receiving the total bytes delivered so far
pub type ByteCallback = Arc<dyn Fn(u64) + Send + Sync>;

/// Pass `stream` through unchanged, calling `callback` after every chunk.
pub fn track(stream: RowStream, callback: ByteCallback) -> RowStream {
    let mut bytes_seen = 0u64;
    stream
        .inspect(move |item| {
            if let Ok(chunk) = item {
                bytes_seen += chunk.len() as u64;
                callback(bytes_seen);
            }
        })
        .boxed()
}

/// Byte callbacks for the two streams of a load
#[derive(Clone, Default)]
pub struct LoadProgress {
    pub parents: Option<ByteCallback>,
    pub children: Option<ByteCallback>,
}

impl LoadProgress {
    pub fn none() -> Self {
        Self::default()
    }

    /// Console spinners, one per table, under a shared [`MultiProgress`]
    pub fn spinners(parent_table: &str, child_table: &str) -> (Self, MultiProgress) {
        let multi = MultiProgress::new();
        let parents = multi.add(spinner(parent_table));
        let children = multi.add(spinner(child_table));

        let progress = Self {
            parents: Some(bar_callback(parents)),
            children: Some(bar_callback(children)),
        };
        (progress, multi)
    }

    pub(crate) fn wrap_parents(&self, stream: RowStream) -> RowStream {
        match &self.parents {
            Some(cb) => track(stream, cb.clone()),
            None => stream,
        }
    }

    pub(crate) fn wrap_children(&self, stream: RowStream) -> RowStream {
        match &self.children {
            Some(cb) => track(stream, cb.clone()),
            None => stream,
        }
    }
}

fn spinner(table: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] {prefix}: {bytes} ({bytes_per_sec})",
    ) {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb.set_prefix(table.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn bar_callback(pb: ProgressBar) -> ByteCallback {
    Arc::new(move |bytes: u64| pb.set_position(bytes))
}
