//! Output module: writes results to their destinations
//!
//! This module handles:
//! - The [`ResultSink`] trait implemented by every destination
//! - Writer-backed sinks for stdout and append-mode files
//! - Draining the shared result stream into all sinks

mod sink;

pub use sink::{open_append, ResultSink, WriterSink};

use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write to {sink}: {source}")]
    Write {
        sink: String,
        source: std::io::Error,
    },

    #[error("Failed to open {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Writes every result from the stream to every sink, one per line
///
/// Blocks the calling thread until every sender is dropped, then finishes
/// each sink. A failing sink is logged and does not stop the others.
///
/// Returns the number of results received.
pub fn drain(mut results: mpsc::Receiver<String>, mut sinks: Vec<Box<dyn ResultSink>>) -> usize {
    let mut received = 0;

    while let Some(result) = results.blocking_recv() {
        for sink in sinks.iter_mut() {
            if let Err(e) = sink.write_result(&result) {
                tracing::warn!("Error writing result {}: {}", result, e);
            }
        }
        received += 1;
    }

    for sink in sinks.iter_mut() {
        if let Err(e) = sink.finish() {
            tracing::warn!("Error closing output: {}", e);
        }
    }

    received
}
