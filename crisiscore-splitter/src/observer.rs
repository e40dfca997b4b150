//! Progress reporting for the chunking engine.
//!
//! The engine never prints. Every noteworthy event goes through a
//! [`SplitObserver`]; [`TracingObserver`] forwards them to `tracing` and is
//! what the engine uses unless another observer is injected.

use crate::config::SplitterConfig;
use crate::engine::SplitReport;
use crate::policy::OversizePolicy;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// A chunk that has been flushed to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkWritten {
    /// Zero-based chunk index
    pub index: usize,
    /// Path of the written artifact
    pub path: PathBuf,
    /// Size in bytes as UTF-8
    pub size: usize,
    /// Number of whole lines in the chunk
    pub line_count: usize,
    /// Whether the chunk exceeds the configured maximum (permissive singleton)
    pub over_limit: bool,
}

/// A line whose size alone exceeds the configured maximum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OversizedLine {
    /// One-based line number in the input
    pub line_number: usize,
    /// Size of the line in bytes as UTF-8
    pub size: usize,
    pub max_chunk_size: usize,
    /// Policy that was applied to the line
    pub policy: OversizePolicy,
}

/// The primary decoding failed and the input is being re-read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodingFallback {
    pub input: PathBuf,
    /// One-based number of the first line that failed to decode
    pub line_number: usize,
    pub primary: &'static str,
    pub fallback: &'static str,
}

/// Receives progress events from a running split.
///
/// Implementations must be cheap; they are called synchronously from the
/// read loop.
pub trait SplitObserver: Send + Sync {
    fn on_split_started(&self, _input: &Path, _config: &SplitterConfig) {}

    fn on_chunk_written(&self, chunk: &ChunkWritten);

    fn on_oversized_line(&self, line: &OversizedLine);

    fn on_decoding_fallback(&self, _fallback: &DecodingFallback) {}

    fn on_split_completed(&self, _input: &Path, _report: &SplitReport) {}
}

/// Default observer logging through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl SplitObserver for TracingObserver {
    fn on_split_started(&self, input: &Path, config: &SplitterConfig) {
        tracing::info!(
            "Splitting {} (max chunk size: {} bytes, oversize policy: {}, boundary: {})",
            input.display(),
            config.max_chunk_size,
            config.oversize_policy,
            config.boundary
        );
    }

    fn on_chunk_written(&self, chunk: &ChunkWritten) {
        tracing::info!("Created chunk: {}", chunk.path.display());
        tracing::debug!(
            "Chunk {} holds {} lines ({} bytes)",
            chunk.index,
            chunk.line_count,
            chunk.size
        );
    }

    fn on_oversized_line(&self, line: &OversizedLine) {
        match line.policy {
            OversizePolicy::Strict => tracing::warn!(
                "Skipping line {} exceeding chunk size ({} > {} bytes)",
                line.line_number,
                line.size,
                line.max_chunk_size
            ),
            OversizePolicy::Permissive => tracing::warn!(
                "Line {} exceeds chunk size ({} > {} bytes), writing it as its own chunk",
                line.line_number,
                line.size,
                line.max_chunk_size
            ),
        }
    }

    fn on_decoding_fallback(&self, fallback: &DecodingFallback) {
        tracing::warn!(
            "{} is not valid {} (line {}), re-reading as {}",
            fallback.input.display(),
            fallback.primary,
            fallback.line_number,
            fallback.fallback
        );
    }

    fn on_split_completed(&self, input: &Path, report: &SplitReport) {
        tracing::info!(
            "Successfully created {} chunks from {}",
            report.chunk_count(),
            input.display()
        );
    }
}

/// A single observer notification, as captured by [`RecordingObserver`] or
/// held back by the engine until a pass is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitEvent {
    ChunkWritten(ChunkWritten),
    OversizedLine(OversizedLine),
    DecodingFallback(DecodingFallback),
}

impl SplitEvent {
    /// Call the matching `on_*` method of `observer`.
    pub fn deliver_to(&self, observer: &dyn SplitObserver) {
        match self {
            SplitEvent::ChunkWritten(chunk) => observer.on_chunk_written(chunk),
            SplitEvent::OversizedLine(line) => observer.on_oversized_line(line),
            SplitEvent::DecodingFallback(fallback) => observer.on_decoding_fallback(fallback),
        }
    }
}

/// Observer for tests.
/// It records every chunk, oversized line and fallback in an internal vector.
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    pub events: Arc<Mutex<Vec<SplitEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<SplitEvent> {
        self.lock().clone()
    }

    pub fn chunks(&self) -> Vec<ChunkWritten> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                SplitEvent::ChunkWritten(chunk) => Some(chunk.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn oversized_lines(&self) -> Vec<OversizedLine> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                SplitEvent::OversizedLine(line) => Some(line.clone()),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<SplitEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SplitObserver for RecordingObserver {
    fn on_chunk_written(&self, chunk: &ChunkWritten) {
        self.lock().push(SplitEvent::ChunkWritten(chunk.clone()));
    }

    fn on_oversized_line(&self, line: &OversizedLine) {
        self.lock().push(SplitEvent::OversizedLine(line.clone()));
    }

    fn on_decoding_fallback(&self, fallback: &DecodingFallback) {
        self.lock().push(SplitEvent::DecodingFallback(fallback.clone()));
    }
}
