//! Batch mode: split every file in a directory that matches a glob pattern.

use crate::config::SplitterConfig;
use crate::engine::ChunkingEngine;
use crate::error::{Result, SplitError};
use crate::naming::is_chunk_artifact;
use crate::observer::{SplitObserver, TracingObserver};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default pattern used when none is given.
pub const DEFAULT_BATCH_PATTERN: &str = "*.txt";

/// Result of splitting one file in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BatchOutcome {
    Success {
        chunk_count: usize,
        output_files: Vec<PathBuf>,
    },
    Error {
        error: String,
    },
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, BatchOutcome::Success { .. })
    }
}

/// Runs one independent [`ChunkingEngine`] per matching file.
///
/// A failure in one file is recorded in the result map and never stops the
/// remaining files.
#[derive(Clone)]
pub struct BatchSplitter {
    config: SplitterConfig,
    observer: Arc<dyn SplitObserver>,
}

impl BatchSplitter {
    pub fn new(config: SplitterConfig) -> Self {
        Self {
            config,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Observer shared by every engine of the batch.
    pub fn with_observer(mut self, observer: Arc<dyn SplitObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Split all regular files in `input_dir` matching `pattern`.
    ///
    /// `pattern` is relative to `input_dir` and may use `**` to recurse.
    /// Chunk artifacts from previous runs (`*.ccNNN.txt`) are skipped.
    ///
    /// # Errors
    /// Only batch-level problems are errors: an invalid configuration, a
    /// missing directory or a malformed pattern. Per-file failures end up as
    /// [`BatchOutcome::Error`] entries.
    pub fn process_directory(
        &self,
        input_dir: &Path,
        pattern: &str,
    ) -> Result<BTreeMap<PathBuf, BatchOutcome>> {
        self.config.validate()?;
        if !input_dir.exists() {
            return Err(SplitError::SourceNotFound {
                path: input_dir.to_path_buf(),
            });
        }
        if !input_dir.is_dir() {
            return Err(SplitError::invalid_config(format!(
                "Not a directory: {}",
                input_dir.display()
            )));
        }

        let dir = input_dir.to_str().ok_or_else(|| {
            SplitError::invalid_config(format!(
                "Directory path is not valid UTF-8: {}",
                input_dir.display()
            ))
        })?;
        let full_pattern = Path::new(&glob::Pattern::escape(dir))
            .join(pattern)
            .to_string_lossy()
            .into_owned();
        let entries = glob::glob(&full_pattern).map_err(|e| {
            SplitError::invalid_config(format!("Invalid file pattern '{pattern}': {e}"))
        })?;

        let mut results = BTreeMap::new();
        for entry in entries {
            match entry {
                Ok(path) => {
                    if !path.is_file() || is_chunk_artifact(&path) {
                        continue;
                    }
                    let outcome = self.split_one(&path);
                    results.insert(path, outcome);
                }
                Err(e) => {
                    tracing::warn!("Failed to read {}: {}", e.path().display(), e.error());
                    results.insert(
                        e.path().to_path_buf(),
                        BatchOutcome::Error {
                            error: e.error().to_string(),
                        },
                    );
                }
            }
        }

        let failed = results.values().filter(|o| !o.is_success()).count();
        tracing::info!(
            "Processed {} files in {} ({} failed)",
            results.len(),
            input_dir.display(),
            failed
        );
        Ok(results)
    }

    fn split_one(&self, path: &Path) -> BatchOutcome {
        let result = ChunkingEngine::new(path, self.config.clone())
            .and_then(|engine| {
                engine
                    .with_observer(Arc::clone(&self.observer))
                    .split_with_report()
            });

        match result {
            Ok(report) => BatchOutcome::Success {
                chunk_count: report.chunk_count(),
                output_files: report.chunks,
            },
            Err(e) => {
                tracing::warn!("Failed to split {}: {}", path.display(), e);
                BatchOutcome::Error {
                    error: e.to_string(),
                }
            }
        }
    }
}
