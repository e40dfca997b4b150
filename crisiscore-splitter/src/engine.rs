//! The line-aware chunking engine.
//!
//! [`ChunkingEngine`] reads an input file line by line and packs whole lines
//! into chunks no larger than a configured number of bytes. A line is never
//! divided across two chunks. Each chunk is written as its own file next to
//! the input (or under an output directory), named `<input>.ccNNN.txt`.
//!
//! # Packing
//!
//! Lines are appended to an in-memory buffer until the next line would push
//! the buffer over `max_chunk_size`; the buffer is then flushed to disk and a
//! new chunk begins. Sizes are UTF-8 byte lengths including the line's own
//! terminator (`\n`, or `\r\n`).
//!
//! A line that is larger than `max_chunk_size` on its own is handled by the
//! configured [`OversizePolicy`]:
//!
//! *   **Permissive** (default): the line is written alone as a chunk that
//!     exceeds the maximum. No data is lost.
//! *   **Strict**: the line is dropped and reported to the observer. Every
//!     chunk honors the maximum.
//!
//! In [`BoundaryMode::Headings`] a line matching one of the heading patterns
//! also ends the current chunk, provided the chunk has reached
//! `min_section_size`. Size limits apply exactly as in line mode.
//!
//! # Encodings
//!
//! The first pass decodes the input as strict UTF-8. If a line is malformed
//! the pass is abandoned and the whole file is re-read with the fallback
//! encoding (windows-1252 unless configured otherwise), overwriting chunks from
//! index 0 and removing any surplus chunks of the abandoned pass. Chunks are
//! always written as UTF-8. Observer events of the first pass are held back
//! while a fallback is configured and only delivered if that pass is kept, so
//! observers see exactly one chunk sequence. Without a fallback, or if the fallback fails too,
//! the split fails with [`FailureCause::DecodingFailure`].
//!
//! # Lifecycle
//!
//! `Constructed → Reading → Flushing → Reading … → Completed | Failed`.
//! Chunks flushed before a failure are left on disk. The existence check made
//! at construction is not repeated: a file deleted between construction and
//! `split()` surfaces as an I/O [`SplitError::SplitFailure`].
//!
//! ```no_run
//! use crisiscore_splitter::{ChunkingEngine, OversizePolicy, SplitterConfig};
//!
//! let config = SplitterConfig::new(64 * 1024).with_oversize_policy(OversizePolicy::Strict);
//! let engine = ChunkingEngine::new("server.log", config)?;
//! let chunk_count = engine.split()?;
//! println!("wrote {chunk_count} chunks");
//! # Ok::<(), crisiscore_splitter::SplitError>(())
//! ```
use crate::config::SplitterConfig;
use crate::decode::LineDecoder;
use crate::error::{FailureCause, Result, SplitError};
use crate::naming::chunk_path;
use crate::observer::{
    ChunkWritten, DecodingFallback, OversizedLine, SplitEvent, SplitObserver, TracingObserver,
};
use crate::policy::{BoundaryMode, OversizePolicy};
use regex::Regex;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Outcome of a successful split.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitReport {
    /// Written chunk paths in index order
    pub chunks: Vec<PathBuf>,
    /// Lines read from the input
    pub lines_read: usize,
    /// Oversized lines dropped under the strict policy
    pub lines_skipped: usize,
    /// Lines larger than the maximum, whichever policy applied
    pub oversized_lines: usize,
    /// Encoding the input was finally decoded with
    pub encoding: &'static str,
}

impl SplitReport {
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

/// Splits one input file into size-bounded chunks of whole lines.
///
/// Input path and configuration are fixed at construction and validated
/// there; [`split`](Self::split) performs the actual pass and may be called
/// again to redo it.
pub struct ChunkingEngine {
    input: PathBuf,
    config: SplitterConfig,
    fallback: Option<LineDecoder>,
    headings: Vec<Regex>,
    observer: Arc<dyn SplitObserver>,
}

impl std::fmt::Debug for ChunkingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkingEngine")
            .field("input", &self.input)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Why a single pass stopped early.
enum PassError {
    Io(io::Error),
    /// Malformed line; `chunks_written` chunks of this pass are already on disk
    Decoding {
        line_number: usize,
        chunks_written: usize,
    },
}

impl From<io::Error> for PassError {
    fn from(e: io::Error) -> Self {
        PassError::Io(e)
    }
}

impl ChunkingEngine {
    /// Create an engine for `input`.
    ///
    /// # Errors
    /// - [`SplitError::InvalidConfiguration`] if `max_chunk_size` is 0, the fallback
    ///   encoding is unknown, or a heading pattern does not compile. These checks run
    ///   before the filesystem is touched.
    /// - [`SplitError::SourceNotFound`] if `input` does not exist.
    pub fn new<P: Into<PathBuf>>(input: P, config: SplitterConfig) -> Result<Self> {
        config.validate()?;
        let fallback = config.fallback_decoder()?;
        let headings = if config.boundary.uses_headings() {
            config.compile_heading_patterns()?
        } else {
            Vec::new()
        };

        let input = input.into();
        if !input.exists() {
            return Err(SplitError::SourceNotFound { path: input });
        }

        Ok(Self {
            input,
            config,
            fallback,
            headings,
            observer: Arc::new(TracingObserver),
        })
    }

    /// Replace the default [`TracingObserver`].
    pub fn with_observer(mut self, observer: Arc<dyn SplitObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }

    /// Path chunk `index` of this input is written to.
    pub fn chunk_path(&self, index: usize) -> PathBuf {
        chunk_path(&self.input, self.config.output_dir.as_deref(), index)
    }

    /// Split the input and return the number of chunks written.
    pub fn split(&self) -> Result<usize> {
        self.split_with_report().map(|report| report.chunk_count())
    }

    /// Split the input and return details about the pass.
    pub fn split_with_report(&self) -> Result<SplitReport> {
        self.observer.on_split_started(&self.input, &self.config);

        if let Some(dir) = &self.config.output_dir {
            fs::create_dir_all(dir).map_err(|e| self.failure(e))?;
        }

        let primary = LineDecoder::utf8();
        let report = match self.run_pass(primary, self.fallback.is_some()) {
            Ok(report) => report,
            Err(PassError::Io(e)) => return Err(self.failure(e)),
            Err(PassError::Decoding {
                line_number,
                chunks_written,
            }) => {
                let Some(fallback) = self.fallback else {
                    return Err(self.failure(FailureCause::DecodingFailure {
                        encoding: primary.name(),
                        line_number,
                    }));
                };
                self.observer.on_decoding_fallback(&DecodingFallback {
                    input: self.input.clone(),
                    line_number,
                    primary: primary.name(),
                    fallback: fallback.name(),
                });
                let report = match self.run_pass(fallback, false) {
                    Ok(report) => report,
                    Err(PassError::Io(e)) => return Err(self.failure(e)),
                    Err(PassError::Decoding { line_number, .. }) => {
                        return Err(self.failure(FailureCause::DecodingFailure {
                            encoding: fallback.name(),
                            line_number,
                        }));
                    }
                };
                self.remove_stale_chunks(report.chunk_count(), chunks_written)?;
                report
            }
        };

        self.observer.on_split_completed(&self.input, &report);
        Ok(report)
    }

    /// Run one pass. With `defer_events` set, observer events are buffered and
    /// only delivered once the pass has read the whole input.
    fn run_pass(
        &self,
        decoder: LineDecoder,
        defer_events: bool,
    ) -> std::result::Result<SplitReport, PassError> {
        let mut reader = BufReader::new(File::open(&self.input)?);
        let mut pass = Pass::new(self, decoder, defer_events);
        let mut raw = Vec::new();

        loop {
            raw.clear();
            if reader.read_until(b'\n', &mut raw)? == 0 {
                break;
            }
            pass.report.lines_read += 1;
            let line_number = pass.report.lines_read;

            let Some(line) = decoder.decode(&raw) else {
                return Err(PassError::Decoding {
                    line_number,
                    chunks_written: pass.report.chunk_count(),
                });
            };
            pass.push_line(line_number, &line)?;
        }

        let (report, deferred) = pass.finish()?;
        for event in &deferred {
            event.deliver_to(self.observer.as_ref());
        }
        Ok(report)
    }

    /// Remove chunks `from..to` left behind by an abandoned pass.
    fn remove_stale_chunks(&self, from: usize, to: usize) -> Result<()> {
        for index in from..to {
            match fs::remove_file(self.chunk_path(index)) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(self.failure(e)),
            }
        }
        Ok(())
    }

    fn is_heading(&self, line: &str) -> bool {
        let text = line.trim_end_matches(|c| c == '\n' || c == '\r');
        self.headings.iter().any(|pattern| pattern.is_match(text))
    }

    fn failure<E: Into<FailureCause>>(&self, cause: E) -> SplitError {
        SplitError::split_failure(self.input.clone(), cause)
    }
}

/// State of one pass over the input.
struct Pass<'a> {
    engine: &'a ChunkingEngine,
    buffer: String,
    buffered_lines: usize,
    report: SplitReport,
    /// Events held back until the pass completes; `None` delivers immediately
    deferred: Option<Vec<SplitEvent>>,
}

impl<'a> Pass<'a> {
    fn new(engine: &'a ChunkingEngine, decoder: LineDecoder, defer_events: bool) -> Self {
        Self {
            engine,
            buffer: String::new(),
            buffered_lines: 0,
            report: SplitReport {
                encoding: decoder.name(),
                ..SplitReport::default()
            },
            deferred: defer_events.then(Vec::new),
        }
    }

    fn emit(&mut self, event: SplitEvent) {
        match &mut self.deferred {
            Some(events) => events.push(event),
            None => event.deliver_to(self.engine.observer.as_ref()),
        }
    }

    fn push_line(&mut self, line_number: usize, line: &str) -> io::Result<()> {
        let engine = self.engine;
        let config = &engine.config;
        let max = config.max_chunk_size;
        let line_size = line.len();

        if config.boundary == BoundaryMode::Headings
            && self.buffered_lines > 0
            && self.buffer.len() >= config.min_section_size
            && engine.is_heading(line)
        {
            self.flush()?;
        }

        if self.buffer.len() + line_size > max && self.buffered_lines > 0 {
            self.flush()?;
        }

        if line_size > max {
            self.report.oversized_lines += 1;
            self.emit(SplitEvent::OversizedLine(OversizedLine {
                line_number,
                size: line_size,
                max_chunk_size: max,
                policy: config.oversize_policy,
            }));
            match config.oversize_policy {
                OversizePolicy::Strict => {
                    self.report.lines_skipped += 1;
                }
                OversizePolicy::Permissive => {
                    // The buffer is empty here, so the line becomes a singleton chunk
                    self.append(line);
                    self.flush()?;
                }
            }
            return Ok(());
        }

        self.append(line);
        Ok(())
    }

    fn append(&mut self, line: &str) {
        self.buffer.push_str(line);
        self.buffered_lines += 1;
    }

    fn flush(&mut self) -> io::Result<()> {
        let index = self.report.chunk_count();
        let path = self.engine.chunk_path(index);

        let mut writer = BufWriter::new(File::create(&path)?);
        writer.write_all(self.buffer.as_bytes())?;
        writer.flush()?;

        let over_limit = self.buffer.len() > self.engine.config.max_chunk_size;
        self.emit(SplitEvent::ChunkWritten(ChunkWritten {
            index,
            path: path.clone(),
            size: self.buffer.len(),
            line_count: self.buffered_lines,
            over_limit,
        }));

        self.report.chunks.push(path);
        self.buffer.clear();
        self.buffered_lines = 0;
        Ok(())
    }

    fn finish(mut self) -> io::Result<(SplitReport, Vec<SplitEvent>)> {
        if self.buffered_lines > 0 {
            self.flush()?;
        }
        Ok((self.report, self.deferred.unwrap_or_default()))
    }
}
