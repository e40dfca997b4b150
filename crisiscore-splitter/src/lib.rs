//! crisiscore-splitter: line-aware splitting of text files into size-bounded chunks
//!
//! The crate takes one large text file and writes it back out as a numbered
//! sequence of smaller files, each at most `max_chunk_size` bytes, without ever
//! cutting a line in half.
//!
//! ## Key Modules
//!
//! - **[`engine`]**: the [`ChunkingEngine`] and its single-pass packing algorithm
//! - **[`config`]**: [`SplitterConfig`], loadable from TOML
//! - **[`observer`]**: progress events, logged through `tracing` by default
//! - **[`batch`]**: splitting every matching file of a directory
//! - **[`naming`]**: the `<input>.ccNNN.txt` output convention
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use crisiscore_splitter::{ChunkingEngine, SplitterConfig};
//!
//! # fn example() -> crisiscore_splitter::Result<()> {
//! let engine = ChunkingEngine::new("export.txt", SplitterConfig::new(1024 * 1024))?;
//! let chunks = engine.split()?; // export.txt.cc000.txt, export.txt.cc001.txt, ...
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod config;
pub mod decode;
pub mod engine;
pub mod error;
pub mod naming;
pub mod observer;
pub mod policy;

pub use batch::{BatchOutcome, BatchSplitter};
pub use config::SplitterConfig;
pub use engine::{ChunkingEngine, SplitReport};
pub use error::{FailureCause, Result, SplitError};
pub use observer::{SplitObserver, TracingObserver};
pub use policy::{BoundaryMode, OversizePolicy};
