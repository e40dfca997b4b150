use anyhow::anyhow;
use clap::Parser;
use crisiscore_splitter::batch::DEFAULT_BATCH_PATTERN;
use crisiscore_splitter::{
    BatchOutcome, BatchSplitter, BoundaryMode, ChunkingEngine, OversizePolicy, SplitError,
    SplitReport, SplitterConfig,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process;
use tracing::Level;

/// Split a text file into size-bounded chunks without breaking lines.
///
/// Chunks are written as <FILE>.cc000.txt, <FILE>.cc001.txt, ...
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input file path, or a directory to split every file matching --pattern
    file: PathBuf,

    /// Maximum chunk size in bytes (default: 1MB)
    #[arg(short, long, allow_negative_numbers = true)]
    size: Option<i64>,

    /// What to do with lines larger than the chunk size: permissive or strict
    #[arg(long)]
    policy: Option<OversizePolicy>,

    /// Where chunks may end: lines or headings
    #[arg(long)]
    boundary: Option<BoundaryMode>,

    /// Minimum chunk size before a heading starts a new chunk (headings mode)
    #[arg(long)]
    min_section_size: Option<usize>,

    /// Encoding tried when the input is not valid UTF-8, or "none"
    #[arg(long)]
    fallback_encoding: Option<String>,

    /// Directory for the chunk files (default: next to the input)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// TOML configuration file; command line flags take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Glob pattern selecting files when FILE is a directory
    #[arg(long, default_value = DEFAULT_BATCH_PATTERN)]
    pattern: String,

    /// Output format
    #[arg(short, long, default_value = "summary")]
    format: OutputFormat,

    /// Log every chunk in detail
    #[arg(short, long)]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum OutputFormat {
    Summary,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "summary" => Ok(OutputFormat::Summary),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid format: {s}")),
        }
    }
}

#[derive(Serialize)]
struct SplitOutput<'a> {
    input: &'a Path,
    chunk_count: usize,
    chunks: &'a [PathBuf],
    lines_read: usize,
    lines_skipped: usize,
    oversized_lines: usize,
    encoding: &'a str,
}

impl<'a> SplitOutput<'a> {
    fn new(input: &'a Path, report: &'a SplitReport) -> Self {
        Self {
            input,
            chunk_count: report.chunk_count(),
            chunks: &report.chunks,
            lines_read: report.lines_read,
            lines_skipped: report.lines_skipped,
            oversized_lines: report.oversized_lines,
            encoding: report.encoding,
        }
    }
}

fn main() {
    // Usage errors exit with 1 like every other failure; help and version exit with 0
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            process::exit(code);
        }
    };

    init_tracing(&args);

    if let Err(e) = run(args) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn init_tracing(args: &Args) {
    let level = if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::WARN
    } else {
        Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = build_config(&args)?;

    if args.file.is_dir() {
        run_batch(&args, config)
    } else {
        run_single(&args, config)
    }
}

/// Config file values first, then explicit flags on top.
fn build_config(args: &Args) -> anyhow::Result<SplitterConfig> {
    let mut config = match &args.config {
        Some(path) => SplitterConfig::from_toml_file(path)?,
        None => SplitterConfig::default(),
    };

    if let Some(size) = args.size {
        config.max_chunk_size = usize::try_from(size)
            .ok()
            .filter(|&size| size > 0)
            .ok_or_else(|| {
                SplitError::invalid_config(format!("Chunk size must be positive, got {size}"))
            })?;
    }
    if let Some(policy) = args.policy {
        config.oversize_policy = policy;
    }
    if let Some(boundary) = args.boundary {
        config.boundary = boundary;
    }
    if let Some(min_section_size) = args.min_section_size {
        config.min_section_size = min_section_size;
    }
    if let Some(label) = &args.fallback_encoding {
        config.fallback_encoding = Some(label.clone());
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = Some(dir.clone());
    }

    Ok(config)
}

fn run_single(args: &Args, config: SplitterConfig) -> anyhow::Result<()> {
    let engine = ChunkingEngine::new(&args.file, config)?;
    let report = engine.split_with_report()?;

    match args.format {
        OutputFormat::Json => {
            let output = SplitOutput::new(engine.input(), &report);
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Summary => {
            println!(
                "Split {} into {} chunks:",
                engine.input().display(),
                report.chunk_count()
            );
            for path in &report.chunks {
                println!("  - {}", path.display());
            }
            if report.lines_skipped > 0 {
                println!("Skipped {} oversized lines", report.lines_skipped);
            }
        }
    }

    Ok(())
}

fn run_batch(args: &Args, config: SplitterConfig) -> anyhow::Result<()> {
    let results = BatchSplitter::new(config).process_directory(&args.file, &args.pattern)?;

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        OutputFormat::Summary => print_batch_summary(&args.file, &args.pattern, &results),
    }

    let failed = results.values().filter(|o| !o.is_success()).count();
    if failed > 0 {
        return Err(anyhow!(
            "{failed} of {} files failed to split",
            results.len()
        ));
    }
    Ok(())
}

fn print_batch_summary(dir: &Path, pattern: &str, results: &BTreeMap<PathBuf, BatchOutcome>) {
    if results.is_empty() {
        println!("No files matching '{pattern}' in {}", dir.display());
        return;
    }

    for (input, outcome) in results {
        println!("Processed {}:", input.display());
        match outcome {
            BatchOutcome::Success { chunk_count, .. } => {
                println!("  Created {chunk_count} chunks");
            }
            BatchOutcome::Error { error } => {
                println!("  Error: {error}");
            }
        }
    }
}
