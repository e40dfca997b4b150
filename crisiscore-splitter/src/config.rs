//! Configuration for the chunking engine

use crate::decode::{DEFAULT_FALLBACK_ENCODING, LineDecoder};
use crate::error::{Result, SplitError};
use crate::policy::{BoundaryMode, OversizePolicy};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default maximum chunk size (1 MiB).
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 1024 * 1024;

/// Default minimum size a chunk must reach before a heading may start a new one.
pub const DEFAULT_MIN_SECTION_SIZE: usize = 512;

/// Default section heading patterns, matched against a line without its terminator.
///
/// - `^#{1,6}\s+.+$`: Markdown headings (`# Title`, `### Part`)
/// - `^[A-Z][^.!?]*:\s*$`: title-like lines ending in a colon (`Summary:`)
/// - `^\d+\.\s+[A-Z][^.!?]*$`: numbered sections (`2. Installation`)
/// - `^[A-Z][A-Z\s]+$`: ALL CAPS lines (`CHAPTER ONE`)
pub const DEFAULT_HEADING_PATTERNS: &[&str] = &[
    r"^#{1,6}\s+.+$",
    r"^[A-Z][^.!?]*:\s*$",
    r"^\d+\.\s+[A-Z][^.!?]*$",
    r"^[A-Z][A-Z\s]+$",
];

/// Label that disables the decoding fallback.
const NO_FALLBACK: &str = "none";

/// Configuration for splitting a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitterConfig {
    /// Maximum size of each chunk in bytes, measured as UTF-8
    pub max_chunk_size: usize,
    /// Handling of lines that are larger than `max_chunk_size` on their own
    pub oversize_policy: OversizePolicy,
    /// Boundary detection strategy
    pub boundary: BoundaryMode,
    /// Headings mode: minimum size before a heading starts a new chunk
    pub min_section_size: usize,
    /// Headings mode: regular expressions identifying section headings
    pub heading_patterns: Vec<String>,
    /// Encoding label re-tried when the input is not valid UTF-8, `"none"` to disable
    pub fallback_encoding: Option<String>,
    /// Directory receiving the chunks; the input's directory when unset
    pub output_dir: Option<PathBuf>,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            oversize_policy: OversizePolicy::default(),
            boundary: BoundaryMode::default(),
            min_section_size: DEFAULT_MIN_SECTION_SIZE,
            heading_patterns: DEFAULT_HEADING_PATTERNS
                .iter()
                .map(|&p| p.to_string())
                .collect(),
            fallback_encoding: Some(DEFAULT_FALLBACK_ENCODING.to_string()),
            output_dir: None,
        }
    }
}

impl SplitterConfig {
    pub fn new(max_chunk_size: usize) -> Self {
        Self {
            max_chunk_size,
            ..Self::default()
        }
    }

    pub fn with_max_chunk_size(mut self, max_chunk_size: usize) -> Self {
        self.max_chunk_size = max_chunk_size;
        self
    }

    pub fn with_oversize_policy(mut self, policy: OversizePolicy) -> Self {
        self.oversize_policy = policy;
        self
    }

    pub fn with_boundary(mut self, boundary: BoundaryMode) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn with_min_section_size(mut self, min_section_size: usize) -> Self {
        self.min_section_size = min_section_size;
        self
    }

    pub fn with_heading_patterns<S: Into<String>>(
        mut self,
        patterns: impl IntoIterator<Item = S>,
    ) -> Self {
        self.heading_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the fallback encoding label; `None` disables the fallback.
    pub fn with_fallback_encoding<S: Into<String>>(mut self, label: Option<S>) -> Self {
        self.fallback_encoding = label.map(Into::into);
        self
    }

    pub fn with_output_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Parse a configuration from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| SplitError::invalid_config(format!("Invalid config file: {e}")))
    }

    /// Load a configuration from a TOML file.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SplitError::invalid_config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Validate every setting without touching the input file.
    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_size == 0 {
            return Err(SplitError::invalid_config("Chunk size must be positive"));
        }
        self.fallback_decoder()?;
        if self.boundary.uses_headings() {
            self.compile_heading_patterns()?;
        }
        Ok(())
    }

    /// Resolve the fallback decoder, `None` when the fallback is disabled.
    pub fn fallback_decoder(&self) -> Result<Option<LineDecoder>> {
        match self.fallback_encoding.as_deref().map(str::trim) {
            None => Ok(None),
            Some(label) if label.eq_ignore_ascii_case(NO_FALLBACK) => Ok(None),
            Some(label) => LineDecoder::for_label(label).map(Some).ok_or_else(|| {
                SplitError::invalid_config(format!("Unsupported fallback encoding: '{label}'"))
            }),
        }
    }

    /// Compile the heading patterns used in headings mode.
    pub fn compile_heading_patterns(&self) -> Result<Vec<Regex>> {
        if self.heading_patterns.is_empty() {
            return Err(SplitError::invalid_config(
                "Headings mode requires at least one heading pattern",
            ));
        }
        self.heading_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| {
                    SplitError::invalid_config(format!(
                        "Invalid heading pattern '{pattern}': {e}"
                    ))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SplitterConfig::default();
        assert_eq!(config.max_chunk_size, 1_048_576);
        assert_eq!(config.oversize_policy, OversizePolicy::Permissive);
        assert_eq!(config.boundary, BoundaryMode::Lines);
        assert_eq!(config.heading_patterns.len(), 4);
        assert!(config.validate().is_ok());
        assert_eq!(
            config.fallback_decoder().unwrap().unwrap().name(),
            "windows-1252"
        );
    }

    #[test]
    fn test_zero_size_rejected() {
        let err = SplitterConfig::new(0).validate().unwrap_err();
        assert!(matches!(err, SplitError::InvalidConfiguration { .. }));
        assert!(err.to_string().contains("must be positive"));
    }

    #[test]
    fn test_fallback_resolution() {
        let disabled = SplitterConfig::default().with_fallback_encoding(None::<String>);
        assert!(disabled.fallback_decoder().unwrap().is_none());

        let none_label = SplitterConfig::default().with_fallback_encoding(Some("None"));
        assert!(none_label.fallback_decoder().unwrap().is_none());

        let unknown = SplitterConfig::default().with_fallback_encoding(Some("klingon"));
        assert!(matches!(
            unknown.validate(),
            Err(SplitError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_heading_patterns_validated_only_in_headings_mode() {
        let config = SplitterConfig::default().with_heading_patterns(["(unclosed"]);
        assert!(config.validate().is_ok());

        let config = config.with_boundary(BoundaryMode::Headings);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("(unclosed"));

        let empty = SplitterConfig::default()
            .with_boundary(BoundaryMode::Headings)
            .with_heading_patterns(Vec::<String>::new());
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_default_heading_patterns() {
        let regexes = SplitterConfig::default().compile_heading_patterns().unwrap();
        let is_heading = |line: &str| regexes.iter().any(|r| r.is_match(line));

        assert!(is_heading("# Title"));
        assert!(is_heading("### Deeper title"));
        assert!(is_heading("Summary:"));
        assert!(is_heading("2. Installation"));
        assert!(is_heading("CHAPTER ONE"));

        assert!(!is_heading("just a sentence."));
        assert!(!is_heading("#hashtag"));
        assert!(!is_heading("Ends with a period: really."));
    }

    #[test]
    fn test_from_toml() {
        let config = SplitterConfig::from_toml_str(
            r#"
max_chunk_size = 4096
oversize_policy = "strict"
boundary = "headings"
fallback_encoding = "latin1"
output_dir = "chunks"
"#,
        )
        .unwrap();

        assert_eq!(config.max_chunk_size, 4096);
        assert_eq!(config.oversize_policy, OversizePolicy::Strict);
        assert_eq!(config.boundary, BoundaryMode::Headings);
        assert_eq!(config.min_section_size, DEFAULT_MIN_SECTION_SIZE);
        assert_eq!(config.output_dir, Some(PathBuf::from("chunks")));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_rejects_negative_size() {
        let err = SplitterConfig::from_toml_str("max_chunk_size = -5").unwrap_err();
        assert!(matches!(err, SplitError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("splitter.toml");
        std::fs::write(&path, "max_chunk_size = 10\n").unwrap();

        let config = SplitterConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.max_chunk_size, 10);

        let missing = SplitterConfig::from_toml_file(dir.path().join("nope.toml"));
        assert!(missing.is_err());
    }
}
