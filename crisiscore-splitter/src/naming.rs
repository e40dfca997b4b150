//! Output artifact naming.
//!
//! For an input `P` and zero-based chunk index `i`, the chunk is written as
//! `P.cc{i:03}.txt`, e.g. `server.log.cc000.txt`, `server.log.cc001.txt`.
//! The fixed-width index keeps lexical and numeric order identical for the
//! first 1000 chunks, which downstream tools rely on when globbing.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Separator placed between the input name and the chunk index.
pub const CHUNK_SEPARATOR: &str = ".cc";

/// Extension appended after the chunk index.
pub const CHUNK_EXTENSION: &str = ".txt";

/// Width of the zero-padded chunk index.
pub const INDEX_WIDTH: usize = 3;

/// Returns the suffix appended to the input name for chunk `index`.
pub fn chunk_suffix(index: usize) -> String {
    format!(
        "{CHUNK_SEPARATOR}{index:0width$}{CHUNK_EXTENSION}",
        width = INDEX_WIDTH
    )
}

/// Path of chunk `index` for `input`.
///
/// Without an `output_dir` the chunk sits next to the input; otherwise it is
/// placed in `output_dir` under the input's file name.
pub fn chunk_path(input: &Path, output_dir: Option<&Path>, index: usize) -> PathBuf {
    let mut name: OsString = match output_dir {
        Some(dir) => {
            let file_name = input
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_else(|| OsString::from("input"));
            dir.join(file_name).into_os_string()
        }
        None => input.as_os_str().to_os_string(),
    };
    name.push(chunk_suffix(index));
    PathBuf::from(name)
}

/// Check whether `path` looks like a chunk produced by this crate.
///
/// Used by batch mode so that re-running over a directory does not split the
/// previous run's output again.
pub fn is_chunk_artifact(path: &Path) -> bool {
    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let Some(stem) = file_name.strip_suffix(CHUNK_EXTENSION) else {
        return false;
    };
    match stem.rsplit_once(CHUNK_SEPARATOR) {
        Some((base, index)) => {
            !base.is_empty()
                && index.len() >= INDEX_WIDTH
                && index.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}
